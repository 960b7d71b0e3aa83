use crate::filter_utils::{FilterUtils, SortUtils};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Select,
};
use std::marker::PhantomData;
use std::str::FromStr;
use util::filters::FilterParam;

/// Generic repository that works with any SeaORM entity.
///
/// Column names arriving in `FilterParam`s and `sort_by` strings are resolved
/// through `C::from_str`, so unknown names fail instead of being ignored.
pub struct Repository<E, C>
where
    E: EntityTrait,
    E::Model: Sync + Send + 'static,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send,
    E::Model: IntoActiveModel<E::ActiveModel>,
    C: ColumnTrait + FromStr + 'static,
    C::Err: std::fmt::Display,
{
    _phantom: PhantomData<(E, C)>,
}

impl<E, C> Repository<E, C>
where
    E: EntityTrait,
    E::Model: Sync + Send + 'static,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send,
    E::Model: IntoActiveModel<E::ActiveModel>,
    C: ColumnTrait + FromStr + 'static,
    C::Err: std::fmt::Display,
{
    fn resolve(column_name: &str) -> Result<C, DbErr> {
        C::from_str(column_name)
            .map_err(|e| DbErr::Custom(format!("Invalid column name '{}': {}", column_name, e)))
    }

    pub fn apply_filter(
        query: Select<E>,
        filter_params: &[FilterParam],
    ) -> Result<Select<E>, DbErr> {
        let condition = FilterUtils::apply_all_filters(filter_params, Self::resolve)?;
        Ok(query.filter(condition))
    }

    pub fn apply_sorting(query: Select<E>, sort_by: Option<&str>) -> Result<Select<E>, DbErr> {
        SortUtils::apply_sorting(query, sort_by, Self::resolve)
    }

    pub async fn find_all(
        db: &DatabaseConnection,
        filter_params: &[FilterParam],
        sort_by: Option<&str>,
    ) -> Result<Vec<E::Model>, DbErr> {
        let query = Self::apply_filter(E::find(), filter_params)?;
        let query = Self::apply_sorting(query, sort_by)?;
        query.all(db).await
    }

    /// Returns one page (1-based) plus the total number of matching rows.
    pub async fn filter(
        db: &DatabaseConnection,
        filter_params: &[FilterParam],
        page: u64,
        per_page: u64,
        sort_by: Option<&str>,
    ) -> Result<(Vec<E::Model>, u64), DbErr> {
        let query = Self::apply_filter(E::find(), filter_params)?;
        let query = Self::apply_sorting(query, sort_by)?;

        let per_page = per_page.max(1);
        let index = page.saturating_sub(1);
        let paginator = query.paginate(db, per_page);
        let total = paginator.num_items().await?;
        if index.saturating_mul(per_page) >= total {
            return Ok((Vec::new(), total));
        }
        let items = paginator.fetch_page(index).await?;

        Ok((items, total))
    }

    pub async fn count(db: &DatabaseConnection, filter_params: &[FilterParam]) -> Result<u64, DbErr> {
        let query = Self::apply_filter(E::find(), filter_params)?;
        <Select<E> as PaginatorTrait<'_, _>>::count(query, db).await
    }
}
