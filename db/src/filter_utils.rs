use sea_orm::sea_query::SimpleExpr;
use sea_orm::{ColumnTrait, Condition, DbErr, EntityTrait, QueryOrder, Select};
use util::filters::{CompareOp, FilterParam, FilterValue};

pub struct FilterUtils;

impl FilterUtils {
    /// Adds one `FilterParam` to `condition` against the resolved column.
    pub fn apply_filter<C>(
        condition: Condition,
        column: C,
        filter_param: &FilterParam,
    ) -> Result<Condition, DbErr>
    where
        C: ColumnTrait,
    {
        let expr = match (&filter_param.value, &filter_param.operator) {
            // SQLite's LIKE is already case-insensitive for ASCII.
            (FilterValue::String(value), CompareOp::Like) => column.like(format!("%{}%", value)),
            (FilterValue::String(value), op) => Self::compare(column, op, value.clone())?,
            (FilterValue::Int(value), CompareOp::Like) => column.like(format!("%{}%", value)),
            (FilterValue::Int(value), op) => Self::compare(column, op, *value)?,
            (FilterValue::DateTime(_), CompareOp::Like) => {
                return Err(DbErr::Custom(
                    "LIKE operator not supported for DateTime values".to_string(),
                ));
            }
            (FilterValue::DateTime(value), op) => Self::compare(column, op, *value)?,
            (FilterValue::Bool(value), CompareOp::Eq) => column.eq(*value),
            (FilterValue::Bool(value), CompareOp::NotEq) => column.ne(*value),
            (FilterValue::Bool(_), op) => {
                return Err(DbErr::Custom(format!(
                    "Invalid operator {:?} for boolean value",
                    op
                )));
            }
        };
        Ok(condition.add(expr))
    }

    fn compare<C, V>(column: C, op: &CompareOp, value: V) -> Result<SimpleExpr, DbErr>
    where
        C: ColumnTrait,
        V: Into<sea_orm::Value>,
    {
        Ok(match op {
            CompareOp::Eq => column.eq(value),
            CompareOp::NotEq => column.ne(value),
            CompareOp::Gt => column.gt(value),
            CompareOp::Gte => column.gte(value),
            CompareOp::Lt => column.lt(value),
            CompareOp::Lte => column.lte(value),
            CompareOp::Like => {
                return Err(DbErr::Custom("LIKE handled by caller".to_string()));
            }
        })
    }

    /// Combines every filter with AND.
    pub fn apply_all_filters<C>(
        filter_params: &[FilterParam],
        column_resolver: impl Fn(&str) -> Result<C, DbErr>,
    ) -> Result<Condition, DbErr>
    where
        C: ColumnTrait,
    {
        let mut condition = Condition::all();

        for filter_param in filter_params {
            let column = column_resolver(&filter_param.column)?;
            condition = Self::apply_filter(condition, column, filter_param)?;
        }

        Ok(condition)
    }
}

pub struct SortUtils;

impl SortUtils {
    /// `sort_by` is a column name, prefixed with `-` for descending order.
    pub fn apply_sorting<E, C>(
        mut query: Select<E>,
        sort_by: Option<&str>,
        column_resolver: impl Fn(&str) -> Result<C, DbErr>,
    ) -> Result<Select<E>, DbErr>
    where
        E: EntityTrait,
        C: ColumnTrait,
    {
        if let Some(sort) = sort_by {
            let (column_name, asc) = match sort.strip_prefix('-') {
                Some(rest) => (rest, false),
                None => (sort, true),
            };

            let column = column_resolver(column_name)?;
            query = if asc {
                query.order_by_asc(column)
            } else {
                query.order_by_desc(column)
            };
        }
        Ok(query)
    }
}
