use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A customer or shop computer tracked in the `devices` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "devices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning account; every query is scoped by it.
    pub user_id: String,
    pub name: String,
    pub device_type: DeviceType,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub processor: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    /// Most recent diagnostic of *this* device, if any.
    pub last_diagnostic_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "device_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceType {
    #[sea_orm(string_value = "desktop")]
    Desktop,

    #[sea_orm(string_value = "laptop")]
    Laptop,

    #[sea_orm(string_value = "tablet")]
    Tablet,

    #[sea_orm(string_value = "phone")]
    Phone,

    #[sea_orm(string_value = "server")]
    Server,

    #[default]
    #[sea_orm(string_value = "other")]
    Other,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(has_many = "super::diagnostic::Entity")]
    Diagnostics,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::diagnostic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Diagnostics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_all_for_user(db: &DbConn, user_id: &str) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await
    }

    pub async fn find_for_user(
        db: &DbConn,
        user_id: &str,
        device_id: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(device_id.to_owned())
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await
    }

    /// Points the device at `diagnostic_id`. Last write wins; the caller is
    /// responsible for checking that the diagnostic belongs to this device.
    pub async fn set_last_diagnostic(
        db: &DbConn,
        device_id: &str,
        diagnostic_id: &str,
    ) -> Result<Model, DbErr> {
        let model = Entity::find_by_id(device_id.to_owned())
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("Device {device_id} not found")))?;

        let mut active: ActiveModel = model.into();
        active.last_diagnostic_id = Set(Some(diagnostic_id.to_owned()));
        active.updated_at = Set(Utc::now());
        active.update(db).await
    }

    pub async fn delete_for_user(db: &DbConn, user_id: &str, device_id: &str) -> Result<u64, DbErr> {
        let res = Entity::delete_many()
            .filter(Column::Id.eq(device_id))
            .filter(Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }
}
