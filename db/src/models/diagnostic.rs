use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One diagnostic run against a device, stored in the `diagnostics` table.
///
/// Metric blobs are kept as opaque JSON; the service layer parses them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "diagnostics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub device_id: String,
    pub user_id: String,
    pub status: DiagnosticStatus,

    pub cpu_status: Option<ComponentStatus>,
    pub memory_status: Option<ComponentStatus>,
    pub disk_status: Option<ComponentStatus>,
    pub network_status: Option<ComponentStatus>,
    pub battery_status: Option<ComponentStatus>,

    pub cpu_metrics: Option<Json>,
    pub memory_metrics: Option<Json>,
    pub disk_metrics: Option<Json>,
    pub network_metrics: Option<Json>,
    pub battery_metrics: Option<Json>,
    pub antivirus_metrics: Option<Json>,
    pub driver_metrics: Option<Json>,

    /// 0..=100, only set once the run completed.
    pub health_score: Option<i32>,
    pub issues: Json,
    pub recommendations: Json,

    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub raw_data: Option<Json>,
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle of a diagnostic run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "diagnostic_status")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DiagnosticStatus {
    #[sea_orm(string_value = "pending")]
    Pending,

    #[sea_orm(string_value = "running")]
    Running,

    #[sea_orm(string_value = "completed")]
    Completed,

    #[sea_orm(string_value = "failed")]
    Failed,
}

impl DiagnosticStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Forward-only transitions. Staying in a non-terminal state is allowed so
    /// a record can be updated in place while metrics arrive.
    pub fn can_transition_to(self, next: Self) -> bool {
        use DiagnosticStatus::*;
        matches!(
            (self, next),
            (Pending, Pending)
                | (Pending, Running)
                | (Pending, Failed)
                | (Running, Running)
                | (Running, Completed)
                | (Running, Failed)
        )
    }
}

/// Coarse per-component health label.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "component_status")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ComponentStatus {
    #[sea_orm(string_value = "normal")]
    Normal,

    #[sea_orm(string_value = "warning")]
    Warning,

    #[sea_orm(string_value = "critical")]
    Critical,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::device::Entity",
        from = "Column::DeviceId",
        to = "super::device::Column::Id"
    )]
    Device,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::device::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Device.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_for_user(
        db: &DbConn,
        user_id: &str,
        diagnostic_id: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(diagnostic_id.to_owned())
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await
    }

    pub async fn find_all_for_user(db: &DbConn, user_id: &str) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await
    }
}
