use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, Set};
use serde::Serialize;

/// Represents an account in the `users` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Primary key (UUID string).
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Unique login email, stored lowercased.
    pub email: String,
    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::device::Entity")]
    Devices,
}

impl Related<super::device::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Devices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DbConn,
        email: &str,
        password_hash: &str,
        full_name: Option<&str>,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            email: Set(email.trim().to_lowercase()),
            password_hash: Set(password_hash.to_owned()),
            full_name: Set(full_name.map(str::to_owned)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    pub async fn find_by_email(db: &DbConn, email: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::Email.eq(email.trim().to_lowercase()))
            .one(db)
            .await
    }
}
