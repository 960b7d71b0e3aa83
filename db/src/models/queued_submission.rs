use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Set};

/// A write captured while no backend was reachable, waiting to be replayed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "offline_queue")]
pub struct Model {
    /// `{kind}_{unix_millis}`
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub kind: String,
    pub payload: Json,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn make_key(kind: &str, at: DateTime<Utc>) -> String {
        format!("{}_{}", kind, at.timestamp_millis())
    }

    pub async fn enqueue(db: &DbConn, kind: &str, payload: Json) -> Result<Model, DbErr> {
        let now = Utc::now();
        let mut key = Self::make_key(kind, now);
        // Two enqueues within the same millisecond would collide on the key.
        let mut bump = 0;
        while Entity::find_by_id(key.clone()).one(db).await?.is_some() {
            bump += 1;
            key = format!("{}_{}", Self::make_key(kind, now), bump);
        }

        ActiveModel {
            key: Set(key),
            kind: Set(kind.to_owned()),
            payload: Set(payload),
            attempts: Set(0),
            last_error: Set(None),
            created_at: Set(now),
        }
        .insert(db)
        .await
    }

    /// Oldest first.
    pub async fn pending(db: &DbConn) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Key)
            .all(db)
            .await
    }

    pub async fn record_failure(db: &DbConn, key: &str, error: &str) -> Result<Model, DbErr> {
        let model = Entity::find_by_id(key.to_owned())
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("Queued submission {key} not found")))?;

        let attempts = model.attempts + 1;
        let mut active: ActiveModel = model.into();
        active.attempts = Set(attempts);
        active.last_error = Set(Some(error.to_owned()));
        active.update(db).await
    }

    pub async fn remove(db: &DbConn, key: &str) -> Result<(), DbErr> {
        Entity::delete_by_id(key.to_owned()).exec(db).await?;
        Ok(())
    }
}
