pub mod filter_utils;
pub mod models;
pub mod repository;
pub mod test_utils;

use migration::Migrator;
use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::path::Path;

/// Turns a configured path or DSN into a connection URL. Plain paths are
/// treated as SQLite files, created on first use.
pub fn database_url(path_or_url: &str) -> String {
    if path_or_url.starts_with("sqlite:")
        || path_or_url.starts_with("postgres://")
        || path_or_url.starts_with("mysql://")
    {
        return path_or_url.to_string();
    }

    // SQLite won't create intermediate dirs.
    if let Some(parent) = Path::new(path_or_url).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    format!("sqlite://{path_or_url}?mode=rwc")
}

pub async fn connect_to(path_or_url: &str) -> Result<DatabaseConnection, DbErr> {
    let url = database_url(path_or_url);
    tracing::debug!(%url, "connecting to database");
    Database::connect(&url).await
}

/// Connects and brings the schema up to date.
pub async fn connect_and_migrate(path_or_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = connect_to(path_or_url).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

#[cfg(test)]
mod tests;
