//! Application state container shared across Axum route handlers and services.
//!
//! Holds the database connection backing the primary API. It is cheap to
//! clone and passed into handlers via Axum's `State<T>` extractor.

use sea_orm::DatabaseConnection;

/// Central application state shared across the server.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
}

impl AppState {
    /// Creates a new `AppState` around an open database connection.
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Returns a cloned copy of the database connection.
    ///
    /// Useful for async contexts or spawning tasks that require ownership.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }
}
