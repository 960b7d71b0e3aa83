//! Local store for diagnostics that could not be submitted.
//!
//! Entries live in the `offline_queue` table of a local database, keyed
//! `{kind}_{unix_millis}`, and are replayed oldest first by [`OfflineQueue::flush`].

use db::models::queued_submission;
use sea_orm::DatabaseConnection;

use crate::client::DataClient;
use crate::error::AppError;
use crate::session::Context;
use crate::types::DiagnosticResult;

pub const DIAGNOSTIC_KIND: &str = "diagnostic";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FlushReport {
    pub submitted: Vec<String>,
    /// `(key, error)` for entries left in the queue.
    pub failed: Vec<(String, String)>,
    /// `(key, error)` for entries the store refused. These are dropped.
    pub rejected: Vec<(String, String)>,
}

#[derive(Clone)]
pub struct OfflineQueue {
    db: DatabaseConnection,
}

impl OfflineQueue {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Opens (and migrates) the queue database at `path_or_url`.
    pub async fn open(path_or_url: &str) -> Result<Self, AppError> {
        Ok(Self::new(db::connect_and_migrate(path_or_url).await?))
    }

    pub async fn enqueue_diagnostic(&self, diagnostic: &DiagnosticResult) -> Result<String, AppError> {
        let payload = serde_json::to_value(diagnostic)
            .map_err(|e| AppError::Validation(format!("cannot serialise diagnostic: {e}")))?;
        let row = queued_submission::Model::enqueue(&self.db, DIAGNOSTIC_KIND, payload).await?;
        Ok(row.key)
    }

    pub async fn pending(&self) -> Result<Vec<queued_submission::Model>, AppError> {
        Ok(queued_submission::Model::pending(&self.db).await?)
    }

    pub async fn len(&self) -> Result<usize, AppError> {
        Ok(self.pending().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool, AppError> {
        Ok(self.len().await? == 0)
    }

    /// Replays every queued entry through `client`. Successful entries are
    /// removed, and so are entries the store refuses outright (a validation
    /// error or an impossible status transition). Other failures stay queued
    /// with their attempt count bumped.
    pub async fn flush(&self, client: &DataClient, ctx: &Context) -> Result<FlushReport, AppError> {
        let mut report = FlushReport::default();

        for entry in self.pending().await? {
            let outcome = match entry.kind.as_str() {
                DIAGNOSTIC_KIND => match serde_json::from_value::<DiagnosticResult>(entry.payload.clone()) {
                    Ok(record) => client.replay_diagnostic(ctx, &record).await.map(|_| ()),
                    Err(e) => Err(AppError::MalformedResponse(format!("queued payload: {e}"))),
                },
                other => Err(AppError::Unsupported(format!("unknown queued kind {other}"))),
            };

            match outcome {
                Ok(()) => {
                    queued_submission::Model::remove(&self.db, &entry.key).await?;
                    tracing::info!(key = %entry.key, "queued submission delivered");
                    report.submitted.push(entry.key);
                }
                Err(err) if err.is_rejection() => {
                    queued_submission::Model::remove(&self.db, &entry.key).await?;
                    tracing::error!(key = %entry.key, error = %err, "queued submission rejected, dropping it");
                    report.rejected.push((entry.key, err.to_string()));
                }
                Err(err) => {
                    let message = err.to_string();
                    queued_submission::Model::record_failure(&self.db, &entry.key, &message).await?;
                    tracing::warn!(key = %entry.key, attempts = entry.attempts + 1, error = %message, "queued submission still failing");
                    report.failed.push((entry.key, message));
                }
            }
        }

        Ok(report)
    }
}
