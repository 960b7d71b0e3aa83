use async_trait::async_trait;

use crate::error::AppError;
use crate::session::Context;
use crate::types::{Device, DeviceUpdate, DiagnosticResult, HistoryFilter, HistoryPage, NewDevice};

/// One backend able to serve device and diagnostic data.
///
/// Implementations report every failure as an [`AppError`]; deciding whether
/// to try somewhere else is the job of [`crate::client::DataClient`].
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    async fn get_devices(&self, ctx: &Context) -> Result<Vec<Device>, AppError>;

    async fn get_device(&self, ctx: &Context, id: &str) -> Result<Device, AppError>;

    async fn create_device(&self, ctx: &Context, device: &NewDevice) -> Result<Device, AppError>;

    async fn update_device(
        &self,
        ctx: &Context,
        id: &str,
        patch: &DeviceUpdate,
    ) -> Result<Device, AppError>;

    async fn delete_device(&self, ctx: &Context, id: &str) -> Result<(), AppError>;

    /// Newest first.
    async fn get_diagnostics(&self, ctx: &Context) -> Result<Vec<DiagnosticResult>, AppError>;

    async fn get_diagnostic(&self, ctx: &Context, id: &str) -> Result<DiagnosticResult, AppError>;

    /// Stores a new record under its own id. The record must be `pending`.
    async fn save_diagnostic(
        &self,
        ctx: &Context,
        diagnostic: &DiagnosticResult,
    ) -> Result<DiagnosticResult, AppError>;

    /// Replaces the stored record with the same id, subject to the status
    /// transition rules.
    async fn update_diagnostic(
        &self,
        ctx: &Context,
        diagnostic: &DiagnosticResult,
    ) -> Result<DiagnosticResult, AppError>;

    async fn get_diagnostic_history(
        &self,
        ctx: &Context,
        filter: &HistoryFilter,
    ) -> Result<HistoryPage<DiagnosticResult>, AppError>;
}
