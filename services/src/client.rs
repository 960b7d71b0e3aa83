//! Ordered-fallback data access.
//!
//! A [`DataClient`] owns a list of providers and tries them in order, one
//! attempt each. The first success wins. A `NotFound` is an answer and ends
//! the chain. When every provider fails, reads are served from the built-in
//! [`MockProvider`] fixtures and writes report [`AppError::AllProvidersFailed`]
//! (or, only when explicitly enabled, a fabricated success).

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use util::config;
use validator::Validate;

use crate::error::AppError;
use crate::offline_queue::OfflineQueue;
use crate::provider::DataProvider;
use crate::providers::{ApiProvider, DatabaseProvider, MockProvider};
use crate::session::Context;
use crate::types::{
    Device, DeviceUpdate, DiagnosticResult, DiagnosticStatus, HistoryFilter, HistoryPage,
    NewDevice,
};

/// What to do with a write once every provider has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockWrites {
    #[default]
    Reject,
    /// Pretend the write succeeded. Each fabricated write is logged at `warn`.
    Fabricate,
}

impl MockWrites {
    pub fn from_config() -> Self {
        if config::allow_mock_writes() {
            MockWrites::Fabricate
        } else {
            MockWrites::Reject
        }
    }
}

/// Outcome of [`DataClient::save_diagnostic_or_queue`].
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Saved(DiagnosticResult),
    /// Nothing accepted the write; it sits in the offline queue under this key.
    Queued(String),
}

/// Tries each provider once, in order. Evaluates to the first `Ok`, the
/// first `NotFound`, or the last error.
macro_rules! first_success {
    ($self:ident, $op:literal, |$p:ident| $call:expr) => {{
        let mut outcome = Err(AppError::Unsupported(
            "no data providers configured".to_string(),
        ));
        for $p in $self.providers.iter() {
            match $call.await {
                Ok(value) => {
                    outcome = Ok(value);
                    break;
                }
                Err(err) if err.is_not_found() => {
                    outcome = Err(err);
                    break;
                }
                Err(err) => {
                    tracing::warn!(provider = $p.name(), op = $op, error = %err, "provider failed");
                    outcome = Err(err);
                }
            }
        }
        outcome
    }};
}

#[derive(Clone)]
pub struct DataClient {
    providers: Vec<Arc<dyn DataProvider>>,
    mock: MockProvider,
    mock_writes: MockWrites,
}

impl DataClient {
    pub fn new(providers: Vec<Arc<dyn DataProvider>>) -> Self {
        Self {
            providers,
            mock: MockProvider::new(),
            mock_writes: MockWrites::Reject,
        }
    }

    /// Primary API first, then the local database when one is given.
    pub fn from_config(db: Option<DatabaseConnection>) -> Result<Self, AppError> {
        let mut providers: Vec<Arc<dyn DataProvider>> = vec![Arc::new(ApiProvider::from_config()?)];
        if let Some(db) = db {
            providers.push(Arc::new(DatabaseProvider::new(db)));
        }
        Ok(Self::new(providers).with_mock_writes(MockWrites::from_config()))
    }

    pub fn with_mock_writes(mut self, mock_writes: MockWrites) -> Self {
        self.mock_writes = mock_writes;
        self.mock = MockProvider::new().fabricating_writes(mock_writes == MockWrites::Fabricate);
        self
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    fn serving_mock(op: &str, err: &AppError) {
        tracing::warn!(op, error = %err, "all providers failed, serving mock data");
    }

    fn exhausted(&self, op: &str, err: AppError) -> Result<(), AppError> {
        if err.is_not_found() {
            return Err(err);
        }
        if self.mock_writes == MockWrites::Fabricate {
            tracing::warn!(op, error = %err, "all providers failed, fabricating write");
            return Ok(());
        }
        tracing::error!(op, error = %err, "all providers failed");
        Err(AppError::AllProvidersFailed(Box::new(err)))
    }

    pub async fn get_devices(&self, ctx: &Context) -> Vec<Device> {
        match first_success!(self, "get_devices", |p| p.get_devices(ctx)) {
            Ok(devices) => devices,
            Err(err) => {
                Self::serving_mock("get_devices", &err);
                self.mock.devices()
            }
        }
    }

    pub async fn get_device(&self, ctx: &Context, id: &str) -> Result<Device, AppError> {
        match first_success!(self, "get_device", |p| p.get_device(ctx, id)) {
            Ok(device) => Ok(device),
            Err(err) if err.is_not_found() => Err(err),
            Err(err) => {
                Self::serving_mock("get_device", &err);
                self.mock.device(id)
            }
        }
    }

    pub async fn create_device(&self, ctx: &Context, new: &NewDevice) -> Result<Device, AppError> {
        new.validate()?;
        match first_success!(self, "create_device", |p| p.create_device(ctx, new)) {
            Ok(device) => Ok(device),
            Err(err) => {
                self.exhausted("create_device", err)?;
                self.mock.create_device(ctx, new).await
            }
        }
    }

    pub async fn update_device(
        &self,
        ctx: &Context,
        id: &str,
        patch: &DeviceUpdate,
    ) -> Result<Device, AppError> {
        patch.validate()?;
        match first_success!(self, "update_device", |p| p.update_device(ctx, id, patch)) {
            Ok(device) => Ok(device),
            Err(err) => {
                self.exhausted("update_device", err)?;
                self.mock.update_device(ctx, id, patch).await
            }
        }
    }

    pub async fn delete_device(&self, ctx: &Context, id: &str) -> Result<(), AppError> {
        match first_success!(self, "delete_device", |p| p.delete_device(ctx, id)) {
            Ok(()) => Ok(()),
            Err(err) => self.exhausted("delete_device", err),
        }
    }

    pub async fn get_diagnostics(&self, ctx: &Context) -> Vec<DiagnosticResult> {
        match first_success!(self, "get_diagnostics", |p| p.get_diagnostics(ctx)) {
            Ok(list) => list,
            Err(err) => {
                Self::serving_mock("get_diagnostics", &err);
                self.mock.diagnostics()
            }
        }
    }

    pub async fn get_diagnostic(&self, ctx: &Context, id: &str) -> Result<DiagnosticResult, AppError> {
        match first_success!(self, "get_diagnostic", |p| p.get_diagnostic(ctx, id)) {
            Ok(diagnostic) => Ok(diagnostic),
            Err(err) if err.is_not_found() => Err(err),
            Err(err) => {
                Self::serving_mock("get_diagnostic", &err);
                self.mock.diagnostic(id)
            }
        }
    }

    pub async fn save_diagnostic(
        &self,
        ctx: &Context,
        diagnostic: &DiagnosticResult,
    ) -> Result<DiagnosticResult, AppError> {
        if diagnostic.status != DiagnosticStatus::Pending {
            return Err(AppError::Validation(format!(
                "new diagnostics must be pending, got {}",
                diagnostic.status
            )));
        }
        diagnostic.validate()?;
        match first_success!(self, "save_diagnostic", |p| p.save_diagnostic(ctx, diagnostic)) {
            Ok(saved) => Ok(saved),
            Err(err) => {
                self.exhausted("save_diagnostic", err)?;
                self.mock.save_diagnostic(ctx, diagnostic).await
            }
        }
    }

    pub async fn update_diagnostic(
        &self,
        ctx: &Context,
        diagnostic: &DiagnosticResult,
    ) -> Result<DiagnosticResult, AppError> {
        diagnostic.validate()?;
        match first_success!(self, "update_diagnostic", |p| p.update_diagnostic(ctx, diagnostic)) {
            Ok(updated) => Ok(updated),
            Err(err) => {
                self.exhausted("update_diagnostic", err)?;
                self.mock.update_diagnostic(ctx, diagnostic).await
            }
        }
    }

    pub async fn get_diagnostic_history(
        &self,
        ctx: &Context,
        filter: &HistoryFilter,
    ) -> HistoryPage<DiagnosticResult> {
        let filter = filter.normalized();
        match first_success!(self, "get_diagnostic_history", |p| p
            .get_diagnostic_history(ctx, &filter))
        {
            Ok(page) => page,
            Err(err) => {
                Self::serving_mock("get_diagnostic_history", &err);
                self.mock.history(&filter)
            }
        }
    }

    /// Saves a new record, parking it in `queue` when nothing accepts it.
    /// Validation failures are returned, never queued.
    pub async fn save_diagnostic_or_queue(
        &self,
        ctx: &Context,
        diagnostic: &DiagnosticResult,
        queue: &OfflineQueue,
    ) -> Result<Submission, AppError> {
        match self.save_diagnostic(ctx, diagnostic).await {
            Ok(saved) => Ok(Submission::Saved(saved)),
            Err(AppError::AllProvidersFailed(cause)) => {
                let key = queue.enqueue_diagnostic(diagnostic).await?;
                tracing::info!(%key, cause = %cause, "diagnostic queued for later submission");
                Ok(Submission::Queued(key))
            }
            Err(err) => Err(err),
        }
    }

    /// Brings the stored copy of `record` up to its status, walking the
    /// lifecycle from wherever the providers currently have it:
    /// absent → pending → running → completed, or straight to failed.
    pub async fn replay_diagnostic(
        &self,
        ctx: &Context,
        record: &DiagnosticResult,
    ) -> Result<DiagnosticResult, AppError> {
        record.validate()?;

        let mut stored = match self.get_diagnostic(ctx, &record.id).await {
            Ok(existing) => existing,
            Err(err) if err.is_not_found() => {
                let mut staged = record.clone();
                staged.status = DiagnosticStatus::Pending;
                staged.health_score = None;
                self.save_diagnostic(ctx, &staged).await?
            }
            Err(err) => return Err(err),
        };

        if stored.status == DiagnosticStatus::Pending
            && matches!(
                record.status,
                DiagnosticStatus::Running | DiagnosticStatus::Completed
            )
        {
            let mut staged = record.clone();
            staged.status = DiagnosticStatus::Running;
            staged.health_score = None;
            stored = self.update_diagnostic(ctx, &staged).await?;
        }

        let stale = !stored.status.is_terminal() && stored != *record;
        if stored.status != record.status || stale {
            stored = self.update_diagnostic(ctx, record).await?;
        }
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClientInfo, DeviceType};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails every call with the configured error, counting attempts.
    struct Failing {
        calls: AtomicUsize,
        not_found: bool,
    }

    impl Failing {
        fn down() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                not_found: false,
            })
        }

        fn empty() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                not_found: true,
            })
        }

        fn fail<T>(&self) -> Result<T, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.not_found {
                Err(AppError::NotFound("thing".into()))
            } else {
                Err(AppError::Network("connection refused".into()))
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DataProvider for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        async fn get_devices(&self, _: &Context) -> Result<Vec<Device>, AppError> {
            self.fail()
        }
        async fn get_device(&self, _: &Context, _: &str) -> Result<Device, AppError> {
            self.fail()
        }
        async fn create_device(&self, _: &Context, _: &NewDevice) -> Result<Device, AppError> {
            self.fail()
        }
        async fn update_device(
            &self,
            _: &Context,
            _: &str,
            _: &DeviceUpdate,
        ) -> Result<Device, AppError> {
            self.fail()
        }
        async fn delete_device(&self, _: &Context, _: &str) -> Result<(), AppError> {
            self.fail()
        }
        async fn get_diagnostics(&self, _: &Context) -> Result<Vec<DiagnosticResult>, AppError> {
            self.fail()
        }
        async fn get_diagnostic(&self, _: &Context, _: &str) -> Result<DiagnosticResult, AppError> {
            self.fail()
        }
        async fn save_diagnostic(
            &self,
            _: &Context,
            _: &DiagnosticResult,
        ) -> Result<DiagnosticResult, AppError> {
            self.fail()
        }
        async fn update_diagnostic(
            &self,
            _: &Context,
            _: &DiagnosticResult,
        ) -> Result<DiagnosticResult, AppError> {
            self.fail()
        }
        async fn get_diagnostic_history(
            &self,
            _: &Context,
            _: &HistoryFilter,
        ) -> Result<HistoryPage<DiagnosticResult>, AppError> {
            self.fail()
        }
    }

    fn client(providers: &[Arc<Failing>]) -> DataClient {
        DataClient::new(
            providers
                .iter()
                .map(|p| p.clone() as Arc<dyn DataProvider>)
                .collect(),
        )
    }

    fn pending() -> DiagnosticResult {
        DiagnosticResult::pending("mock-device-1", "u", &ClientInfo::default())
    }

    #[tokio::test]
    async fn reads_fall_through_to_mock_data() {
        let a = Failing::down();
        let b = Failing::down();
        let client = client(&[a.clone(), b.clone()]);
        let ctx = Context::anonymous();

        let devices = client.get_devices(&ctx).await;
        assert_eq!(devices.len(), 2);
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);

        let page = client.get_diagnostic_history(&ctx, &HistoryFilter::default()).await;
        assert_eq!(page.total, 3);

        let beyond = client
            .get_diagnostic_history(&ctx, &HistoryFilter::page(u64::MAX, 10))
            .await;
        assert!(beyond.data.is_empty());
        assert_eq!(beyond.page, HistoryFilter::MAX_PAGE);
    }

    #[tokio::test]
    async fn not_found_stops_the_chain() {
        let a = Failing::empty();
        let b = Failing::down();
        let client = client(&[a.clone(), b.clone()]);

        let err = client
            .get_device(&Context::anonymous(), "mock-device-1")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn writes_fail_loudly_by_default() {
        let a = Failing::down();
        let client = client(&[a.clone()]);
        let err = client
            .save_diagnostic(&Context::anonymous(), &pending())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AllProvidersFailed(_)));
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn fabricated_writes_only_when_enabled() {
        let client = client(&[Failing::down()]).with_mock_writes(MockWrites::Fabricate);
        let record = pending();
        let saved = client
            .save_diagnostic(&Context::anonymous(), &record)
            .await
            .unwrap();
        assert_eq!(saved.id, record.id);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_providers() {
        let a = Failing::down();
        let client = client(&[a.clone()]);
        let ctx = Context::anonymous();

        let err = client
            .create_device(&ctx, &NewDevice::named("", DeviceType::Other))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut running = pending();
        running.status = DiagnosticStatus::Running;
        assert!(client.save_diagnostic(&ctx, &running).await.is_err());
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn no_providers_still_serves_reads() {
        let client = DataClient::new(Vec::new());
        assert_eq!(client.get_devices(&Context::anonymous()).await.len(), 2);
        assert!(client.provider_names().is_empty());
    }
}
