//! Drives one diagnostic run from a pending record to a terminal state.
//!
//! ```text
//! Idle -> Pending -> Running -> Completed
//!            \          \
//!             +----------+--> Failed
//! ```
//!
//! Each component is persisted as soon as it is collected. Any collector or
//! persistence error after the record exists marks it `failed` with the
//! error message. Progress and run state are published on `watch` channels.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::DataClient;
use crate::collector::{Component, MetricsCollector, Readings};
use crate::error::AppError;
use crate::poller::MIN_INTERVAL;
use crate::scoring;
use crate::session::Context;
use crate::types::{ClientInfo, DeviceUpdate, DiagnosticResult, DiagnosticStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

/// Ceiling for the cosmetic ticker; only a finished run reaches 100.
pub const SIMULATED_PROGRESS_CAP: u8 = 95;
const SIMULATED_STEP: u8 = 5;

/// Sender side of a run's observable state.
#[derive(Clone)]
struct Tracker {
    progress: Arc<watch::Sender<u8>>,
    state: Arc<watch::Sender<RunState>>,
}

impl Tracker {
    fn new() -> Self {
        let (progress, _) = watch::channel(0u8);
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            progress: Arc::new(progress),
            state: Arc::new(state),
        }
    }

    /// Never moves backwards.
    fn advance(&self, to: u8) {
        let to = to.min(100);
        self.progress.send_if_modified(|current| {
            if to > *current {
                *current = to;
                true
            } else {
                false
            }
        });
    }

    fn current(&self) -> u8 {
        *self.progress.borrow()
    }

    fn enter(&self, state: RunState) {
        self.state.send_replace(state);
        if state.is_terminal() {
            self.advance(100);
        }
    }
}

/// Handle to a run started with [`DiagnosticOrchestrator::start`].
pub struct DiagnosticRun {
    progress: watch::Receiver<u8>,
    state: watch::Receiver<RunState>,
    handle: JoinHandle<Result<DiagnosticResult, AppError>>,
}

impl DiagnosticRun {
    pub fn progress(&self) -> watch::Receiver<u8> {
        self.progress.clone()
    }

    pub fn state(&self) -> watch::Receiver<RunState> {
        self.state.clone()
    }

    pub async fn wait(self) -> Result<DiagnosticResult, AppError> {
        self.handle
            .await
            .map_err(|e| AppError::Collection(format!("diagnostic task aborted: {e}")))?
    }
}

#[derive(Clone)]
pub struct DiagnosticOrchestrator {
    client: Arc<DataClient>,
    collector: Arc<dyn MetricsCollector>,
    tick: Duration,
}

impl DiagnosticOrchestrator {
    pub fn new(client: Arc<DataClient>, collector: Arc<dyn MetricsCollector>) -> Self {
        Self {
            client,
            collector,
            tick: Duration::from_millis(200),
        }
    }

    /// Interval of the simulated progress ticker.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(MIN_INTERVAL);
        self
    }

    /// Spawns the run and returns immediately with observers attached.
    pub fn start(&self, ctx: Context, device_id: String, client_info: ClientInfo) -> DiagnosticRun {
        let tracker = Tracker::new();
        let progress = tracker.progress.subscribe();
        let state = tracker.state.subscribe();
        let this = self.clone();
        let handle =
            tokio::spawn(async move { this.drive(&ctx, &device_id, &client_info, tracker).await });
        DiagnosticRun {
            progress,
            state,
            handle,
        }
    }

    /// Runs to completion on the current task.
    pub async fn run(
        &self,
        ctx: &Context,
        device_id: &str,
        client_info: ClientInfo,
    ) -> Result<DiagnosticResult, AppError> {
        self.drive(ctx, device_id, &client_info, Tracker::new()).await
    }

    fn spawn_ticker(&self, tracker: Tracker, stop: CancellationToken) {
        let tick = self.tick;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = interval.tick() => {
                        let next = tracker.current().saturating_add(SIMULATED_STEP);
                        tracker.advance(next.min(SIMULATED_PROGRESS_CAP));
                    }
                }
            }
        });
    }

    async fn drive(
        &self,
        ctx: &Context,
        device_id: &str,
        client_info: &ClientInfo,
        tracker: Tracker,
    ) -> Result<DiagnosticResult, AppError> {
        let device = match self.client.get_device(ctx, device_id).await {
            Ok(device) => device,
            Err(err) => {
                tracing::error!(device_id, error = %err, "cannot start diagnostic");
                tracker.enter(RunState::Failed);
                return Err(err);
            }
        };
        let owner = ctx
            .session()
            .map(|s| s.user_id().to_owned())
            .unwrap_or_else(|| device.user_id.clone());

        let mut record = DiagnosticResult::pending(&device.id, &owner, client_info);
        if let Err(err) = self.client.save_diagnostic(ctx, &record).await {
            tracing::error!(device_id, error = %err, "cannot create diagnostic record");
            tracker.enter(RunState::Failed);
            return Err(err);
        }
        tracker.enter(RunState::Pending);
        tracing::info!(diagnostic_id = %record.id, device_id, "diagnostic started");

        let stop = CancellationToken::new();
        if self.collector.is_simulated() {
            self.spawn_ticker(tracker.clone(), stop.clone());
        }
        let outcome = self.collect_and_score(ctx, &mut record, &tracker).await;
        stop.cancel();

        match outcome {
            Ok(done) => {
                if let Err(err) = self
                    .client
                    .update_device(ctx, &device.id, &DeviceUpdate::last_diagnostic(&done.id))
                    .await
                {
                    tracing::warn!(device_id, error = %err, "could not update last diagnostic pointer");
                }
                tracker.enter(RunState::Completed);
                tracing::info!(diagnostic_id = %done.id, score = ?done.health_score, "diagnostic completed");
                Ok(done)
            }
            Err(err) => {
                let failed = self.mark_failed(ctx, record, &err).await;
                tracker.enter(RunState::Failed);
                Err(failed)
            }
        }
    }

    async fn collect_and_score(
        &self,
        ctx: &Context,
        record: &mut DiagnosticResult,
        tracker: &Tracker,
    ) -> Result<DiagnosticResult, AppError> {
        record.status = DiagnosticStatus::Running;
        self.client.update_diagnostic(ctx, record).await?;
        tracker.enter(RunState::Running);
        tracker.advance(10);

        let simulated = self.collector.is_simulated();
        let steps = Component::ALL.len() as u16;
        let step_done = |i: u16| {
            if !simulated {
                tracker.advance((10 + 80 * (i + 1) / steps) as u8);
            }
        };

        let cpu = self.collector.collect_cpu().await?;
        record.cpu = Some(scoring::cpu_report(&cpu));
        self.client.update_diagnostic(ctx, record).await?;
        step_done(0);

        let memory = self.collector.collect_memory().await?;
        record.memory = Some(scoring::memory_report(&memory));
        self.client.update_diagnostic(ctx, record).await?;
        step_done(1);

        let disk = self.collector.collect_disk().await?;
        record.disk = Some(scoring::disk_report(&disk));
        self.client.update_diagnostic(ctx, record).await?;
        step_done(2);

        let network = self.collector.collect_network().await?;
        record.network = Some(scoring::network_report(&network));
        self.client.update_diagnostic(ctx, record).await?;
        step_done(3);

        let battery = self.collector.collect_battery().await?;
        if let Some(b) = &battery {
            record.battery = Some(scoring::battery_report(b));
            self.client.update_diagnostic(ctx, record).await?;
        }
        step_done(4);

        let readings = Readings {
            cpu,
            memory,
            disk,
            network,
            battery,
        };
        let assessment = scoring::assess(&readings);
        record.status = DiagnosticStatus::Completed;
        record.health_score = Some(assessment.health_score);
        record.issues = assessment.issues;
        record.recommendations = assessment.recommendations;
        record.raw_data = serde_json::to_value(&readings).ok();

        self.client.update_diagnostic(ctx, record).await
    }

    /// Best effort: the run already failed, so a failing write here is only
    /// logged.
    async fn mark_failed(
        &self,
        ctx: &Context,
        mut record: DiagnosticResult,
        cause: &AppError,
    ) -> AppError {
        let message = cause.to_string();
        tracing::error!(diagnostic_id = %record.id, error = %message, "diagnostic failed");

        record.status = DiagnosticStatus::Failed;
        record.health_score = None;
        record.error_message = Some(message.clone());
        if let Err(err) = self.client.update_diagnostic(ctx, &record).await {
            tracing::error!(diagnostic_id = %record.id, error = %err, "could not persist failure");
        }

        AppError::DiagnosticFailed {
            id: record.id,
            message,
        }
    }
}
