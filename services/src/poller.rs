use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use util::config;

/// Owner of a polling loop. Dropping it stops the loop, including a task
/// that is mid-flight.
pub struct PollHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancels and waits for the loop to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        let _ = (&mut self.handle).await;
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Shortest interval a loop will run at. `tokio::time::interval` panics on zero.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub struct Poller;

impl Poller {
    /// Default dashboard refresh interval (`POLL_INTERVAL_SECS`).
    pub fn default_interval() -> Duration {
        Duration::from_secs(config::poll_interval_secs().max(1))
    }

    /// Runs `task` immediately and then every `interval` until the returned
    /// handle is cancelled or dropped. Missed ticks are skipped, so a slow
    /// task never causes a burst of catch-up runs.
    pub fn spawn<F, Fut>(interval: Duration, mut task: F) -> PollHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let token = CancellationToken::new();
        let child = token.child_token();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = task() => {}
                }
            }
            tracing::debug!("poller stopped");
        });

        PollHandle { token, handle }
    }
}
