//! Presentation model for the diagnostic history screen.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

use crate::client::DataClient;
use crate::poller::{PollHandle, Poller};
use crate::session::Context;
use crate::types::{Device, DiagnosticResult, HistoryFilter, HistoryPage};

pub const UNKNOWN_DEVICE: &str = "Unknown device";

pub const HEALTHY_FROM: u8 = 80;
pub const WARNING_FROM: u8 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthBracket {
    Healthy,
    Warning,
    Critical,
}

impl HealthBracket {
    pub fn of(score: u8) -> Self {
        if score >= HEALTHY_FROM {
            HealthBracket::Healthy
        } else if score >= WARNING_FROM {
            HealthBracket::Warning
        } else {
            HealthBracket::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub diagnostic: DiagnosticResult,
    pub device_name: String,
}

impl HistoryRow {
    pub fn bracket(&self) -> Option<HealthBracket> {
        self.diagnostic.health_score.map(HealthBracket::of)
    }

    fn matches(&self, needle: &str) -> bool {
        let d = &self.diagnostic;
        [
            Some(d.id.as_str()),
            Some(d.device_id.as_str()),
            Some(self.device_name.as_str()),
            d.client_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Counts over the visible rows. Rows without a score (pending, running,
/// failed) count toward `total` only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistorySummary {
    pub total: usize,
    pub healthy: usize,
    pub warning: usize,
    pub critical: usize,
    pub average_score: Option<f64>,
}

impl HistorySummary {
    pub fn of(rows: &[HistoryRow]) -> Self {
        let mut summary = HistorySummary {
            total: rows.len(),
            ..Default::default()
        };
        let mut sum = 0u64;
        let mut scored = 0u64;

        for score in rows.iter().filter_map(|r| r.diagnostic.health_score) {
            match HealthBracket::of(score) {
                HealthBracket::Healthy => summary.healthy += 1,
                HealthBracket::Warning => summary.warning += 1,
                HealthBracket::Critical => summary.critical += 1,
            }
            sum += u64::from(score);
            scored += 1;
        }

        if scored > 0 {
            summary.average_score = Some(sum as f64 / scored as f64);
        }
        summary
    }

    /// Mean rounded to two decimals, or `"-"` when nothing is scored.
    pub fn average_display(&self) -> String {
        match self.average_score {
            Some(avg) => format!("{avg:.2}"),
            None => "-".to_owned(),
        }
    }
}

/// Guards a requested page to `[1, max(pages, 1)]`.
pub fn clamp_page(requested: u64, pages: u64) -> u64 {
    requested.clamp(1, pages.max(1))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryView {
    pub rows: Vec<HistoryRow>,
    pub summary: HistorySummary,
    pub page: u64,
    pub pages: u64,
    pub limit: u64,
    /// Server-side total, before the local search.
    pub total: u64,
}

impl HistoryView {
    /// Joins one page of history with device names and applies the local
    /// text search. Navigation bounds come from the page as returned.
    pub fn build(page: HistoryPage<DiagnosticResult>, devices: &[Device], search: Option<&str>) -> Self {
        let names: HashMap<&str, &str> = devices
            .iter()
            .map(|d| (d.id.as_str(), d.name.as_str()))
            .collect();

        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let rows: Vec<HistoryRow> = page
            .data
            .into_iter()
            .map(|diagnostic| {
                let device_name = names
                    .get(diagnostic.device_id.as_str())
                    .copied()
                    .unwrap_or(UNKNOWN_DEVICE)
                    .to_owned();
                HistoryRow {
                    diagnostic,
                    device_name,
                }
            })
            .filter(|row| needle.as_deref().is_none_or(|n| row.matches(n)))
            .collect();

        Self {
            summary: HistorySummary::of(&rows),
            rows,
            page: clamp_page(page.page, page.pages),
            pages: page.pages,
            limit: page.limit,
            total: page.total,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }
}

/// Re-queries history on an interval and publishes the latest view.
/// Dropping the feed stops the polling.
pub struct HistoryFeed {
    view: watch::Receiver<Option<HistoryView>>,
    _poll: PollHandle,
}

impl HistoryFeed {
    /// Refreshes every `POLL_INTERVAL_SECS`.
    pub fn start(client: Arc<DataClient>, ctx: Context, filter: HistoryFilter) -> Self {
        Self::start_every(client, ctx, filter, Poller::default_interval())
    }

    pub fn start_every(
        client: Arc<DataClient>,
        ctx: Context,
        filter: HistoryFilter,
        interval: Duration,
    ) -> Self {
        let (tx, rx) = watch::channel(None);
        let tx = Arc::new(tx);

        let poll = Poller::spawn(interval, move || {
            let client = client.clone();
            let ctx = ctx.clone();
            let filter = filter.clone();
            let tx = tx.clone();
            async move {
                let devices = client.get_devices(&ctx).await;
                let page = client.get_diagnostic_history(&ctx, &filter).await;
                let view = HistoryView::build(page, &devices, None);
                tracing::debug!(rows = view.rows.len(), total = view.total, "history refreshed");
                tx.send_replace(Some(view));
            }
        });

        Self {
            view: rx,
            _poll: poll,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<HistoryView>> {
        self.view.clone()
    }

    pub fn latest(&self) -> Option<HistoryView> {
        self.view.borrow().clone()
    }
}
