//! Core of the repair desk: domain types, persistence with provider
//! fallback, diagnostic runs and the history view model.

pub mod client;
pub mod collector;
pub mod error;
pub mod history;
pub mod offline_queue;
pub mod orchestrator;
pub mod poller;
pub mod provider;
pub mod providers;
pub mod scoring;
pub mod session;
pub mod types;

pub use client::{DataClient, MockWrites, Submission};
pub use error::AppError;
pub use orchestrator::{DiagnosticOrchestrator, DiagnosticRun, RunState};
pub use provider::DataProvider;
pub use session::{Context, Session};
