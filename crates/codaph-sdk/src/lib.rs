//! codaph-sdk: a stable, high-level facade over the codaph capture/mirror/replay core.
//!
//! # Quickstart
//!
//! ```no_run
//! use codaph_sdk::{Client, types::SessionFilter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::connect_default()?;
//! let sessions = client.sessions(SessionFilter::all())?;
//! if let Some(summary) = sessions.first() {
//!     let events = client.session(&summary.session_id).events()?;
//!     println!("{} has {} mirrored events", summary.session_id, events.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! This SDK is a facade over:
//! - `codaph-types`: the captured-event envelope and per-repo state shapes
//! - `codaph-mirror`: the append-only JSONL mirror and its indexes
//! - `codaph-engine`: ingest pipeline, remote adapter, replayer
//! - `codaph-providers`: provider history-backfill readers
//! - `codaph-runtime`: lock, orchestrator, and state stores

pub mod client;
pub mod error;
pub mod types;

pub use client::{Client, SessionHandle};
pub use codaph_runtime::{AutomationConfig, OrchestratorConfig, PushKind, RunSummary, WorkflowMode};
pub use error::{Error, Result};
pub use types::{SessionFilter, SessionSummary};
