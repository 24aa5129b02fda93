// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod metrics;
pub mod monitor;
pub mod notify;
pub mod novelty;
pub mod schedule;
pub mod state;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::classify::{classify, display_priority};
pub use crate::config::{merge_config, validate_config, MonitorConfig};
pub use crate::error::{MonitorError, Result};
pub use crate::fetcher::{ChangelogFetcher, ChangelogSource};
pub use crate::filter::apply_filters;
pub use crate::monitor::{CycleReport, Monitor, MonitorStatus};
pub use crate::notify::{Dispatcher, Notifier};
pub use crate::novelty::get_new_entries;
pub use crate::state::StateStore;
pub use crate::types::{ChangelogEntry, MonitorState, Priority};
