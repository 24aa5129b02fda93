// src/error.rs
//! Error kinds surfaced by the monitor pipeline.
//!
//! Parsing never fails (best-effort scraping yields fewer entries instead),
//! so there is no parse variant here.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Changelog page unreachable or answered with a non-success status.
    #[error("failed to fetch changelog from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// State file could not be written.
    #[error("failed to persist state to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// One channel failed; siblings are unaffected.
    #[error("delivery via {channel} failed: {reason}")]
    Delivery {
        channel: &'static str,
        reason: String,
    },

    /// Generic webhook template produced invalid JSON after substitution.
    #[error("webhook template is not valid JSON after substitution: {0}")]
    Template(#[from] serde_json::Error),
}

impl MonitorError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type Result<T, E = MonitorError> = std::result::Result<T, E>;
