// src/config/mod.rs
//! Monitor configuration: channel definitions, filters, schedule and state path.
//!
//! Field names follow the camelCase layout of the config file
//! (`checkInterval`, `stateFile`, `excludeKeywords`, ...).

pub mod merge;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MonitorError, Result};

pub use merge::{merge_config, validate_config};

pub const ENV_CONFIG_PATH: &str = "CHANGELOG_MONITOR_CONFIG";
pub const DEFAULT_CHECK_INTERVAL_MINUTES: u32 = 15;

/// Files probed in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILES: [&str; 4] = [
    "changelog-monitor.toml",
    "changelog-monitor.json",
    ".changelogmonitorrc",
    ".changelogmonitorrc.json",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    #[serde(default)]
    pub webhooks: WebhookConfig,
    /// Minutes between scheduled checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

impl MonitorConfig {
    pub fn interval_minutes(&self) -> u32 {
        self.check_interval.unwrap_or(DEFAULT_CHECK_INTERVAL_MINUTES)
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    #[serde(default)]
    pub slack: Vec<String>,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub generic: Vec<GenericWebhook>,
}

impl WebhookConfig {
    pub fn has_any_channel(&self) -> bool {
        !self.slack.is_empty()
            || !self.teams.is_empty()
            || self.email.is_some()
            || !self.generic.is_empty()
    }
}

/// SMTP settings. Missing fields deserialize to empty values so that
/// validation can report an incomplete block instead of a parse error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub auth: Option<EmailAuth>,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailAuth {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pass: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Post,
    Put,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericWebhook {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON with `{{title}}`-style placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// Include/exclude criteria. `None` means no constraint on that axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_keywords: Option<Vec<String>>,
}

/// Load a config file. Supports TOML or JSON.
pub fn load_config_from(path: &Path) -> Result<MonitorConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        MonitorError::config(format!("reading config from {}: {e}", path.display()))
    })?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .map_err(|e| MonitorError::config(format!("parsing {}: {e:#}", path.display())))
}

/// Resolve the config file:
/// 1) explicit path
/// 2) $CHANGELOG_MONITOR_CONFIG
/// 3) the first of `DEFAULT_CONFIG_FILES` present in the cwd
///
/// Returns `Ok(None)` when nothing is found.
pub fn load_config(explicit: Option<&Path>) -> Result<Option<MonitorConfig>> {
    if let Some(p) = explicit {
        return load_config_from(p).map(Some);
    }
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(MonitorError::config(format!(
                "{ENV_CONFIG_PATH} points to non-existent path {}",
                pb.display()
            )));
        }
        return load_config_from(&pb).map(Some);
    }
    for name in DEFAULT_CONFIG_FILES {
        let pb = PathBuf::from(name);
        if pb.exists() {
            tracing::info!(path = %pb.display(), "loading config");
            return load_config_from(&pb).map(Some);
        }
    }
    Ok(None)
}

fn parse_config(s: &str, hint_ext: &str) -> anyhow::Result<MonitorConfig> {
    if hint_ext == "toml" {
        return Ok(toml::from_str(s)?);
    }
    if let Ok(cfg) = serde_json::from_str(s) {
        return Ok(cfg);
    }
    if hint_ext != "json" {
        if let Ok(cfg) = toml::from_str(s) {
            return Ok(cfg);
        }
    }
    // Re-run JSON to surface its error message.
    serde_json::from_str(s).map_err(|e| anyhow!("unsupported config format: {e}"))
}
