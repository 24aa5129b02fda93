// src/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category used when the page does not label an entry.
pub const DEFAULT_CATEGORY: &str = "General";

/// One published changelog item, as scraped from the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangelogEntry {
    /// Stable id derived from title + date (or title + position).
    pub id: String,
    pub title: String,
    /// ISO-8601 or whatever the site prints; not guaranteed parseable.
    pub date: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Absolute link; the changelog page itself when the entry has none.
    pub url: String,
}

impl ChangelogEntry {
    /// Lowercased `title description`, the haystack for keyword matching.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.description).to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Normal,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Normal => "normal",
        }
    }
}

/// Uppercase label used in message bodies ("CRITICAL", "HIGH", "NORMAL").
impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// Persisted record of what has already been notified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonitorState {
    #[serde(default = "now_iso")]
    pub last_checked: String,
    #[serde(default)]
    pub seen_entries: Vec<String>,
}

impl MonitorState {
    pub fn fresh() -> Self {
        Self {
            last_checked: now_iso(),
            seen_entries: Vec::new(),
        }
    }
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::fresh()
    }
}

/// `2025-09-06T09:00:00.000Z` style timestamp.
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_uses_camel_case_on_the_wire() {
        let st = MonitorState {
            last_checked: "2025-09-06T09:00:00.000Z".into(),
            seen_entries: vec!["a".into()],
        };
        let v = serde_json::to_value(&st).unwrap();
        assert_eq!(v["lastChecked"], "2025-09-06T09:00:00.000Z");
        assert_eq!(v["seenEntries"][0], "a");
    }

    #[test]
    fn priority_label_is_uppercase() {
        assert_eq!(Priority::Critical.to_string(), "CRITICAL");
        assert_eq!(Priority::Normal.as_str(), "normal");
    }
}
