// src/classify.rs
//! Priority classification of changelog entries.
//!
//! `classify` is the canonical three-tier classifier used for notifications.
//! `display_priority` is the two-tier view printed by the CLI; it uses a
//! different keyword set and only flags entries when an include-keyword
//! filter is active, so CLI output and message payloads can disagree.

use crate::config::FilterConfig;
use crate::types::{ChangelogEntry, Priority};

const CRITICAL_KEYWORDS: [&str; 4] = ["breaking", "security", "critical", "urgent"];
const HIGH_KEYWORDS: [&str; 4] = ["deprecated", "required", "removed", "changed"];
const DISPLAY_HIGH_KEYWORDS: [&str; 5] = ["breaking", "deprecated", "critical", "security", "urgent"];

pub fn classify(entry: &ChangelogEntry) -> Priority {
    let text = entry.search_text();
    if CRITICAL_KEYWORDS.iter().any(|k| text.contains(k)) {
        Priority::Critical
    } else if HIGH_KEYWORDS.iter().any(|k| text.contains(k)) {
        Priority::High
    } else {
        Priority::Normal
    }
}

/// CLI listing priority: only `High` or `Normal`.
pub fn display_priority(entry: &ChangelogEntry, filters: Option<&FilterConfig>) -> Priority {
    let keyword_filter_active = filters
        .and_then(|f| f.keywords.as_ref())
        .is_some_and(|k| !k.is_empty());
    if !keyword_filter_active {
        return Priority::Normal;
    }
    let text = entry.search_text();
    if DISPLAY_HIGH_KEYWORDS.iter().any(|k| text.contains(k)) {
        Priority::High
    } else {
        Priority::Normal
    }
}
