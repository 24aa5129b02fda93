// src/novelty.rs
use std::collections::HashSet;

use crate::config::FilterConfig;
use crate::error::Result;
use crate::fetcher::ChangelogSource;
use crate::filter::apply_filters;
use crate::types::ChangelogEntry;

/// Fetch the current entries and keep those not in `seen_ids` that pass `filters`.
pub async fn get_new_entries(
    source: &dyn ChangelogSource,
    seen_ids: &[String],
    filters: Option<&FilterConfig>,
) -> Result<Vec<ChangelogEntry>> {
    let all = source.fetch_entries().await?;
    let total = all.len();
    let unseen = unseen_entries(all, seen_ids);
    let unseen_count = unseen.len();
    let out = apply_filters(unseen, filters);
    tracing::debug!(
        source = source.name(),
        total,
        unseen = unseen_count,
        kept = out.len(),
        "novelty resolved"
    );
    Ok(out)
}

/// Order-preserving set difference by id.
pub fn unseen_entries(entries: Vec<ChangelogEntry>, seen_ids: &[String]) -> Vec<ChangelogEntry> {
    let seen: HashSet<&str> = seen_ids.iter().map(String::as_str).collect();
    entries
        .into_iter()
        .filter(|e| !seen.contains(e.id.as_str()))
        .collect()
}
