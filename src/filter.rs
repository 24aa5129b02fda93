// src/filter.rs
//! Include/exclude filtering over scraped entries.
//!
//! Axes are ANDed, list items within an axis are ORed. An empty or absent
//! list disables its axis. Matching is case-insensitive substring matching.
//! Order of the input is preserved.

use crate::config::FilterConfig;
use crate::types::ChangelogEntry;

pub fn apply_filters(entries: Vec<ChangelogEntry>, filters: Option<&FilterConfig>) -> Vec<ChangelogEntry> {
    let Some(f) = filters else {
        return entries;
    };
    let categories = lowered(f.categories.as_deref());
    let keywords = lowered(f.keywords.as_deref());
    let excluded = lowered(f.exclude_keywords.as_deref());

    entries
        .into_iter()
        .filter(|e| passes(e, &categories, &keywords, &excluded))
        .collect()
}

fn passes(e: &ChangelogEntry, categories: &[String], keywords: &[String], excluded: &[String]) -> bool {
    if !categories.is_empty() {
        let cat = e.category.to_lowercase();
        if !categories.iter().any(|c| cat.contains(c.as_str())) {
            return false;
        }
    }
    if keywords.is_empty() && excluded.is_empty() {
        return true;
    }
    let text = e.search_text();
    if !keywords.is_empty() && !keywords.iter().any(|k| text.contains(k.as_str())) {
        return false;
    }
    !excluded.iter().any(|k| text.contains(k.as_str()))
}

fn lowered(list: Option<&[String]>) -> Vec<String> {
    list.unwrap_or_default()
        .iter()
        .map(|s| s.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, category: &str, description: &str) -> ChangelogEntry {
        ChangelogEntry {
            id: title.to_string(),
            title: title.to_string(),
            date: "2025-09-01".into(),
            category: category.to_string(),
            description: description.to_string(),
            url: "https://example.test/changelog".into(),
        }
    }

    fn sample() -> Vec<ChangelogEntry> {
        vec![
            entry("Breaking change to Orders API", "Admin API", "The field was removed."),
            entry("New checkout theme settings", "Themes", "Minor typo fixes included."),
            entry("Security patch for Payments", "Payments", ""),
            entry("Deprecated webhook topic", "Admin API", "Fix a typo in docs."),
        ]
    }

    fn titles(v: &[ChangelogEntry]) -> Vec<&str> {
        v.iter().map(|e| e.title.as_str()).collect()
    }

    #[test]
    fn no_filter_is_identity() {
        assert_eq!(apply_filters(sample(), None).len(), 4);
        assert_eq!(apply_filters(sample(), Some(&FilterConfig::default())).len(), 4);
    }

    #[test]
    fn empty_lists_disable_their_axis() {
        let f = FilterConfig {
            categories: Some(vec![]),
            keywords: Some(vec![]),
            exclude_keywords: Some(vec![]),
        };
        assert_eq!(apply_filters(sample(), Some(&f)).len(), 4);
    }

    #[test]
    fn category_is_case_insensitive_substring() {
        let f = FilterConfig {
            categories: Some(vec!["api".into()]),
            ..Default::default()
        };
        let out = apply_filters(sample(), Some(&f));
        assert_eq!(
            titles(&out),
            vec!["Breaking change to Orders API", "Deprecated webhook topic"]
        );
    }

    #[test]
    fn include_keywords_search_title_and_description() {
        let f = FilterConfig {
            keywords: Some(vec!["REMOVED".into(), "security".into()]),
            ..Default::default()
        };
        let out = apply_filters(sample(), Some(&f));
        assert_eq!(
            titles(&out),
            vec!["Breaking change to Orders API", "Security patch for Payments"]
        );
    }

    #[test]
    fn all_three_axes_compose_with_and() {
        let f = FilterConfig {
            categories: Some(vec!["Admin".into(), "Payments".into()]),
            keywords: Some(vec!["breaking".into(), "deprecated".into(), "security".into()]),
            exclude_keywords: Some(vec!["typo".into()]),
        };
        let out = apply_filters(sample(), Some(&f));
        assert_eq!(
            titles(&out),
            vec!["Breaking change to Orders API", "Security patch for Payments"]
        );
        // each survivor also passes when filtered alone
        for e in sample() {
            let expected = out.iter().any(|o| o.id == e.id);
            let alone = apply_filters(vec![e.clone()], Some(&f));
            assert_eq!(alone.len() == 1, expected, "{}", e.title);
        }
    }
}
