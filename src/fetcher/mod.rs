// src/fetcher/mod.rs
//! Changelog page fetching and parsing.

pub mod strategies;

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::{header, Client, Url};
use scraper::Html;
use std::collections::HashSet;

use crate::error::{MonitorError, Result};
use crate::types::ChangelogEntry;
use strategies::{ArticleStrategy, EntryStrategy, HeadingStrategy};

pub const SHOPIFY_CHANGELOG_URL: &str = "https://shopify.dev/changelog";
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Anything that can produce the current list of changelog entries.
#[async_trait]
pub trait ChangelogSource: Send + Sync {
    async fn fetch_entries(&self) -> Result<Vec<ChangelogEntry>>;
    fn name(&self) -> &str;
}

/// Where a page came from; used to absolutize links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub url: String,
    pub origin: String,
}

impl PageInfo {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let origin = Url::parse(&url)
            .map(|u| u.origin().ascii_serialization())
            .unwrap_or_else(|_| url.clone());
        Self { url, origin }
    }

    /// Resolve `href` against the site origin.
    pub fn resolve(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            return href.to_string();
        }
        Url::parse(&self.origin)
            .and_then(|base| base.join(href))
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}{}", self.origin, href))
    }
}

/// Parse a changelog page. Never fails; unknown markup yields an empty list.
pub fn parse_changelog(html: &str, page: &PageInfo) -> Vec<ChangelogEntry> {
    let strategies: [&dyn EntryStrategy; 2] = [&ArticleStrategy, &HeadingStrategy];
    parse_with(html, page, &strategies)
}

/// Run `strategies` in order; the first non-empty result wins.
/// Duplicate ids (nested containers) are collapsed, first occurrence kept.
pub fn parse_with(html: &str, page: &PageInfo, strategies: &[&dyn EntryStrategy]) -> Vec<ChangelogEntry> {
    let t0 = std::time::Instant::now();
    let doc = Html::parse_document(html);

    let mut entries = Vec::new();
    for s in strategies {
        entries = s.extract(&doc, page);
        if !entries.is_empty() {
            tracing::debug!(strategy = s.name(), count = entries.len(), "changelog parsed");
            break;
        }
    }
    if entries.is_empty() {
        tracing::warn!(url = %page.url, "no changelog entries recognised on page");
    }

    let mut seen = HashSet::new();
    entries.retain(|e| seen.insert(e.id.clone()));

    histogram!("changelog_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    entries
}

/// HTTP fetcher for the vendor changelog page.
#[derive(Clone)]
pub struct ChangelogFetcher {
    page: PageInfo,
    client: Client,
}

impl Default for ChangelogFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangelogFetcher {
    pub fn new() -> Self {
        Self::with_url(SHOPIFY_CHANGELOG_URL)
    }

    /// Target a different changelog page (other vendor, local mock).
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            page: PageInfo::new(url),
            client: Client::new(),
        }
    }

    pub fn page(&self) -> &PageInfo {
        &self.page
    }

    pub async fn fetch_html(&self) -> Result<String> {
        let fetch_err = |source| MonitorError::Fetch {
            url: self.page.url.clone(),
            source,
        };
        let resp = self
            .client
            .get(&self.page.url)
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fetch_err)?;
        resp.text().await.map_err(fetch_err)
    }
}

#[async_trait]
impl ChangelogSource for ChangelogFetcher {
    async fn fetch_entries(&self) -> Result<Vec<ChangelogEntry>> {
        let html = match self.fetch_html().await {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(error = %e, "changelog fetch failed");
                counter!("changelog_fetch_errors_total").increment(1);
                return Err(e);
            }
        };
        let entries = parse_changelog(&html, &self.page);
        counter!("changelog_entries_parsed_total").increment(entries.len() as u64);
        Ok(entries)
    }

    fn name(&self) -> &str {
        &self.page.url
    }
}
