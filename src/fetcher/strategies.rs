// src/fetcher/strategies.rs
//! Extraction strategies over a parsed changelog page.
//!
//! The page markup is not stable, so extraction is best-effort: strategies
//! are tried in order and the first one that yields entries wins.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};

use super::PageInfo;
use crate::types::{now_iso, ChangelogEntry, DEFAULT_CATEGORY};

/// Length of the hex id kept from the SHA-256 digest.
const ID_LEN: usize = 32;

pub trait EntryStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, doc: &Html, page: &PageInfo) -> Vec<ChangelogEntry>;
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e:?}"))
}

static ENTRY_CONTAINERS: Lazy<Selector> =
    Lazy::new(|| selector("article, .changelog-entry, [data-changelog-entry]"));
static ENTRY_TITLE: Lazy<Selector> = Lazy::new(|| selector("h2, h3, .title, [data-title]"));
static ENTRY_DATE: Lazy<Selector> = Lazy::new(|| selector("time, .date, [data-date]"));
static ENTRY_CATEGORY: Lazy<Selector> = Lazy::new(|| selector(".category, [data-category]"));
static ENTRY_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| selector("p, .description, [data-description]"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a"));
static HEADINGS: Lazy<Selector> = Lazy::new(|| selector("h2, h3"));
static TIME: Lazy<Selector> = Lazy::new(|| selector("time"));

/// Entries marked up as `<article>` / `.changelog-entry` / `[data-changelog-entry]`.
pub struct ArticleStrategy;

impl EntryStrategy for ArticleStrategy {
    fn name(&self) -> &'static str {
        "article"
    }

    fn extract(&self, doc: &Html, page: &PageInfo) -> Vec<ChangelogEntry> {
        let mut out = Vec::new();
        for el in doc.select(&ENTRY_CONTAINERS) {
            let title = first_text(el, &ENTRY_TITLE);

            // machine-readable datetime beats visible text
            let date = el
                .select(&ENTRY_DATE)
                .next()
                .map(|d| {
                    d.value()
                        .attr("datetime")
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .unwrap_or_else(|| element_text(d))
                })
                .unwrap_or_default();

            if title.is_empty() || date.is_empty() {
                continue;
            }

            let category = Some(first_text(el, &ENTRY_CATEGORY))
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
            let description = first_text(el, &ENTRY_DESCRIPTION);
            let url = el
                .select(&LINK)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(|h| page.resolve(h))
                .unwrap_or_else(|| page.url.clone());

            out.push(ChangelogEntry {
                id: entry_id(&title, &date),
                title,
                date,
                category,
                description,
                url,
            });
        }
        out
    }
}

/// Loose layout: `h2`/`h3` headings with a nearby `<time>` and a following paragraph.
pub struct HeadingStrategy;

impl EntryStrategy for HeadingStrategy {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn extract(&self, doc: &Html, page: &PageInfo) -> Vec<ChangelogEntry> {
        let mut out = Vec::new();
        for (index, heading) in doc.select(&HEADINGS).enumerate() {
            let title = element_text(heading);
            if title.is_empty() {
                continue;
            }

            let date_text = heading
                .parent()
                .and_then(ElementRef::wrap)
                .and_then(date_near)
                .unwrap_or_default();

            let description = heading
                .next_siblings()
                .find_map(ElementRef::wrap)
                .filter(|sib| sib.value().name() == "p")
                .map(element_text)
                .unwrap_or_default();

            if date_text.is_empty() && description.is_empty() {
                continue;
            }

            let (id, date) = if date_text.is_empty() {
                (entry_id(&title, &index.to_string()), now_iso())
            } else {
                (entry_id(&title, &date_text), date_text)
            };

            out.push(ChangelogEntry {
                id,
                title,
                date,
                category: DEFAULT_CATEGORY.to_string(),
                description,
                url: page.url.clone(),
            });
        }
        out
    }
}

/// `<time>` inside the container, then sibling `<time>` elements after it,
/// then before it (closest first).
fn date_near(container: ElementRef<'_>) -> Option<String> {
    let inside = container
        .select(&TIME)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty());
    if inside.is_some() {
        return inside;
    }
    let is_time = |el: &ElementRef<'_>| el.value().name() == "time";
    container
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(is_time)
        .map(element_text)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            container
                .prev_siblings()
                .filter_map(ElementRef::wrap)
                .find(is_time)
                .map(element_text)
                .filter(|s| !s.is_empty())
        })
}

fn first_text(el: ElementRef<'_>, sel: &Selector) -> String {
    el.select(sel).next().map(element_text).unwrap_or_default()
}

/// Visible text with whitespace collapsed.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    let raw: String = el.text().collect();
    RE_WS.replace_all(&raw, " ").trim().to_string()
}

/// Truncated SHA-256 hex of `"{title}-{key}"`; stable across fetches.
pub fn entry_id(title: &str, key: &str) -> String {
    use std::fmt::Write as _;
    let digest = Sha256::digest(format!("{title}-{key}").as_bytes());
    let mut out = String::with_capacity(ID_LEN);
    for b in digest.iter().take(ID_LEN / 2) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
