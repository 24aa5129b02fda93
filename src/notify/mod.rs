// src/notify/mod.rs
//! Outbound notifications: one `Notifier` per configured channel instance,
//! fanned out by `Dispatcher`.

pub mod email;
pub mod generic;
pub mod slack;
pub mod teams;

use anyhow::Result;
use futures::future::join_all;
use metrics::counter;
use reqwest::Client;
use std::collections::BTreeMap;

use crate::classify::classify;
use crate::config::WebhookConfig;
use crate::error::MonitorError;
use crate::types::{ChangelogEntry, Priority};

pub use email::EmailNotifier;
pub use generic::GenericNotifier;
pub use slack::SlackNotifier;
pub use teams::TeamsNotifier;

pub const DEFAULT_PRODUCT: &str = "Shopify";

/// Shown when an entry has no description.
pub(crate) const NO_DESCRIPTION: &str =
    "No detailed description available. Click below to view full changelog entry.";

/// What every channel adapter renders.
#[derive(Debug, Clone, Copy)]
pub struct Notification<'a> {
    pub entry: &'a ChangelogEntry,
    pub priority: Priority,
    /// Vendor label, e.g. "Shopify".
    pub product: &'a str,
}

impl Notification<'_> {
    pub fn headline(&self) -> String {
        format!("{} Changelog Update", self.product)
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Channel kind for logs and metrics ("slack", "teams", ...).
    fn channel(&self) -> &'static str;

    /// Number of recipients reached by one send (email fans out further).
    fn recipients(&self) -> usize {
        1
    }

    async fn send(&self, n: &Notification<'_>) -> Result<()>;
}

/// Outcome of one `Dispatcher::notify` call.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub dry_run: bool,
    pub attempted: usize,
    pub delivered: usize,
    pub failures: Vec<MonitorError>,
}

pub struct Dispatcher {
    notifiers: Vec<Box<dyn Notifier>>,
    product: String,
}

impl Dispatcher {
    pub fn new(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self {
            notifiers,
            product: DEFAULT_PRODUCT.to_string(),
        }
    }

    /// One notifier per slack url, teams url, generic hook, plus email if configured.
    pub fn from_config(cfg: &WebhookConfig) -> Self {
        let client = Client::new();
        let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();
        for url in &cfg.slack {
            notifiers.push(Box::new(SlackNotifier::with_client(url.clone(), client.clone())));
        }
        for url in &cfg.teams {
            notifiers.push(Box::new(TeamsNotifier::with_client(url.clone(), client.clone())));
        }
        if let Some(email) = &cfg.email {
            notifiers.push(Box::new(EmailNotifier::new(email.clone())));
        }
        for hook in &cfg.generic {
            notifiers.push(Box::new(GenericNotifier::with_client(hook.clone(), client.clone())));
        }
        Self::new(notifiers)
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Send `entry` to every channel concurrently and wait for all of them.
    ///
    /// Never fails: each channel error is logged where it happens and
    /// collected into the report. In dry-run mode nothing is sent.
    pub async fn notify(&self, entry: &ChangelogEntry, dry_run: bool) -> DispatchReport {
        if dry_run {
            self.log_dry_run(entry);
            return DispatchReport {
                dry_run: true,
                ..Default::default()
            };
        }

        let n = Notification {
            entry,
            priority: classify(entry),
            product: &self.product,
        };

        let sends = self.notifiers.iter().map(|notifier| async move {
            let channel = notifier.channel();
            counter!("monitor_deliveries_total", "channel" => channel).increment(1);
            match notifier.send(&n).await {
                Ok(()) => {
                    tracing::debug!(channel, entry_id = %n.entry.id, "notification delivered");
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(channel, entry_id = %n.entry.id, error = ?e, "notification failed");
                    counter!("monitor_delivery_failures_total", "channel" => channel).increment(1);
                    Err(MonitorError::Delivery {
                        channel,
                        reason: format!("{e:#}"),
                    })
                }
            }
        });
        let results = join_all(sends).await;

        let attempted = results.len();
        let failures: Vec<MonitorError> = results.into_iter().filter_map(|r| r.err()).collect();
        DispatchReport {
            dry_run: false,
            attempted,
            delivered: attempted - failures.len(),
            failures,
        }
    }

    fn log_dry_run(&self, entry: &ChangelogEntry) {
        let mut per_channel: BTreeMap<&'static str, (usize, usize)> = BTreeMap::new();
        for n in &self.notifiers {
            let slot = per_channel.entry(n.channel()).or_default();
            slot.0 += 1;
            slot.1 += n.recipients();
        }
        tracing::info!(entry_id = %entry.id, title = %entry.title, "[dry run] would send notifications");
        for (channel, (count, recipients)) in per_channel {
            tracing::info!(channel, count, recipients, "[dry run] channel");
        }
    }
}
