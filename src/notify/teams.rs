use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};

use super::{Notification, Notifier, NO_DESCRIPTION};
use crate::types::Priority;

/// Microsoft Teams incoming webhook (legacy MessageCard format).
pub struct TeamsNotifier {
    webhook_url: String,
    client: Client,
}

impl TeamsNotifier {
    pub fn new(url: String) -> Self {
        Self::with_client(url, Client::new())
    }

    pub fn with_client(url: String, client: Client) -> Self {
        Self {
            webhook_url: url,
            client,
        }
    }
}

pub fn teams_payload(n: &Notification<'_>) -> Value {
    let (theme_color, icon, prefix) = match n.priority {
        Priority::Critical => ("FF0000", "🚨", "CRITICAL: "),
        Priority::High => ("FFA500", "⚠️", "IMPORTANT: "),
        Priority::Normal => ("5E72E4", "⚡", ""),
    };
    let headline = n.headline();
    let text = if n.entry.description.is_empty() {
        format!("_{NO_DESCRIPTION}_")
    } else {
        n.entry.description.clone()
    };

    json!({
        "@type": "MessageCard",
        "@context": "https://schema.org/extensions",
        "summary": format!("{prefix}{headline}"),
        "themeColor": theme_color,
        "title": format!("{icon} {prefix}{headline}"),
        "sections": [{
            "activityTitle": format!("{icon} {}", n.entry.title),
            "activitySubtitle": format!("{} | Priority: {}", n.entry.date, n.priority),
            "facts": [
                { "name": "Category", "value": n.entry.category },
                { "name": "Priority Level", "value": n.priority.to_string() }
            ],
            "text": text
        }],
        "potentialAction": [{
            "@type": "OpenUri",
            "name": "View Changelog",
            "targets": [{ "os": "default", "uri": n.entry.url }]
        }]
    })
}

#[async_trait::async_trait]
impl Notifier for TeamsNotifier {
    fn channel(&self) -> &'static str {
        "teams"
    }

    async fn send(&self, n: &Notification<'_>) -> Result<()> {
        self.client
            .post(&self.webhook_url)
            .json(&teams_payload(n))
            .send()
            .await
            .context("teams post")?
            .error_for_status()
            .context("teams non-2xx")?;
        Ok(())
    }
}
