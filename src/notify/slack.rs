use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};

use super::{Notification, Notifier, NO_DESCRIPTION};
use crate::types::Priority;

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
}

impl SlackNotifier {
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

/// Block Kit message: header, summary, fields, and a link button.
pub fn slack_payload(n: &Notification<'_>) -> Value {
    let (icon, prefix, button_style) = match n.priority {
        Priority::Critical => ("🚨", "CRITICAL: ", Some("danger")),
        Priority::High => ("⚠️", "Important: ", Some("primary")),
        Priority::Normal => ("⚡", "", None),
    };
    let context_icon = match n.priority {
        Priority::Normal => "📄",
        _ => icon,
    };
    let description = if n.entry.description.is_empty() {
        format!("_{NO_DESCRIPTION}_")
    } else {
        n.entry.description.clone()
    };

    let mut button = json!({
        "type": "button",
        "text": { "type": "plain_text", "text": "View Full Details →", "emoji": true },
        "url": n.entry.url,
    });
    if let Some(style) = button_style {
        button["style"] = json!(style);
    }

    json!({
        "blocks": [
            {
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": format!("{icon} {prefix}{}", n.headline()),
                    "emoji": true
                }
            },
            {
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": format!("{context_icon} *{}*\n\n{description}", n.entry.title)
                }
            },
            {
                "type": "section",
                "fields": [
                    { "type": "mrkdwn", "text": format!("*Category:*\n{}", n.entry.category) },
                    { "type": "mrkdwn", "text": format!("*Date:*\n{}", n.entry.date) },
                    { "type": "mrkdwn", "text": format!("*Priority:*\n{}", n.priority) }
                ]
            },
            { "type": "actions", "elements": [button] }
        ]
    })
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    fn channel(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, n: &Notification<'_>) -> Result<()> {
        self.client
            .post(&self.webhook_url)
            .json(&slack_payload(n))
            .send()
            .await
            .context("slack post")?
            .error_for_status()
            .context("slack non-2xx")?;
        Ok(())
    }
}
