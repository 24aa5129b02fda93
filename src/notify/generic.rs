use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::{Client, Method};
use serde_json::{json, Value};

use super::{Notification, Notifier};
use crate::config::{GenericWebhook, HttpMethod};
use crate::error::MonitorError;
use crate::types::ChangelogEntry;

/// Arbitrary HTTP endpoint (PagerDuty, internal APIs, ...).
pub struct GenericNotifier {
    hook: GenericWebhook,
    client: Client,
}

impl GenericNotifier {
    pub fn new(hook: GenericWebhook) -> Self {
        Self::with_client(hook, Client::new())
    }

    pub fn with_client(hook: GenericWebhook, client: Client) -> Self {
        Self { hook, client }
    }

    pub fn payload(&self, n: &Notification<'_>) -> Result<Value, MonitorError> {
        match &self.hook.template {
            Some(t) => render_template(t, n.entry),
            None => Ok(default_payload(n)),
        }
    }
}

/// Substitute `{{title}}`, `{{description}}`, `{{category}}`, `{{date}}`,
/// `{{url}}` and `{{id}}`, then parse the result as JSON.
///
/// Values are JSON-string-escaped, so placeholders must sit inside quotes.
/// Unknown placeholders are left untouched. Substitution is single-pass:
/// placeholder text inside a value is not expanded again.
pub fn render_template(template: &str, entry: &ChangelogEntry) -> Result<Value, MonitorError> {
    static RE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(\w+)\}\}").unwrap());

    let rendered = RE_PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        let value = match &caps[1] {
            "title" => &entry.title,
            "description" => &entry.description,
            "category" => &entry.category,
            "date" => &entry.date,
            "url" => &entry.url,
            "id" => &entry.id,
            _ => return caps[0].to_string(),
        };
        json_escape(value)
    });
    Ok(serde_json::from_str(&rendered)?)
}

/// Escape `s` for embedding between JSON double quotes.
fn json_escape(s: &str) -> String {
    let quoted = Value::String(s.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

pub fn default_payload(n: &Notification<'_>) -> Value {
    let e = n.entry;
    json!({
        "title": e.title,
        "description": e.description,
        "category": e.category,
        "date": e.date,
        "url": e.url,
        "source": format!("{}-changelog-monitor", n.product.to_ascii_lowercase()),
    })
}

#[async_trait::async_trait]
impl Notifier for GenericNotifier {
    fn channel(&self) -> &'static str {
        "generic"
    }

    async fn send(&self, n: &Notification<'_>) -> Result<()> {
        let payload = self.payload(n)?;
        let method = match self.hook.method {
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
        };
        let mut req = self.client.request(method, &self.hook.url);
        for (k, v) in &self.hook.headers {
            req = req.header(k.as_str(), v.as_str());
        }
        // `json` only sets Content-Type when the headers above did not.
        req.json(&payload)
            .send()
            .await
            .with_context(|| format!("generic webhook {}", self.hook.url))?
            .error_for_status()
            .context("generic webhook non-2xx")?;
        Ok(())
    }
}
