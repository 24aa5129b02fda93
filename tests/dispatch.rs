// tests/dispatch.rs
//! Fan-out to real HTTP channels (mocked): settle-all semantics and payloads.

use std::collections::BTreeMap;

use changelog_monitor::config::{GenericWebhook, HttpMethod, WebhookConfig};
use changelog_monitor::{ChangelogEntry, Dispatcher, MonitorError};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn entry() -> ChangelogEntry {
    ChangelogEntry {
        id: "0f3c".into(),
        title: "Breaking change to \"Orders\"".into(),
        date: "2025-09-01".into(),
        category: "API".into(),
        description: "Scope required.".into(),
        url: "https://shopify.dev/changelog/orders-breaking".into(),
    }
}

fn generic(server: &MockServer, template: Option<&str>) -> GenericWebhook {
    let mut headers = BTreeMap::new();
    headers.insert("X-Token".to_string(), "s3cret".to_string());
    GenericWebhook {
        url: format!("{}/hook", server.uri()),
        method: HttpMethod::Put,
        headers,
        template: template.map(str::to_string),
    }
}

async fn bodies_for(server: &MockServer, p: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == p)
        .map(|r| r.body_json::<Value>().unwrap())
        .collect()
}

#[tokio::test]
async fn failing_channel_does_not_block_siblings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/slack"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/teams"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/hook"))
        .and(header("x-token", "s3cret"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = WebhookConfig {
        slack: vec![format!("{}/slack", server.uri())],
        teams: vec![format!("{}/teams", server.uri())],
        email: None,
        generic: vec![generic(
            &server,
            Some(r#"{"text":"{{title}} ({{category}})","link":"{{url}}","unknown":"{{nope}}"}"#),
        )],
    };
    let report = Dispatcher::from_config(&cfg).notify(&entry(), false).await;

    assert_eq!(report.attempted, 3);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0],
        MonitorError::Delivery { channel: "teams", .. }
    ));

    let hook = bodies_for(&server, "/hook").await;
    assert_eq!(
        hook,
        vec![json!({
            "text": "Breaking change to \"Orders\" (API)",
            "link": "https://shopify.dev/changelog/orders-breaking",
            "unknown": "{{nope}}"
        })]
    );

    let slack = bodies_for(&server, "/slack").await;
    assert_eq!(
        slack[0]["blocks"][0]["text"]["text"],
        "🚨 CRITICAL: Shopify Changelog Update"
    );
}

#[tokio::test]
async fn generic_default_body_when_no_template() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = WebhookConfig {
        generic: vec![generic(&server, None)],
        ..Default::default()
    };
    let report = Dispatcher::from_config(&cfg).notify(&entry(), false).await;
    assert!(report.failures.is_empty());

    let body = &bodies_for(&server, "/hook").await[0];
    assert_eq!(body["source"], "shopify-changelog-monitor");
    assert_eq!(body["category"], "API");
    assert_eq!(body["date"], "2025-09-01");
}

#[tokio::test]
async fn malformed_template_fails_only_that_channel() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/slack"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = WebhookConfig {
        slack: vec![format!("{}/slack", server.uri())],
        generic: vec![generic(&server, Some(r#"{"text": {{title}} }"#))],
        ..Default::default()
    };
    let report = Dispatcher::from_config(&cfg).notify(&entry(), false).await;
    assert_eq!(report.delivered, 1);
    assert!(matches!(
        report.failures[0],
        MonitorError::Delivery { channel: "generic", .. }
    ));
}

#[tokio::test]
async fn dry_run_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cfg = WebhookConfig {
        slack: vec![format!("{}/slack", server.uri())],
        teams: vec![format!("{}/teams", server.uri())],
        email: None,
        generic: vec![generic(&server, None)],
    };
    let report = Dispatcher::from_config(&cfg).notify(&entry(), true).await;
    assert!(report.dry_run);
    assert_eq!(report.attempted, 0);
}
