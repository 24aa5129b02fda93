use anyhow::{Context, Result};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::AsyncSmtpTransport;
use lettre::{AsyncTransport, Tokio1Executor};

use super::{Notification, Notifier, NO_DESCRIPTION};
use crate::config::EmailConfig;
use crate::types::Priority;

/// SMTP sender. A transport is opened per send, so config changes need no reconnect logic.
pub struct EmailNotifier {
    cfg: EmailConfig,
}

impl EmailNotifier {
    pub fn new(cfg: EmailConfig) -> Self {
        Self { cfg }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let host = self.cfg.host.as_str();
        // `secure` = implicit TLS; otherwise plain with STARTTLS when offered.
        let builder = if self.cfg.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host).context("smtp relay")?
        } else {
            let tls = TlsParameters::new(host.to_string()).context("smtp tls parameters")?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                .tls(Tls::Opportunistic(tls))
        };
        let mut builder = builder.port(self.cfg.port);
        if let Some(auth) = &self.cfg.auth {
            builder = builder.credentials(Credentials::new(auth.user.clone(), auth.pass.clone()));
        }
        Ok(builder.build())
    }

    pub fn build_message(&self, n: &Notification<'_>) -> Result<Message> {
        let from: Mailbox = self
            .cfg
            .from
            .parse()
            .with_context(|| format!("invalid from address {:?}", self.cfg.from))?;
        let mut builder = Message::builder()
            .from(from)
            .subject(format!("{} Changelog: {}", n.product, n.entry.title))
            .header(header::ContentType::TEXT_HTML);
        for to in &self.cfg.to {
            let mbox: Mailbox = to
                .parse()
                .with_context(|| format!("invalid recipient {to:?}"))?;
            builder = builder.to(mbox);
        }
        builder.body(email_html(n)).context("build email")
    }
}

pub fn email_html(n: &Notification<'_>) -> String {
    let (icon, color, badge) = match n.priority {
        Priority::Critical => (
            "🚨",
            "#FF0000",
            r#"<span style="background: #FF0000; color: white; padding: 4px 8px; border-radius: 4px; font-size: 12px; font-weight: bold;">⚠️ CRITICAL</span>"#,
        ),
        Priority::High => (
            "⚠️",
            "#FFA500",
            r#"<span style="background: #FFA500; color: white; padding: 4px 8px; border-radius: 4px; font-size: 12px;">⚠️ HIGH PRIORITY</span>"#,
        ),
        Priority::Normal => (
            "⚡",
            "#5E72E4",
            r#"<span style="background: #5E72E4; color: white; padding: 4px 8px; border-radius: 4px; font-size: 12px;">NORMAL</span>"#,
        ),
    };
    let button_color = if n.priority == Priority::Critical {
        "#FF0000"
    } else {
        "#5E72E4"
    };
    let e = n.entry;
    let description = if e.description.is_empty() {
        format!("<em>{NO_DESCRIPTION}</em>")
    } else {
        text(&e.description).into_owned()
    };
    let url = attr(&e.url);

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px;">
  <h2 style="color: {color};">{icon} {headline}</h2>
  <div style="background: #f5f5f5; padding: 15px; border-radius: 8px; margin: 15px 0;">
    <h3 style="margin-top: 0;"><a href="{url}" style="color: #333; text-decoration: none;">{title}</a></h3>
    <p style="margin: 10px 0;"><strong>Category:</strong> {category} | <strong>Date:</strong> {date}</p>
    <p style="margin: 10px 0;">{badge}</p>
  </div>
  <div style="margin: 15px 0;">
    <p><strong>Description:</strong></p>
    <p style="line-height: 1.6;">{description}</p>
  </div>
  <p><a href="{url}" style="background: {button_color}; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px; display: inline-block;">View Full Details →</a></p>
</div>"#,
        headline = text(&n.headline()),
        title = text(&e.title),
        category = text(&e.category),
        date = text(&e.date),
    )
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }

    fn recipients(&self) -> usize {
        self.cfg.to.len()
    }

    async fn send(&self, n: &Notification<'_>) -> Result<()> {
        let msg = self.build_message(n)?;
        self.transport()?.send(msg).await.context("send email")?;
        Ok(())
    }
}
