// src/config/merge.rs
use super::{FilterConfig, MonitorConfig, WebhookConfig};
use crate::error::{MonitorError, Result};

/// Combine file config with CLI-supplied values.
///
/// - scalars (`checkInterval`, `stateFile`, `dryRun`) from the CLI win only when set
/// - filters are taken per axis, CLI first
/// - slack/teams/generic lists are concatenated, file entries first
/// - a CLI email block replaces the file one
pub fn merge_config(file: Option<MonitorConfig>, cli: MonitorConfig) -> MonitorConfig {
    let mut out = file.unwrap_or_default();

    if cli.check_interval.is_some() {
        out.check_interval = cli.check_interval;
    }
    if cli.state_file.is_some() {
        out.state_file = cli.state_file;
    }
    if cli.dry_run.is_some() {
        out.dry_run = cli.dry_run;
    }

    if let Some(cli_filters) = cli.filters {
        let base = out.filters.take().unwrap_or_default();
        out.filters = Some(FilterConfig {
            categories: cli_filters.categories.or(base.categories),
            keywords: cli_filters.keywords.or(base.keywords),
            exclude_keywords: cli_filters.exclude_keywords.or(base.exclude_keywords),
        });
    }

    let WebhookConfig {
        slack,
        teams,
        email,
        generic,
    } = cli.webhooks;
    out.webhooks.slack.extend(slack);
    out.webhooks.teams.extend(teams);
    out.webhooks.generic.extend(generic);
    if email.is_some() {
        out.webhooks.email = email;
    }

    out
}

/// Reject configs that cannot deliver anything. Only meaningful outside dry-run.
pub fn validate_config(cfg: &MonitorConfig) -> Result<()> {
    if !cfg.webhooks.has_any_channel() {
        return Err(MonitorError::config(
            "at least one webhook channel (slack, teams, email or generic) is required",
        ));
    }

    if let Some(email) = &cfg.webhooks.email {
        let auth_ok = email
            .auth
            .as_ref()
            .is_some_and(|a| !a.user.is_empty() && !a.pass.is_empty());
        if email.host.is_empty()
            || email.port == 0
            || !auth_ok
            || email.from.is_empty()
            || email.to.is_empty()
        {
            return Err(MonitorError::config(
                "email config is incomplete (host, port, auth.user, auth.pass, from and to are required)",
            ));
        }
    }

    if cfg.webhooks.generic.iter().any(|w| w.url.trim().is_empty()) {
        return Err(MonitorError::config("generic webhook must have a url"));
    }

    if cfg.check_interval == Some(0) {
        return Err(MonitorError::config("checkInterval must be at least 1 minute"));
    }

    Ok(())
}
