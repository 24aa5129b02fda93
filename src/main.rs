//! changelog-monitor: binary entrypoint.
//! One-shot checks, a scheduled watch loop, listing, state reset and an
//! HTTP status surface on top of the library.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use changelog_monitor::config::{load_config, FilterConfig, WebhookConfig};
use changelog_monitor::fetcher::{ChangelogFetcher, ChangelogSource};
use changelog_monitor::metrics::Metrics;
use changelog_monitor::{
    apply_filters, display_priority, merge_config, validate_config, ChangelogEntry, CycleReport,
    Monitor, MonitorConfig, Priority, StateStore,
};

#[derive(Parser)]
#[command(
    name = "changelog-monitor",
    version,
    about = "Monitor the Shopify changelog and send updates to webhooks"
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check for new changelog entries once.
    Check(RunArgs),
    /// Continuously monitor the changelog.
    Watch(WatchArgs),
    /// List current changelog entries (no state interaction).
    List(ListArgs),
    /// Clear all seen entries.
    Reset(ResetArgs),
    /// Watch plus the HTTP status surface.
    Serve(ServeArgs),
}

#[derive(Args)]
struct FilterArgs {
    /// Only entries in these categories.
    #[arg(long, num_args = 1.., value_name = "CATEGORY")]
    filter_categories: Option<Vec<String>>,
    /// Only entries mentioning one of these keywords.
    #[arg(long, num_args = 1.., value_name = "KEYWORD")]
    filter_keywords: Option<Vec<String>>,
    /// Drop entries mentioning any of these keywords.
    #[arg(long, num_args = 1.., value_name = "KEYWORD")]
    exclude_keywords: Option<Vec<String>>,
}

impl FilterArgs {
    fn into_config(self) -> Option<FilterConfig> {
        if self.filter_categories.is_none()
            && self.filter_keywords.is_none()
            && self.exclude_keywords.is_none()
        {
            return None;
        }
        Some(FilterConfig {
            categories: self.filter_categories,
            keywords: self.filter_keywords,
            exclude_keywords: self.exclude_keywords,
        })
    }
}

#[derive(Args)]
struct RunArgs {
    /// Path to a config file (TOML or JSON).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Slack webhook URLs.
    #[arg(long, num_args = 1.., value_name = "URL")]
    slack: Vec<String>,
    /// Teams webhook URLs.
    #[arg(long, num_args = 1.., value_name = "URL")]
    teams: Vec<String>,
    #[arg(long)]
    state_file: Option<PathBuf>,
    /// Show what would be sent without sending or touching state.
    #[arg(long)]
    dry_run: bool,
    #[command(flatten)]
    filters: FilterArgs,
}

impl RunArgs {
    /// File config merged with CLI values, validated unless dry-run.
    fn resolve(self, interval: Option<u32>) -> Result<MonitorConfig> {
        let file = load_config(self.config.as_deref())?;
        let cli = MonitorConfig {
            webhooks: WebhookConfig {
                slack: self.slack,
                teams: self.teams,
                ..Default::default()
            },
            check_interval: interval,
            state_file: self.state_file,
            filters: self.filters.into_config(),
            dry_run: self.dry_run.then_some(true),
        };
        let cfg = merge_config(file, cli);
        if !cfg.is_dry_run() {
            validate_config(&cfg)?;
        }
        Ok(cfg)
    }
}

#[derive(Args)]
struct WatchArgs {
    #[command(flatten)]
    run: RunArgs,
    /// Minutes between checks [default: 15].
    #[arg(long, value_name = "MINUTES", value_parser = clap::value_parser!(u32).range(1..))]
    interval: Option<u32>,
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    watch: WatchArgs,
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
}

#[derive(Args)]
struct ListArgs {
    #[arg(long, default_value_t = 10)]
    limit: usize,
    #[command(flatten)]
    filters: FilterArgs,
}

#[derive(Args)]
struct ResetArgs {
    #[arg(long)]
    state_file: Option<PathBuf>,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("changelog_monitor=info,warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    // Load .env when present; no-op otherwise.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Check(args) => check(args).await,
        Command::Watch(args) => watch(args).await,
        Command::List(args) => list(args).await,
        Command::Reset(args) => reset(args).await,
        Command::Serve(args) => serve(args).await,
    }
}

async fn check(args: RunArgs) -> Result<()> {
    let cfg = args.resolve(None)?;
    println!("Checking changelog for updates...");

    let monitor = Monitor::new(cfg);
    let report = monitor.check_for_updates().await?;
    print_report(&report, monitor.config());
    println!("\n✓ Check complete!");
    Ok(())
}

async fn watch(args: WatchArgs) -> Result<()> {
    let monitor = start_monitor(args.run.resolve(args.interval)?);
    println!("✓ Monitor started. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    monitor.stop();
    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    let bind = args.bind;
    let cfg = args.watch.run.resolve(args.watch.interval)?;
    // recorder first so the immediate cycle is counted
    let metrics = Metrics::init(cfg.interval_minutes())?;
    let monitor = start_monitor(cfg);

    let app = changelog_monitor::router(monitor.clone()).merge(metrics.router());
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(%bind, "http surface listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("http server")?;
    monitor.stop();
    Ok(())
}

fn start_monitor(cfg: MonitorConfig) -> Arc<Monitor> {
    print_watch_banner(&cfg);
    let monitor = Arc::new(Monitor::new(cfg));
    monitor.start();
    monitor
}

async fn list(args: ListArgs) -> Result<()> {
    println!("Fetching changelog entries...\n");
    let filters = args.filters.into_config();

    let entries = ChangelogFetcher::new().fetch_entries().await?;
    let total = entries.len();
    let filtered = apply_filters(entries, filters.as_ref());
    let shown: Vec<&ChangelogEntry> = filtered.iter().take(args.limit).collect();

    if shown.is_empty() {
        println!("No changelog entries found.");
        return Ok(());
    }

    for (i, entry) in shown.iter().enumerate() {
        print!("{}. ", i + 1);
        print_entry(entry, display_priority(entry, filters.as_ref()));
        if !entry.description.is_empty() {
            let short: String = entry.description.chars().take(100).collect();
            println!("   Description: {short}...");
        }
        println!();
    }
    println!(
        "Showing {} of {} filtered entries ({} total).",
        shown.len(),
        filtered.len(),
        total
    );
    Ok(())
}

async fn reset(args: ResetArgs) -> Result<()> {
    StateStore::from_option(args.state_file.as_deref())
        .reset()
        .await?;
    println!("✓ State file reset successfully.");
    Ok(())
}

fn print_entry(entry: &ChangelogEntry, priority: Priority) {
    let icon = if priority == Priority::High { "🚨" } else { "📄" };
    println!("{icon} {}", entry.title);
    println!("   Category: {}", entry.category);
    println!("   Date: {}", entry.date);
    println!("   URL: {}", entry.url);
    if priority == Priority::High {
        println!("   ⚠️  HIGH PRIORITY");
    }
}

fn print_report(report: &CycleReport, cfg: &MonitorConfig) {
    if report.entries.is_empty() {
        println!("No new changelog entries found.");
        return;
    }
    println!("Found {} new changelog entries.", report.entries.len());
    for new in &report.entries {
        println!();
        print_entry(&new.entry, display_priority(&new.entry, cfg.filters.as_ref()));
    }
    if report.dry_run {
        println!("\n⚠️  DRY RUN - nothing was sent and state was not updated");
    } else {
        println!("\n✓ Webhooks notified, {} entries marked seen", report.marked_seen);
        if report.delivery_failures > 0 {
            println!("   {} deliveries failed (see logs)", report.delivery_failures);
        }
    }
}

fn print_watch_banner(cfg: &MonitorConfig) {
    println!("Starting changelog monitor...");
    println!("Check interval: {} minutes", cfg.interval_minutes());
    if cfg.is_dry_run() {
        println!("⚠️  DRY RUN MODE - No webhooks will be sent");
    }
    let w = &cfg.webhooks;
    if !w.slack.is_empty() {
        println!("Slack webhooks: {}", w.slack.len());
    }
    if !w.teams.is_empty() {
        println!("Teams webhooks: {}", w.teams.len());
    }
    if let Some(email) = &w.email {
        println!("Email recipients: {}", email.to.len());
    }
    if !w.generic.is_empty() {
        println!("Generic webhooks: {}", w.generic.len());
    }
    if let Some(f) = &cfg.filters {
        if let Some(c) = &f.categories {
            println!("Filtering categories: {}", c.join(", "));
        }
        if let Some(k) = &f.keywords {
            println!("Filtering keywords: {}", k.join(", "));
        }
    }
}
