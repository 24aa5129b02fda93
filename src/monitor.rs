// src/monitor.rs
//! Long-lived monitor: owns config, state store, source and dispatcher,
//! and drives check cycles on a fixed minute grid.

use chrono::Utc;
use metrics::{counter, gauge};
use serde::Serialize;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::watch;

use crate::classify::classify;
use crate::config::MonitorConfig;
use crate::error::Result;
use crate::fetcher::{ChangelogFetcher, ChangelogSource};
use crate::notify::Dispatcher;
use crate::novelty::get_new_entries;
use crate::schedule::until_next_tick;
use crate::state::StateStore;
use crate::types::{ChangelogEntry, Priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stopped,
    Running,
}

enum Lifecycle {
    Stopped,
    Running {
        stop: watch::Sender<bool>,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    pub is_running: bool,
    pub last_checked: String,
    pub seen_count: usize,
}

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub entry: ChangelogEntry,
    pub priority: Priority,
}

/// What one check cycle did.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub dry_run: bool,
    pub entries: Vec<NewEntry>,
    pub marked_seen: usize,
    pub delivery_failures: usize,
}

pub struct Monitor {
    config: MonitorConfig,
    store: StateStore,
    source: Arc<dyn ChangelogSource>,
    dispatcher: Dispatcher,
    lifecycle: Mutex<Lifecycle>,
    // serializes cycles: scheduled and manual triggers never overlap
    cycle_guard: tokio::sync::Mutex<()>,
}

impl Monitor {
    /// Monitor against the default vendor changelog.
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_source(config, Arc::new(ChangelogFetcher::new()))
    }

    pub fn with_source(config: MonitorConfig, source: Arc<dyn ChangelogSource>) -> Self {
        let dispatcher = Dispatcher::from_config(&config.webhooks);
        Self::with_parts(config, source, dispatcher)
    }

    pub fn with_parts(
        config: MonitorConfig,
        source: Arc<dyn ChangelogSource>,
        dispatcher: Dispatcher,
    ) -> Self {
        let store = StateStore::from_option(config.state_file.as_deref());
        Self {
            config,
            store,
            source,
            dispatcher,
            lifecycle: Mutex::new(Lifecycle::Stopped),
            cycle_guard: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn phase(&self) -> Phase {
        match *self.lifecycle.lock().expect("lifecycle mutex poisoned") {
            Lifecycle::Stopped => Phase::Stopped,
            Lifecycle::Running { .. } => Phase::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase() == Phase::Running
    }

    /// One cycle: seen ids -> new entries -> classify -> dispatch -> mark seen.
    ///
    /// Fetch and persist errors abort the cycle and are returned; channel
    /// failures are only counted. Entries already dispatched before a persist
    /// error stay dispatched.
    pub async fn check_for_updates(&self) -> Result<CycleReport> {
        let _guard = self.cycle_guard.lock().await;
        counter!("monitor_cycles_total").increment(1);

        let dry_run = self.config.is_dry_run();
        let mut report = CycleReport {
            dry_run,
            ..Default::default()
        };

        let seen = self.store.seen_entries().await;
        let new_entries =
            get_new_entries(self.source.as_ref(), &seen, self.config.filters.as_ref()).await?;
        gauge!("monitor_last_check_ts").set(Utc::now().timestamp() as f64);

        if new_entries.is_empty() {
            tracing::info!("no new changelog entries");
            return Ok(report);
        }
        tracing::info!(count = new_entries.len(), "found new changelog entries");
        counter!("monitor_new_entries_total").increment(new_entries.len() as u64);

        for entry in new_entries {
            let priority = classify(&entry);
            tracing::info!(
                entry_id = %entry.id,
                title = %entry.title,
                category = %entry.category,
                priority = priority.as_str(),
                "new changelog entry"
            );

            let dispatch = self.dispatcher.notify(&entry, dry_run).await;
            report.delivery_failures += dispatch.failures.len();

            if !dry_run {
                self.store.add_seen(&entry.id).await?;
                report.marked_seen += 1;
            }
            report.entries.push(NewEntry { entry, priority });
        }
        Ok(report)
    }

    /// Scheduled wrapper: errors are logged, never propagated.
    pub async fn run_scheduled_cycle(&self) {
        match self.check_for_updates().await {
            Ok(r) => tracing::debug!(
                new = r.entries.len(),
                marked_seen = r.marked_seen,
                delivery_failures = r.delivery_failures,
                "check cycle finished"
            ),
            Err(e) => {
                counter!("monitor_cycle_errors_total").increment(1);
                tracing::warn!(error = %e, "check cycle failed");
            }
        }
    }

    /// Run one cycle now, then one per grid tick. Returns `false` if already running.
    ///
    /// Must be called inside a tokio runtime. The background task holds only a
    /// weak reference, so dropping the last `Arc<Monitor>` ends the schedule.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut lc = self.lifecycle.lock().expect("lifecycle mutex poisoned");
        if matches!(*lc, Lifecycle::Running { .. }) {
            tracing::warn!("monitor is already running");
            return false;
        }

        let interval = self.config.interval_minutes();
        tracing::info!(interval_minutes = interval, "starting changelog monitor");

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let weak: Weak<Self> = Arc::downgrade(self);
        // detached: the task ends on the stop signal or when the monitor is dropped
        tokio::spawn(async move {
            if let Some(this) = weak.upgrade() {
                this.run_scheduled_cycle().await;
            }
            loop {
                let wait = until_next_tick(Utc::now(), interval);
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = stop_rx.changed() => break,
                }
                if *stop_rx.borrow() {
                    break;
                }
                let Some(this) = weak.upgrade() else {
                    break;
                };
                this.run_scheduled_cycle().await;
            }
            tracing::debug!("monitor schedule ended");
        });

        *lc = Lifecycle::Running { stop: stop_tx };
        true
    }

    /// Cancel the schedule. An in-flight cycle finishes first. Idempotent.
    pub fn stop(&self) -> bool {
        let mut lc = self.lifecycle.lock().expect("lifecycle mutex poisoned");
        match std::mem::replace(&mut *lc, Lifecycle::Stopped) {
            Lifecycle::Running { stop } => {
                let _ = stop.send(true);
                tracing::info!("monitor stopped");
                true
            }
            Lifecycle::Stopped => false,
        }
    }

    pub async fn get_status(&self) -> MonitorStatus {
        let state = self.store.load().await;
        MonitorStatus {
            is_running: self.is_running(),
            last_checked: state.last_checked,
            seen_count: state.seen_entries.len(),
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        if let Ok(mut lc) = self.lifecycle.lock() {
            if let Lifecycle::Running { stop } = std::mem::replace(&mut *lc, Lifecycle::Stopped) {
                let _ = stop.send(true);
            }
        }
    }
}
