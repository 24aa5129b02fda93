use anyhow::Context;
use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the configured interval.
    pub fn init(interval_minutes: u32) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        gauge!("monitor_check_interval_minutes").set(interval_minutes as f64);

        Ok(Self { handle })
    }

    /// Scrape target for the monitor's cycle and delivery series.
    pub fn router(&self) -> Router {
        let prometheus = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || std::future::ready(prometheus.render())),
        )
    }
}
