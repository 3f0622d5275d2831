//! The monitoring loop.
//!
//! Each cycle fetches the inventory, rebuilds the topology and runs
//! [`PathSelector::select_and_install`] for every unordered host pair in a
//! fixed order. A failed fetch leaves topology and metrics untouched and the
//! loop sleeps the (longer) backoff instead of the cycle interval. Only the
//! stop signal ends the loop; it is checked between cycles and between pairs.

use std::sync::Arc;
use std::time::Duration;

use raven_control::ControllerApi;
use raven_core::naming::friendly_name;
use raven_core::{LinkMetricsStore, RavenConfig, Topology};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::selector::{PairOutcome, PathSelector};
use crate::stats::StatsCollector;

/// Summary of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// False when the inventory fetch failed and nothing else ran.
    pub fetched: bool,
    pub pairs: usize,
    pub installed: usize,
    pub install_failures: usize,
    pub no_route: usize,
    pub errors: usize,
    /// Stop was requested before every pair was processed.
    pub interrupted: bool,
}

pub struct Monitor {
    controller: Arc<dyn ControllerApi>,
    metrics: Arc<LinkMetricsStore>,
    selector: PathSelector,
    topology: Topology,
    stats: StatsCollector,
    cycle_interval: Duration,
    fetch_backoff: Duration,
}

impl Monitor {
    /// Monitor with link metrics seeded from the configured capacity hints.
    pub fn new(controller: Arc<dyn ControllerApi>, config: &RavenConfig) -> Self {
        let metrics = Arc::new(LinkMetricsStore::with_capacity_hints(config.capacity_hints()));
        Self::with_metrics(controller, metrics, config)
    }

    /// Monitor sharing an existing metrics store.
    pub fn with_metrics(
        controller: Arc<dyn ControllerApi>,
        metrics: Arc<LinkMetricsStore>,
        config: &RavenConfig,
    ) -> Self {
        let selector = PathSelector::new(controller.clone(), metrics.clone(), config);
        Self {
            controller,
            metrics,
            selector,
            topology: Topology::new(),
            stats: StatsCollector::new(),
            cycle_interval: config.monitor.cycle_interval(),
            fetch_backoff: config.monitor.fetch_backoff(),
        }
    }

    pub fn metrics(&self) -> &Arc<LinkMetricsStore> {
        &self.metrics
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn stats(&self) -> StatsCollector {
        self.stats.clone()
    }

    /// Run one fetch / rebuild / select-and-install pass.
    pub async fn run_cycle(&mut self, stop: &watch::Receiver<bool>) -> CycleReport {
        let mut report = CycleReport::default();

        let inventory = match self.controller.fetch_inventory().await {
            Ok(inv) => inv,
            Err(e) => {
                warn!(
                    error = %e,
                    backoff_secs = self.fetch_backoff.as_secs(),
                    "inventory fetch failed; keeping previous state"
                );
                self.stats.record_fetch_failure();
                return report;
            }
        };
        report.fetched = true;

        self.topology.rebuild(&inventory, &self.metrics);

        let hosts: Vec<String> = self.topology.hosts().into_iter().map(str::to_string).collect();
        'pairs: for (i, src) in hosts.iter().enumerate() {
            for dst in &hosts[i + 1..] {
                if *stop.borrow() {
                    report.interrupted = true;
                    break 'pairs;
                }
                report.pairs += 1;
                match self.selector.select_and_install(&self.topology, src, dst).await {
                    Ok(PairOutcome::Installed { .. }) => {
                        report.installed += 1;
                        self.stats.record_install();
                    }
                    Ok(PairOutcome::InstallFailed { .. }) => {
                        report.install_failures += 1;
                        self.stats.record_install_failure();
                    }
                    Ok(PairOutcome::NoRoute) => {
                        report.no_route += 1;
                        self.stats.record_no_route();
                    }
                    Err(e) => {
                        warn!(
                            src = %friendly_name(src),
                            dst = %friendly_name(dst),
                            error = %e,
                            "pair skipped"
                        );
                        report.errors += 1;
                        self.stats.record_pair_error();
                    }
                }
            }
        }

        self.stats
            .record_cycle(self.topology.node_count(), self.topology.edge_count());
        info!(
            pairs = report.pairs,
            installed = report.installed,
            failed = report.install_failures,
            no_route = report.no_route,
            errors = report.errors,
            "cycle complete"
        );
        report
    }

    /// Loop until `shutdown` carries `true`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> StatsCollector {
        info!(
            interval_secs = self.cycle_interval.as_secs(),
            backoff_secs = self.fetch_backoff.as_secs(),
            "monitoring loop started"
        );
        let mut signal_open = true;
        loop {
            if *shutdown.borrow() {
                break;
            }
            let report = self.run_cycle(&shutdown).await;
            if report.interrupted {
                break;
            }
            let delay = if report.fetched {
                self.cycle_interval
            } else {
                self.fetch_backoff
            };
            debug!(delay_ms = delay.as_millis() as u64, "sleeping");

            // Wake early only for a stop; other updates keep the deadline.
            let deadline = tokio::time::Instant::now() + delay;
            while signal_open && !*shutdown.borrow() {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => break,
                    changed = shutdown.changed() => {
                        // No sender left to ever request a stop.
                        if changed.is_err() {
                            signal_open = false;
                        }
                    }
                }
            }
            if !signal_open {
                tokio::time::sleep_until(deadline).await;
            }
        }
        info!("monitoring loop stopped");
        self.stats
    }
}
