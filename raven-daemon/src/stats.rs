#![forbid(unsafe_code)]

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

/// Counters accumulated over the life of the loop.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoopStats {
    pub cycles: u64,
    pub fetch_failures: u64,
    pub installs: u64,
    pub install_failures: u64,
    pub no_route: u64,
    pub pair_errors: u64,
    pub last_nodes: usize,
    pub last_edges: usize,
}

/// Shared, cheaply cloneable handle on [`LoopStats`].
#[derive(Clone, Default)]
pub struct StatsCollector {
    inner: Arc<RwLock<LoopStats>>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> LoopStats {
        self.inner.read().clone()
    }

    pub(crate) fn record_cycle(&self, nodes: usize, edges: usize) {
        let mut w = self.inner.write();
        w.cycles += 1;
        w.last_nodes = nodes;
        w.last_edges = edges;
    }

    pub(crate) fn record_fetch_failure(&self) {
        self.inner.write().fetch_failures += 1;
    }

    pub(crate) fn record_install(&self) {
        self.inner.write().installs += 1;
    }

    pub(crate) fn record_install_failure(&self) {
        self.inner.write().install_failures += 1;
    }

    pub(crate) fn record_no_route(&self) {
        self.inner.write().no_route += 1;
    }

    pub(crate) fn record_pair_error(&self) {
        self.inner.write().pair_errors += 1;
    }

    /// Prometheus text exposition of the current counters.
    pub fn render_prometheus(&self) -> String {
        let s = self.snapshot();
        format!(
            concat!(
                "# HELP raven_cycles_total Completed monitoring cycles\n",
                "# TYPE raven_cycles_total counter\n",
                "raven_cycles_total {}\n",
                "# HELP raven_fetch_failures_total Failed inventory fetches\n",
                "# TYPE raven_fetch_failures_total counter\n",
                "raven_fetch_failures_total {}\n",
                "# HELP raven_path_installs_total Paths installed end to end\n",
                "# TYPE raven_path_installs_total counter\n",
                "raven_path_installs_total {}\n",
                "# HELP raven_install_failures_total Paths aborted on a failed rule write\n",
                "# TYPE raven_install_failures_total counter\n",
                "raven_install_failures_total {}\n",
                "# HELP raven_no_route_total Host pairs without a candidate path\n",
                "# TYPE raven_no_route_total counter\n",
                "raven_no_route_total {}\n",
                "# HELP raven_pair_errors_total Host pairs that failed before installation\n",
                "# TYPE raven_pair_errors_total counter\n",
                "raven_pair_errors_total {}\n",
                "# HELP raven_topology_nodes Nodes in the last rebuilt topology\n",
                "# TYPE raven_topology_nodes gauge\n",
                "raven_topology_nodes {}\n",
                "# HELP raven_topology_edges Edges in the last rebuilt topology\n",
                "# TYPE raven_topology_edges gauge\n",
                "raven_topology_edges {}\n"
            ),
            s.cycles,
            s.fetch_failures,
            s.installs,
            s.install_failures,
            s.no_route,
            s.pair_errors,
            s.last_nodes,
            s.last_edges
        )
    }
}
