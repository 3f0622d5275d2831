//! Path selection and installation for one host pair.
//!
//! Candidates come from the k-shortest-path generator, are scored against the
//! shared link metrics and the best one is written switch by switch. The
//! first failed write aborts the path and is charged to the link entering the
//! failing switch; there is no fallback to the runner-up within a cycle.

use std::sync::Arc;

use raven_control::{ControllerApi, FlowRule};
use raven_core::candidates::k_shortest_paths;
use raven_core::naming::{format_path, friendly_name};
use raven_core::scoring::{PathMetrics, RavenScorer, ScoringWeights};
use raven_core::{LinkKey, LinkMetricsStore, NodeId, NodeKind, Path, RavenConfig, Topology};
use tracing::{debug, error, info, warn};

use crate::errors::{DaemonError, Result};

/// The winning candidate of one selection round.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub path: Path,
    pub score: f64,
    pub metrics: PathMetrics,
    /// Number of candidates that were scored.
    pub candidates: usize,
}

/// Result of writing one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Installation {
    /// Every switch on the path accepted its rule.
    Complete { rules: usize },
    /// A write failed; later switches were not attempted.
    Aborted {
        /// Rules written before the failure.
        rules: usize,
        switch: NodeId,
        link: LinkKey,
        /// Failure count of `link` after this failure.
        failures: u32,
        reason: String,
    },
}

/// What happened to one host pair.
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    NoRoute,
    Installed { selection: Selection, rules: usize },
    InstallFailed {
        selection: Selection,
        switch: NodeId,
        link: LinkKey,
        failures: u32,
    },
}

/// Picks and installs the best RAVEN path between two hosts.
pub struct PathSelector {
    controller: Arc<dyn ControllerApi>,
    metrics: Arc<LinkMetricsStore>,
    weights: ScoringWeights,
    candidate_paths: usize,
    flow_priority: u32,
    default_output_port: String,
}

impl PathSelector {
    pub fn new(
        controller: Arc<dyn ControllerApi>,
        metrics: Arc<LinkMetricsStore>,
        config: &RavenConfig,
    ) -> Self {
        Self {
            controller,
            metrics,
            weights: config.scoring,
            candidate_paths: config.monitor.candidate_paths,
            flow_priority: config.controller.flow_priority,
            default_output_port: config.controller.default_output_port.clone(),
        }
    }

    /// Score up to `k` candidates and return the best; ties keep the earliest.
    ///
    /// `None` when an endpoint is missing from `topology` or no path exists.
    pub fn select(&self, topology: &Topology, src: &str, dst: &str) -> Option<Selection> {
        for endpoint in [src, dst] {
            if !topology.contains(endpoint) {
                warn!(node = %friendly_name(endpoint), "endpoint not in topology");
                return None;
            }
        }

        let candidates = k_shortest_paths(topology, src, dst, self.candidate_paths);
        if candidates.is_empty() {
            warn!(
                src = %friendly_name(src),
                dst = %friendly_name(dst),
                "no path between hosts"
            );
            return None;
        }

        let scorer = RavenScorer::new(&self.metrics, self.weights);
        let count = candidates.len();
        let mut best: Option<Selection> = None;
        for path in candidates {
            let score = scorer.score(&path);
            let metrics = scorer.path_metrics(&path);
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(Selection {
                    path,
                    score,
                    metrics,
                    candidates: count,
                });
            }
        }

        if let Some(sel) = &best {
            info!(
                path = %format_path(sel.path.nodes()),
                score = %format!("{:.3}", sel.score),
                candidates = count,
                "selected path"
            );
        }
        best
    }

    /// Write a rule on every switch of `path`, matching the destination's
    /// address and forwarding towards the next hop. Hosts get no state.
    pub async fn install(&self, topology: &Topology, path: &Path) -> Result<Installation> {
        let rules = self.plan(topology, path)?;
        let nodes = path.nodes();
        let mut written = 0;
        for (idx, rule) in rules {
            if let Err(e) = self.controller.install_flow(&rule).await {
                // Charge the link the traffic arrives on; a switch at the
                // head of the path has none, so its outgoing link is used.
                let link = if idx == 0 {
                    LinkKey::new(nodes[0].as_str(), nodes[1].as_str())
                } else {
                    LinkKey::new(nodes[idx - 1].as_str(), nodes[idx].as_str())
                };
                let failures = self.metrics.record_failure(&link);
                error!(
                    switch = %friendly_name(&rule.device_id),
                    link = %link,
                    failures,
                    error = %e,
                    "flow install failed; path aborted"
                );
                return Ok(Installation::Aborted {
                    rules: written,
                    switch: rule.device_id,
                    link,
                    failures,
                    reason: e.to_string(),
                });
            }
            written += 1;
        }
        Ok(Installation::Complete { rules: written })
    }

    /// Rules for every switch on `path`, paired with the switch's index.
    fn plan(&self, topology: &Topology, path: &Path) -> Result<Vec<(usize, FlowRule)>> {
        let nodes = path.nodes();
        let dst = path.destination();
        let dst_mac = topology
            .address_of(dst)
            .filter(|addr| !addr.is_empty())
            .ok_or_else(|| DaemonError::MissingAddress(dst.to_string()))?
            .to_string();

        let mut rules = Vec::new();
        for (idx, pair) in nodes.windows(2).enumerate() {
            let (node, next) = (&pair[0], &pair[1]);
            if topology.kind_of(node) != Some(NodeKind::Switch) {
                continue;
            }
            let output_port = match topology.egress_port(node, next) {
                Some(port) => port.to_string(),
                None => {
                    debug!(
                        switch = %friendly_name(node),
                        next = %friendly_name(next),
                        port = %self.default_output_port,
                        "egress port unknown; using default"
                    );
                    self.default_output_port.clone()
                }
            };
            rules.push((
                idx,
                FlowRule {
                    device_id: node.clone(),
                    dst_mac: dst_mac.clone(),
                    output_port,
                    next_hop: next.clone(),
                    priority: self.flow_priority,
                },
            ));
        }
        Ok(rules)
    }

    /// Select the best path from `src` to `dst` and install it.
    ///
    /// Controller failures are reported in the outcome, not as errors; `Err`
    /// means the pair could not be attempted at all.
    pub async fn select_and_install(
        &self,
        topology: &Topology,
        src: &str,
        dst: &str,
    ) -> Result<PairOutcome> {
        let Some(selection) = self.select(topology, src, dst) else {
            return Ok(PairOutcome::NoRoute);
        };
        match self.install(topology, &selection.path).await? {
            Installation::Complete { rules } => {
                info!(
                    src = %friendly_name(src),
                    dst = %friendly_name(dst),
                    rules,
                    "path installed"
                );
                Ok(PairOutcome::Installed { selection, rules })
            }
            Installation::Aborted {
                switch,
                link,
                failures,
                ..
            } => Ok(PairOutcome::InstallFailed {
                selection,
                switch,
                link,
                failures,
            }),
        }
    }
}
