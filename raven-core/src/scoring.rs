//! RAVEN path score.
//!
//! `score = alpha * reliability + beta * (bandwidth / bandwidth_ref) - gamma * hops`
//! where reliability is the product of link reliabilities and bandwidth the
//! bottleneck link bandwidth.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::link_metrics::LinkMetricsStore;
use crate::naming::format_path;
use crate::types::Path;

/// Weights of the RAVEN score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Reliability weight.
    pub alpha: f64,
    /// Normalized bandwidth weight.
    pub beta: f64,
    /// Penalty per hop.
    pub gamma: f64,
    /// Bandwidth (Mbps) that normalizes to 1.0.
    pub bandwidth_ref: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            beta: 0.4,
            gamma: 0.1,
            bandwidth_ref: 100.0,
        }
    }
}

/// Aggregated link metrics of one path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathMetrics {
    /// Product of link reliabilities.
    pub reliability: f64,
    /// Bottleneck bandwidth in Mbps.
    pub bandwidth_mbps: f64,
    /// Number of edges.
    pub hop_count: usize,
}

impl PathMetrics {
    /// Combine the metrics with `weights`.
    pub fn score(&self, weights: &ScoringWeights) -> f64 {
        weights.alpha * self.reliability
            + weights.beta * (self.bandwidth_mbps / weights.bandwidth_ref)
            - weights.gamma * self.hop_count as f64
    }
}

/// Scores paths against the current link metrics. Never mutates the store.
#[derive(Debug, Clone, Copy)]
pub struct RavenScorer<'a> {
    metrics: &'a LinkMetricsStore,
    weights: ScoringWeights,
}

impl<'a> RavenScorer<'a> {
    /// Scorer reading `metrics` with the given weights.
    pub fn new(metrics: &'a LinkMetricsStore, weights: ScoringWeights) -> Self {
        Self { metrics, weights }
    }

    /// Reliability, bottleneck bandwidth and hop count of `path`.
    ///
    /// # Panics
    /// Panics if the path has no edge; callers only ever pass paths between
    /// two distinct endpoints.
    pub fn path_metrics(&self, path: &Path) -> PathMetrics {
        assert!(path.nodes().len() >= 2, "scored path must have at least one edge");
        let mut reliability = 1.0;
        let mut bandwidth_mbps = f64::INFINITY;
        for link in path.links() {
            reliability *= self.metrics.reliability_of(&link);
            bandwidth_mbps = bandwidth_mbps.min(self.metrics.bandwidth_of(&link));
        }
        PathMetrics {
            reliability,
            bandwidth_mbps,
            hop_count: path.hop_count(),
        }
    }

    /// RAVEN score of `path`, logged per candidate.
    pub fn score(&self, path: &Path) -> f64 {
        let metrics = self.path_metrics(path);
        let score = metrics.score(&self.weights);
        info!(
            path = %format_path(path.nodes()),
            reliability = metrics.reliability,
            bandwidth = metrics.bandwidth_mbps,
            hops = metrics.hop_count,
            score,
            "candidate path scored"
        );
        score
    }
}
