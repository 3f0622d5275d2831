//! Long-lived per-link quality state.
//!
//! The store outlives every topology rebuild and is shared with the graph
//! only through [`LinkKey`]. Entries are created on first observation and
//! never removed; the only later mutation is the failure counter.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::types::LinkKey;

/// Bandwidth assumed for a link with no capacity hint (Mbps).
pub const DEFAULT_BANDWIDTH_MBPS: f64 = 100.0;
/// Reliability never drops below this floor.
pub const MIN_RELIABILITY: f64 = 0.1;
/// Reliability lost per recorded failure.
pub const RELIABILITY_STEP: f64 = 0.1;

/// Reliability implied by `failures` observed failures.
pub fn reliability_for_failures(failures: u32) -> f64 {
    (1.0 - RELIABILITY_STEP * f64::from(failures)).max(MIN_RELIABILITY)
}

/// Metrics recorded for one link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkMetrics {
    /// Available bandwidth estimate in Mbps.
    pub bandwidth_mbps: f64,
    /// Failures observed since first sighting.
    pub failure_count: u32,
}

/// Process-wide link metrics store.
///
/// All mutation goes through one mutex, so concurrent `record_failure`
/// calls on the same link are serialized.
#[derive(Debug, Default)]
pub struct LinkMetricsStore {
    entries: Mutex<HashMap<LinkKey, LinkMetrics>>,
    capacity_hints: HashMap<LinkKey, f64>,
}

impl LinkMetricsStore {
    /// Empty store; every link starts at [`DEFAULT_BANDWIDTH_MBPS`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store whose first-observation bandwidth comes from `hints`
    /// when the link is listed there.
    pub fn with_capacity_hints(hints: HashMap<LinkKey, f64>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity_hints: hints,
        }
    }

    /// Initialize `key` if it has never been seen. Returns true when a new
    /// entry was created; an existing entry is left untouched.
    pub fn initialize(&self, key: &LinkKey) -> bool {
        let mut entries = self.entries.lock();
        if entries.contains_key(key) {
            return false;
        }
        let bandwidth_mbps = self
            .capacity_hints
            .get(key)
            .copied()
            .unwrap_or(DEFAULT_BANDWIDTH_MBPS);
        entries.insert(
            key.clone(),
            LinkMetrics {
                bandwidth_mbps,
                failure_count: 0,
            },
        );
        debug!(link = %key, bandwidth_mbps, "link first observed");
        true
    }

    /// `max(0.1, 1.0 - 0.1 * failures)`; an unseen link counts as zero failures.
    pub fn reliability_of(&self, key: &LinkKey) -> f64 {
        reliability_for_failures(self.failure_count(key))
    }

    /// Stored bandwidth, [`DEFAULT_BANDWIDTH_MBPS`] for an unseen link.
    pub fn bandwidth_of(&self, key: &LinkKey) -> f64 {
        self.entries
            .lock()
            .get(key)
            .map(|m| m.bandwidth_mbps)
            .unwrap_or(DEFAULT_BANDWIDTH_MBPS)
    }

    /// Failures recorded for `key`, zero if unseen.
    pub fn failure_count(&self, key: &LinkKey) -> u32 {
        self.entries
            .lock()
            .get(key)
            .map(|m| m.failure_count)
            .unwrap_or(0)
    }

    /// Count one failure against `key` and return the new total.
    ///
    /// A link that was never initialized gets its entry created first, so
    /// the failure is not lost.
    pub fn record_failure(&self, key: &LinkKey) -> u32 {
        let mut entries = self.entries.lock();
        let bandwidth_mbps = self
            .capacity_hints
            .get(key)
            .copied()
            .unwrap_or(DEFAULT_BANDWIDTH_MBPS);
        let entry = entries.entry(key.clone()).or_insert(LinkMetrics {
            bandwidth_mbps,
            failure_count: 0,
        });
        entry.failure_count = entry.failure_count.saturating_add(1);
        entry.failure_count
    }

    /// Copy of one entry.
    pub fn get(&self, key: &LinkKey) -> Option<LinkMetrics> {
        self.entries.lock().get(key).cloned()
    }

    /// Number of links ever observed.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True if no link has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
