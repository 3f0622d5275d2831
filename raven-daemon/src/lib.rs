#![forbid(unsafe_code)]

// Daemon runtime: selection, installation and the polling loop.
pub mod errors; // Error types for daemon
pub mod monitor; // Fetch / rebuild / install cycle
pub mod selector; // Best-path selection and flow installation
pub mod stats; // Loop counters and Prometheus text

pub use errors::{DaemonError, Result};
pub use monitor::{CycleReport, Monitor};
pub use selector::{Installation, PairOutcome, PathSelector, Selection};
pub use stats::{LoopStats, StatsCollector};
