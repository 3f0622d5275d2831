#![forbid(unsafe_code)]

//! raven-core: the path-selection model of the RAVEN controller.
//!
//! - [`topology`]: per-cycle graph of switches and hosts, rebuilt from an inventory snapshot
//! - [`link_metrics`]: process-wide failure counts and bandwidth per link
//! - [`candidates`]: loopless k-shortest-path enumeration over [`candidates::PathGraph`]
//! - [`scoring`]: the RAVEN reliability / bandwidth / hop-count score
//! - [`config`]: TOML configuration shared by the control and daemon crates

pub mod candidates;
pub mod config;
pub mod error;
pub mod inventory;
pub mod link_metrics;
pub mod naming;
pub mod scoring;
pub mod topology;
pub mod types;

pub use candidates::{k_shortest_paths, PathGraph};
pub use config::RavenConfig;
pub use error::{Error, Result};
pub use inventory::{Device, Host, Inventory, InventoryLink};
pub use link_metrics::LinkMetricsStore;
pub use naming::{format_path, friendly_name};
pub use scoring::{PathMetrics, RavenScorer, ScoringWeights};
pub use topology::Topology;
pub use types::{LinkKey, NodeId, NodeKind, Path};
