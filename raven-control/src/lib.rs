#![forbid(unsafe_code)]

//! raven-control: the boundary between the RAVEN core and the SDN controller.
//! This crate provides:
//! - [`ControllerApi`], the three inventory reads and the flow-rule write the core depends on
//! - [`onos::OnosClient`], an implementation over the ONOS REST API (ureq, basic auth, timeouts)
//! - [`flow::FlowRule`], the minimal forwarding rule and its ONOS JSON encoding

use async_trait::async_trait;
use raven_core::inventory::{Device, Host, Inventory, InventoryLink};
use tracing::warn;

pub mod flow;
pub mod onos;

pub use flow::FlowRule;
pub use onos::OnosClient;

/// Errors talking to the controller.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Connection, DNS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Controller answered with an unexpected status.
    #[error("unexpected status {code} from {url}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Request URL.
        url: String,
    },
    /// Body was not the expected JSON.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// Reading the body failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The blocking request task could not be joined.
    #[error("join error: {0}")]
    Join(String),
}

/// Result alias for controller calls.
pub type Result<T> = std::result::Result<T, Error>;

/// What the core needs from the SDN controller.
///
/// Every call is bounded by a timeout and may fail; failures are ordinary
/// outcomes for the caller to log, never a reason to stop.
#[async_trait]
pub trait ControllerApi: Send + Sync {
    /// Devices and their availability.
    async fn fetch_devices(&self) -> Result<Vec<Device>>;

    /// Infrastructure links and their state.
    async fn fetch_links(&self) -> Result<Vec<InventoryLink>>;

    /// Hosts and their attachment points.
    async fn fetch_hosts(&self) -> Result<Vec<Host>>;

    /// Write one forwarding rule.
    async fn install_flow(&self, rule: &FlowRule) -> Result<()>;

    /// Read devices, links and hosts as one snapshot.
    ///
    /// Fails as a whole if any of the three reads fails, so a partial
    /// inventory is never mistaken for a shrunken network.
    async fn fetch_inventory(&self) -> Result<Inventory> {
        let devices = self.fetch_devices().await.map_err(|e| {
            warn!(error = %e, "device read failed");
            e
        })?;
        let links = self.fetch_links().await.map_err(|e| {
            warn!(error = %e, "link read failed");
            e
        })?;
        let hosts = self.fetch_hosts().await.map_err(|e| {
            warn!(error = %e, "host read failed");
            e
        })?;
        Ok(Inventory {
            devices,
            links,
            hosts,
        })
    }
}
