//! Inventory snapshot as reported by the SDN controller.
//!
//! Field names follow the ONOS REST representation so the same types are
//! used for decoding responses and for building test fixtures.

use serde::{Deserialize, Serialize};

use crate::types::NodeId;

/// A forwarding device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Device identity, e.g. `of:0000000000000001`.
    pub id: NodeId,
    /// Whether the controller currently reaches the device.
    #[serde(default)]
    pub available: bool,
}

impl Device {
    /// Available device with the given id.
    pub fn available(id: impl Into<NodeId>) -> Self {
        Self { id: id.into(), available: true }
    }
}

/// One end of an inventory link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectPoint {
    /// Device identity.
    pub device: NodeId,
    /// Port on that device, when reported.
    #[serde(default)]
    pub port: Option<String>,
}

/// Link state as reported by the controller.
///
/// Only `ACTIVE` is meaningful to path selection; every other state string
/// collapses into [`LinkState::Inactive`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LinkState {
    /// Link carries traffic.
    Active,
    /// Any other reported state.
    #[default]
    Inactive,
}

impl From<String> for LinkState {
    fn from(state: String) -> Self {
        if state.eq_ignore_ascii_case("ACTIVE") {
            LinkState::Active
        } else {
            LinkState::Inactive
        }
    }
}

impl From<LinkState> for String {
    fn from(state: LinkState) -> Self {
        match state {
            LinkState::Active => "ACTIVE".into(),
            LinkState::Inactive => "INACTIVE".into(),
        }
    }
}

/// A directed switch-to-switch link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLink {
    /// Source connect point.
    pub src: ConnectPoint,
    /// Destination connect point.
    pub dst: ConnectPoint,
    /// Reported state.
    #[serde(default)]
    pub state: LinkState,
}

impl InventoryLink {
    /// Active link between two devices with the given ports.
    pub fn active(src: &str, src_port: &str, dst: &str, dst_port: &str) -> Self {
        Self {
            src: ConnectPoint { device: src.into(), port: Some(src_port.into()) },
            dst: ConnectPoint { device: dst.into(), port: Some(dst_port.into()) },
            state: LinkState::Active,
        }
    }

    /// True when the link is in the active state.
    pub fn is_active(&self) -> bool {
        self.state == LinkState::Active
    }
}

/// Attachment point of a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostLocation {
    /// Switch the host hangs off.
    #[serde(rename = "elementId")]
    pub element_id: NodeId,
    /// Switch port facing the host.
    #[serde(default)]
    pub port: Option<String>,
}

/// An end host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    /// Host identity, e.g. `00:00:00:00:00:01/None`.
    pub id: NodeId,
    /// MAC address used as the forwarding match.
    #[serde(default)]
    pub mac: Option<String>,
    /// Attachment points.
    #[serde(default)]
    pub locations: Vec<HostLocation>,
}

impl Host {
    /// Host attached to `switch` on `port`, identified by its MAC.
    pub fn attached(mac: &str, switch: &str, port: &str) -> Self {
        Self {
            id: format!("{mac}/None"),
            mac: Some(mac.into()),
            locations: vec![HostLocation {
                element_id: switch.into(),
                port: Some(port.into()),
            }],
        }
    }

    /// Address forwarding rules match on: the MAC, else the id up to `/`.
    pub fn address(&self) -> String {
        match &self.mac {
            Some(mac) if !mac.is_empty() => mac.clone(),
            _ => self.id.split('/').next().unwrap_or(&self.id).to_string(),
        }
    }
}

/// One full inventory snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    /// Devices.
    pub devices: Vec<Device>,
    /// Links.
    pub links: Vec<InventoryLink>,
    /// Hosts.
    pub hosts: Vec<Host>,
}
