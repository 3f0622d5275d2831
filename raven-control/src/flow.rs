//! Minimal forwarding rule: match on destination MAC, output on one port.

use serde::Serialize;
use serde_json::{json, Value};

/// A forwarding rule for one switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowRule {
    /// Switch receiving the rule.
    pub device_id: String,
    /// Destination MAC to match.
    pub dst_mac: String,
    /// Egress port towards the next hop.
    pub output_port: String,
    /// Next-hop node, kept for logging.
    pub next_hop: String,
    /// Rule priority.
    pub priority: u32,
}

impl FlowRule {
    /// ONOS `POST /flows/{deviceId}` body: permanent, no idle timeout.
    pub fn to_onos_json(&self) -> Value {
        json!({
            "priority": self.priority,
            "timeout": 0,
            "isPermanent": true,
            "deviceId": self.device_id,
            "treatment": {
                "instructions": [
                    { "type": "OUTPUT", "port": self.output_port }
                ]
            },
            "selector": {
                "criteria": [
                    { "type": "ETH_DST", "mac": self.dst_mac }
                ]
            }
        })
    }
}
