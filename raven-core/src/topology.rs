//! Per-cycle topology graph.
//!
//! The graph is disposable: [`Topology::rebuild`] clears it and repopulates
//! it from one inventory snapshot. Link quality lives in
//! [`LinkMetricsStore`](crate::link_metrics::LinkMetricsStore) and is
//! reached only through [`LinkKey`].

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use tracing::{debug, info};

use crate::candidates::PathGraph;
use crate::inventory::Inventory;
use crate::link_metrics::LinkMetricsStore;
use crate::naming::friendly_name;
use crate::types::{LinkKey, NodeId, NodeKind};

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    /// Inventory identity.
    pub id: NodeId,
    /// Switch or host.
    pub kind: NodeKind,
    /// Match address for hosts (MAC); `None` for switches.
    pub address: Option<String>,
}

/// Undirected graph of the switches and hosts seen in the last inventory.
#[derive(Debug, Default)]
pub struct Topology {
    graph: UnGraph<NodeInfo, LinkKey>,
    index: HashMap<NodeId, NodeIndex>,
    egress: HashMap<(NodeId, NodeId), String>,
}

impl Topology {
    /// Empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh topology from `inventory`.
    pub fn from_inventory(inventory: &Inventory, metrics: &LinkMetricsStore) -> Self {
        let mut topology = Self::new();
        topology.rebuild(inventory, metrics);
        topology
    }

    /// Clear the graph and repopulate it from `inventory`.
    ///
    /// - every available device becomes a switch;
    /// - every host becomes a node, linked to each attachment switch that
    ///   made it into the graph;
    /// - every active link between two present switches becomes an edge.
    ///
    /// Each edge is registered with `metrics`, which only initializes links
    /// it has never seen.
    pub fn rebuild(&mut self, inventory: &Inventory, metrics: &LinkMetricsStore) {
        self.clear();

        for device in inventory.devices.iter().filter(|d| d.available) {
            self.add_switch(&device.id);
        }

        for host in &inventory.hosts {
            if !self.add_host(&host.id, host.address()) {
                continue;
            }
            for location in &host.locations {
                if self.kind_of(&location.element_id) != Some(NodeKind::Switch) {
                    debug!(
                        host = %friendly_name(&host.id),
                        switch = %friendly_name(&location.element_id),
                        "attachment switch not in topology; host left unconnected"
                    );
                    continue;
                }
                if let Some(key) =
                    self.add_link(&host.id, None, &location.element_id, location.port.as_deref())
                {
                    metrics.initialize(&key);
                }
            }
        }

        for link in inventory.links.iter().filter(|l| l.is_active()) {
            let (src, dst) = (&link.src.device, &link.dst.device);
            if self.kind_of(src) != Some(NodeKind::Switch)
                || self.kind_of(dst) != Some(NodeKind::Switch)
            {
                debug!(
                    src = %friendly_name(src),
                    dst = %friendly_name(dst),
                    "link references a switch not in topology; dropped"
                );
                continue;
            }
            if let Some(key) =
                self.add_link(src, link.src.port.as_deref(), dst, link.dst.port.as_deref())
            {
                metrics.initialize(&key);
            }
        }

        info!(
            nodes = self.node_count(),
            edges = self.edge_count(),
            hosts = self.hosts().len(),
            "topology rebuilt"
        );
    }

    /// Drop every node, edge and port record.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.index.clear();
        self.egress.clear();
    }

    /// Add a switch node. Returns false if `id` is already present.
    pub fn add_switch(&mut self, id: &str) -> bool {
        self.add_node(NodeInfo {
            id: id.to_string(),
            kind: NodeKind::Switch,
            address: None,
        })
    }

    /// Add a host node with its match address. Returns false if `id` is
    /// already present.
    pub fn add_host(&mut self, id: &str, address: impl Into<String>) -> bool {
        self.add_node(NodeInfo {
            id: id.to_string(),
            kind: NodeKind::Host,
            address: Some(address.into()),
        })
    }

    fn add_node(&mut self, info: NodeInfo) -> bool {
        if self.index.contains_key(&info.id) {
            return false;
        }
        let id = info.id.clone();
        let idx = self.graph.add_node(info);
        self.index.insert(id, idx);
        true
    }

    /// Connect two present nodes and remember the port each side uses to
    /// reach the other. A repeated link (e.g. the reverse direction of a
    /// bidirectional pair) keeps one edge.
    ///
    /// Returns the link key, or `None` when an endpoint is missing or the
    /// link would be a self-loop.
    pub fn add_link(
        &mut self,
        a: &str,
        a_port: Option<&str>,
        b: &str,
        b_port: Option<&str>,
    ) -> Option<LinkKey> {
        if a == b {
            return None;
        }
        let (ia, ib) = (*self.index.get(a)?, *self.index.get(b)?);
        let key = LinkKey::new(a, b);
        self.graph.update_edge(ia, ib, key.clone());
        if let Some(port) = a_port {
            self.egress.insert((a.to_string(), b.to_string()), port.to_string());
        }
        if let Some(port) = b_port {
            self.egress.insert((b.to_string(), a.to_string()), port.to_string());
        }
        Some(key)
    }

    /// True if `id` is a node of the graph.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Node kind, `None` when absent.
    pub fn kind_of(&self, id: &str) -> Option<NodeKind> {
        self.index.get(id).map(|&idx| self.graph[idx].kind)
    }

    /// Match address of a host node.
    pub fn address_of(&self, id: &str) -> Option<&str> {
        self.index
            .get(id)
            .and_then(|&idx| self.graph[idx].address.as_deref())
    }

    /// Port `from` uses to reach its neighbour `to`, when the inventory
    /// reported one.
    pub fn egress_port(&self, from: &str, to: &str) -> Option<&str> {
        self.egress
            .get(&(from.to_string(), to.to_string()))
            .map(String::as_str)
    }

    /// True if an edge connects `a` and `b`.
    pub fn has_link(&self, a: &str, b: &str) -> bool {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&ia), Some(&ib)) => self.graph.find_edge(ia, ib).is_some(),
            _ => false,
        }
    }

    /// Host identities in inventory order.
    pub fn hosts(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|idx| &self.graph[idx])
            .filter(|n| n.kind == NodeKind::Host)
            .map(|n| n.id.as_str())
            .collect()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl PathGraph for Topology {
    fn contains_node(&self, node: &str) -> bool {
        self.contains(node)
    }

    /// Neighbours in ascending identity order, independent of insertion
    /// order, so enumeration is reproducible.
    fn neighbors<'a>(&'a self, node: &str) -> Vec<&'a str> {
        let Some(&idx) = self.index.get(node) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].id.as_str())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Hosts terminate paths; only switches forward.
    fn is_transit(&self, node: &str) -> bool {
        self.kind_of(node) == Some(NodeKind::Switch)
    }
}
