use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identity of a switch or host as reported by the controller inventory.
pub type NodeId = String;

/// Role of a node in the topology graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Forwarding element; receives flow rules.
    Switch,
    /// Traffic endpoint; never receives flow rules.
    Host,
}

impl NodeKind {
    /// Lowercase label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Switch => "switch",
            NodeKind::Host => "host",
        }
    }
}

/// Canonical key of an undirected link.
///
/// The two endpoints are stored in ascending order so `A-B` and `B-A`
/// resolve to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkKey {
    lo: NodeId,
    hi: NodeId,
}

impl LinkKey {
    /// Build the canonical key for the link between `a` and `b`.
    pub fn new(a: impl Into<NodeId>, b: impl Into<NodeId>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    /// Lexicographically smaller endpoint.
    pub fn lo(&self) -> &str {
        &self.lo
    }

    /// Lexicographically larger endpoint.
    pub fn hi(&self) -> &str {
        &self.hi
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lo, self.hi)
    }
}

/// A simple path: at least two nodes, none repeated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path(Vec<NodeId>);

impl Path {
    /// Validate and wrap a node sequence.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPath`] when the sequence has fewer than two
    /// nodes or visits a node twice.
    pub fn new(nodes: Vec<NodeId>) -> Result<Self> {
        if nodes.len() < 2 {
            return Err(Error::invalid_path(format!(
                "a path needs at least 2 nodes, got {}",
                nodes.len()
            )));
        }
        for (i, node) in nodes.iter().enumerate() {
            if nodes[..i].contains(node) {
                return Err(Error::invalid_path(format!("node {node} repeated")));
            }
        }
        Ok(Self(nodes))
    }

    /// Node sequence from source to destination.
    pub fn nodes(&self) -> &[NodeId] {
        &self.0
    }

    /// Number of edges.
    pub fn hop_count(&self) -> usize {
        self.0.len() - 1
    }

    /// First node.
    pub fn source(&self) -> &str {
        &self.0[0]
    }

    /// Last node.
    pub fn destination(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    /// Canonical keys of every edge, in path order.
    pub fn links(&self) -> impl Iterator<Item = LinkKey> + '_ {
        self.0
            .windows(2)
            .map(|pair| LinkKey::new(pair[0].as_str(), pair[1].as_str()))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" -> "))
    }
}
