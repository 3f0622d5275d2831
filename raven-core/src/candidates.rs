//! Loopless k-shortest-path enumeration (Yen's algorithm, unit edge weights).
//!
//! Works over any [`PathGraph`]; the topology store is one implementation.
//! Ties in hop count are resolved by discovery order, which depends only on
//! the order `neighbors` returns nodes in.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::{LinkKey, NodeId, Path};

/// Read-only view of an undirected graph for path enumeration.
pub trait PathGraph {
    /// True if `node` exists.
    fn contains_node(&self, node: &str) -> bool;

    /// Adjacent nodes in a fixed, reproducible order.
    fn neighbors<'a>(&'a self, node: &str) -> Vec<&'a str>;

    /// Whether a path may pass through `node`. Endpoints are always allowed.
    fn is_transit(&self, _node: &str) -> bool {
        true
    }
}

/// Up to `k` simple paths from `src` to `dst`, by non-decreasing hop count.
///
/// Returns an empty vector when `k` is zero, when either endpoint is missing,
/// when `src == dst`, or when the endpoints are disconnected.
pub fn k_shortest_paths<G: PathGraph + ?Sized>(
    graph: &G,
    src: &str,
    dst: &str,
    k: usize,
) -> Vec<Path> {
    if k == 0 || src == dst || !graph.contains_node(src) || !graph.contains_node(dst) {
        return Vec::new();
    }

    let no_nodes = HashSet::new();
    let no_links = HashSet::new();
    let Some(first) = shortest_path(graph, src, dst, &no_nodes, &no_links) else {
        return Vec::new();
    };

    let mut accepted: Vec<Vec<&str>> = vec![first];
    // Pending candidates with their discovery sequence number.
    let mut pending: Vec<(usize, Vec<&str>)> = Vec::new();
    let mut seq = 0usize;

    while accepted.len() < k {
        let last = accepted[accepted.len() - 1].clone();

        for spur_idx in 0..last.len() - 1 {
            let spur = last[spur_idx];
            let root = &last[..=spur_idx];

            // Block the next edge of every accepted path sharing this root.
            let mut blocked_links = HashSet::new();
            for path in &accepted {
                if path.len() > spur_idx + 1 && &path[..=spur_idx] == root {
                    blocked_links.insert(LinkKey::new(path[spur_idx], path[spur_idx + 1]));
                }
            }
            // Root nodes before the spur may not be revisited.
            let blocked_nodes: HashSet<&str> = root[..spur_idx].iter().copied().collect();

            let Some(spur_path) = shortest_path(graph, spur, dst, &blocked_nodes, &blocked_links)
            else {
                continue;
            };

            let mut total: Vec<&str> = root[..spur_idx].to_vec();
            total.extend(spur_path);
            if !accepted.contains(&total) && !pending.iter().any(|(_, p)| *p == total) {
                pending.push((seq, total));
                seq += 1;
            }
        }

        let Some(best) = pending
            .iter()
            .enumerate()
            .min_by_key(|(_, (order, path))| (path.len(), *order))
            .map(|(pos, _)| pos)
        else {
            break;
        };
        let (_, next) = pending.swap_remove(best);
        accepted.push(next);
    }

    accepted
        .into_iter()
        .filter_map(|nodes| Path::new(nodes.into_iter().map(NodeId::from).collect()).ok())
        .collect()
}

/// Breadth-first shortest path avoiding `blocked_nodes` and `blocked_links`.
fn shortest_path<'a, G: PathGraph + ?Sized>(
    graph: &'a G,
    src: &'a str,
    dst: &str,
    blocked_nodes: &HashSet<&str>,
    blocked_links: &HashSet<LinkKey>,
) -> Option<Vec<&'a str>> {
    if blocked_nodes.contains(src) {
        return None;
    }
    let mut parent: HashMap<&'a str, &'a str> = HashMap::new();
    let mut seen: HashSet<&'a str> = HashSet::from([src]);
    let mut queue = VecDeque::from([src]);

    while let Some(node) = queue.pop_front() {
        if node == dst {
            let mut path = vec![node];
            let mut cur = node;
            while let Some(&prev) = parent.get(cur) {
                path.push(prev);
                cur = prev;
            }
            path.reverse();
            return Some(path);
        }
        for next in graph.neighbors(node) {
            if seen.contains(next) || blocked_nodes.contains(next) {
                continue;
            }
            if next != dst && !graph.is_transit(next) {
                continue;
            }
            if blocked_links.contains(&LinkKey::new(node, next)) {
                continue;
            }
            seen.insert(next);
            parent.insert(next, node);
            queue.push_back(next);
        }
    }
    None
}
