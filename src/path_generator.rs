use std::collections::hash_map::Entry::{Occupied, Vacant};
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::cmp::Ordering;

use petgraph::graph::NodeIndex;
use petgraph::visit::{EdgeRef, VisitMap, Visitable};

use super::error::{ModelError, Result};
use super::road_network::{NodeId, RoadNetwork};


/// A simple path through the road network, origin first.  `weight` is its total used weight
/// under the weighting(s) that produced it.
#[derive(PartialEq, Debug, Clone)]
pub struct Route {
    pub nodes: Vec<NodeId>,
    pub weight: f64,
}

impl Route {
    pub fn new(nodes: Vec<NodeId>, weight: f64) -> Route {
        Route {nodes, weight}
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn origin(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn destination(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// The nodes strictly between the origin and the destination.
    pub fn interior(&self) -> &[NodeId] {
        if self.nodes.len() < 2 {
            return &[];
        }
        &self.nodes[1..self.nodes.len() - 1]
    }

    pub fn is_simple(&self) -> bool {
        let unique: HashSet<&NodeId> = self.nodes.iter().collect();
        unique.len() == self.nodes.len()
    }
}


/// The `k` cheapest loopless routes from `origin` to `destination` by used weight, cheapest
/// first.  The returned routes of equal weight are ordered by their node id sequence.  When
/// more routes tie than fit in `k`, which of them are returned depends on the network's
/// insertion order, not on their node ids.  If there's no path, the result is empty.
pub fn k_shortest_paths(network: &RoadNetwork, origin: NodeId, destination: NodeId, k: usize)
                        -> Result<Vec<Route>> {
    k_shortest_paths_avoiding(network, origin, destination, k, &HashSet::new())
}

/// Like `k_shortest_paths`, but no route may pass through a node in `excluded`.
pub fn k_shortest_paths_avoiding(network: &RoadNetwork, origin: NodeId, destination: NodeId,
                                 k: usize, excluded: &HashSet<NodeId>) -> Result<Vec<Route>> {
    let source = network.node_index(origin).ok_or(ModelError::UnknownNode(origin))?;
    let target = network.node_index(destination).ok_or(ModelError::UnknownNode(destination))?;
    if k == 0 || excluded.contains(&origin) || excluded.contains(&destination) {
        return Ok(vec![]);
    }
    if source == target {
        return Ok(vec![Route::new(vec![origin], 0.)]);
    }

    let base_banned: HashSet<NodeIndex> = excluded.iter().
        filter_map(|id| network.node_index(*id)).collect();
    let first = match restricted_dijkstra(network, source, target, &base_banned,
                                          &HashSet::new()) {
        Some(path) => path,
        None => {
            log::debug!("no path from {} to {}", origin, destination);
            return Ok(vec![]);
        }
    };

    // Yen's algorithm
    let mut found = vec![first.clone()];
    let mut seen: HashSet<Vec<NodeIndex>> = HashSet::new();
    seen.insert(first);
    let mut candidates: Vec<Candidate> = vec![];
    while found.len() < k {
        let prev = found[found.len() - 1].clone();
        for ii in 0..prev.len() - 1 {
            let spur = prev[ii];
            let root = &prev[..=ii];
            // don't let the spur path re-create a route we already have
            let mut banned_links = HashSet::new();
            for path in &found {
                if path.len() > ii + 1 && &path[..=ii] == root {
                    banned_links.insert((path[ii], path[ii + 1]));
                }
            }
            // and keep it loopless
            let mut banned_nodes = base_banned.clone();
            banned_nodes.extend(root[..ii].iter().copied());

            if let Some(spur_path) = restricted_dijkstra(network, spur, target, &banned_nodes,
                                                         &banned_links) {
                let mut path = root[..ii].to_vec();
                path.extend(spur_path);
                if seen.insert(path.clone()) {
                    if let Some(candidate) = Candidate::new(network, path) {
                        candidates.push(candidate);
                    }
                }
            }
        }

        let best_idx = candidates.iter().enumerate().
            min_by(|(_, aa), (_, bb)| aa.order(bb)).
            map(|(idx, _)| idx);
        match best_idx {
            Some(idx) => found.push(candidates.swap_remove(idx).path),
            None => break,
        }
    }

    let mut routes: Vec<Candidate> = found.into_iter().
        filter_map(|path| Candidate::new(network, path)).collect();
    routes.sort_by(|aa, bb| aa.order(bb));
    Ok(routes.into_iter().map(|cc| Route::new(cc.ids, cc.weight)).collect())
}


struct Candidate {
    weight: f64,
    ids: Vec<NodeId>,
    path: Vec<NodeIndex>,
}

impl Candidate {
    fn new(network: &RoadNetwork, path: Vec<NodeIndex>) -> Option<Candidate> {
        let ids: Vec<NodeId> = path.iter().map(|idx| network.node_id(*idx)).collect();
        let weight = network.path_weight(&ids)?;
        Some(Candidate {weight, ids, path})
    }

    fn order(&self, other: &Candidate) -> Ordering {
        self.weight.partial_cmp(&other.weight).unwrap_or(Ordering::Equal).
            then_with(|| self.ids.cmp(&other.ids))
    }
}


/// Dijkstra from `source` to `target` over segments with a used weight, skipping banned nodes
/// and banned (from, to) links.  Parallel segments are interchangeable, so the cheapest of
/// them is what counts.  Based on the implementation in the petgraph library.
fn restricted_dijkstra(network: &RoadNetwork, source: NodeIndex, target: NodeIndex,
                       banned_nodes: &HashSet<NodeIndex>,
                       banned_links: &HashSet<(NodeIndex, NodeIndex)>)
                       -> Option<Vec<NodeIndex>> {
    if banned_nodes.contains(&source) || banned_nodes.contains(&target) {
        return None;
    }
    let graph = network.graph();
    let mut visited = graph.visit_map();
    let mut scores = HashMap::new();
    let mut predecessors = HashMap::new();
    scores.insert(source, 0.);

    let mut visit_next = BinaryHeap::new();
    visit_next.push(MinScored(0., source));
    while let Some(MinScored(node_score, node)) = visit_next.pop() {
        if visited.is_visited(&node) {
            continue;
        }
        if node == target {
            break;
        }
        for edge in graph.edges(node) {
            let next = edge.target();
            if visited.is_visited(&next) || banned_nodes.contains(&next) ||
               banned_links.contains(&(node, next)) {
                continue;
            }
            let cost = match edge.weight().used_weight {
                Some(cost) => cost,
                None => continue,
            };
            let next_score = node_score + cost;
            match scores.entry(next) {
                Occupied(ent) => {
                    if next_score < *ent.get() {
                        *ent.into_mut() = next_score;
                        visit_next.push(MinScored(next_score, next));
                        predecessors.insert(next, node);
                    }
                }
                Vacant(ent) => {
                    ent.insert(next_score);
                    visit_next.push(MinScored(next_score, next));
                    predecessors.insert(next, node);
                }
            }
        }
        visited.visit(node);
    }

    if !scores.contains_key(&target) {
        return None;
    }
    let mut path = vec![target];
    let mut node = target;
    while node != source {
        node = *predecessors.get(&node)?;
        path.push(node);
    }
    path.reverse();
    Some(path)
}


#[derive(Copy, Clone, Debug)]
pub struct MinScored<K, T>(pub K, pub T);

impl<K: PartialOrd, T> PartialEq for MinScored<K, T> {
    #[inline]
    fn eq(&self, other: &MinScored<K, T>) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: PartialOrd, T> Eq for MinScored<K, T> {}

impl<K: PartialOrd, T> PartialOrd for MinScored<K, T> {
    #[inline]
    fn partial_cmp(&self, other: &MinScored<K, T>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: PartialOrd, T> Ord for MinScored<K, T> {
    #[inline]
    fn cmp(&self, other: &MinScored<K, T>) -> Ordering {
        let a = &self.0;
        let b = &other.0;
        if a == b {
            Ordering::Equal
        } else if a < b {
            Ordering::Greater
        } else if a > b {
            Ordering::Less
        } else if a.ne(a) && b.ne(b) {
            // these are the NaN cases
            Ordering::Equal
        } else if a.ne(a) {
            // Order NaN less, so that it is last in the MinScore order
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}
