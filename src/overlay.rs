use std::collections::{BTreeMap, HashMap, VecDeque};

use petgraph::graphmap::UnGraphMap;

use super::path_generator::Route;
use super::road_network::NodeId;


/// The routes generated from one origin, folded into an undirected graph.  Each edge counts
/// how many times the routes travelled between its two nodes, in either direction.
#[derive(Debug, Clone)]
pub struct RouteOverlayGraph {
    origin: NodeId,
    graph: UnGraphMap<NodeId, u32>,
}

impl RouteOverlayGraph {
    pub fn new(origin: NodeId) -> RouteOverlayGraph {
        RouteOverlayGraph {
            origin,
            graph: UnGraphMap::new(),
        }
    }

    pub fn from_routes<'a, II>(origin: NodeId, routes: II) -> RouteOverlayGraph
        where II: IntoIterator<Item = &'a Route>
    {
        let mut overlay = RouteOverlayGraph::new(origin);
        for route in routes {
            overlay.add_route(route);
        }
        return overlay;
    }

    pub fn add_route(&mut self, route: &Route) {
        for node in &route.nodes {
            self.graph.add_node(*node);
        }
        for pair in route.nodes.windows(2) {
            match self.graph.edge_weight_mut(pair[0], pair[1]) {
                Some(count) => *count += 1,
                None => {
                    self.graph.add_edge(pair[0], pair[1], 1);
                }
            }
        }
    }

    pub fn origin(&self) -> NodeId {
        self.origin
    }

    pub fn graph(&self) -> &UnGraphMap<NodeId, u32> {
        &self.graph
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// How many times the routes travelled between `aa` and `bb`.
    pub fn count(&self, aa: NodeId, bb: NodeId) -> Option<u32> {
        self.graph.edge_weight(aa, bb).copied()
    }

    /// Each node's degree over `N - 1`.  A lone node scores 1.
    pub fn degree_centrality(&self) -> BTreeMap<NodeId, f64> {
        let num_nodes = self.graph.node_count();
        if num_nodes <= 1 {
            return self.graph.nodes().map(|node| (node, 1.)).collect();
        }
        let scale = 1. / (num_nodes - 1) as f64;
        self.graph.nodes().
            map(|node| (node, self.graph.neighbors(node).count() as f64 * scale)).
            collect()
    }

    /// Normalized betweenness centrality, ignoring the counts: for each node, the fraction of
    /// shortest paths between other pairs of nodes that pass through it.
    pub fn betweenness_centrality(&self) -> BTreeMap<NodeId, f64> {
        let nodes: Vec<NodeId> = self.graph.nodes().collect();
        let num_nodes = nodes.len();
        let node_idxs: HashMap<NodeId, usize> = nodes.iter().enumerate().
            map(|(idx, node)| (*node, idx)).collect();
        let neighbours: Vec<Vec<usize>> = nodes.iter().
            map(|node| self.graph.neighbors(*node).map(|nbr| node_idxs[&nbr]).collect()).
            collect();

        // Brandes' algorithm, with a breadth-first search from each node
        let mut betweenness = vec![0.; num_nodes];
        for source in 0..num_nodes {
            let mut stack = Vec::with_capacity(num_nodes);
            let mut preds: Vec<Vec<usize>> = vec![vec![]; num_nodes];
            let mut num_paths = vec![0.; num_nodes];
            let mut dists: Vec<Option<usize>> = vec![None; num_nodes];
            num_paths[source] = 1.;
            dists[source] = Some(0);
            let mut queue = VecDeque::new();
            queue.push_back(source);
            while let Some(node) = queue.pop_front() {
                stack.push(node);
                let node_dist = dists[node].unwrap_or(0);
                for &nbr in &neighbours[node] {
                    if dists[nbr].is_none() {
                        dists[nbr] = Some(node_dist + 1);
                        queue.push_back(nbr);
                    }
                    if dists[nbr] == Some(node_dist + 1) {
                        num_paths[nbr] += num_paths[node];
                        preds[nbr].push(node);
                    }
                }
            }

            let mut dependencies = vec![0.; num_nodes];
            while let Some(node) = stack.pop() {
                for &pred in &preds[node] {
                    dependencies[pred] +=
                        num_paths[pred] / num_paths[node] * (1. + dependencies[node]);
                }
                if node != source {
                    betweenness[node] += dependencies[node];
                }
            }
        }

        // each pair was counted from both ends, which the normalization accounts for
        if num_nodes > 2 {
            let scale = 1. / ((num_nodes - 1) * (num_nodes - 2)) as f64;
            for value in betweenness.iter_mut() {
                *value *= scale;
            }
        }
        nodes.into_iter().zip(betweenness).collect()
    }
}


#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn route(nodes: &[NodeId]) -> Route {
        Route::new(nodes.to_vec(), nodes.len() as f64)
    }

    #[test]
    fn test_counts_accumulate() {
        let routes = vec![route(&[1, 2, 3]), route(&[1, 2, 4]), route(&[4, 2, 1])];
        let overlay = RouteOverlayGraph::from_routes(1, &routes);
        assert_eq!(overlay.origin(), 1);
        assert_eq!(overlay.num_nodes(), 4);
        assert_eq!(overlay.num_edges(), 3);
        // both directions count towards the same edge
        assert_eq!(overlay.count(1, 2), Some(3));
        assert_eq!(overlay.count(2, 1), Some(3));
        assert_eq!(overlay.count(2, 4), Some(2));
        assert_eq!(overlay.count(2, 3), Some(1));
        assert_eq!(overlay.count(1, 3), None);
    }

    #[test]
    fn test_path_centralities() {
        let overlay = RouteOverlayGraph::from_routes(1, &[route(&[1, 2, 3])]);
        let betweenness = overlay.betweenness_centrality();
        assert_relative_eq!(betweenness[&1], 0.);
        assert_relative_eq!(betweenness[&2], 1.);
        assert_relative_eq!(betweenness[&3], 0.);

        let degree = overlay.degree_centrality();
        assert_relative_eq!(degree[&1], 0.5);
        assert_relative_eq!(degree[&2], 1.);
        assert_relative_eq!(degree[&3], 0.5);
    }

    #[test]
    fn test_star_and_cycle_betweenness() {
        // a star with centre 0
        let routes = vec![route(&[1, 0, 2]), route(&[3, 0, 4])];
        let betweenness = RouteOverlayGraph::from_routes(1, &routes).betweenness_centrality();
        assert_relative_eq!(betweenness[&0], 1.);
        assert_relative_eq!(betweenness[&3], 0.);

        // a 4-cycle: each node is on one of the two shortest paths between its neighbours
        let routes = vec![route(&[1, 2, 3]), route(&[1, 4, 3])];
        let betweenness = RouteOverlayGraph::from_routes(1, &routes).betweenness_centrality();
        for node in 1..5 {
            assert_relative_eq!(betweenness[&node], 1. / 6.);
        }
    }

    #[test]
    fn test_small_overlays() {
        let empty = RouteOverlayGraph::new(7);
        assert!(empty.is_empty());
        assert!(empty.degree_centrality().is_empty());
        assert!(empty.betweenness_centrality().is_empty());

        let single = RouteOverlayGraph::from_routes(7, &[route(&[7])]);
        assert_eq!(single.degree_centrality()[&7], 1.);
        assert_eq!(single.betweenness_centrality()[&7], 0.);

        let pair = RouteOverlayGraph::from_routes(7, &[route(&[7, 8])]);
        assert_eq!(pair.degree_centrality()[&8], 1.);
        assert_eq!(pair.betweenness_centrality()[&8], 0.);
    }
}
