// Network-level statistics over the routes of one scenario.
use std::collections::{BTreeMap, HashSet};

use ndarray::Array1;

use super::overlay::RouteOverlayGraph;
use super::path_generator::Route;
use super::road_network::NodeId;
use super::scenario::ScenarioResult;


/// The mean and population variance of `values`, or zeros if there are none.
pub fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0., 0.);
    }
    let values = Array1::from(values.to_vec());
    let mean = values.mean().unwrap_or(0.);
    return (mean, values.var(0.));
}

/// The mean number of nodes in `routes`, or None if there are none.
pub fn continuity(routes: &[Route]) -> Option<f64> {
    if routes.is_empty() {
        return None;
    }
    let total: usize = routes.iter().map(|rr| rr.len()).sum();
    Some(total as f64 / routes.len() as f64)
}

/// For each route, how many of the other routes share at least one interior node with it.
/// Origins and destinations don't count, since all of one origin's routes share it.
pub fn connectivity(routes: &[Route]) -> Vec<f64> {
    let interiors: Vec<HashSet<NodeId>> = routes.iter().
        map(|rr| rr.interior().iter().copied().collect()).
        collect();
    interiors.iter().enumerate().map(|(ii, interior)| {
        interiors.iter().enumerate().
            filter(|(jj, other)| *jj != ii && !interior.is_disjoint(other)).
            count() as f64
    }).collect()
}

/// For each node on any of `routes`, the number of routes through it over `num_of_paths`.
pub fn node_frequency(routes: &[Route], num_of_paths: usize) -> BTreeMap<NodeId, f64> {
    let mut counts: BTreeMap<NodeId, usize> = BTreeMap::new();
    for route in routes {
        let unique: HashSet<&NodeId> = route.nodes.iter().collect();
        for node in unique {
            *counts.entry(*node).or_insert(0) += 1;
        }
    }
    let scale = if num_of_paths > 0 {1. / num_of_paths as f64} else {0.};
    counts.into_iter().map(|(node, count)| (node, count as f64 * scale)).collect()
}


/// Collects per-origin statistics over a scenario, then summarizes them.
#[derive(Debug, Clone, Default)]
pub struct ScenarioStatistics {
    num_of_paths: usize,
    num_of_nodes: usize,
    num_of_edges: usize,
    continuities: Vec<f64>,
    connectivities: Vec<f64>,
    node_frequencies: Vec<f64>,
    degree_means: Vec<f64>,
    degree_vars: Vec<f64>,
    betweenness_means: Vec<f64>,
    betweenness_vars: Vec<f64>,
    path_inflations: Vec<f64>,
}

impl ScenarioStatistics {
    pub fn new(num_of_paths: usize) -> ScenarioStatistics {
        ScenarioStatistics {
            num_of_paths,
            ..Default::default()
        }
    }

    /// Adds all the routes generated from `origin`, and returns their overlay graph.
    pub fn add_origin(&mut self, origin: NodeId, routes: &[Route]) -> RouteOverlayGraph {
        let overlay = RouteOverlayGraph::from_routes(origin, routes);
        if routes.is_empty() {
            log::debug!("no routes from origin {}", origin);
            return overlay;
        }

        self.num_of_nodes += overlay.num_nodes();
        self.num_of_edges += overlay.num_edges();
        if let Some(cont) = continuity(routes) {
            self.continuities.push(cont);
        }
        self.connectivities.extend(connectivity(routes));
        self.node_frequencies.extend(node_frequency(routes, self.num_of_paths).values());

        let degrees: Vec<f64> = overlay.degree_centrality().values().copied().collect();
        let (mean, var) = mean_and_variance(&degrees);
        self.degree_means.push(mean);
        self.degree_vars.push(var);
        let betweennesses: Vec<f64> = overlay.betweenness_centrality().values().copied().
            collect();
        let (mean, var) = mean_and_variance(&betweennesses);
        self.betweenness_means.push(mean);
        self.betweenness_vars.push(var);
        return overlay;
    }

    /// Records how much longer the routes between one OD pair are than in the base case.
    pub fn add_path_inflation(&mut self, inflation: f64) {
        self.path_inflations.push(inflation);
    }

    pub fn num_origins_with_routes(&self) -> usize {
        self.continuities.len()
    }

    pub fn summarize(&self) -> ScenarioResult {
        let (continuity_mean, continuity_vars) = mean_and_variance(&self.continuities);
        let (connectivity_mean, connectivity_vars) = mean_and_variance(&self.connectivities);
        let (node_frequency_mean, node_frequency_var) =
            mean_and_variance(&self.node_frequencies);
        let (path_inflation_mean, path_inflation_var) =
            mean_and_variance(&self.path_inflations);
        ScenarioResult {
            num_of_nodes: self.num_of_nodes,
            num_of_edges: self.num_of_edges,
            continuity_mean,
            continuity_vars,
            connectivity_mean,
            connectivity_vars,
            node_frequency_mean,
            node_frequency_var,
            degree_centrality_mean: mean_and_variance(&self.degree_means).0,
            degree_centrality_var: mean_and_variance(&self.degree_vars).0,
            betweenness_centrality_mean: mean_and_variance(&self.betweenness_means).0,
            betweenness_centrality_var: mean_and_variance(&self.betweenness_vars).0,
            path_inflation_mean,
            path_inflation_var,
        }
    }
}
