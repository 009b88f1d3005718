use std::collections::{BTreeMap, HashMap};

use itertools::iproduct;
use rayon::prelude::*;

use super::config::{ModelConfig, PointSource};
use super::edge_cost::{compute_weights, CostFactors};
use super::error::{ModelError, Result};
use super::overlay::RouteOverlayGraph;
use super::path_generator::{k_shortest_paths, Route};
use super::road_network::{NodeId, RoadNetwork};
use super::sampler::OdSampler;
use super::scenario::{ScenarioParameters, ScenarioResult};
use super::statistics::ScenarioStatistics;
use super::strategy::{compose_strategy_switch, Strategy};


/// Mean route node counts per OD pair on the unmodified network, for one set of points.
#[derive(Debug, Clone)]
struct BaseCase {
    points: Vec<NodeId>,
    num_of_paths: usize,
    mean_lengths: HashMap<(NodeId, NodeId), f64>,
}

/// Generates escape routes between origins and destinations on a road network, and
/// summarizes them.  The base network is never modified; each scenario weights its own
/// copies of it.
#[derive(Debug, Clone)]
pub struct RouteModel {
    base_network: RoadNetwork,
    undirected_network: RoadNetwork,
    sampler: Option<OdSampler>,
    points: Vec<NodeId>,
    base_case: Option<BaseCase>,
    // what the last scenario generated, for drawing
    last_routes: BTreeMap<NodeId, Vec<Route>>,
    last_overlays: Vec<RouteOverlayGraph>,
}

impl RouteModel {
    fn new(base_network: RoadNetwork, sampler: Option<OdSampler>, points: Vec<NodeId>)
           -> RouteModel {
        let undirected_network = base_network.to_undirected();
        RouteModel {
            base_network,
            undirected_network,
            sampler,
            points,
            base_case: None,
            last_routes: BTreeMap::new(),
            last_overlays: vec![],
        }
    }

    /// A model whose origins and destinations are always `points`.
    pub fn with_points(network: RoadNetwork, points: Vec<NodeId>) -> Result<RouteModel> {
        let mut unique = vec![];
        for point in points {
            if network.node_index(point).is_none() {
                return Err(ModelError::UnknownNode(point));
            }
            if !unique.contains(&point) {
                unique.push(point);
            }
        }
        Ok(RouteModel::new(network, None, unique))
    }

    /// A model that draws its origins and destinations with each scenario's seed.
    pub fn with_sampler(network: RoadNetwork, sampler: OdSampler) -> RouteModel {
        RouteModel::new(network, Some(sampler), vec![])
    }

    pub fn from_config(config: &ModelConfig) -> Result<RouteModel> {
        let network = RoadNetwork::from_graphml(&config.network_path)?;
        log::info!("loaded network with {} nodes and {} segments", network.num_nodes(),
                   network.num_segments());
        match &config.points {
            PointSource::Fixed(points) => RouteModel::with_points(network, points.clone()),
            PointSource::Sampled { regions, margin_fraction, max_attempts } => {
                let sampler = OdSampler::with_limits(&network, regions.clone(),
                                                     *margin_fraction, *max_attempts)?;
                Ok(RouteModel::with_sampler(network, sampler))
            }
        }
    }

    pub fn base_network(&self) -> &RoadNetwork {
        &self.base_network
    }

    /// The origins and destinations used by the last scenario.
    pub fn points(&self) -> &Vec<NodeId> {
        &self.points
    }

    /// The routes the last scenario generated, by origin.
    pub fn last_routes(&self) -> &BTreeMap<NodeId, Vec<Route>> {
        &self.last_routes
    }

    /// The overlay graphs of the last scenario, one per origin with any routes.
    pub fn last_overlays(&self) -> &Vec<RouteOverlayGraph> {
        &self.last_overlays
    }

    pub fn run_scenario(&mut self, params: &ScenarioParameters) -> Result<ScenarioResult> {
        params.validate()?;
        log::info!("running scenario {}", params.name);
        self.last_routes.clear();
        self.last_overlays.clear();

        if let Some(sampler) = &mut self.sampler {
            self.points = sampler.sample_points(params.seed, params.points_per_polygon)?.
                clone();
        }
        self.update_base_case(params.num_of_paths)?;

        let points = self.points.clone();
        let mut stats = ScenarioStatistics::new(params.num_of_paths);
        if params.rational {
            let network = self.weighted_copy(params.one_way_possible, &params.factors)?;
            for &origin in &points {
                let mut routes = vec![];
                for &destination in &points {
                    if origin == destination {
                        continue;
                    }
                    let od_routes = k_shortest_paths(&network, origin, destination,
                                                     params.num_of_paths)?;
                    self.record_od_routes(origin, destination, od_routes, &mut routes,
                                          &mut stats);
                }
                self.finish_origin(origin, routes, &mut stats);
            }
        } else {
            let start_network = self.strategy_copy(&params.start_strategy)?;
            let end_network = self.strategy_copy(&params.end_strategy)?;
            for &origin in &points {
                let mut routes = vec![];
                for &destination in &points {
                    if origin == destination {
                        continue;
                    }
                    let first_routes = k_shortest_paths(&start_network, origin, destination,
                                                        params.num_of_paths)?;
                    let mut od_routes = vec![];
                    for route in &first_routes {
                        od_routes.extend(compose_strategy_switch(
                            route, params.strategy_change_percentage, &start_network,
                            &end_network, params.num_of_paths)?);
                    }
                    self.record_od_routes(origin, destination, od_routes, &mut routes,
                                          &mut stats);
                }
                self.finish_origin(origin, routes, &mut stats);
            }
        }

        let result = stats.summarize();
        log::info!("scenario {}: {} of {} origins had routes", params.name,
                   stats.num_origins_with_routes(), self.points.len());
        Ok(result)
    }

    fn weighted_copy(&self, undirected: bool, factors: &CostFactors) -> Result<RoadNetwork> {
        let mut network = if undirected {
            self.undirected_network.clone()
        } else {
            self.base_network.clone()
        };
        compute_weights(&mut network, factors)?;
        Ok(network)
    }

    fn strategy_copy(&self, strategy: &Strategy) -> Result<RoadNetwork> {
        log::debug!("weighting a copy for strategy {}", strategy.name);
        self.weighted_copy(strategy.uses_undirected_graph, &strategy.factors)
    }

    fn record_od_routes(&self, origin: NodeId, destination: NodeId, od_routes: Vec<Route>,
                        origin_routes: &mut Vec<Route>, stats: &mut ScenarioStatistics) {
        if od_routes.is_empty() {
            log::debug!("no routes from {} to {}", origin, destination);
            return;
        }
        let base_mean = self.base_case.as_ref().
            and_then(|bc| bc.mean_lengths.get(&(origin, destination)));
        if let Some(base_mean) = base_mean {
            let mean_len = od_routes.iter().map(|rr| rr.len()).sum::<usize>() as f64 /
                od_routes.len() as f64;
            stats.add_path_inflation(mean_len / base_mean);
        }
        origin_routes.extend(od_routes);
    }

    fn finish_origin(&mut self, origin: NodeId, routes: Vec<Route>,
                     stats: &mut ScenarioStatistics) {
        let overlay = stats.add_origin(origin, &routes);
        if !overlay.is_empty() {
            self.last_overlays.push(overlay);
        }
        self.last_routes.insert(origin, routes);
    }

    /// Computes the base-case route lengths, unless they're already known for these points.
    fn update_base_case(&mut self, num_of_paths: usize) -> Result<()> {
        if let Some(base_case) = &self.base_case {
            if base_case.points == self.points && base_case.num_of_paths == num_of_paths {
                return Ok(());
            }
        }
        log::debug!("computing the base case for {} points", self.points.len());
        let network = self.weighted_copy(false, &CostFactors::neutral())?;
        let mut mean_lengths = HashMap::new();
        for (&origin, &destination) in iproduct!(&self.points, &self.points) {
            if origin == destination {
                continue;
            }
            let routes = k_shortest_paths(&network, origin, destination, num_of_paths)?;
            if routes.is_empty() {
                continue;
            }
            let total: usize = routes.iter().map(|rr| rr.len()).sum();
            mean_lengths.insert((origin, destination), total as f64 / routes.len() as f64);
        }
        self.base_case = Some(BaseCase {
            points: self.points.clone(),
            num_of_paths,
            mean_lengths,
        });
        Ok(())
    }
}


/// Runs each scenario on its own copy of `model`, in parallel.  The results are in the same
/// order as `scenarios`; a failed scenario doesn't affect the others.
pub fn run_scenarios(model: &RouteModel, scenarios: &[ScenarioParameters])
                     -> Vec<Result<ScenarioResult>> {
    scenarios.par_iter().map(|params| {
        let mut model = model.clone();
        model.run_scenario(params)
    }).collect()
}
