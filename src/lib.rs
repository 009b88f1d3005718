// imports of other modules from this crate
mod error;
pub use error::{ModelError, Result};

mod geometry;
pub use geometry::{polygon_from_points, Point2d};

mod config_utils;

mod road_network;
pub use road_network::{NodeId, RoadNetwork, RoadNode, RoadSegment, SpeedSpec};

mod edge_cost;
pub use edge_cost::{compute_weights, segment_cost, CostFactors, TrafficAvoidance};

mod path_generator;
pub use path_generator::{k_shortest_paths, k_shortest_paths_avoiding, Route};

mod strategy;
pub use strategy::{compose_strategy_switch, switch_index, Strategy};

mod overlay;
pub use overlay::RouteOverlayGraph;

mod statistics;
pub use statistics::{mean_and_variance, ScenarioStatistics};

mod sampler;
pub use sampler::OdSampler;

mod scenario;
pub use scenario::{csv_header, write_results_csv, ScenarioParameters, ScenarioResult,
                   RESULT_NAMES};

mod config;
pub use config::{ModelConfig, PointSource};

mod route_model;
pub use route_model::{run_scenarios, RouteModel};

#[cfg(test)]
mod test_utils;
