use std::collections::HashSet;

use yaml_rust::Yaml;

use super::config_utils::yaml_opt_bool;
use super::edge_cost::{CostFactors, TrafficAvoidance};
use super::error::{ModelError, Result};
use super::path_generator::{k_shortest_paths_avoiding, Route};
use super::road_network::{NodeId, RoadNetwork};


/// A named set of behavioural preferences a fugitive can follow.
#[derive(PartialEq, Debug, Clone)]
pub struct Strategy {
    pub name: String,
    pub factors: CostFactors,
    // if true, one-way roads may be driven in either direction
    pub uses_undirected_graph: bool,
}

impl Strategy {
    pub fn neutral() -> Strategy {
        Strategy {
            name: String::from("neutral"),
            factors: CostFactors::neutral(),
            uses_undirected_graph: false,
        }
    }

    /// Keeps away from obstacles and one-way roads, and sticks to residential streets.
    pub fn cautious() -> Strategy {
        let mut factors = CostFactors::neutral();
        factors.oa = 5.;
        factors.rp = 0.1;
        factors.ow = 5.;
        Strategy {
            name: String::from("cautious"),
            factors,
            uses_undirected_graph: false,
        }
    }

    /// Goes for fast, wide roads, but stays off the busiest ones.
    pub fn hasty() -> Strategy {
        let mut factors = CostFactors::neutral();
        factors.lp = 0.1;
        factors.hs = 5.;
        factors.ta = TrafficAvoidance::Scaled { ta: 5., ta1: 2., ta2: 1.7, ta3: 1.3 };
        Strategy {
            name: String::from("hasty"),
            factors,
            uses_undirected_graph: false,
        }
    }

    pub fn preset(name: &str) -> Option<Strategy> {
        match name {
            "neutral" => Some(Strategy::neutral()),
            "cautious" => Some(Strategy::cautious()),
            "hasty" => Some(Strategy::hasty()),
            _ => None,
        }
    }

    /// Either the name of a preset, or a map with an optional `name`, the factors, and an
    /// optional `undirected` flag.
    pub fn from_yaml(yaml_cfg: &Yaml) -> Result<Strategy> {
        if let Some(name) = yaml_cfg.as_str() {
            return Strategy::preset(name).ok_or_else(||
                ModelError::Config(format!("unknown strategy \"{}\"", name)));
        }
        if yaml_cfg.as_hash().is_none() {
            return Err(ModelError::Config(
                String::from("a strategy must be a preset name or a map of factors")));
        }
        let name = yaml_cfg["name"].as_str().unwrap_or("custom");
        Ok(Strategy {
            name: String::from(name),
            factors: CostFactors::from_yaml(yaml_cfg)?,
            uses_undirected_graph: yaml_opt_bool(yaml_cfg, "undirected")?.unwrap_or(false),
        })
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::neutral()
    }
}


/// The position along a route of `len` nodes where the fugitive re-plans.
pub fn switch_index(len: usize, change_fraction: f64) -> usize {
    if len == 0 {
        return 0;
    }
    let idx = (len as f64 * change_fraction).floor() as usize;
    return idx.min(len - 1);
}

/// Re-plans `route` part of the way along it.
///
/// `route` was generated on `first_network`.  The fugitive keeps the first `i` nodes, where
/// `i = floor(len * change_fraction)` clamped to the last node, then takes each of the `k`
/// best continuations from `route[i]` to the destination on `second_network`.  Continuations
/// may not revisit the kept nodes.  Each composite's weight is the kept part's weight on the
/// first network plus the continuation's weight on the second.
pub fn compose_strategy_switch(route: &Route, change_fraction: f64,
                               first_network: &RoadNetwork, second_network: &RoadNetwork,
                               k: usize) -> Result<Vec<Route>> {
    if !(0. ..=1.).contains(&change_fraction) {
        return Err(ModelError::InvalidParameter {
            name: "strategy_change_percentage",
            value: change_fraction,
            reason: "must be between 0 and 1",
        });
    }
    let destination = match route.destination() {
        Some(dest) => dest,
        None => return Ok(vec![]),
    };
    let switch_idx = switch_index(route.len(), change_fraction);
    let switch_node = route.nodes[switch_idx];
    let prefix = &route.nodes[..switch_idx];
    let prefix_weight = match first_network.path_weight(&route.nodes[..=switch_idx]) {
        Some(ww) => ww,
        None => {
            log::warn!("route {:?} has no weight on its own network", route.nodes);
            return Ok(vec![]);
        }
    };

    let excluded: HashSet<NodeId> = prefix.iter().copied().collect();
    let continuations = k_shortest_paths_avoiding(second_network, switch_node, destination, k,
                                                  &excluded)?;
    let composites = continuations.into_iter().map(|cont| {
        let mut nodes = prefix.to_vec();
        nodes.extend(cont.nodes);
        Route::new(nodes, prefix_weight + cont.weight)
    }).collect();
    Ok(composites)
}


#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use super::super::edge_cost::compute_weights;
    use super::super::path_generator::k_shortest_paths;
    use super::super::test_utils::{diamond_network, grid_network};

    fn weighted(mut network: RoadNetwork, factors: &CostFactors) -> RoadNetwork {
        compute_weights(&mut network, factors).unwrap();
        network
    }

    #[test]
    fn test_switch_index() {
        assert_eq!(switch_index(4, 0.), 0);
        assert_eq!(switch_index(4, 0.5), 2);
        assert_eq!(switch_index(4, 0.99), 3);
        // the end of the route is as far as the switch can go
        assert_eq!(switch_index(4, 1.), 3);
        assert_eq!(switch_index(5, 0.3), 1);
        assert_eq!(switch_index(0, 0.5), 0);
    }

    #[test]
    fn test_full_switch_keeps_route() {
        let network = weighted(diamond_network(), &CostFactors::neutral());
        let route = k_shortest_paths(&network, 1, 4, 1).unwrap().remove(0);
        let composites = compose_strategy_switch(&route, 1., &network, &network, 3).unwrap();
        assert_eq!(composites.len(), 1);
        assert_eq!(composites[0].nodes, route.nodes);
        assert_relative_eq!(composites[0].weight, route.weight);
    }

    #[test]
    fn test_immediate_switch_is_second_strategy() {
        let first = weighted(diamond_network(), &CostFactors::neutral());
        let mut factors = CostFactors::neutral();
        factors.rp = 2.;
        let second = weighted(diamond_network(), &factors);

        let route = k_shortest_paths(&first, 1, 4, 1).unwrap().remove(0);
        assert_eq!(route.nodes, vec![1, 3, 4]);
        let composites = compose_strategy_switch(&route, 0., &first, &second, 2).unwrap();
        let pure_second = k_shortest_paths(&second, 1, 4, 2).unwrap();
        assert_eq!(composites, pure_second);
    }

    #[test]
    fn test_prefix_is_kept() {
        let first = weighted(grid_network(4), &CostFactors::neutral());
        let mut factors = CostFactors::neutral();
        factors.sr = 0.5;
        factors.ow = 3.;
        let second = weighted(grid_network(4).to_undirected(), &factors);

        let routes = k_shortest_paths(&first, 0, 15, 5).unwrap();
        for fraction in &[0., 0.2, 0.5, 0.7, 1.] {
            for route in &routes {
                let idx = switch_index(route.len(), *fraction);
                let composites = compose_strategy_switch(route, *fraction, &first, &second, 5).
                    unwrap();
                assert!(!composites.is_empty());
                assert!(composites.len() <= 5);
                for composite in &composites {
                    assert_eq!(&composite.nodes[..idx], &route.nodes[..idx]);
                    assert_eq!(composite.nodes[idx], route.nodes[idx]);
                    assert_eq!(composite.destination(), Some(15));
                    assert!(composite.is_simple());
                }
            }
        }
    }

    #[test]
    fn test_composite_weight() {
        let first = weighted(diamond_network(), &CostFactors::neutral());
        let mut factors = CostFactors::neutral();
        factors.rp = 2.;
        let second = weighted(diamond_network(), &factors);

        // switch at C, halfway along [A, C, D]
        let route = Route::new(vec![1, 3, 4], 10. / 3.);
        let composites = compose_strategy_switch(&route, 0.5, &first, &second, 2).unwrap();
        assert_eq!(composites.len(), 1);
        assert_eq!(composites[0].nodes, vec![1, 3, 4]);
        // A-C on the first network, C-D on the second
        assert_relative_eq!(composites[0].weight, 5. / 3. + 10. / 3., epsilon = 1e-9);
    }

    #[test]
    fn test_bad_fraction() {
        let network = weighted(diamond_network(), &CostFactors::neutral());
        let route = Route::new(vec![1, 3, 4], 10. / 3.);
        assert!(compose_strategy_switch(&route, 1.5, &network, &network, 2).is_err());
        assert!(compose_strategy_switch(&route, -0.1, &network, &network, 2).is_err());
    }

    #[test]
    fn test_presets() {
        let cautious = Strategy::preset("cautious").unwrap();
        assert_eq!(cautious.factors.oa, 5.);
        assert_eq!(cautious.factors.rp, 0.1);
        assert_eq!(cautious.factors.ow, 5.);
        assert!(!cautious.uses_undirected_graph);
        let hasty = Strategy::preset("hasty").unwrap();
        assert_eq!(hasty.factors.hs, 5.);
        assert!(Strategy::preset("reckless").is_none());
        for strategy in &[Strategy::neutral(), cautious, hasty] {
            strategy.factors.validate().unwrap();
        }
    }

    #[test]
    fn test_strategy_from_yaml() {
        use yaml_rust::YamlLoader;
        let docs = YamlLoader::load_from_str("cautious").unwrap();
        assert_eq!(Strategy::from_yaml(&docs[0]).unwrap(), Strategy::cautious());

        let docs = YamlLoader::load_from_str("name: reckless\nOW: 0.2\nundirected: true").
            unwrap();
        let strategy = Strategy::from_yaml(&docs[0]).unwrap();
        assert_eq!(strategy.name, "reckless");
        assert_eq!(strategy.factors.ow, 0.2);
        assert!(strategy.uses_undirected_graph);

        let docs = YamlLoader::load_from_str("sneaky").unwrap();
        assert!(Strategy::from_yaml(&docs[0]).is_err());
    }
}
