use std::collections::BTreeMap;
use std::path::Path;

use yaml_rust::Yaml;

use super::config_utils::{yaml_opt_bool, yaml_opt_f64, yaml_opt_u64};
use super::edge_cost::CostFactors;
use super::error::{ModelError, Result};
use super::strategy::Strategy;


pub static DEFAULT_NUM_OF_PATHS: usize = 5;
pub static DEFAULT_SEED: u64 = 1000;


/// Everything that varies between scenarios.
#[derive(PartialEq, Debug, Clone)]
pub struct ScenarioParameters {
    pub name: String,
    // used when the fugitive is rational
    pub factors: CostFactors,
    // if false, the fugitive switches from start_strategy to end_strategy along the way
    pub rational: bool,
    // whether a rational fugitive may drive the wrong way down one-way roads
    pub one_way_possible: bool,
    pub start_strategy: Strategy,
    pub end_strategy: Strategy,
    // how far along each route the switch happens, in [0, 1]
    pub strategy_change_percentage: f64,
    pub num_of_paths: usize,
    pub seed: u64,
    pub points_per_polygon: usize,
}

impl Default for ScenarioParameters {
    fn default() -> Self {
        ScenarioParameters {
            name: String::from("default"),
            factors: CostFactors::neutral(),
            rational: true,
            one_way_possible: false,
            start_strategy: Strategy::neutral(),
            end_strategy: Strategy::neutral(),
            strategy_change_percentage: 1.,
            num_of_paths: DEFAULT_NUM_OF_PATHS,
            seed: DEFAULT_SEED,
            points_per_polygon: 1,
        }
    }
}

impl ScenarioParameters {
    /// Reads a scenario from a yaml map.  The multipliers (CA, OA, ...) sit at the top level;
    /// any key that's left out takes its default.
    pub fn from_yaml(yaml_cfg: &Yaml) -> Result<ScenarioParameters> {
        if yaml_cfg.as_hash().is_none() {
            return Err(ModelError::Config(String::from("a scenario must be a map")));
        }
        let defaults = ScenarioParameters::default();
        let name = match yaml_cfg["name"].as_str() {
            Some(name) => String::from(name),
            None => defaults.name,
        };
        let start_strategy = match &yaml_cfg["start_strategy"] {
            Yaml::BadValue => defaults.start_strategy,
            strategy => Strategy::from_yaml(strategy)?,
        };
        let end_strategy = match &yaml_cfg["end_strategy"] {
            Yaml::BadValue => defaults.end_strategy,
            strategy => Strategy::from_yaml(strategy)?,
        };
        let params = ScenarioParameters {
            name,
            factors: CostFactors::from_yaml(yaml_cfg)?,
            rational: yaml_opt_bool(yaml_cfg, "rational")?.unwrap_or(defaults.rational),
            one_way_possible: yaml_opt_bool(yaml_cfg, "one_way_possible")?.
                unwrap_or(defaults.one_way_possible),
            start_strategy,
            end_strategy,
            strategy_change_percentage: yaml_opt_f64(yaml_cfg, "strategy_change_percentage")?.
                unwrap_or(defaults.strategy_change_percentage),
            num_of_paths: yaml_opt_u64(yaml_cfg, "num_of_paths")?.
                map_or(defaults.num_of_paths, |nn| nn as usize),
            seed: yaml_opt_u64(yaml_cfg, "seed")?.unwrap_or(defaults.seed),
            points_per_polygon: yaml_opt_u64(yaml_cfg, "points_per_polygon")?.
                map_or(defaults.points_per_polygon, |nn| nn as usize),
        };
        Ok(params)
    }

    /// Checks everything that can be checked before touching the network.
    pub fn validate(&self) -> Result<()> {
        self.factors.validate()?;
        self.start_strategy.factors.validate()?;
        self.end_strategy.factors.validate()?;
        if self.num_of_paths == 0 {
            return Err(ModelError::InvalidParameter {
                name: "num_of_paths",
                value: 0.,
                reason: "at least one path per OD pair is needed",
            });
        }
        if !(0. ..=1.).contains(&self.strategy_change_percentage) {
            return Err(ModelError::InvalidParameter {
                name: "strategy_change_percentage",
                value: self.strategy_change_percentage,
                reason: "must be between 0 and 1",
            });
        }
        if self.points_per_polygon == 0 {
            return Err(ModelError::InvalidParameter {
                name: "points_per_polygon",
                value: 0.,
                reason: "at least one point per polygon is needed",
            });
        }
        Ok(())
    }
}


/// The names of the statistics, in the order they're written out.
pub static RESULT_NAMES: [&str; 14] = [
    "num_of_nodes",
    "num_of_edges",
    "continuity_mean",
    "continuity_vars",
    "connectivity_mean",
    "connectivity_vars",
    "node_frequency_mean",
    "node_frequency_var",
    "degree_centrality_mean",
    "degree_centrality_var",
    "betweenness_centrality_mean",
    "betweenness_centrality_var",
    "path_inflation_mean",
    "path_inflation_var",
];

/// The statistics of one scenario.
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct ScenarioResult {
    pub num_of_nodes: usize,
    pub num_of_edges: usize,
    pub continuity_mean: f64,
    pub continuity_vars: f64,
    pub connectivity_mean: f64,
    pub connectivity_vars: f64,
    pub node_frequency_mean: f64,
    pub node_frequency_var: f64,
    pub degree_centrality_mean: f64,
    pub degree_centrality_var: f64,
    pub betweenness_centrality_mean: f64,
    pub betweenness_centrality_var: f64,
    pub path_inflation_mean: f64,
    pub path_inflation_var: f64,
}

impl ScenarioResult {
    /// The values, in the same order as `RESULT_NAMES`.
    pub fn values(&self) -> [f64; 14] {
        [
            self.num_of_nodes as f64,
            self.num_of_edges as f64,
            self.continuity_mean,
            self.continuity_vars,
            self.connectivity_mean,
            self.connectivity_vars,
            self.node_frequency_mean,
            self.node_frequency_var,
            self.degree_centrality_mean,
            self.degree_centrality_var,
            self.betweenness_centrality_mean,
            self.betweenness_centrality_var,
            self.path_inflation_mean,
            self.path_inflation_var,
        ]
    }

    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        RESULT_NAMES.iter().copied().zip(self.values().iter().copied()).collect()
    }

    /// The row for this result under `csv_header()`.
    pub fn csv_record(&self, scenario_name: &str) -> Vec<String> {
        let mut record = vec![String::from(scenario_name)];
        record.extend(self.values().iter().map(|vv| vv.to_string()));
        return record;
    }
}

pub fn csv_header() -> Vec<&'static str> {
    let mut header = vec!["scenario"];
    header.extend(RESULT_NAMES.iter());
    return header;
}

/// Writes one row per (scenario name, result).
pub fn write_results_csv(path: &Path, results: &[(String, ScenarioResult)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(csv_header())?;
    for (name, result) in results {
        writer.write_record(result.csv_record(name))?;
    }
    writer.flush()?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::super::edge_cost::TrafficAvoidance;
    use tempfile::tempdir;
    use yaml_rust::YamlLoader;

    #[test]
    fn test_defaults() {
        let params = ScenarioParameters::default();
        assert!(params.rational);
        assert_eq!(params.num_of_paths, 5);
        assert_eq!(params.factors, CostFactors::neutral());
        params.validate().unwrap();
    }

    #[test]
    fn test_validate() {
        let mut params = ScenarioParameters::default();
        params.num_of_paths = 0;
        assert!(params.validate().is_err());

        let mut params = ScenarioParameters::default();
        params.strategy_change_percentage = 1.2;
        assert!(params.validate().is_err());

        let mut params = ScenarioParameters::default();
        params.factors.oa = -0.5;
        match params.validate() {
            Err(ModelError::InvalidParameter { name, .. }) => assert_eq!(name, "OA"),
            other => panic!("expected invalid parameter, got {:?}", other),
        }

        let mut params = ScenarioParameters::default();
        params.end_strategy.factors.sr = std::f64::NAN;
        assert!(params.validate().is_err());

        let mut params = ScenarioParameters::default();
        params.points_per_polygon = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_from_yaml() {
        let text = "
name: switcher
rational: false
CA: 3
TA: 2
start_strategy: cautious
end_strategy:
    HS: 4
    undirected: true
strategy_change_percentage: 0.5
num_of_paths: 3
seed: 12
";
        let docs = YamlLoader::load_from_str(text).unwrap();
        let params = ScenarioParameters::from_yaml(&docs[0]).unwrap();
        assert_eq!(params.name, "switcher");
        assert!(!params.rational);
        assert!(!params.one_way_possible);
        assert_eq!(params.factors.ca, 3.);
        assert_eq!(params.factors.ta, TrafficAvoidance::Uniform(2.));
        assert_eq!(params.start_strategy, Strategy::cautious());
        assert_eq!(params.end_strategy.factors.hs, 4.);
        assert!(params.end_strategy.uses_undirected_graph);
        assert_eq!(params.strategy_change_percentage, 0.5);
        assert_eq!(params.num_of_paths, 3);
        assert_eq!(params.seed, 12);
        assert_eq!(params.points_per_polygon, 1);

        let docs = YamlLoader::load_from_str("num_of_paths: many").unwrap();
        assert!(ScenarioParameters::from_yaml(&docs[0]).is_err());
        let docs = YamlLoader::load_from_str("- 1\n- 2").unwrap();
        assert!(ScenarioParameters::from_yaml(&docs[0]).is_err());
    }

    #[test]
    fn test_result_map() {
        let mut result = ScenarioResult::default();
        result.num_of_nodes = 12;
        result.continuity_mean = 4.5;
        let map = result.as_map();
        assert_eq!(map.len(), RESULT_NAMES.len());
        assert_eq!(map["num_of_nodes"], 12.);
        assert_eq!(map["continuity_mean"], 4.5);
        assert_eq!(map["path_inflation_var"], 0.);
    }

    #[test]
    fn test_write_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let mut result = ScenarioResult::default();
        result.num_of_edges = 3;
        result.connectivity_mean = 0.25;
        write_results_csv(&path, &[(String::from("first"), result)]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 15);
        assert_eq!(&headers[0], "scenario");
        assert_eq!(&headers[5], "connectivity_mean");
        let rows: Vec<csv::StringRecord> = reader.records().map(|rr| rr.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "first");
        assert_eq!(&rows[0][2], "3");
        assert_eq!(&rows[0][5], "0.25");
    }
}
