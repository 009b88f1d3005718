use std::path::{Path, PathBuf};

use geo::Polygon;
use yaml_rust::{Yaml, YamlLoader};

use super::config_utils::{str_to_absolute_path, yaml_opt_f64, yaml_opt_u64};
use super::error::{ModelError, Result};
use super::geometry::{polygon_from_points, Point2d};
use super::road_network::NodeId;
use super::sampler::{DEFAULT_MARGIN_FRACTION, DEFAULT_MAX_ATTEMPTS};
use super::scenario::ScenarioParameters;


/// Where origins and destinations come from.
#[derive(PartialEq, Debug, Clone)]
pub enum PointSource {
    /// fixed node ids, the same for every scenario.
    Fixed(Vec<NodeId>),
    /// random points in the given regions, drawn with each scenario's seed.
    Sampled {
        regions: Vec<Polygon<f64>>,
        margin_fraction: f64,
        max_attempts: usize,
    },
}

/// A batch of scenarios to run on one road network.
#[derive(PartialEq, Debug, Clone)]
pub struct ModelConfig {
    pub network_path: PathBuf,
    pub output_path: PathBuf,
    pub points: PointSource,
    pub scenarios: Vec<ScenarioParameters>,
}

impl ModelConfig {
    /// Relative paths in the file are taken relative to the file's own directory.
    pub fn from_file(config_path: &Path) -> Result<ModelConfig> {
        let file_contents = std::fs::read_to_string(config_path)?;
        let docs = YamlLoader::load_from_str(&file_contents)?;
        let yaml_cfg = docs.get(0).ok_or_else(||
            ModelError::Config(format!("{} is empty", config_path.display())))?;
        let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        return ModelConfig::from_yaml(yaml_cfg, base_dir);
    }

    pub fn from_yaml(yaml_cfg: &Yaml, base_dir: &Path) -> Result<ModelConfig> {
        let network_path = yaml_cfg["network_path"].as_str().ok_or_else(||
            ModelError::Config(String::from("no network_path given")))?;
        let network_path = str_to_absolute_path(network_path, base_dir);
        let output_path = yaml_cfg["output_path"].as_str().unwrap_or("results.csv");
        let output_path = str_to_absolute_path(output_path, base_dir);

        let points = match (&yaml_cfg["points"], &yaml_cfg["sampling"]) {
            (Yaml::Array(ids), Yaml::BadValue) => PointSource::Fixed(parse_node_ids(ids)?),
            (Yaml::BadValue, Yaml::Hash(_)) => parse_sampling(&yaml_cfg["sampling"])?,
            (Yaml::BadValue, Yaml::BadValue) => return Err(ModelError::Config(
                String::from("either points or sampling must be given"))),
            _ => return Err(ModelError::Config(
                String::from("give either a list of points or a sampling map, not both"))),
        };

        let scenarios = match &yaml_cfg["scenarios"] {
            Yaml::Array(scenarios) => scenarios.iter().
                map(ScenarioParameters::from_yaml).
                collect::<Result<Vec<_>>>()?,
            // a single scenario with all defaults
            Yaml::BadValue => vec![ScenarioParameters::default()],
            _ => return Err(ModelError::Config(String::from("scenarios must be a list"))),
        };

        Ok(ModelConfig {network_path, output_path, points, scenarios})
    }
}

fn parse_node_ids(ids: &[Yaml]) -> Result<Vec<NodeId>> {
    ids.iter().map(|id| match id {
        Yaml::Integer(ii) if *ii >= 0 => Ok(*ii as NodeId),
        other => Err(ModelError::Config(format!("{:?} is not a node id", other))),
    }).collect()
}

fn parse_sampling(yaml_cfg: &Yaml) -> Result<PointSource> {
    let regions = match &yaml_cfg["regions"] {
        Yaml::Array(regions) => regions.iter().
            map(parse_polygon).
            collect::<Result<Vec<_>>>()?,
        _ => return Err(ModelError::Config(String::from("sampling needs a list of regions"))),
    };
    Ok(PointSource::Sampled {
        regions,
        margin_fraction: yaml_opt_f64(yaml_cfg, "margin_fraction")?.
            unwrap_or(DEFAULT_MARGIN_FRACTION),
        max_attempts: yaml_opt_u64(yaml_cfg, "max_attempts")?.
            map_or(DEFAULT_MAX_ATTEMPTS, |nn| nn as usize),
    })
}

/// A polygon is a list of [x, y] pairs.
fn parse_polygon(yaml_cfg: &Yaml) -> Result<Polygon<f64>> {
    let vertices = yaml_cfg.as_vec().ok_or_else(||
        ModelError::Config(String::from("a region must be a list of [x, y] points")))?;
    let mut points = vec![];
    for vertex in vertices {
        let coords: Vec<f64> = match vertex.as_vec() {
            Some(coords) => coords.iter().filter_map(yaml_number).collect(),
            None => vec![],
        };
        if coords.len() != 2 || vertex.as_vec().map_or(0, |vv| vv.len()) != 2 {
            return Err(ModelError::Config(format!("bad polygon vertex {:?}", vertex)));
        }
        points.push(Point2d::new(coords[0], coords[1]));
    }
    Ok(polygon_from_points(&points))
}

fn yaml_number(yaml: &Yaml) -> Option<f64> {
    match yaml {
        Yaml::Integer(ii) => Some(*ii as f64),
        Yaml::Real(_) => yaml.as_f64(),
        _ => None,
    }
}
