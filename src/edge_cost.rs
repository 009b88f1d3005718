// Turns segment attributes and a scenario's behavioural multipliers into traversal costs.
use petgraph::visit::EdgeRef;
use yaml_rust::Yaml;

use super::config_utils::yaml_opt_f64;
use super::error::{ModelError, Result};
use super::road_network::{RoadNetwork, RoadSegment, DEFAULT_SPEED};


static LONG_SEGMENT_M: f64 = 100.;
static HIGH_SPEED_KMH: f64 = 50.;

// road classes of the three traffic-avoidance bands, most important first
static MAJOR_ROADS: [&str; 3] = ["motorway", "motorway_link", "trunk"];
static MIDDLE_ROADS: [&str; 3] = ["primary", "primary_link", "secondary"];
static MINOR_ROADS: [&str; 1] = ["tertiary"];


/// How busy road classes are penalized.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum TrafficAvoidance {
    /// one factor for every busy band.
    Uniform(f64),
    /// a factor per band.
    Banded { ta1: f64, ta2: f64, ta3: f64 },
    /// `ta * ta_i` on band i, but only when `ta > 1`.
    Scaled { ta: f64, ta1: f64, ta2: f64, ta3: f64 },
}

impl TrafficAvoidance {
    /// The factor for a segment in band 0, 1 or 2.
    fn band_factor(&self, band: usize) -> f64 {
        match *self {
            TrafficAvoidance::Uniform(ta) => ta,
            TrafficAvoidance::Banded { ta1, ta2, ta3 } => [ta1, ta2, ta3][band],
            TrafficAvoidance::Scaled { ta, ta1, ta2, ta3 } => {
                if ta > 1. {
                    ta * [ta1, ta2, ta3][band]
                } else {
                    1.
                }
            }
        }
    }

    fn factors(&self) -> Vec<(&'static str, f64)> {
        match *self {
            TrafficAvoidance::Uniform(ta) => vec![("TA", ta)],
            TrafficAvoidance::Banded { ta1, ta2, ta3 } =>
                vec![("TA1", ta1), ("TA2", ta2), ("TA3", ta3)],
            TrafficAvoidance::Scaled { ta, ta1, ta2, ta3 } =>
                vec![("TA", ta), ("TA1", ta1), ("TA2", ta2), ("TA3", ta3)],
        }
    }
}

impl Default for TrafficAvoidance {
    fn default() -> Self {
        TrafficAvoidance::Uniform(1.)
    }
}


/// Multiplicative preference factors.  1 is neutral, above 1 avoids, below 1 prefers.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct CostFactors {
    // camera avoidance
    pub ca: f64,
    // obstacle avoidance: tunnels, bridges, roundabouts, traffic lights
    pub oa: f64,
    // lane preference, for multi-lane roads
    pub lp: f64,
    // residential preference
    pub rp: f64,
    // one-way roads, which can only be driven the wrong way when that's possible at all
    pub ow: f64,
    // high speed preference
    pub hs: f64,
    // short road preference: applies to segments over 100m
    pub sr: f64,
    pub ta: TrafficAvoidance,
}

impl CostFactors {
    pub fn neutral() -> CostFactors {
        CostFactors {
            ca: 1.,
            oa: 1.,
            lp: 1.,
            rp: 1.,
            ow: 1.,
            hs: 1.,
            sr: 1.,
            ta: TrafficAvoidance::default(),
        }
    }

    /// Fails on the first factor that is negative or not finite.
    pub fn validate(&self) -> Result<()> {
        let mut named = vec![
            ("CA", self.ca),
            ("OA", self.oa),
            ("LP", self.lp),
            ("RP", self.rp),
            ("OW", self.ow),
            ("HS", self.hs),
            ("SR", self.sr),
        ];
        named.extend(self.ta.factors());
        for (name, value) in named {
            if !value.is_finite() || value < 0. {
                return Err(ModelError::InvalidParameter {
                    name,
                    value,
                    reason: "multipliers must be finite and non-negative",
                });
            }
        }
        Ok(())
    }
}

impl CostFactors {
    /// Reads factors keyed by their short names (CA, OA, ..., TA, TA1, TA2, TA3).  Missing
    /// keys stay neutral.  TA alone is uniform, TA1-3 alone are banded, and TA together with
    /// any of TA1-3 is scaled.
    pub fn from_yaml(yaml_cfg: &Yaml) -> Result<CostFactors> {
        let mut factors = CostFactors::neutral();
        let mut fields = [
            ("CA", &mut factors.ca),
            ("OA", &mut factors.oa),
            ("LP", &mut factors.lp),
            ("RP", &mut factors.rp),
            ("OW", &mut factors.ow),
            ("HS", &mut factors.hs),
            ("SR", &mut factors.sr),
        ];
        for (key, field) in fields.iter_mut() {
            if let Some(value) = yaml_opt_f64(yaml_cfg, *key)? {
                **field = value;
            }
        }

        let ta = yaml_opt_f64(yaml_cfg, "TA")?;
        let ta1 = yaml_opt_f64(yaml_cfg, "TA1")?;
        let ta2 = yaml_opt_f64(yaml_cfg, "TA2")?;
        let ta3 = yaml_opt_f64(yaml_cfg, "TA3")?;
        let any_band = ta1.is_some() || ta2.is_some() || ta3.is_some();
        factors.ta = match ta {
            Some(ta) if any_band => TrafficAvoidance::Scaled {
                ta,
                ta1: ta1.unwrap_or(1.),
                ta2: ta2.unwrap_or(1.),
                ta3: ta3.unwrap_or(1.),
            },
            Some(ta) => TrafficAvoidance::Uniform(ta),
            None if any_band => TrafficAvoidance::Banded {
                ta1: ta1.unwrap_or(1.),
                ta2: ta2.unwrap_or(1.),
                ta3: ta3.unwrap_or(1.),
            },
            None => TrafficAvoidance::default(),
        };
        Ok(factors)
    }
}

impl Default for CostFactors {
    fn default() -> Self {
        CostFactors::neutral()
    }
}


/// The cost of traversing one segment, or None if its speed couldn't be read.
pub fn segment_cost(segment: &RoadSegment, factors: &CostFactors) -> Option<f64> {
    let speed = segment.maxspeed.travel_speed()?;
    let mut cost = segment.length / speed;

    if segment.camera {
        cost *= factors.ca;
    }
    if segment.tunnel || segment.roundabout || segment.bridge || segment.traffic_light {
        cost *= factors.oa;
    }
    if segment.lanes.map_or(false, |lanes| lanes > 1) {
        cost *= factors.lp;
    }
    if segment.highway.len() == 1 && segment.highway[0] == "residential" {
        cost *= factors.rp;
    }
    if segment.oneway {
        cost *= factors.ow;
    }
    if segment.maxspeed.posted_limit().map_or(false, |limit| limit > HIGH_SPEED_KMH) {
        cost *= factors.hs;
    }
    if segment.length > LONG_SEGMENT_M {
        cost *= factors.sr;
    }

    let bands: [&[&str]; 3] = [&MAJOR_ROADS, &MIDDLE_ROADS, &MINOR_ROADS];
    let band = bands.iter().
        position(|classes| classes.iter().any(|class| segment.has_road_class(class)));
    if let Some(band) = band {
        cost *= factors.ta.band_factor(band);
    }

    if cost.is_finite() && cost >= 0. {
        Some(cost)
    } else {
        None
    }
}

/// Sets `used_weight` on every segment of `network`, which should be a working copy.
///
/// Segments the cost function can't handle get `length / 30` in a second pass, so afterwards
/// every segment carries a finite, non-negative weight.
pub fn compute_weights(network: &mut RoadNetwork, factors: &CostFactors) -> Result<()> {
    factors.validate()?;
    let graph = network.graph_mut();
    for segment in graph.edge_weights_mut() {
        if !segment.length.is_finite() || segment.length < 0. {
            return Err(ModelError::InconsistentNetwork(
                format!("segment with unusable length {}", segment.length)));
        }
        segment.used_weight = segment_cost(segment, factors);
    }

    // the second pass
    let unweighted: Vec<_> = network.graph().edge_references().
        filter(|er| er.weight().used_weight.is_none()).
        map(|er| er.id()).
        collect();
    for edge in unweighted {
        log::debug!("no weight computed for segment {:?}, using the default",
                    network.segment_key(edge));
        let segment = &mut network.graph_mut()[edge];
        segment.used_weight = Some(segment.length / DEFAULT_SPEED);
    }
    Ok(())
}
