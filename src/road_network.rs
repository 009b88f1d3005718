// this file defines a struct to represent the road network a fugitive can escape through.
// It's a wrapper around a petgraph graph, which allows parallel segments between two
// intersections.
use std::collections::HashMap;
use std::path::Path;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use xml::reader::XmlEvent;

use super::config_utils;
use super::error::{ModelError, Result};
use super::geometry::Point2d;


/// Stable identifier of an intersection (the OSM node id).
pub type NodeId = u64;

/// maxspeed assumed for segments that don't specify one, in km/h.
pub static DEFAULT_SPEED: f64 = 30.0;

static FALSE_VALUES: [&str; 5] = ["False", "false", "no", "0", ""];


/// The speed limit of a segment, resolved once when the network is loaded.
#[derive(PartialEq, Debug, Clone)]
pub enum SpeedSpec {
    Single(f64),
    /// differing limits on different lanes; the first is the one that counts.
    PerLane(Vec<f64>),
    Absent,
    /// a value was given but could not be read as a number.
    Invalid(String),
}

impl SpeedSpec {
    pub fn parse(text: &str) -> SpeedSpec {
        let values = parse_list(text);
        let parsed: std::result::Result<Vec<f64>, _> = values.iter().
            map(|vv| vv.parse::<f64>()).collect();
        match parsed {
            Ok(speeds) if speeds.is_empty() => SpeedSpec::Absent,
            Ok(mut speeds) if speeds.len() == 1 => SpeedSpec::Single(speeds.remove(0)),
            Ok(speeds) => SpeedSpec::PerLane(speeds),
            Err(_) => SpeedSpec::Invalid(String::from(text)),
        }
    }

    /// The speed used to compute traversal time, or None if the value was unreadable.
    pub fn travel_speed(&self) -> Option<f64> {
        match self {
            SpeedSpec::Single(speed) => Some(*speed),
            SpeedSpec::PerLane(speeds) => speeds.first().copied(),
            SpeedSpec::Absent => Some(DEFAULT_SPEED),
            SpeedSpec::Invalid(_) => None,
        }
    }

    /// The posted limit, if one was given.
    pub fn posted_limit(&self) -> Option<f64> {
        match self {
            SpeedSpec::Single(speed) => Some(*speed),
            SpeedSpec::PerLane(speeds) => speeds.first().copied(),
            _ => None,
        }
    }
}

impl Default for SpeedSpec {
    fn default() -> Self {
        SpeedSpec::Absent
    }
}


#[derive(PartialEq, Debug, Clone)]
pub struct RoadNode {
    pub id: NodeId,
    pub pos: Point2d,
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct RoadSegment {
    // meters
    pub length: f64,
    pub maxspeed: SpeedSpec,
    pub lanes: Option<u32>,
    // road classes, eg. "residential".  Usually one, sometimes several for merged ways.
    pub highway: Vec<String>,
    pub oneway: bool,
    pub camera: bool,
    pub tunnel: bool,
    pub bridge: bool,
    pub roundabout: bool,
    pub traffic_light: bool,
    // traversal cost under the current scenario; only set on working copies.
    pub used_weight: Option<f64>,
}

impl RoadSegment {
    pub fn new(length: f64, maxspeed: SpeedSpec) -> RoadSegment {
        RoadSegment {length, maxspeed, ..RoadSegment::default()}
    }

    /// Builds a segment from the string-valued attributes of a loaded edge.  A segment without
    /// a length can't be costed at all, so that's an error.
    pub fn from_attributes(attrs: &HashMap<String, String>) -> Result<RoadSegment> {
        let length = match attrs.get("length") {
            Some(text) => text.trim().parse::<f64>().map_err(|_| ModelError::Parse {
                what: "segment length",
                text: text.clone(),
            })?,
            None => return Err(ModelError::InconsistentNetwork(
                String::from("segment has no length attribute"))),
        };
        let maxspeed = match attrs.get("maxspeed") {
            Some(text) => SpeedSpec::parse(text),
            None => SpeedSpec::Absent,
        };
        let lanes = match attrs.get("lanes") {
            Some(text) => {
                let lanes = parse_list(text).first().and_then(|ll| ll.parse::<f64>().ok());
                if lanes.is_none() {
                    log::debug!("could not read lane count from {:?}", text);
                }
                lanes.map(|ll| ll as u32)
            }
            None => None,
        };
        let highway = match attrs.get("highway") {
            Some(text) => parse_list(text),
            None => vec![],
        };
        let flag = |name: &str| match attrs.get(name) {
            Some(value) => !FALSE_VALUES.contains(&value.trim()),
            None => false,
        };

        Ok(RoadSegment {
            length,
            maxspeed,
            lanes,
            highway,
            oneway: flag("oneway"),
            camera: flag("camera"),
            tunnel: flag("tunnel"),
            bridge: flag("bridge"),
            roundabout: flag("roundabout"),
            traffic_light: flag("traffic_light"),
            used_weight: None,
        })
    }

    pub fn has_road_class(&self, class: &str) -> bool {
        self.highway.iter().any(|hh| hh == class)
    }
}


/// Reads the textual list representation used for multi-valued edge attributes, eg.
/// "['50', '30']".  A plain value becomes a one-element list.
fn parse_list(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.starts_with('[') && text.ends_with(']') {
        return text[1..text.len() - 1].split(',').
            map(|ss| ss.trim().trim_matches(|cc| cc == '\'' || cc == '"').to_string()).
            filter(|ss| !ss.is_empty()).
            collect();
    }
    if text.is_empty() {
        return vec![];
    }
    return vec![String::from(text)];
}


#[derive(Clone, Debug)]
pub struct RoadNetwork {
    graph: DiGraph<RoadNode, RoadSegment>,
    node_idxs_by_id: HashMap<NodeId, NodeIndex>,
}

impl RoadNetwork {
    pub fn new() -> RoadNetwork {
        RoadNetwork {
            graph: DiGraph::new(),
            node_idxs_by_id: HashMap::new(),
        }
    }

    /// Adds an intersection.  Adding an id that's already present just moves it.
    pub fn add_node(&mut self, id: NodeId, pos: Point2d) -> NodeIndex {
        if let Some(idx) = self.node_idxs_by_id.get(&id) {
            self.graph[*idx].pos = pos;
            return *idx;
        }
        let idx = self.graph.add_node(RoadNode {id, pos});
        self.node_idxs_by_id.insert(id, idx);
        return idx;
    }

    pub fn add_segment(&mut self, from: NodeId, to: NodeId, segment: RoadSegment)
                       -> Result<EdgeIndex> {
        if !segment.length.is_finite() || segment.length < 0. {
            return Err(ModelError::InconsistentNetwork(
                format!("segment ({}, {}) has unusable length {}", from, to, segment.length)));
        }
        let from_idx = self.node_index(from).ok_or(ModelError::UnknownNode(from))?;
        let to_idx = self.node_index(to).ok_or(ModelError::UnknownNode(to))?;
        Ok(self.graph.add_edge(from_idx, to_idx, segment))
    }

    /// Loads a network from a GraphML file of the kind osmnx writes: node attributes `x` and
    /// `y`, edge attributes as described on `RoadSegment`.
    pub fn from_graphml(path: &Path) -> Result<RoadNetwork> {
        let mut parser = config_utils::xml_parser_from_path(path)?;
        let mut key_names = HashMap::new();
        let mut nodes = vec![];
        let mut edges = vec![];
        let mut undirected = false;

        // the element whose <data> children we're currently collecting
        let mut cur_element: Option<(String, Vec<String>)> = None;
        let mut cur_attrs: HashMap<String, String> = HashMap::new();
        let mut cur_key: Option<String> = None;
        loop {
            match parser.next()? {
                XmlEvent::EndDocument => {
                    log::info!("Reached end of network graphml");
                    break;
                }
                XmlEvent::StartElement{ name, attributes, .. } => {
                    let get = |attr| config_utils::get_xml_attribute_value(&attributes, attr);
                    match name.local_name.as_str() {
                        "key" => {
                            if let (Some(id), Some(attr_name)) = (get("id"), get("attr.name")) {
                                key_names.insert(id, attr_name);
                            }
                        }
                        "graph" => {
                            undirected = get("edgedefault").as_deref() == Some("undirected");
                        }
                        "node" => {
                            let id = get("id").ok_or_else(|| ModelError::InconsistentNetwork(
                                String::from("node without an id")))?;
                            cur_element = Some((String::from("node"), vec![id]));
                            cur_attrs.clear();
                        }
                        "edge" => {
                            let source = get("source");
                            let target = get("target");
                            match (source, target) {
                                (Some(source), Some(target)) => {
                                    cur_element = Some((String::from("edge"),
                                                        vec![source, target]));
                                }
                                _ => return Err(ModelError::InconsistentNetwork(
                                    String::from("edge without source or target"))),
                            }
                            cur_attrs.clear();
                        }
                        "data" => {
                            // record the name of the attribute
                            cur_key = get("key").map(|key| match key_names.get(&key) {
                                Some(attr_name) => attr_name.clone(),
                                None => key,
                            });
                        }
                        _ => (),
                    }
                }
                XmlEvent::Characters(content) => {
                    if let Some(key) = cur_key.take() {
                        cur_attrs.insert(key, content);
                    }
                }
                XmlEvent::EndElement{ name } => {
                    match name.local_name.as_str() {
                        "data" => cur_key = None,
                        "node" | "edge" => {
                            if let Some((kind, ids)) = cur_element.take() {
                                let attrs = std::mem::take(&mut cur_attrs);
                                if kind == "node" {
                                    nodes.push((ids[0].clone(), attrs));
                                } else {
                                    edges.push((ids[0].clone(), ids[1].clone(), attrs));
                                }
                            }
                        }
                        _ => (),
                    }
                }
                _ => (),
            }
        }

        let mut network = RoadNetwork::new();
        for (id, attrs) in nodes {
            let id = parse_node_id(&id)?;
            let coord = |name: &str| -> Result<f64> {
                let text = attrs.get(name).ok_or_else(|| ModelError::InconsistentNetwork(
                    format!("node {} has no {} coordinate", id, name)))?;
                text.trim().parse().map_err(|_| ModelError::Parse {
                    what: "node coordinate",
                    text: text.clone(),
                })
            };
            network.add_node(id, Point2d::new(coord("x")?, coord("y")?));
        }
        for (from_id, to_id, attrs) in edges {
            if from_id == to_id {
                // ignore self-connections
                continue;
            }
            let from_id = parse_node_id(&from_id)?;
            let to_id = parse_node_id(&to_id)?;
            let segment = RoadSegment::from_attributes(&attrs).map_err(|err| match err {
                ModelError::InconsistentNetwork(msg) =>
                    ModelError::InconsistentNetwork(format!("({}, {}): {}", from_id, to_id, msg)),
                other => other,
            })?;
            network.add_segment(from_id, to_id, segment)?;
        }

        let comps = kosaraju_scc(&network.graph);
        log::info!("loaded {} nodes and {} segments in {} strongly connected components",
                   network.num_nodes(), network.num_segments(), comps.len());

        if undirected {
            return Ok(network.to_undirected());
        }
        Ok(network)
    }

    /// Returns a copy in which every segment can also be driven in reverse.  Reverse copies
    /// carry the same attributes as the segment they mirror.
    pub fn to_undirected(&self) -> RoadNetwork {
        let mut undirected = self.clone();
        for edge in self.graph.edge_references() {
            let (from, to) = (edge.source(), edge.target());
            if self.graph.find_edge(to, from).is_none() {
                undirected.graph.add_edge(to, from, edge.weight().clone());
            }
        }
        return undirected;
    }

    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_idxs_by_id.get(&id).copied()
    }

    pub fn node_id(&self, idx: NodeIndex) -> NodeId {
        self.graph[idx].id
    }

    pub fn node_position(&self, id: NodeId) -> Option<&Point2d> {
        self.node_index(id).map(|idx| &self.graph[idx].pos)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &RoadNode> {
        self.graph.node_weights()
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_segments(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn graph(&self) -> &DiGraph<RoadNode, RoadSegment> {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut DiGraph<RoadNode, RoadSegment> {
        &mut self.graph
    }

    /// The (origin id, destination id, parallel index) key of a segment.
    pub fn segment_key(&self, edge: EdgeIndex) -> Option<(NodeId, NodeId, usize)> {
        let (from, to) = self.graph.edge_endpoints(edge)?;
        let parallel_idx = self.graph.edges_connecting(from, to).
            filter(|er| er.id() < edge).count();
        Some((self.node_id(from), self.node_id(to), parallel_idx))
    }

    /// The cheapest used weight over all parallel segments from `from` to `to`.
    pub fn link_weight(&self, from: NodeIndex, to: NodeIndex) -> Option<f64> {
        self.graph.edges_connecting(from, to).
            filter_map(|er| er.weight().used_weight).
            fold(None, |best: Option<f64>, ww| match best {
                Some(bb) if bb <= ww => Some(bb),
                _ => Some(ww),
            })
    }

    /// Total used weight along a node sequence, or None if some step has no weighted segment.
    pub fn path_weight(&self, nodes: &[NodeId]) -> Option<f64> {
        let mut total = 0.;
        for pair in nodes.windows(2) {
            let from = self.node_index(pair[0])?;
            let to = self.node_index(pair[1])?;
            total += self.link_weight(from, to)?;
        }
        Some(total)
    }
}

fn parse_node_id(text: &str) -> Result<NodeId> {
    text.trim().parse().map_err(|_| ModelError::Parse {
        what: "node id",
        text: String::from(text),
    })
}
