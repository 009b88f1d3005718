use thiserror::Error;

use super::road_network::NodeId;


pub type Result<T> = std::result::Result<T, ModelError>;

/// Everything that can make a scenario evaluation (or the setup before it) fail.
/// Missing optional edge attributes and OD pairs without a path are not errors;
/// they are handled where they occur.
#[derive(Error, Debug)]
pub enum ModelError {
    /// a scenario parameter is outside its domain.  Raised before any graph work.
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// the road network is malformed in a way no default can paper over.
    #[error("inconsistent network: {0}")]
    InconsistentNetwork(String),

    #[error("node {0} is not in the road network")]
    UnknownNode(NodeId),

    #[error("point sampling failed: {0}")]
    Sampling(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not parse {what} from {text:?}")]
    Parse { what: &'static str, text: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] yaml_rust::ScanError),

    #[error("xml error: {0}")]
    Xml(#[from] xml::reader::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
