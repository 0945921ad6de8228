mod graph;
mod node_trait;
mod types;
pub mod nodes;

pub use graph::{AudioGraph, Connection, GraphNode};
pub use node_trait::AudioNode;
pub use petgraph::stable_graph::NodeIndex;
pub use types::{check_finite, ConnectionError, NodeCategory, NodePort, Parameter, ParameterUnit, PARAM_DRY, PARAM_WET};

pub use crate::error::ParameterError;
