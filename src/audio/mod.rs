pub mod node_graph;

pub use node_graph::{AudioGraph, AudioNode, ConnectionError, NodeIndex};
