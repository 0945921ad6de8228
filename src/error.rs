use crate::audio::node_graph::ConnectionError;
use crate::spatial::ZoneId;
use thiserror::Error;

/// Errors raised while resolving or building effect units
#[derive(Debug, Error)]
pub enum EffectError {
    #[error("unsupported effect kind: {0}")]
    UnsupportedKind(String),

    #[error("invalid parameter bag: {0}")]
    InvalidParamBag(#[from] serde_json::Error),
}

/// Errors raised while writing a single control on a unit
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("parameter {0} is not available on this unit")]
    Unavailable(u32),

    #[error("parameter {id} received a non-finite value")]
    NonFinite { id: u32 },

    #[error("control '{name}' expects a number")]
    ExpectedNumber { name: String },

    #[error("control '{name}' has no choice named '{value}'")]
    UnknownChoice { name: String, value: String },
}

/// Errors raised by the spatial router's graph bookkeeping
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("no active effect instance '{0}'")]
    UnknownInstance(ZoneId),

    #[error("radius must be a positive finite number, got {0}")]
    InvalidRadius(f32),

    #[error("graph wiring failed for '{id}': {source}")]
    Graph {
        id: String,
        #[source]
        source: ConnectionError,
    },
}

/// Errors raised while loading engine configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
