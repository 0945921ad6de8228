// Zone FX - spatial effect routing for 3D sound worlds
//
// Effect zones (spheres and rotated boxes) placed in a scene own a live effect
// unit each. Every animation frame the proximity detector decides which sound
// sources sit inside which zones and pushes a smoothed send amount into the
// audio graph, so sources pick up effects as they move without clicks.
// The audio graph is a petgraph-backed node graph; UI edits can be queued onto
// the frame thread through a lock-free rtrb command queue.

pub mod audio;
pub mod command;
pub mod config;
pub mod dsp;
pub mod effects;
pub mod engine;
pub mod error;
pub mod spatial;

// Re-export commonly used types
pub use audio::node_graph::{AudioGraph, AudioNode, ConnectionError, NodeIndex};
pub use command::Command;
pub use config::{EngineConfig, PannerSettings};
pub use effects::{EffectCatalog, EffectKind, ParamBag, ParamValue, ParameterUpdater, TestSignalConfig, UpdateReport};
pub use engine::{EngineController, EngineStats, ZoneEngine};
pub use error::{ConfigError, EffectError, ParameterError, RouterError};
pub use spatial::{
    EffectInstance, EffectZone, ProximityDetector, ProximityFrame, SendSink, SoundSource, SourceId, SpatialRouter,
    WorldSnapshot, ZoneId, ZoneShape,
};
