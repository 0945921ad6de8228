//! Zone geometry, the per-frame proximity sweep and the graph routing it drives

pub mod geometry;
pub mod proximity;
pub mod router;
pub mod world;

pub use geometry::{evaluate, radial_amount, Containment};
pub use proximity::{PairReading, ProximityDetector, ProximityFrame, SendSink};
pub use router::{EffectInstance, SpatialRouter};
pub use world::{EffectZone, SoundSource, SourceId, WorldSnapshot, ZoneId, ZoneShape};
