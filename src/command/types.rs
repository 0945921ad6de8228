use crate::effects::{EffectKind, ParamBag};
use crate::spatial::{SourceId, ZoneId};
use glam::Vec3;

/// Commands sent from the UI/editing thread to the frame thread
///
/// Each maps onto one `ZoneEngine` facade call and is applied at the start
/// of the next frame.
#[derive(Debug, Clone)]
pub enum Command {
    // Zone lifecycle
    /// Build and wire an effect instance for a zone (id, kind, position)
    CreateZoneEffect(ZoneId, EffectKind, Vec3),
    /// Tear down a zone's effect instance
    RemoveZoneEffect(ZoneId),

    // Zone edits
    /// Apply named control changes to a zone's effect
    UpdateEffectParams(ZoneId, ParamBag),
    /// Move a zone's panner
    MoveZone(ZoneId, Vec3),
    /// Set a zone's influence radius
    ResizeZoneRadius(ZoneId, f32),
    /// Re-apply every panner's coordinates
    RefreshAll,

    // Listening
    /// Move the listener all panners measure distance from
    SetListener(Vec3),
    /// Add a source bus ahead of its first send
    RegisterSource(SourceId),
    /// Drop a source's bus and every send it feeds
    RemoveSource(SourceId),
    /// Start auditioning a zone's effect with its test signal
    StartPreview(ZoneId),
    /// Stop auditioning a zone's effect
    StopPreview(ZoneId),
}
