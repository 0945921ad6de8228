use crate::audio::node_graph::NodeIndex;
use crate::command::Command;
use crate::config::EngineConfig;
use crate::effects::{EffectCatalog, EffectKind, ParamBag, ParameterUpdater, UpdateReport};
use crate::error::EffectError;
use crate::spatial::{ProximityDetector, ProximityFrame, SourceId, SpatialRouter, WorldSnapshot, ZoneId};
use glam::Vec3;
use serde::Serialize;
use std::collections::HashSet;

/// Counters for UI status displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub active_instance_count: usize,
    pub supported_kind_count: usize,
    pub graph_node_count: usize,
    pub send_count: usize,
}

/// Frame-driven spatial effect engine
///
/// Editing calls go straight to the router and never fail outward: errors are
/// logged and the call becomes a no-op, so a bad edit never stops playback.
/// Hosts whose UI runs on another thread use an [`EngineController`] instead;
/// its commands are applied at the start of the next [`ZoneEngine::frame`].
pub struct ZoneEngine {
    config: EngineConfig,
    router: SpatialRouter,
    detector: ProximityDetector,
    command_rx: Option<rtrb::Consumer<Command>>,
    /// Sources seen in the previous frame's world
    present_sources: HashSet<SourceId>,
    frames: u64,
}

impl ZoneEngine {
    pub fn new(config: EngineConfig) -> Self {
        let router = SpatialRouter::new(&config);
        let detector = ProximityDetector::new(config.diagnostics_interval());
        Self {
            config,
            router,
            detector,
            command_rx: None,
            present_sources: HashSet::new(),
            frames: 0,
        }
    }

    /// Create an engine together with a controller feeding its command queue
    pub fn with_controller(config: EngineConfig) -> (Self, EngineController) {
        let (command_tx, command_rx) = rtrb::RingBuffer::new(config.command_queue_capacity.max(1));
        let mut engine = Self::new(config);
        engine.command_rx = Some(command_rx);
        (engine, EngineController { command_tx })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Frames run so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Place an effect for zone `id`; returns whether an instance is now active
    pub fn create_zone_effect(&mut self, id: impl Into<ZoneId>, kind: EffectKind, position: Vec3) -> bool {
        match self.router.create_instance(id, kind, position) {
            Ok(instance) => {
                log::info!("Zone '{}' now runs {}", instance.id, kind);
                true
            }
            Err(e) => {
                log::error!("Failed to create {} zone effect: {}", kind, e);
                false
            }
        }
    }

    /// As `create_zone_effect`, with the kind given by its string id
    pub fn create_zone_effect_named(
        &mut self,
        id: impl Into<ZoneId>,
        kind: &str,
        position: Vec3,
    ) -> Result<bool, EffectError> {
        let kind: EffectKind = kind.parse()?;
        Ok(self.create_zone_effect(id, kind, position))
    }

    /// Apply named control changes to a zone's effect
    ///
    /// Returns `None` when the zone has no effect instance.
    pub fn update_effect_params(&mut self, id: &ZoneId, params: &ParamBag) -> Option<UpdateReport> {
        let Some((kind, unit)) = self.router.unit_mut(id) else {
            log::warn!("Cannot update params: no effect instance '{}'", id);
            return None;
        };
        Some(ParameterUpdater::update(unit, kind, params))
    }

    /// Current controls of a zone's effect in the vocabulary `update_effect_params` takes
    pub fn effect_params(&self, id: &ZoneId) -> Option<ParamBag> {
        let (kind, unit) = self.router.unit(id)?;
        Some(ParameterUpdater::current_params(unit, kind))
    }

    pub fn move_zone(&mut self, id: &ZoneId, position: Vec3) {
        if let Err(e) = self.router.update_position(id, position) {
            log::warn!("Cannot move zone: {}", e);
        }
    }

    pub fn resize_zone_radius(&mut self, id: &ZoneId, radius: f32) {
        if let Err(e) = self.router.set_radius(id, radius) {
            log::warn!("Cannot resize zone '{}': {}", id, e);
        }
    }

    pub fn remove_zone_effect(&mut self, id: &ZoneId) {
        if !self.router.remove_instance(id) {
            log::debug!("No effect instance '{}' to remove", id);
        }
    }

    pub fn refresh_all(&mut self) {
        self.router.refresh_all();
    }

    pub fn list_supported_kinds(&self) -> &'static [EffectKind] {
        EffectCatalog::supported_kinds()
    }

    pub fn stats_snapshot(&self) -> EngineStats {
        EngineStats {
            active_instance_count: self.router.instance_count(),
            supported_kind_count: EffectCatalog::supported_kinds().len(),
            graph_node_count: self.router.graph().node_count(),
            send_count: self.router.send_count(),
        }
    }

    pub fn set_listener(&mut self, position: Vec3) {
        self.router.set_listener(position);
    }

    /// Smoothed listener-relative intensity of every instance
    ///
    /// Each call advances the smoothing by one step, so hosts call it once per
    /// frame and use the values to duck an effect's overall level.
    pub fn listener_intensities(&mut self) -> Vec<(ZoneId, f32)> {
        let listener = self.router.listener();
        let ids: Vec<ZoneId> = self.router.instances().map(|instance| instance.id.clone()).collect();
        ids.into_iter()
            .filter_map(|id| {
                let intensity = self.router.intensity_for(&id, listener)?;
                Some((id, intensity))
            })
            .collect()
    }

    pub fn register_source(&mut self, id: impl Into<SourceId>) -> NodeIndex {
        self.router.register_source(id)
    }

    /// Drop a source's bus and every send it feeds
    pub fn remove_source(&mut self, id: &SourceId) {
        self.present_sources.remove(id);
        if !self.router.remove_source(id) {
            log::debug!("No source '{}' to remove", id);
        }
    }

    /// Audition a zone's effect with the catalog's test signal for its kind
    pub fn start_preview(&mut self, id: &ZoneId) {
        if let Err(e) = self.router.attach_preview(id) {
            log::warn!("Cannot preview zone: {}", e);
        }
    }

    pub fn stop_preview(&mut self, id: &ZoneId) {
        if !self.router.detach_preview(id) {
            log::debug!("No preview running for zone '{}'", id);
        }
    }

    /// Apply every queued command
    pub fn process_commands(&mut self) {
        let Some(mut command_rx) = self.command_rx.take() else {
            return;
        };
        while let Ok(cmd) = command_rx.pop() {
            self.handle_command(cmd);
        }
        self.command_rx = Some(command_rx);
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::CreateZoneEffect(id, kind, position) => {
                self.create_zone_effect(id, kind, position);
            }
            Command::RemoveZoneEffect(id) => self.remove_zone_effect(&id),
            Command::UpdateEffectParams(id, params) => {
                if let Some(report) = self.update_effect_params(&id, &params) {
                    if !report.is_clean() {
                        log::debug!("Partial update of '{}': {:?}", id, report);
                    }
                }
            }
            Command::MoveZone(id, position) => self.move_zone(&id, position),
            Command::ResizeZoneRadius(id, radius) => self.resize_zone_radius(&id, radius),
            Command::RefreshAll => self.refresh_all(),
            Command::SetListener(position) => self.set_listener(position),
            Command::RegisterSource(id) => {
                self.register_source(id);
            }
            Command::RemoveSource(id) => self.remove_source(&id),
            Command::StartPreview(id) => self.start_preview(&id),
            Command::StopPreview(id) => self.stop_preview(&id),
        }
    }

    /// Run one animation frame: queued edits first, then the proximity sweep
    ///
    /// Sources missing from `world` that were present last frame have their
    /// sends ramped to silence. Their buses stay until `remove_source`.
    pub fn frame(&mut self, world: &WorldSnapshot) -> ProximityFrame {
        self.process_commands();
        self.frames += 1;
        let frame = self.detector.run(world, &mut self.router);

        let present: HashSet<SourceId> = world.sources.iter().map(|source| source.id.clone()).collect();
        for departed in self.present_sources.difference(&present) {
            log::debug!("Source '{}' left the world, silencing its sends", departed);
            self.router.silence_source(departed);
        }
        self.present_sources = present;
        frame
    }

    /// Render interleaved stereo audio, overwriting `output`
    pub fn render(&mut self, output: &mut [f32]) {
        self.router.render(output);
    }

    pub fn router(&self) -> &SpatialRouter {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut SpatialRouter {
        &mut self.router
    }
}

/// Queues edits for a `ZoneEngine` running on another thread
pub struct EngineController {
    command_tx: rtrb::Producer<Command>,
}

impl EngineController {
    /// Queue a command; returns false (and logs) when the queue is full
    pub fn send(&mut self, cmd: Command) -> bool {
        match self.command_tx.push(cmd) {
            Ok(()) => true,
            Err(rtrb::PushError::Full(cmd)) => {
                log::warn!("Command queue full, dropping {:?}", cmd);
                false
            }
        }
    }

    pub fn create_zone_effect(&mut self, id: impl Into<ZoneId>, kind: EffectKind, position: Vec3) -> bool {
        self.send(Command::CreateZoneEffect(id.into(), kind, position))
    }

    pub fn update_effect_params(&mut self, id: impl Into<ZoneId>, params: ParamBag) -> bool {
        self.send(Command::UpdateEffectParams(id.into(), params))
    }

    pub fn move_zone(&mut self, id: impl Into<ZoneId>, position: Vec3) -> bool {
        self.send(Command::MoveZone(id.into(), position))
    }

    pub fn resize_zone_radius(&mut self, id: impl Into<ZoneId>, radius: f32) -> bool {
        self.send(Command::ResizeZoneRadius(id.into(), radius))
    }

    pub fn remove_zone_effect(&mut self, id: impl Into<ZoneId>) -> bool {
        self.send(Command::RemoveZoneEffect(id.into()))
    }

    pub fn refresh_all(&mut self) -> bool {
        self.send(Command::RefreshAll)
    }

    pub fn set_listener(&mut self, position: Vec3) -> bool {
        self.send(Command::SetListener(position))
    }

    pub fn register_source(&mut self, id: impl Into<SourceId>) -> bool {
        self.send(Command::RegisterSource(id.into()))
    }

    pub fn remove_source(&mut self, id: impl Into<SourceId>) -> bool {
        self.send(Command::RemoveSource(id.into()))
    }

    pub fn start_preview(&mut self, id: impl Into<ZoneId>) -> bool {
        self.send(Command::StartPreview(id.into()))
    }

    pub fn stop_preview(&mut self, id: impl Into<ZoneId>) -> bool {
        self.send(Command::StopPreview(id.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::ParamValue;
    use crate::spatial::{EffectZone, SoundSource};

    fn world(sources: &[(&str, Vec3)], zones: &[EffectZone]) -> WorldSnapshot {
        WorldSnapshot {
            sources: sources.iter().map(|(id, pos)| SoundSource::new(*id, *pos)).collect(),
            zones: zones.to_vec(),
        }
    }

    #[test]
    fn test_stats_track_instances() {
        let mut engine = ZoneEngine::new(EngineConfig::default());
        assert_eq!(engine.stats_snapshot().active_instance_count, 0);
        assert_eq!(engine.stats_snapshot().supported_kind_count, 17);

        assert!(engine.create_zone_effect("a", EffectKind::Reverb, Vec3::ZERO));
        assert!(engine.create_zone_effect("b", EffectKind::BitCrusher, Vec3::X));
        assert_eq!(engine.stats_snapshot().active_instance_count, 2);

        engine.remove_zone_effect(&"a".into());
        assert_eq!(engine.stats_snapshot().active_instance_count, 1);
        assert_eq!(engine.list_supported_kinds().len(), 17);
    }

    #[test]
    fn test_unknown_ids_are_no_ops() {
        let mut engine = ZoneEngine::new(EngineConfig::default());
        let ghost = ZoneId::from("ghost");
        engine.move_zone(&ghost, Vec3::ONE);
        engine.resize_zone_radius(&ghost, 3.0);
        engine.remove_zone_effect(&ghost);
        engine.start_preview(&ghost);
        assert!(engine.update_effect_params(&ghost, &ParamBag::new()).is_none());
        assert!(engine.effect_params(&ghost).is_none());
    }

    #[test]
    fn test_named_kind_must_be_supported() {
        let mut engine = ZoneEngine::new(EngineConfig::default());
        assert!(matches!(
            engine.create_zone_effect_named("z", "wobble", Vec3::ZERO),
            Err(EffectError::UnsupportedKind(_))
        ));
        assert_eq!(engine.stats_snapshot().active_instance_count, 0);
        assert!(engine.create_zone_effect_named("z", "jcReverb", Vec3::ZERO).unwrap());
    }

    #[test]
    fn test_params_round_trip_through_facade() {
        let mut engine = ZoneEngine::new(EngineConfig::default());
        let id = ZoneId::from("z");
        engine.create_zone_effect(id.clone(), EffectKind::PingPongDelay, Vec3::ZERO);

        let mut params = ParamBag::new();
        params.insert("delayTime".into(), ParamValue::Number(0.5));
        params.insert("notAControl".into(), ParamValue::Number(1.0));
        let report = engine.update_effect_params(&id, &params).unwrap();
        assert_eq!(report.applied, vec!["delayTime"]);
        assert_eq!(report.ignored, vec!["notAControl"]);

        let current = engine.effect_params(&id).unwrap();
        assert_eq!(current.get("delayTime"), Some(&ParamValue::Number(0.5)));
    }

    #[test]
    fn test_invalid_radius_keeps_previous() {
        let mut engine = ZoneEngine::new(EngineConfig::default());
        let id = ZoneId::from("z");
        engine.create_zone_effect(id.clone(), EffectKind::Chorus, Vec3::ZERO);
        engine.resize_zone_radius(&id, -2.0);
        assert_eq!(engine.router().radius(&id), Some(2.0));
        engine.resize_zone_radius(&id, 6.0);
        assert_eq!(engine.router().radius(&id), Some(6.0));
    }

    #[test]
    fn test_commands_apply_on_next_frame() {
        let (mut engine, mut controller) = ZoneEngine::with_controller(EngineConfig::default());
        assert!(controller.create_zone_effect("z", EffectKind::Phaser, Vec3::ZERO));
        assert!(controller.resize_zone_radius("z", 4.0));
        assert_eq!(engine.stats_snapshot().active_instance_count, 0);

        engine.frame(&WorldSnapshot::default());
        assert_eq!(engine.stats_snapshot().active_instance_count, 1);
        assert_eq!(engine.router().radius(&"z".into()), Some(4.0));
        assert_eq!(engine.frame_count(), 1);
    }

    #[test]
    fn test_full_queue_drops_commands() {
        let config = EngineConfig {
            command_queue_capacity: 1,
            ..EngineConfig::default()
        };
        let (_engine, mut controller) = ZoneEngine::with_controller(config);
        assert!(controller.refresh_all());
        assert!(!controller.refresh_all());
    }

    #[test]
    fn test_listener_intensities_follow_distance() {
        let mut engine = ZoneEngine::new(EngineConfig::default());
        engine.create_zone_effect("near", EffectKind::Reverb, Vec3::ZERO);
        engine.create_zone_effect("far", EffectKind::Reverb, Vec3::new(50.0, 0.0, 0.0));

        let mut intensities = Vec::new();
        for _ in 0..20 {
            intensities = engine.listener_intensities();
        }
        let lookup = |name: &str| intensities.iter().find(|(id, _)| id.as_str() == name).map(|(_, v)| *v);
        assert!(lookup("near").unwrap() > 0.8);
        assert_eq!(lookup("far"), Some(0.0));
    }

    #[test]
    fn test_oversized_diagnostics_interval_does_not_stop_engine() {
        let config = EngineConfig::from_json(r#"{"diagnosticsIntervalSecs": 1e30}"#).unwrap();
        let mut engine = ZoneEngine::new(config);
        let zones = vec![EffectZone::sphere("z", EffectKind::Reverb, Vec3::ZERO, 2.0)];
        engine.create_zone_effect("z", EffectKind::Reverb, Vec3::ZERO);
        engine.frame(&world(&[("s", Vec3::X)], &zones));
        assert_eq!(engine.router().send_amount(&"s".into(), &"z".into()), 0.5);
    }

    #[test]
    fn test_departed_source_is_silenced() {
        let mut engine = ZoneEngine::new(EngineConfig::default());
        let zones = vec![EffectZone::sphere("z", EffectKind::Tremolo, Vec3::ZERO, 2.0)];
        engine.create_zone_effect("z", EffectKind::Tremolo, Vec3::ZERO);
        let idle_nodes = engine.stats_snapshot().graph_node_count;

        engine.frame(&world(&[("s", Vec3::new(1.0, 0.0, 0.0))], &zones));
        assert_eq!(engine.router().send_amount(&"s".into(), &"z".into()), 0.5);

        // Gone from the world while still inside the zone
        engine.frame(&world(&[], &zones));
        assert_eq!(engine.router().send_amount(&"s".into(), &"z".into()), 0.0);

        engine.remove_source(&"s".into());
        assert_eq!(engine.stats_snapshot().send_count, 0);
        assert_eq!(engine.stats_snapshot().graph_node_count, idle_nodes);
    }

    #[test]
    fn test_source_and_preview_commands() {
        let (mut engine, mut controller) = ZoneEngine::with_controller(EngineConfig::default());
        let zones = vec![EffectZone::sphere("z", EffectKind::Phaser, Vec3::ZERO, 2.0)];
        assert!(controller.create_zone_effect("z", EffectKind::Phaser, Vec3::ZERO));
        assert!(controller.register_source("s"));
        assert!(controller.start_preview("z"));
        engine.frame(&world(&[("s", Vec3::X)], &zones));
        assert!(engine.router().is_previewing(&"z".into()));
        assert!(engine.router().source_input(&"s".into()).is_some());

        assert!(controller.stop_preview("z"));
        assert!(controller.remove_source("s"));
        engine.frame(&world(&[], &zones));
        assert!(!engine.router().is_previewing(&"z".into()));
        assert!(engine.router().source_input(&"s".into()).is_none());
        assert_eq!(engine.stats_snapshot().send_count, 0);
    }
}
