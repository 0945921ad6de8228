use super::geometry::{is_valid_radius, radial_amount};
use super::world::{SourceId, ZoneId};
use crate::audio::node_graph::nodes::{gain, panner, GainNode, MasterOutputNode, PannerNode, TestToneNode};
use crate::audio::node_graph::{AudioGraph, AudioNode, ConnectionError, NodeIndex};
use crate::config::{EngineConfig, PannerSettings};
use crate::effects::{EffectCatalog, EffectKind};
use crate::error::RouterError;
use glam::Vec3;
use std::collections::HashMap;

/// The live realization of one effect zone
#[derive(Debug, Clone, PartialEq)]
pub struct EffectInstance {
    pub id: ZoneId,
    pub kind: EffectKind,
    /// Graph node running the effect
    pub unit: NodeIndex,
    /// Graph node spatializing this instance's output, used by nothing else
    pub panner: NodeIndex,
    pub position: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy)]
struct SendSlot {
    node: NodeIndex,
    amount: f32,
}

/// Owns every effect instance and the graph wiring around it
///
/// Topology:
///
/// ```text
/// source bus ──────────────────────────────┐
///      │                                    ▼
///      └─> send gain ─> effect unit ─> panner ─> master
/// ```
///
/// Each source bus feeds the master dry and feeds one send gain per zone it
/// has ever been routed into. Send gains ramp, so amount changes never click.
pub struct SpatialRouter {
    graph: AudioGraph,
    master: NodeIndex,

    instances: HashMap<ZoneId, EffectInstance>,
    /// Listener intensity follower state per instance
    intensities: HashMap<ZoneId, f32>,
    sources: HashMap<SourceId, NodeIndex>,
    sends: HashMap<(SourceId, ZoneId), SendSlot>,
    previews: HashMap<ZoneId, NodeIndex>,

    listener: Vec3,
    panner_settings: PannerSettings,
    default_radius: f32,
    smoothing: f32,
}

impl SpatialRouter {
    pub fn new(config: &EngineConfig) -> Self {
        let mut graph = AudioGraph::new(config.sample_rate, config.buffer_size);
        let master = graph.add_node(Box::new(MasterOutputNode::new("master")));
        graph.set_output_node(Some(master));

        let default_radius = if is_valid_radius(config.default_radius) {
            config.default_radius
        } else {
            log::warn!("Ignoring invalid default radius {}, using 2.0", config.default_radius);
            2.0
        };

        Self {
            graph,
            master,
            instances: HashMap::new(),
            intensities: HashMap::new(),
            sources: HashMap::new(),
            sends: HashMap::new(),
            previews: HashMap::new(),
            listener: Vec3::ZERO,
            panner_settings: config.panner.clone(),
            default_radius,
            smoothing: config.intensity_smoothing.clamp(0.0, 1.0),
        }
    }

    /// Build, wire and register an instance for zone `id`
    ///
    /// An existing instance under the same id is torn down first, so the new
    /// one starts from the default radius with no intensity history. On a
    /// wiring failure every node added here is removed again and nothing is
    /// registered.
    pub fn create_instance(
        &mut self,
        id: impl Into<ZoneId>,
        kind: EffectKind,
        position: Vec3,
    ) -> Result<&EffectInstance, RouterError> {
        let id = id.into();
        if self.remove_instance(&id) {
            log::debug!("Replaced existing effect instance '{}'", id);
        }

        let unit = self.graph.add_node(EffectCatalog::create(kind));
        let spatializer = self.graph.add_node(Box::new(PannerNode::new(
            format!("{}-panner", id),
            &self.panner_settings,
        )));

        if let Err(source) = self.wire_instance(unit, spatializer) {
            self.graph.remove_node(spatializer);
            self.graph.remove_node(unit);
            log::error!("Failed to wire effect instance '{}': {}", id, source);
            return Err(RouterError::Graph {
                id: id.to_string(),
                source,
            });
        }

        Self::apply_vector(&mut self.graph, spatializer, panner::PARAM_POSITION_X, position);
        Self::apply_vector(&mut self.graph, spatializer, panner::PARAM_LISTENER_X, self.listener);
        // A new panner starts at its target instead of gliding in from the origin
        if let Some(node) = self.graph.get_node_mut(spatializer) {
            node.reset();
        }

        log::debug!("Created {} instance '{}' at {}", kind, id, position);
        self.instances.insert(
            id.clone(),
            EffectInstance {
                id: id.clone(),
                kind,
                unit,
                panner: spatializer,
                position,
                radius: self.default_radius,
            },
        );

        self.instances.get(&id).ok_or(RouterError::UnknownInstance(id))
    }

    fn wire_instance(&mut self, unit: NodeIndex, panner: NodeIndex) -> Result<(), ConnectionError> {
        self.graph.connect(unit, 0, panner, 0)?;
        self.graph.connect(panner, 0, self.master, 0)?;
        Ok(())
    }

    /// Write a vector onto three consecutive parameters starting at `first_param`
    fn apply_vector(graph: &mut AudioGraph, node: NodeIndex, first_param: u32, value: Vec3) {
        let Some(node) = graph.get_node_mut(node) else {
            return;
        };
        for (axis, component) in value.to_array().into_iter().enumerate() {
            if let Err(e) = node.set_parameter(first_param + axis as u32, component) {
                log::error!("Failed to set {} axis {}: {}", node.name(), axis, e);
            }
        }
    }

    /// Move an instance's panner; the effect unit itself is untouched
    pub fn update_position(&mut self, id: &ZoneId, position: Vec3) -> Result<(), RouterError> {
        let instance = self
            .instances
            .get_mut(id)
            .ok_or_else(|| RouterError::UnknownInstance(id.clone()))?;
        instance.position = position;
        Self::apply_vector(&mut self.graph, instance.panner, panner::PARAM_POSITION_X, position);
        Ok(())
    }

    pub fn set_radius(&mut self, id: &ZoneId, radius: f32) -> Result<(), RouterError> {
        if !is_valid_radius(radius) {
            return Err(RouterError::InvalidRadius(radius));
        }
        let instance = self
            .instances
            .get_mut(id)
            .ok_or_else(|| RouterError::UnknownInstance(id.clone()))?;
        instance.radius = radius;
        Ok(())
    }

    /// Influence radius, or `None` for an unknown id
    pub fn radius(&self, id: &ZoneId) -> Option<f32> {
        self.instances.get(id).map(|instance| instance.radius)
    }

    /// Tear down an instance and everything routed into it
    ///
    /// Returns false for an unknown id, which is otherwise a no-op.
    pub fn remove_instance(&mut self, id: &ZoneId) -> bool {
        let Some(instance) = self.instances.get(id).cloned() else {
            return false;
        };

        self.detach_preview(id);

        let routed: Vec<(SourceId, ZoneId)> = self.sends.keys().filter(|(_, zone)| zone == id).cloned().collect();
        for key in routed {
            if let Some(slot) = self.sends.remove(&key) {
                self.graph.remove_node(slot.node);
            }
        }

        self.graph.disconnect(instance.unit, 0, instance.panner, 0);
        self.graph.disconnect(instance.panner, 0, self.master, 0);
        self.graph.remove_node(instance.panner);
        self.graph.remove_node(instance.unit);

        self.intensities.remove(id);
        self.instances.remove(id);
        log::debug!("Removed effect instance '{}'", id);
        true
    }

    /// Listener-relative intensity of an instance, smoothed across calls
    ///
    /// Each call moves the stored intensity a fixed fraction of the way toward
    /// `max(0, 1 - distance / radius)`. Unknown ids yield `None`.
    pub fn intensity_for(&mut self, id: &ZoneId, listener: Vec3) -> Option<f32> {
        let instance = self.instances.get(id)?;
        let raw = radial_amount(instance.position.distance(listener), instance.radius);

        let intensity = self.intensities.entry(id.clone()).or_insert(0.0);
        *intensity += (raw - *intensity) * self.smoothing;
        Some(*intensity)
    }

    /// Re-apply an instance's stored position to its panner
    pub fn refresh(&mut self, id: &ZoneId) -> Result<(), RouterError> {
        let instance = self
            .instances
            .get(id)
            .ok_or_else(|| RouterError::UnknownInstance(id.clone()))?;
        Self::apply_vector(&mut self.graph, instance.panner, panner::PARAM_POSITION_X, instance.position);
        Ok(())
    }

    pub fn refresh_all(&mut self) {
        for instance in self.instances.values() {
            Self::apply_vector(&mut self.graph, instance.panner, panner::PARAM_POSITION_X, instance.position);
        }
    }

    /// Position the panner is currently heading to
    pub fn panner_position(&self, id: &ZoneId) -> Option<Vec3> {
        let panner_node = self.graph.get_node(self.instances.get(id)?.panner)?;
        Some(Vec3::new(
            panner_node.get_parameter(panner::PARAM_POSITION_X)?,
            panner_node.get_parameter(panner::PARAM_POSITION_Y)?,
            panner_node.get_parameter(panner::PARAM_POSITION_Z)?,
        ))
    }

    /// Add a bus for `id` feeding the master, or return the existing one
    ///
    /// Whatever a host connects into the bus is heard dry and can be sent into
    /// any effect zone.
    pub fn register_source(&mut self, id: impl Into<SourceId>) -> NodeIndex {
        let id = id.into();
        if let Some(&bus) = self.sources.get(&id) {
            return bus;
        }

        let bus = self.graph.add_node(Box::new(GainNode::with_gain(format!("{}-bus", id), 1.0)));
        if let Err(e) = self.graph.connect(bus, 0, self.master, 0) {
            log::error!("Failed to connect source bus '{}': {}", id, e);
        }
        self.sources.insert(id, bus);
        bus
    }

    /// Bus node a host should connect a source's signal into
    pub fn source_input(&self, id: &SourceId) -> Option<NodeIndex> {
        self.sources.get(id).copied()
    }

    pub fn remove_source(&mut self, id: &SourceId) -> bool {
        let Some(bus) = self.sources.remove(id) else {
            return false;
        };

        let routed: Vec<(SourceId, ZoneId)> =
            self.sends.keys().filter(|(source, _)| source == id).cloned().collect();
        for key in routed {
            if let Some(slot) = self.sends.remove(&key) {
                self.graph.remove_node(slot.node);
            }
        }
        self.graph.remove_node(bus);
        true
    }

    /// Ramp every send of a source down to silence, keeping its bus and sends
    pub fn silence_source(&mut self, id: &SourceId) {
        for ((source, _), slot) in self.sends.iter_mut() {
            if source == id && slot.amount != 0.0 {
                slot.amount = 0.0;
                Self::apply_send_gain(&mut self.graph, slot.node, 0.0);
            }
        }
    }

    /// Route `amount` of a source's signal into a zone's effect
    ///
    /// The amount is clamped to [0, 1] and the send gain ramps toward it. The
    /// send is created on the first nonzero amount (registering the source bus
    /// if needed) and kept at silence afterwards rather than removed. Zones
    /// without an active instance are skipped.
    pub fn set_send_amount(&mut self, source: &SourceId, zone: &ZoneId, amount: f32) {
        let amount = if amount.is_finite() { amount.clamp(0.0, 1.0) } else { 0.0 };

        let Some(unit) = self.instances.get(zone).map(|instance| instance.unit) else {
            log::trace!("No effect instance '{}' to send '{}' into", zone, source);
            return;
        };

        let key = (source.clone(), zone.clone());
        if let Some(slot) = self.sends.get_mut(&key) {
            if slot.amount != amount {
                slot.amount = amount;
                Self::apply_send_gain(&mut self.graph, slot.node, amount);
            }
            return;
        }

        if amount == 0.0 {
            return;
        }

        let bus = self.register_source(source.clone());
        // Starts silent and ramps up to the requested amount
        let send = self
            .graph
            .add_node(Box::new(GainNode::with_gain(format!("{}->{}", source, zone), 0.0)));

        let wired = self
            .graph
            .connect(bus, 0, send, 0)
            .and_then(|()| self.graph.connect(send, 0, unit, 0));
        if let Err(e) = wired {
            log::error!("Failed to route '{}' into '{}': {}", source, zone, e);
            self.graph.remove_node(send);
            return;
        }

        Self::apply_send_gain(&mut self.graph, send, amount);
        self.sends.insert(key, SendSlot { node: send, amount });
    }

    fn apply_send_gain(graph: &mut AudioGraph, send: NodeIndex, amount: f32) {
        if let Some(node) = graph.get_node_mut(send) {
            if let Err(e) = node.set_parameter(gain::PARAM_GAIN, amount) {
                log::error!("Failed to set send gain on {}: {}", node.name(), e);
            }
        }
    }

    /// Requested send amount for a pair; 0 when no send exists
    pub fn send_amount(&self, source: &SourceId, zone: &ZoneId) -> f32 {
        self.sends.get(&(source.clone(), zone.clone())).map_or(0.0, |slot| slot.amount)
    }

    /// Number of send gains currently in the graph
    pub fn send_count(&self) -> usize {
        self.sends.len()
    }

    pub fn listener(&self) -> Vec3 {
        self.listener
    }

    /// Move the listener every panner measures distance from
    pub fn set_listener(&mut self, position: Vec3) {
        self.listener = position;
        for instance in self.instances.values() {
            Self::apply_vector(&mut self.graph, instance.panner, panner::PARAM_LISTENER_X, position);
        }
    }

    /// Feed the catalog's test signal for the instance's kind into its unit
    pub fn attach_preview(&mut self, id: &ZoneId) -> Result<(), RouterError> {
        let instance = self
            .instances
            .get(id)
            .ok_or_else(|| RouterError::UnknownInstance(id.clone()))?;
        if self.previews.contains_key(id) {
            return Ok(());
        }

        let signal = EffectCatalog::test_signal_config(instance.kind);
        let unit = instance.unit;
        let tone = self.graph.add_node(Box::new(TestToneNode::new(
            format!("{}-preview", id),
            signal.frequency,
            signal.level,
            signal.wave_shape,
        )));

        if let Err(source) = self.graph.connect(tone, 0, unit, 0) {
            self.graph.remove_node(tone);
            return Err(RouterError::Graph {
                id: id.to_string(),
                source,
            });
        }

        self.previews.insert(id.clone(), tone);
        Ok(())
    }

    pub fn detach_preview(&mut self, id: &ZoneId) -> bool {
        match self.previews.remove(id) {
            Some(tone) => self.graph.remove_node(tone).is_some(),
            None => false,
        }
    }

    pub fn is_previewing(&self, id: &ZoneId) -> bool {
        self.previews.contains_key(id)
    }

    pub fn instance(&self, id: &ZoneId) -> Option<&EffectInstance> {
        self.instances.get(id)
    }

    pub fn instances(&self) -> impl Iterator<Item = &EffectInstance> {
        self.instances.values()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// An instance's effect unit together with its kind
    pub fn unit(&self, id: &ZoneId) -> Option<(EffectKind, &dyn AudioNode)> {
        let instance = self.instances.get(id)?;
        Some((instance.kind, self.graph.get_node(instance.unit)?))
    }

    pub fn unit_mut(&mut self, id: &ZoneId) -> Option<(EffectKind, &mut (dyn AudioNode + 'static))> {
        let instance = self.instances.get(id)?;
        let kind = instance.kind;
        let unit = instance.unit;
        Some((kind, self.graph.get_node_mut(unit)?))
    }

    pub fn master(&self) -> NodeIndex {
        self.master
    }

    pub fn graph(&self) -> &AudioGraph {
        &self.graph
    }

    /// Direct graph access for hosts wiring their own source signals
    pub fn graph_mut(&mut self) -> &mut AudioGraph {
        &mut self.graph
    }

    /// Render interleaved stereo output, overwriting `output`
    pub fn render(&mut self, output: &mut [f32]) {
        self.graph.render(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> SpatialRouter {
        SpatialRouter::new(&EngineConfig::default())
    }

    fn zone(id: &str) -> ZoneId {
        ZoneId::from(id)
    }

    fn source(id: &str) -> SourceId {
        SourceId::from(id)
    }

    #[test]
    fn test_create_wires_unit_panner_master() {
        let mut router = router();
        let instance = router.create_instance("z", EffectKind::Reverb, Vec3::new(1.0, 0.0, 0.0)).unwrap().clone();

        assert_eq!(instance.radius, 2.0);
        assert_eq!(router.graph().node_count(), 3);
        assert!(router.graph().is_connected(instance.unit, instance.panner));
        assert!(router.graph().is_connected(instance.panner, router.master()));
        assert_eq!(router.panner_position(&zone("z")), Some(Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_recreate_starts_fresh() {
        let mut router = router();
        router.create_instance("z", EffectKind::Chorus, Vec3::ZERO).unwrap();
        router.set_radius(&zone("z"), 5.0).unwrap();
        router.intensity_for(&zone("z"), Vec3::ZERO);

        router.create_instance("z", EffectKind::Tremolo, Vec3::ZERO).unwrap();
        assert_eq!(router.radius(&zone("z")), Some(2.0));
        assert_eq!(router.instance(&zone("z")).unwrap().kind, EffectKind::Tremolo);
        assert_eq!(router.instance_count(), 1);
        assert_eq!(router.graph().node_count(), 3);
        // No smoothing history: first call starts from zero again
        assert!((router.intensity_for(&zone("z"), Vec3::ZERO).unwrap() - 0.1).abs() < 1.0e-6);
    }

    #[test]
    fn test_remove_leaves_no_residue() {
        let mut router = router();
        router.create_instance("z", EffectKind::Phaser, Vec3::ZERO).unwrap();
        router.set_send_amount(&source("s"), &zone("z"), 0.5);
        router.attach_preview(&zone("z")).unwrap();

        assert!(router.remove_instance(&zone("z")));
        assert_eq!(router.radius(&zone("z")), None);
        assert_eq!(router.intensity_for(&zone("z"), Vec3::ZERO), None);
        assert_eq!(router.send_count(), 0);
        assert!(!router.is_previewing(&zone("z")));
        // Master plus the source bus
        assert_eq!(router.graph().node_count(), 2);
        assert_eq!(router.graph().connection_count(), 1);

        assert!(!router.remove_instance(&zone("z")));
    }

    #[test]
    fn test_unknown_ids() {
        let mut router = router();
        assert!(matches!(
            router.update_position(&zone("nope"), Vec3::ONE),
            Err(RouterError::UnknownInstance(_))
        ));
        assert!(router.refresh(&zone("nope")).is_err());
        assert_eq!(router.radius(&zone("nope")), None);
        assert!(router.unit(&zone("nope")).is_none());
    }

    #[test]
    fn test_radius_validation() {
        let mut router = router();
        router.create_instance("z", EffectKind::Reverb, Vec3::ZERO).unwrap();
        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(router.set_radius(&zone("z"), bad), Err(RouterError::InvalidRadius(_))));
        }
        router.set_radius(&zone("z"), 4.0).unwrap();
        assert_eq!(router.radius(&zone("z")), Some(4.0));
    }

    #[test]
    fn test_intensity_smoothing() {
        let mut router = router();
        router.create_instance("z", EffectKind::Reverb, Vec3::ZERO).unwrap();
        let first = router.intensity_for(&zone("z"), Vec3::ZERO).unwrap();
        let second = router.intensity_for(&zone("z"), Vec3::ZERO).unwrap();
        assert!((first - 0.1).abs() < 1.0e-6);
        assert!((second - 0.19).abs() < 1.0e-6);

        // Out of range decays toward zero
        let third = router.intensity_for(&zone("z"), Vec3::new(10.0, 0.0, 0.0)).unwrap();
        assert!(third < second);
    }

    #[test]
    fn test_move_only_touches_panner() {
        let mut router = router();
        router.create_instance("z", EffectKind::Distortion, Vec3::ZERO).unwrap();
        router.update_position(&zone("z"), Vec3::new(0.0, 3.0, -2.0)).unwrap();
        assert_eq!(router.panner_position(&zone("z")), Some(Vec3::new(0.0, 3.0, -2.0)));
        assert_eq!(router.instance(&zone("z")).unwrap().position, Vec3::new(0.0, 3.0, -2.0));
    }

    #[test]
    fn test_sends_are_created_lazily() {
        let mut router = router();
        router.create_instance("z", EffectKind::FeedbackDelay, Vec3::ZERO).unwrap();

        router.set_send_amount(&source("s"), &zone("z"), 0.0);
        assert_eq!(router.send_count(), 0);
        assert_eq!(router.source_input(&source("s")), None);

        router.set_send_amount(&source("s"), &zone("z"), 1.5);
        assert_eq!(router.send_amount(&source("s"), &zone("z")), 1.0);
        let bus = router.source_input(&source("s")).unwrap();
        assert!(router.graph().is_connected(bus, router.master()));

        router.set_send_amount(&source("s"), &zone("z"), 0.0);
        assert_eq!(router.send_amount(&source("s"), &zone("z")), 0.0);
        assert_eq!(router.send_count(), 1);

        // Sends into zones without an instance are dropped
        router.set_send_amount(&source("s"), &zone("missing"), 0.7);
        assert_eq!(router.send_amount(&source("s"), &zone("missing")), 0.0);
    }

    #[test]
    fn test_remove_source_drops_its_sends() {
        let mut router = router();
        router.create_instance("z", EffectKind::Vibrato, Vec3::ZERO).unwrap();
        router.set_send_amount(&source("s"), &zone("z"), 0.3);
        assert!(router.remove_source(&source("s")));
        assert_eq!(router.send_count(), 0);
        assert_eq!(router.graph().node_count(), 3);
        assert!(!router.remove_source(&source("s")));
    }

    #[test]
    fn test_silence_source_keeps_routing() {
        let mut router = router();
        router.create_instance("a", EffectKind::Reverb, Vec3::ZERO).unwrap();
        router.create_instance("b", EffectKind::Chorus, Vec3::X).unwrap();
        router.set_send_amount(&source("s"), &zone("a"), 0.4);
        router.set_send_amount(&source("s"), &zone("b"), 0.7);
        router.set_send_amount(&source("t"), &zone("a"), 0.2);

        router.silence_source(&source("s"));
        assert_eq!(router.send_amount(&source("s"), &zone("a")), 0.0);
        assert_eq!(router.send_amount(&source("s"), &zone("b")), 0.0);
        assert_eq!(router.send_amount(&source("t"), &zone("a")), 0.2);
        assert_eq!(router.send_count(), 3);
    }

    #[test]
    fn test_listener_reaches_every_panner() {
        let mut router = router();
        router.create_instance("a", EffectKind::Reverb, Vec3::ZERO).unwrap();
        router.set_listener(Vec3::new(0.0, 1.0, 5.0));
        router.create_instance("b", EffectKind::Reverb, Vec3::ZERO).unwrap();

        for id in ["a", "b"] {
            let panner_idx = router.instance(&zone(id)).unwrap().panner;
            let node = router.graph().get_node(panner_idx).unwrap();
            assert_eq!(node.get_parameter(panner::PARAM_LISTENER_Z), Some(5.0));
        }
    }

    #[test]
    fn test_preview_produces_sound() {
        let mut router = router();
        router.create_instance("z", EffectKind::Tremolo, Vec3::new(0.0, 0.0, -1.0)).unwrap();
        router.attach_preview(&zone("z")).unwrap();

        let mut out = vec![0.0; 4096];
        router.render(&mut out);
        assert!(out.iter().any(|s| s.abs() > 0.01));
        assert!(out.iter().all(|s| s.is_finite()));

        assert!(router.detach_preview(&zone("z")));
        assert!(!router.detach_preview(&zone("z")));
    }
}
