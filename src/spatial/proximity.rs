use super::geometry::{evaluate, Containment};
use super::router::SpatialRouter;
use super::world::{SourceId, WorldSnapshot, ZoneId};
use std::time::{Duration, Instant};

/// Anything that can receive per-pair send amounts
pub trait SendSink {
    fn set_send_amount(&mut self, source: &SourceId, zone: &ZoneId, amount: f32);
}

impl SendSink for SpatialRouter {
    fn set_send_amount(&mut self, source: &SourceId, zone: &ZoneId, amount: f32) {
        SpatialRouter::set_send_amount(self, source, zone, amount);
    }
}

/// One evaluated (source, zone) pair
#[derive(Debug, Clone, PartialEq)]
pub struct PairReading {
    pub source: SourceId,
    pub zone: ZoneId,
    pub containment: Containment,
}

/// What one detector pass computed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProximityFrame {
    /// True when the world had no zones and nothing was evaluated
    pub skipped: bool,
    pub readings: Vec<PairReading>,
}

impl ProximityFrame {
    /// Amount computed for a pair this frame, if it was evaluated
    pub fn amount(&self, source: &SourceId, zone: &ZoneId) -> Option<f32> {
        self.readings
            .iter()
            .find(|reading| &reading.source == source && &reading.zone == zone)
            .map(|reading| reading.containment.amount)
    }

    pub fn contained(&self, source: &SourceId, zone: &ZoneId) -> bool {
        self.readings
            .iter()
            .any(|reading| &reading.source == source && &reading.zone == zone && reading.containment.contained)
    }
}

/// Per-frame sweep turning world geometry into send amounts
pub struct ProximityDetector {
    log_interval: Duration,
    last_log: Option<Instant>,
}

impl ProximityDetector {
    pub fn new(log_interval: Duration) -> Self {
        Self {
            log_interval,
            last_log: None,
        }
    }

    /// Evaluate every (source, zone) pair and push the amounts into `sink`
    pub fn run(&mut self, world: &WorldSnapshot, sink: &mut dyn SendSink) -> ProximityFrame {
        self.run_at(world, sink, Instant::now())
    }

    /// As `run`, with the wall-clock time used for diagnostics throttling
    pub fn run_at(&mut self, world: &WorldSnapshot, sink: &mut dyn SendSink, now: Instant) -> ProximityFrame {
        if world.zones.is_empty() {
            return ProximityFrame {
                skipped: true,
                readings: Vec::new(),
            };
        }

        let log_now = self.should_log(now);
        let mut readings = Vec::with_capacity(world.sources.len() * world.zones.len());

        for source in &world.sources {
            let mut in_any_zone = false;

            for zone in &world.zones {
                let containment = evaluate(zone, source.position);
                in_any_zone |= containment.contained;
                sink.set_send_amount(&source.id, &zone.id, containment.amount);

                if log_now {
                    log::debug!(
                        "source '{}' zone '{}' ({:?}): distance {:.3}, contained {}, amount {:.3}",
                        source.id,
                        zone.id,
                        zone.shape,
                        containment.distance,
                        containment.contained,
                        containment.amount
                    );
                }

                readings.push(PairReading {
                    source: source.id.clone(),
                    zone: zone.id.clone(),
                    containment,
                });
            }

            // Only after every zone has been seen for this source
            if !in_any_zone {
                for zone in &world.zones {
                    sink.set_send_amount(&source.id, &zone.id, 0.0);
                }
            }
        }

        ProximityFrame {
            skipped: false,
            readings,
        }
    }

    fn should_log(&mut self, now: Instant) -> bool {
        let due = match self.last_log {
            Some(last) => now.saturating_duration_since(last) >= self.log_interval,
            None => true,
        };
        if due {
            self.last_log = Some(now);
        }
        due
    }
}

impl Default for ProximityDetector {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKind;
    use crate::spatial::{EffectZone, SoundSource};
    use glam::Vec3;
    use std::collections::HashMap;

    /// Records every call, keeping the last amount per pair
    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<(SourceId, ZoneId, f32)>,
        last: HashMap<(SourceId, ZoneId), f32>,
    }

    impl SendSink for RecordingSink {
        fn set_send_amount(&mut self, source: &SourceId, zone: &ZoneId, amount: f32) {
            self.calls.push((source.clone(), zone.clone(), amount));
            self.last.insert((source.clone(), zone.clone()), amount);
        }
    }

    impl RecordingSink {
        fn last(&self, source: &str, zone: &str) -> Option<f32> {
            self.last.get(&(SourceId::from(source), ZoneId::from(zone))).copied()
        }
    }

    fn world(sources: Vec<SoundSource>, zones: Vec<EffectZone>) -> WorldSnapshot {
        WorldSnapshot { sources, zones }
    }

    #[test]
    fn test_no_zones_skips_entirely() {
        let mut detector = ProximityDetector::default();
        let mut sink = RecordingSink::default();
        let frame = detector.run(&world(vec![SoundSource::new("s", Vec3::ZERO)], vec![]), &mut sink);
        assert!(frame.skipped);
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn test_sphere_enter_and_exit() {
        let mut detector = ProximityDetector::default();
        let mut sink = RecordingSink::default();
        let zones = vec![EffectZone::sphere("z", EffectKind::Reverb, Vec3::ZERO, 2.0)];

        let frame = detector.run(&world(vec![SoundSource::new("s", Vec3::X)], zones.clone()), &mut sink);
        assert!(frame.contained(&"s".into(), &"z".into()));
        assert_eq!(sink.last("s", "z"), Some(0.5));

        let frame = detector.run(&world(vec![SoundSource::new("s", Vec3::new(3.0, 0.0, 0.0))], zones), &mut sink);
        assert!(!frame.contained(&"s".into(), &"z".into()));
        assert_eq!(frame.amount(&"s".into(), &"z".into()), Some(0.0));
        assert_eq!(sink.last("s", "z"), Some(0.0));
    }

    #[test]
    fn test_zero_reasserted_after_all_zones() {
        let mut detector = ProximityDetector::default();
        let mut sink = RecordingSink::default();
        let zones = vec![
            EffectZone::sphere("a", EffectKind::Reverb, Vec3::ZERO, 1.0),
            EffectZone::sphere("b", EffectKind::Chorus, Vec3::new(10.0, 0.0, 0.0), 1.0),
        ];
        detector.run(&world(vec![SoundSource::new("s", Vec3::new(5.0, 0.0, 0.0))], zones), &mut sink);

        // Two evaluated sends, then the aggregate pass for both zones
        let zones_in_order: Vec<&str> = sink.calls.iter().map(|(_, zone, _)| zone.as_str()).collect();
        assert_eq!(zones_in_order, vec!["a", "b", "a", "b"]);
        assert!(sink.calls.iter().all(|(_, _, amount)| *amount == 0.0));
    }

    #[test]
    fn test_contained_source_gets_no_aggregate_pass() {
        let mut detector = ProximityDetector::default();
        let mut sink = RecordingSink::default();
        let zones = vec![
            EffectZone::sphere("a", EffectKind::Reverb, Vec3::ZERO, 2.0),
            EffectZone::sphere("b", EffectKind::Chorus, Vec3::new(10.0, 0.0, 0.0), 1.0),
        ];
        detector.run(&world(vec![SoundSource::new("s", Vec3::ZERO)], zones), &mut sink);
        assert_eq!(sink.calls.len(), 2);
        assert_eq!(sink.last("s", "a"), Some(1.0));
    }

    #[test]
    fn test_overlapping_zones_are_independent() {
        let mut detector = ProximityDetector::default();
        let mut sink = RecordingSink::default();
        let zones = vec![
            EffectZone::sphere("small", EffectKind::Reverb, Vec3::new(0.5, 0.0, 0.0), 2.0),
            EffectZone::sphere("large", EffectKind::Phaser, Vec3::new(0.0, 1.0, 0.0), 3.0),
        ];
        detector.run(&world(vec![SoundSource::new("s", Vec3::ZERO)], zones), &mut sink);

        assert!((sink.last("s", "small").unwrap() - (1.0 - 0.5 / 2.0)).abs() < 1.0e-6);
        assert!((sink.last("s", "large").unwrap() - (1.0 - 1.0 / 3.0)).abs() < 1.0e-6);
    }

    #[test]
    fn test_diagnostics_are_throttled() {
        let mut detector = ProximityDetector::new(Duration::from_secs(2));
        let start = Instant::now();
        assert!(detector.should_log(start));
        assert!(!detector.should_log(start + Duration::from_millis(500)));
        assert!(!detector.should_log(start + Duration::from_millis(1999)));
        assert!(detector.should_log(start + Duration::from_secs(2)));
    }
}
