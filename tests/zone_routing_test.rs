use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::FRAC_PI_4;
use zone_fx::audio::node_graph::nodes::TestToneNode;
use zone_fx::dsp::WaveShape;
use zone_fx::spatial::{evaluate, radial_amount};
use zone_fx::{
    EffectKind, EffectZone, EngineConfig, ParamBag, ParamValue, ParameterUpdater, SoundSource, SourceId,
    WorldSnapshot, ZoneEngine, ZoneId,
};

fn engine_with(zones: &[EffectZone]) -> ZoneEngine {
    let mut engine = ZoneEngine::new(EngineConfig::default());
    for zone in zones {
        assert!(engine.create_zone_effect(zone.id.clone(), zone.kind, zone.position));
        engine.resize_zone_radius(&zone.id, zone.radius());
    }
    engine
}

fn snapshot(sources: &[(&str, Vec3)], zones: &[EffectZone]) -> WorldSnapshot {
    WorldSnapshot {
        sources: sources.iter().map(|(id, pos)| SoundSource::new(*id, *pos)).collect(),
        zones: zones.to_vec(),
    }
}

fn send(engine: &ZoneEngine, source: &str, zone: &str) -> f32 {
    engine.router().send_amount(&SourceId::from(source), &ZoneId::from(zone))
}

#[test]
fn test_sphere_scenario_enter_then_exit() {
    let zones = vec![EffectZone::sphere("verb", EffectKind::Reverb, Vec3::ZERO, 2.0)];
    let mut engine = engine_with(&zones);

    engine.frame(&snapshot(&[("s", Vec3::new(1.0, 0.0, 0.0))], &zones));
    assert!((send(&engine, "s", "verb") - 0.5).abs() < 1.0e-6);

    let frame = engine.frame(&snapshot(&[("s", Vec3::new(3.0, 0.0, 0.0))], &zones));
    assert!(!frame.contained(&"s".into(), &"verb".into()));
    assert_eq!(send(&engine, "s", "verb"), 0.0);
}

#[test]
fn test_rotated_cube_scenario() {
    let point = Vec3::new(1.0, 1.0, 1.0);
    let aligned = vec![EffectZone::cube("box", EffectKind::Distortion, Vec3::ZERO, 2.0, Vec3::ZERO)];
    let mut engine = engine_with(&aligned);
    let frame = engine.frame(&snapshot(&[("s", point)], &aligned));
    assert!(frame.contained(&"s".into(), &"box".into()));

    // A point near the aligned box's corner falls outside once the box turns 45 degrees about Y
    let corner = Vec3::new(1.8, 0.0, 1.8);
    let frame = engine.frame(&snapshot(&[("s", corner)], &aligned));
    assert!(frame.contained(&"s".into(), &"box".into()));

    let rotated = vec![EffectZone::cube(
        "box",
        EffectKind::Distortion,
        Vec3::ZERO,
        2.0,
        Vec3::new(0.0, FRAC_PI_4, 0.0),
    )];
    let frame = engine.frame(&snapshot(&[("s", corner)], &rotated));
    assert!(!frame.contained(&"s".into(), &"box".into()));
    assert_eq!(send(&engine, "s", "box"), 0.0);
}

#[test]
fn test_full_disconnect_on_exit() {
    let zones = vec![
        EffectZone::sphere("a", EffectKind::Chorus, Vec3::ZERO, 2.0),
        EffectZone::sphere("b", EffectKind::Tremolo, Vec3::new(3.0, 0.0, 0.0), 2.0),
        EffectZone::cube("c", EffectKind::Phaser, Vec3::new(0.0, 3.0, 0.0), 1.5, Vec3::ZERO),
    ];
    let mut engine = engine_with(&zones);

    engine.frame(&snapshot(&[("s", Vec3::new(1.5, 0.5, 0.0))], &zones));
    assert!(send(&engine, "s", "a") > 0.0);
    assert!(send(&engine, "s", "b") > 0.0);

    engine.frame(&snapshot(&[("s", Vec3::new(-20.0, -20.0, 0.0))], &zones));
    for zone in ["a", "b", "c"] {
        assert_eq!(send(&engine, "s", zone), 0.0);
    }
}

#[test]
fn test_overlap_independence() {
    let zones = vec![
        EffectZone::sphere("small", EffectKind::Reverb, Vec3::new(0.8, 0.0, 0.0), 2.0),
        EffectZone::sphere("large", EffectKind::PingPongDelay, Vec3::new(0.0, 0.0, 0.6), 3.0),
    ];
    let mut engine = engine_with(&zones);
    engine.frame(&snapshot(&[("s", Vec3::ZERO)], &zones));

    let small = send(&engine, "s", "small");
    let large = send(&engine, "s", "large");
    assert!((small - radial_amount(0.8, 2.0)).abs() < 1.0e-6);
    assert!((large - radial_amount(0.6, 3.0)).abs() < 1.0e-6);

    // Removing one zone leaves the other's send untouched
    let only_large = vec![zones[1].clone()];
    engine.frame(&snapshot(&[("s", Vec3::ZERO)], &only_large));
    assert_eq!(send(&engine, "s", "large"), large);
}

#[test]
fn test_containment_monotonic_in_distance() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..200 {
        let radius: f32 = rng.gen_range(0.1..10.0);
        let centre = Vec3::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0));
        let direction = Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
            .try_normalize()
            .unwrap_or(Vec3::X);
        let zone = EffectZone::sphere("z", EffectKind::Reverb, centre, radius);

        let mut previous = evaluate(&zone, centre).amount;
        assert_eq!(previous, 1.0);
        for step in 1..=20 {
            let distance = radius * step as f32 / 20.0;
            let reading = evaluate(&zone, centre + direction * distance * 0.999);
            assert!(reading.amount <= previous + 1.0e-6);
            previous = reading.amount;
        }

        let outside = evaluate(&zone, centre + direction * radius * 1.01);
        assert!(!outside.contained);
        assert_eq!(outside.amount, 0.0);
    }
}

#[test]
fn test_idempotent_refresh() {
    let zones = vec![EffectZone::sphere("z", EffectKind::Vibrato, Vec3::new(1.0, 2.0, 3.0), 2.0)];
    let mut engine = engine_with(&zones);
    let id = ZoneId::from("z");

    engine.refresh_all();
    let first = engine.router().panner_position(&id);
    engine.refresh_all();
    assert_eq!(engine.router().panner_position(&id), first);
    assert_eq!(first, Some(Vec3::new(1.0, 2.0, 3.0)));
}

#[test]
fn test_removal_leaves_no_residue() {
    let zones = vec![EffectZone::sphere("z", EffectKind::Freeverb, Vec3::ZERO, 2.0)];
    let mut engine = engine_with(&zones);
    let id = ZoneId::from("z");

    engine.resize_zone_radius(&id, 5.0);
    engine.frame(&snapshot(&[("s", Vec3::X)], &zones));
    let nodes_with_instance = engine.stats_snapshot().graph_node_count;

    engine.remove_zone_effect(&id);
    assert_eq!(engine.router().radius(&id), None);
    assert_eq!(engine.router_mut().intensity_for(&id, Vec3::ZERO), None);
    assert_eq!(engine.stats_snapshot().send_count, 0);
    // Unit, panner and the send are gone; the source bus stays
    assert_eq!(engine.stats_snapshot().graph_node_count, nodes_with_instance - 3);

    assert!(engine.create_zone_effect(id.clone(), EffectKind::Freeverb, Vec3::ZERO));
    assert_eq!(engine.router().radius(&id), Some(2.0));
}

#[test]
fn test_partial_update_applies_valid_keys() {
    let zones = vec![EffectZone::sphere("wah", EffectKind::AutoWah, Vec3::ZERO, 2.0)];
    let mut engine = engine_with(&zones);
    let id = ZoneId::from("wah");

    let mut params = ParamBag::new();
    params.insert("baseFrequency".into(), ParamValue::Number(300.0));
    params.insert("octaves".into(), ParamValue::Number(4.0));
    params.insert("sensitivity".into(), ParamValue::Number(-10.0));
    params.insert("Q".into(), ParamValue::Text("sharp".into()));
    params.insert("warp".into(), ParamValue::Number(9.0));

    let report = engine.update_effect_params(&id, &params).unwrap();
    assert_eq!(report.applied.len(), 3);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.ignored, vec!["warp"]);

    let current = engine.effect_params(&id).unwrap();
    assert_eq!(current.get("baseFrequency"), Some(&ParamValue::Number(300.0)));
    assert_eq!(current.get("octaves"), Some(&ParamValue::Number(4.0)));
    assert_eq!(current.get("sensitivity"), Some(&ParamValue::Number(-10.0)));
}

#[test]
fn test_source_is_heard_through_zone_effect() {
    let zones = vec![EffectZone::sphere("crush", EffectKind::BitCrusher, Vec3::new(0.0, 0.0, -1.0), 2.0)];
    let mut engine = engine_with(&zones);

    let bus = engine.register_source("s");
    let graph = engine.router_mut().graph_mut();
    let tone = graph.add_node(Box::new(TestToneNode::new("s-tone", 220.0, 0.4, WaveShape::Sine)));
    graph.connect(tone, 0, bus, 0).unwrap();

    let mut dry_only = vec![0.0; 4096];
    engine.render(&mut dry_only);

    engine.frame(&snapshot(&[("s", Vec3::new(0.0, 0.0, -1.0))], &zones));
    let mut with_send = vec![0.0; 4096];
    for _ in 0..4 {
        engine.render(&mut with_send);
    }

    assert!(with_send.iter().all(|s| s.is_finite()));
    let energy = |buffer: &[f32]| buffer.iter().map(|s| s * s).sum::<f32>();
    assert!(energy(&with_send) > energy(&dry_only));
}

#[test]
fn test_commands_apply_on_next_frame() {
    let (mut engine, mut controller) = ZoneEngine::with_controller(EngineConfig::default());
    let zones = vec![EffectZone::sphere("z", EffectKind::Chorus, Vec3::ZERO, 2.0)];

    controller.create_zone_effect("z", EffectKind::Chorus, Vec3::ZERO);
    let mut params = ParamBag::new();
    params.insert("chorusFrequency".into(), ParamValue::Number(3.0));
    controller.update_effect_params("z", params);

    // Nothing is visible until the frame drains the queue
    assert!(engine.effect_params(&"z".into()).is_none());

    engine.frame(&snapshot(&[("s", Vec3::new(0.5, 0.0, 0.0))], &zones));
    let current = engine.effect_params(&"z".into()).unwrap();
    assert_eq!(current.get("chorusFrequency"), Some(&ParamValue::Number(3.0)));
    assert!((send(&engine, "s", "z") - 0.75).abs() < 1.0e-6);

    controller.remove_zone_effect("z");
    engine.frame(&WorldSnapshot::default());
    assert_eq!(engine.stats_snapshot().active_instance_count, 0);
}

#[test]
fn test_every_kind_reads_back_after_creation() {
    let mut engine = ZoneEngine::new(EngineConfig::default());
    for (i, &kind) in engine.list_supported_kinds().iter().enumerate() {
        let id = ZoneId::from(format!("zone-{}", i));
        assert!(engine.create_zone_effect(id.clone(), kind, Vec3::ZERO));
        let (_, unit) = engine.router().unit(&id).unwrap();
        let current = ParameterUpdater::current_params(unit, kind);
        assert!(current.contains_key("wet"), "{} has no wet control", kind);
    }
    assert_eq!(engine.stats_snapshot().active_instance_count, 17);
}
