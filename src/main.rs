use anyhow::{anyhow, Context};
use clap::Parser;
use glam::Vec3;
use serde::Deserialize;
use std::path::PathBuf;
use zone_fx::audio::node_graph::nodes::TestToneNode;
use zone_fx::{EffectZone, EngineConfig, ParamBag, SoundSource, SourceId, TestSignalConfig, WorldSnapshot, ZoneEngine};

/// Offline renderer: animates the sources of a scene through its effect zones
/// and writes what the listener hears to a WAV file
#[derive(Parser, Debug)]
#[command(name = "zone-render")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene description (JSON)
    #[arg(long)]
    scene: PathBuf,

    /// Output WAV path
    #[arg(long)]
    out: PathBuf,

    /// Length of the render in seconds
    #[arg(long, default_value_t = 8.0)]
    seconds: f32,

    /// Animation frames per second; the proximity sweep runs once per frame
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Engine configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Scene {
    #[serde(default)]
    listener: Vec3,
    #[serde(default)]
    sources: Vec<SceneSource>,
    #[serde(default)]
    zones: Vec<SceneZone>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneSource {
    id: SourceId,
    tone: TestSignalConfig,
    /// Path walked at constant pace over the whole render
    waypoints: Vec<Vec3>,
}

impl SceneSource {
    fn position_at(&self, progress: f32) -> Vec3 {
        match self.waypoints.as_slice() {
            [] => Vec3::ZERO,
            [only] => *only,
            points => {
                let span = progress.clamp(0.0, 1.0) * (points.len() - 1) as f32;
                let segment = (span.floor() as usize).min(points.len() - 2);
                points[segment].lerp(points[segment + 1], span - segment as f32)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SceneZone {
    #[serde(flatten)]
    zone: EffectZone,
    #[serde(default)]
    params: ParamBag,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let text = std::fs::read_to_string(&args.scene).with_context(|| format!("reading {}", args.scene.display()))?;
    let scene: Scene = serde_json::from_str(&text).with_context(|| format!("parsing {}", args.scene.display()))?;

    if args.fps == 0 || args.seconds <= 0.0 {
        return Err(anyhow!("--fps and --seconds must be positive"));
    }

    let sample_rate = config.sample_rate;
    let mut engine = ZoneEngine::new(config);
    engine.set_listener(scene.listener);

    for SceneZone { zone, params } in &scene.zones {
        if !engine.create_zone_effect(zone.id.clone(), zone.kind, zone.position) {
            continue;
        }
        engine.resize_zone_radius(&zone.id, zone.radius());
        if !params.is_empty() {
            if let Some(report) = engine.update_effect_params(&zone.id, params) {
                for name in &report.ignored {
                    log::warn!("Zone '{}' has no control '{}'", zone.id, name);
                }
            }
        }
    }

    for source in &scene.sources {
        let bus = engine.register_source(source.id.clone());
        let graph = engine.router_mut().graph_mut();
        let tone = graph.add_node(Box::new(TestToneNode::new(
            format!("{}-tone", source.id),
            source.tone.frequency,
            source.tone.level,
            source.tone.wave_shape,
        )));
        graph
            .connect(tone, 0, bus, 0)
            .map_err(|e| anyhow!("wiring source '{}': {}", source.id, e))?;
    }

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer =
        hound::WavWriter::create(&args.out, spec).with_context(|| format!("creating {}", args.out.display()))?;

    let total_frames = (args.seconds * sample_rate as f32) as usize;
    let frames_per_tick = sample_rate as f64 / args.fps as f64;
    let zones: Vec<EffectZone> = scene.zones.iter().map(|z| z.zone.clone()).collect();

    let mut rendered = 0usize;
    let mut owed = 0.0f64;
    let mut buffer = Vec::new();
    let mut peak = 0.0f32;

    while rendered < total_frames {
        let progress = rendered as f32 / total_frames as f32;
        let world = WorldSnapshot {
            sources: scene
                .sources
                .iter()
                .map(|s| SoundSource::new(s.id.clone(), s.position_at(progress)))
                .collect(),
            zones: zones.clone(),
        };
        engine.frame(&world);

        owed += frames_per_tick;
        let frames = (owed.floor() as usize).min(total_frames - rendered);
        owed -= frames as f64;

        buffer.resize(frames * 2, 0.0);
        engine.render(&mut buffer);
        for &sample in &buffer {
            peak = peak.max(sample.abs());
            writer.write_sample(sample)?;
        }
        rendered += frames;
    }

    writer.finalize()?;
    log::info!(
        "Rendered {:.2}s ({} frames, {} zones, {} sources) to {}, peak {:.3}",
        args.seconds,
        engine.frame_count(),
        scene.zones.len(),
        scene.sources.len(),
        args.out.display(),
        peak
    );
    Ok(())
}
