use super::kind::EffectKind;
use crate::audio::node_graph::nodes::{
    auto_filter, auto_wah, bit_crusher, chebyshev, chorus, distortion, feedback_delay, freeverb, frequency_shifter,
    jc_reverb, phaser, ping_pong_delay, pitch_shift, reverb, stereo_widener, tremolo, vibrato, AutoFilterNode,
    AutoWahNode, BitCrusherNode, ChebyshevNode, ChorusNode, DistortionNode, FeedbackDelayNode, FreeverbNode,
    FrequencyShifterNode, JcReverbNode, PhaserNode, PingPongDelayNode, PitchShiftNode, ReverbNode, StereoWidenerNode,
    TremoloNode, VibratoNode,
};
use crate::audio::node_graph::AudioNode;
use crate::dsp::WaveShape;
use crate::error::EffectError;
use serde::{Deserialize, Serialize};

/// Oscillator settings used to audition an effect on its own
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSignalConfig {
    pub frequency: f32,
    pub level: f32,
    pub wave_shape: WaveShape,
}

impl TestSignalConfig {
    const fn new(frequency: f32, level: f32, wave_shape: WaveShape) -> Self {
        Self {
            frequency,
            level,
            wave_shape,
        }
    }
}

/// Builds a ready-to-route unit for each effect kind
pub struct EffectCatalog;

impl EffectCatalog {
    /// Construct a unit for `kind` with its tuned defaults applied and settled
    pub fn create(kind: EffectKind) -> Box<dyn AudioNode> {
        let name = kind.id();
        let mut node: Box<dyn AudioNode> = match kind {
            EffectKind::Phaser => Box::new(PhaserNode::new(name)),
            EffectKind::AutoFilter => Box::new(AutoFilterNode::new(name)),
            EffectKind::AutoWah => Box::new(AutoWahNode::new(name)),
            EffectKind::BitCrusher => Box::new(BitCrusherNode::new(name)),
            EffectKind::Chebyshev => Box::new(ChebyshevNode::new(name)),
            EffectKind::Distortion => Box::new(DistortionNode::new(name)),
            EffectKind::Chorus => Box::new(ChorusNode::new(name)),
            EffectKind::FeedbackDelay => Box::new(FeedbackDelayNode::new(name)),
            EffectKind::PingPongDelay => Box::new(PingPongDelayNode::new(name)),
            EffectKind::Reverb => Box::new(ReverbNode::new(name)),
            EffectKind::Freeverb => Box::new(FreeverbNode::new(name)),
            EffectKind::JcReverb => Box::new(JcReverbNode::new(name)),
            EffectKind::FrequencyShifter => Box::new(FrequencyShifterNode::new(name)),
            EffectKind::PitchShift => Box::new(PitchShiftNode::new(name)),
            EffectKind::StereoWidener => Box::new(StereoWidenerNode::new(name)),
            EffectKind::Tremolo => Box::new(TremoloNode::new(name)),
            EffectKind::Vibrato => Box::new(VibratoNode::new(name)),
        };

        for &(id, value) in Self::preset(kind) {
            if let Err(e) = node.set_parameter(id, value) {
                log::error!("Preset for {} rejected parameter {}: {}", kind, id, e);
            }
        }
        // Start from the preset, not a ramp toward it
        node.reset();
        node
    }

    /// Hand-tuned starting values per kind
    fn preset(kind: EffectKind) -> &'static [(u32, f32)] {
        match kind {
            EffectKind::Phaser => &[
                (phaser::PARAM_FREQUENCY, 0.5),
                (phaser::PARAM_OCTAVES, 2.2),
                (phaser::PARAM_BASE_FREQUENCY, 1000.0),
                (phaser::PARAM_STAGES, 6.0),
            ],
            EffectKind::AutoFilter => &[
                (auto_filter::PARAM_FREQUENCY, 1.0),
                (auto_filter::PARAM_DEPTH, 1.0),
                (auto_filter::PARAM_BASE_FREQUENCY, 200.0),
                (auto_filter::PARAM_OCTAVES, 2.6),
                (auto_filter::PARAM_FILTER_Q, 1.0),
            ],
            EffectKind::AutoWah => &[
                (auto_wah::PARAM_BASE_FREQUENCY, 100.0),
                (auto_wah::PARAM_OCTAVES, 6.0),
                (auto_wah::PARAM_SENSITIVITY, 0.0),
                (auto_wah::PARAM_Q, 2.0),
            ],
            EffectKind::BitCrusher => &[(bit_crusher::PARAM_BITS, 4.0)],
            EffectKind::Chebyshev => &[(chebyshev::PARAM_ORDER, 50.0)],
            EffectKind::Distortion => &[(distortion::PARAM_DISTORTION, 0.4)],
            EffectKind::Chorus => &[
                (chorus::PARAM_FREQUENCY, 1.5),
                (chorus::PARAM_DELAY_TIME, 3.5),
                (chorus::PARAM_DEPTH, 0.7),
                (chorus::PARAM_SPREAD, 180.0),
            ],
            EffectKind::FeedbackDelay => &[(feedback_delay::PARAM_DELAY_TIME, 0.25), (feedback_delay::PARAM_FEEDBACK, 0.5)],
            EffectKind::PingPongDelay => &[
                (ping_pong_delay::PARAM_DELAY_TIME, 0.25),
                (ping_pong_delay::PARAM_FEEDBACK, 0.3),
            ],
            EffectKind::Reverb => &[(reverb::PARAM_DECAY, 1.5), (reverb::PARAM_PRE_DELAY, 0.01)],
            EffectKind::Freeverb => &[(freeverb::PARAM_ROOM_SIZE, 0.7), (freeverb::PARAM_DAMPENING, 3000.0)],
            EffectKind::JcReverb => &[(jc_reverb::PARAM_ROOM_SIZE, 0.5)],
            EffectKind::FrequencyShifter => &[(frequency_shifter::PARAM_FREQUENCY, 42.0)],
            EffectKind::PitchShift => &[(pitch_shift::PARAM_PITCH, 0.0), (pitch_shift::PARAM_WINDOW_SIZE, 0.1)],
            EffectKind::StereoWidener => &[(stereo_widener::PARAM_WIDTH, 0.5)],
            EffectKind::Tremolo => &[(tremolo::PARAM_FREQUENCY, 10.0), (tremolo::PARAM_DEPTH, 0.5)],
            EffectKind::Vibrato => &[(vibrato::PARAM_FREQUENCY, 5.0), (vibrato::PARAM_DEPTH, 0.1)],
        }
    }

    /// Parse a kind id and construct it; unknown ids fail fast
    pub fn create_named(kind: &str) -> Result<(EffectKind, Box<dyn AudioNode>), EffectError> {
        let kind: EffectKind = kind.parse()?;
        Ok((kind, Self::create(kind)))
    }

    /// Oscillator settings that make the effect's character audible in isolation
    pub fn test_signal_config(kind: EffectKind) -> TestSignalConfig {
        use WaveShape::*;
        match kind {
            // Resonant and filter kinds clip easily, so they get quieter, brighter signals
            EffectKind::Phaser => TestSignalConfig::new(440.0, 0.3, Sawtooth),
            EffectKind::AutoFilter => TestSignalConfig::new(220.0, 0.25, Sawtooth),
            EffectKind::AutoWah => TestSignalConfig::new(220.0, 0.25, Sawtooth),
            EffectKind::BitCrusher => TestSignalConfig::new(440.0, 0.4, Sine),
            EffectKind::Chebyshev => TestSignalConfig::new(220.0, 0.3, Sine),
            EffectKind::Distortion => TestSignalConfig::new(220.0, 0.3, Sine),
            EffectKind::Chorus => TestSignalConfig::new(440.0, 0.4, Triangle),
            EffectKind::FeedbackDelay => TestSignalConfig::new(523.25, 0.4, Triangle),
            EffectKind::PingPongDelay => TestSignalConfig::new(523.25, 0.4, Triangle),
            EffectKind::Reverb => TestSignalConfig::new(523.25, 0.35, Triangle),
            EffectKind::Freeverb => TestSignalConfig::new(523.25, 0.35, Triangle),
            EffectKind::JcReverb => TestSignalConfig::new(523.25, 0.35, Triangle),
            EffectKind::FrequencyShifter => TestSignalConfig::new(440.0, 0.4, Sine),
            EffectKind::PitchShift => TestSignalConfig::new(440.0, 0.4, Sine),
            EffectKind::StereoWidener => TestSignalConfig::new(330.0, 0.3, Sawtooth),
            EffectKind::Tremolo => TestSignalConfig::new(440.0, 0.5, Sine),
            EffectKind::Vibrato => TestSignalConfig::new(440.0, 0.5, Sine),
        }
    }

    /// Every supported kind, in catalog order
    pub fn supported_kinds() -> &'static [EffectKind] {
        &EffectKind::ALL
    }
}
