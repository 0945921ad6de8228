// Utility nodes
pub mod gain;
pub mod output;
pub mod panner;
pub mod test_tone;

// One node per effect kind
pub mod auto_filter;
pub mod auto_wah;
pub mod bit_crusher;
pub mod chebyshev;
pub mod chorus;
pub mod distortion;
pub mod feedback_delay;
pub mod freeverb;
pub mod frequency_shifter;
pub mod jc_reverb;
pub mod phaser;
pub mod ping_pong_delay;
pub mod pitch_shift;
pub mod reverb;
pub mod stereo_widener;
pub mod tremolo;
pub mod vibrato;

pub use auto_filter::AutoFilterNode;
pub use auto_wah::AutoWahNode;
pub use bit_crusher::BitCrusherNode;
pub use chebyshev::ChebyshevNode;
pub use chorus::ChorusNode;
pub use distortion::DistortionNode;
pub use feedback_delay::FeedbackDelayNode;
pub use freeverb::FreeverbNode;
pub use frequency_shifter::FrequencyShifterNode;
pub use gain::GainNode;
pub use jc_reverb::JcReverbNode;
pub use output::MasterOutputNode;
pub use panner::PannerNode;
pub use phaser::PhaserNode;
pub use ping_pong_delay::PingPongDelayNode;
pub use pitch_shift::PitchShiftNode;
pub use reverb::ReverbNode;
pub use stereo_widener::StereoWidenerNode;
pub use test_tone::TestToneNode;
pub use tremolo::TremoloNode;
pub use vibrato::VibratoNode;

use super::NodePort;

/// The single stereo in / stereo out port pair most nodes expose
pub(crate) fn stereo_ports() -> (Vec<NodePort>, Vec<NodePort>) {
    (vec![NodePort::new("Audio In", 0)], vec![NodePort::new("Audio Out", 0)])
}

/// Run one block through a single-input node and return its first output
#[cfg(test)]
pub(crate) fn run_block(node: &mut dyn super::AudioNode, input: &[f32], sample_rate: u32) -> Vec<f32> {
    let mut out = vec![0.0; input.len()];
    {
        let mut outputs: Vec<&mut [f32]> = vec![&mut out[..]];
        if node.inputs().is_empty() {
            node.process(&[], &mut outputs, sample_rate);
        } else {
            node.process(&[input], &mut outputs, sample_rate);
        }
    }
    out
}
