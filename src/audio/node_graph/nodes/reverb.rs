use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::reverb_filters::scale_delay;
use crate::dsp::{AllPassFilter, CombFilter, DelayLine, WetDryMix};

pub const PARAM_DECAY: u32 = 0;
pub const PARAM_PRE_DELAY: u32 = 1;

// Comb filter delays, tuned at 44.1 kHz
const COMB_DELAYS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
// All-pass filter delays, tuned at 44.1 kHz
const ALLPASS_DELAYS: [usize; 4] = [556, 441, 341, 225];
// Right channel is offset for decorrelation
const STEREO_SPREAD: usize = 23;

const MAX_PRE_DELAY: f32 = 1.0;
const OUTPUT_SCALE: f32 = 0.015;

struct Tank {
    combs: Vec<CombFilter>,
    allpasses: Vec<AllPassFilter>,
}

impl Tank {
    fn new(sample_rate: u32, spread: usize) -> Self {
        Self {
            combs: COMB_DELAYS
                .iter()
                .map(|&d| CombFilter::new(scale_delay(d + spread, sample_rate)))
                .collect(),
            allpasses: ALLPASS_DELAYS
                .iter()
                .map(|&d| AllPassFilter::new(scale_delay(d + spread, sample_rate), 0.5))
                .collect(),
        }
    }

    /// Comb feedback for a -60 dB tail after `decay` seconds
    fn set_decay(&mut self, decay: f32, sample_rate: u32) {
        for comb in &mut self.combs {
            let seconds = comb.len() as f32 / sample_rate as f32;
            comb.set_feedback(10.0_f32.powf(-3.0 * seconds / decay));
            comb.set_damp(0.2);
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mut output = 0.0;
        for comb in &mut self.combs {
            output += comb.process(input);
        }
        output *= OUTPUT_SCALE;

        for allpass in &mut self.allpasses {
            output = allpass.process(output);
        }
        output
    }

    fn mute(&mut self) {
        self.combs.iter_mut().for_each(CombFilter::mute);
        self.allpasses.iter_mut().for_each(AllPassFilter::mute);
    }
}

/// Schroeder reverb sized by its decay time, with a pre-delay
pub struct ReverbNode {
    name: String,
    decay: f32,     // seconds to -60 dB
    pre_delay: f32, // seconds

    pre_delay_line: DelayLine,
    left: Tank,
    right: Tank,
    mix: WetDryMix,
    sample_rate: u32,

    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl ReverbNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters = vec![
            Parameter::new(PARAM_DECAY, "decay", 0.001, 30.0, 1.5, ParameterUnit::Time),
            Parameter::new(PARAM_PRE_DELAY, "preDelay", 0.0, MAX_PRE_DELAY, 0.01, ParameterUnit::Time),
        ];
        parameters.extend(WetDryMix::parameters(1.0));

        let mut node = Self {
            name: name.into(),
            decay: 1.5,
            pre_delay: 0.01,
            pre_delay_line: DelayLine::new(0),
            left: Tank::new(48000, 0),
            right: Tank::new(48000, STEREO_SPREAD),
            mix: WetDryMix::new(1.0),
            sample_rate: 48000,
            inputs,
            outputs,
            parameters,
        };
        node.rebuild(48000);
        node
    }

    fn rebuild(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.pre_delay_line = DelayLine::with_duration(MAX_PRE_DELAY, sample_rate);
        self.left = Tank::new(sample_rate, 0);
        self.right = Tank::new(sample_rate, STEREO_SPREAD);
        self.apply_decay();
    }

    fn apply_decay(&mut self) {
        self.left.set_decay(self.decay, self.sample_rate);
        self.right.set_decay(self.decay, self.sample_rate);
    }
}

impl AudioNode for ReverbNode {
    fn category(&self) -> NodeCategory {
        NodeCategory::Effect
    }

    fn inputs(&self) -> &[NodePort] {
        &self.inputs
    }

    fn outputs(&self) -> &[NodePort] {
        &self.outputs
    }

    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn set_parameter(&mut self, id: u32, value: f32) -> Result<(), ParameterError> {
        match id {
            PARAM_DECAY => {
                self.decay = check_finite(id, value)?.clamp(0.001, 30.0);
                self.apply_decay();
            }
            PARAM_PRE_DELAY => self.pre_delay = check_finite(id, value)?.clamp(0.0, MAX_PRE_DELAY),
            _ => return self.mix.set_parameter(id, value).unwrap_or(Err(ParameterError::Unavailable(id))),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_DECAY => Some(self.decay),
            PARAM_PRE_DELAY => Some(self.pre_delay),
            _ => self.mix.get_parameter(id),
        }
    }

    fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]], sample_rate: u32) {
        if inputs.is_empty() || outputs.is_empty() {
            return;
        }

        if self.sample_rate != sample_rate {
            self.rebuild(sample_rate);
        }

        let input = inputs[0];
        let output = &mut outputs[0];
        let frames = input.len().min(output.len()) / 2;
        let pre_delay_samples = self.pre_delay * sample_rate as f32;

        for frame in 0..frames {
            let left_in = input[frame * 2];
            let right_in = input[frame * 2 + 1];

            self.pre_delay_line.write((left_in + right_in) * 0.5);
            let send = self.pre_delay_line.read(pre_delay_samples + 1.0);

            let left = self.left.process(send);
            let right = self.right.process(send);

            let (dry, wet) = self.mix.gains(sample_rate);
            output[frame * 2] = left_in * dry + left * wet;
            output[frame * 2 + 1] = right_in * dry + right * wet;
        }
    }

    fn reset(&mut self) {
        self.pre_delay_line.clear();
        self.left.mute();
        self.right.mute();
        self.mix.settle();
    }

    fn node_type(&self) -> &str {
        "Reverb"
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tail_energy(decay: f32) -> f32 {
        let mut node = ReverbNode::new("reverb");
        node.set_parameter(PARAM_DECAY, decay).unwrap();
        let mut input = vec![0.0; 48000];
        input[0] = 1.0;
        input[1] = 1.0;
        let out = super::super::run_block(&mut node, &input, 48000);
        out[24000..].iter().map(|s| s * s).sum()
    }

    #[test]
    fn test_longer_decay_has_longer_tail() {
        assert!(tail_energy(4.0) > tail_energy(0.3));
    }

    #[test]
    fn test_tail_stays_finite() {
        assert!(tail_energy(30.0).is_finite());
    }
}
