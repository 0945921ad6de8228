use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::reverb_filters::scale_delay;
use crate::dsp::{AllPassFilter, CombFilter, SmoothedValue, WetDryMix};
use std::f32::consts::PI;

pub const PARAM_ROOM_SIZE: u32 = 0;
pub const PARAM_DAMPENING: u32 = 1;

// Lowpass-feedback comb tunings; the first half feeds the left channel
const COMB_TUNINGS: [usize; 8] = [1557, 1617, 1491, 1422, 1277, 1356, 1188, 1116];
const ALLPASS_TUNINGS: [usize; 4] = [225, 556, 441, 341];

const FIXED_GAIN: f32 = 0.03;

/// Freeverb: parallel lowpass-feedback combs into series all-passes
pub struct FreeverbNode {
    name: String,
    room_size: SmoothedValue,
    dampening: f32, // Hz

    combs: Vec<CombFilter>,
    allpass_left: Vec<AllPassFilter>,
    allpass_right: Vec<AllPassFilter>,
    mix: WetDryMix,
    sample_rate: u32,

    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl FreeverbNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters = vec![
            Parameter::new(PARAM_ROOM_SIZE, "roomSize", 0.0, 1.0, 0.7, ParameterUnit::Generic).smoothed(),
            Parameter::new(PARAM_DAMPENING, "dampening", 20.0, 20000.0, 3000.0, ParameterUnit::Frequency),
        ];
        parameters.extend(WetDryMix::parameters(1.0));

        let mut node = Self {
            name: name.into(),
            room_size: SmoothedValue::new(0.7),
            dampening: 3000.0,
            combs: Vec::new(),
            allpass_left: Vec::new(),
            allpass_right: Vec::new(),
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
        self.combs = COMB_TUNINGS
            .iter()
            .map(|&d| CombFilter::new(scale_delay(d, sample_rate)))
            .collect();
        self.allpass_left = ALLPASS_TUNINGS
            .iter()
            .map(|&d| AllPassFilter::new(scale_delay(d, sample_rate), 0.5))
            .collect();
        self.allpass_right = ALLPASS_TUNINGS
            .iter()
            .map(|&d| AllPassFilter::new(scale_delay(d + 23, sample_rate), 0.5))
            .collect();
        self.apply_dampening();
    }

    /// One-pole coefficient for the in-loop lowpass
    fn apply_dampening(&mut self) {
        let damp = (-2.0 * PI * self.dampening / self.sample_rate as f32).exp();
        for comb in &mut self.combs {
            comb.set_damp(damp);
        }
    }
}

impl AudioNode for FreeverbNode {
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
            PARAM_ROOM_SIZE => self.room_size.set_target(check_finite(id, value)?.clamp(0.0, 1.0)),
            PARAM_DAMPENING => {
                self.dampening = check_finite(id, value)?.clamp(20.0, 20000.0);
                self.apply_dampening();
            }
            _ => return self.mix.set_parameter(id, value).unwrap_or(Err(ParameterError::Unavailable(id))),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_ROOM_SIZE => Some(self.room_size.target()),
            PARAM_DAMPENING => Some(self.dampening),
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
        let half = self.combs.len() / 2;

        for frame in 0..frames {
            let left_in = input[frame * 2];
            let right_in = input[frame * 2 + 1];

            let feedback = 0.7 + 0.28 * self.room_size.next(sample_rate);
            let mono = (left_in + right_in) * FIXED_GAIN;

            let mut left = 0.0;
            let mut right = 0.0;
            for (i, comb) in self.combs.iter_mut().enumerate() {
                comb.set_feedback(feedback);
                if i < half {
                    left += comb.process(mono);
                } else {
                    right += comb.process(mono);
                }
            }

            for allpass in &mut self.allpass_left {
                left = allpass.process(left);
            }
            for allpass in &mut self.allpass_right {
                right = allpass.process(right);
            }

            let (dry, wet) = self.mix.gains(sample_rate);
            output[frame * 2] = left_in * dry + left * wet;
            output[frame * 2 + 1] = right_in * dry + right * wet;
        }
    }

    fn reset(&mut self) {
        self.combs.iter_mut().for_each(CombFilter::mute);
        self.allpass_left.iter_mut().for_each(AllPassFilter::mute);
        self.allpass_right.iter_mut().for_each(AllPassFilter::mute);
        self.room_size.settle();
        self.mix.settle();
    }

    fn node_type(&self) -> &str {
        "Freeverb"
    }

    fn name(&self) -> &str {
        &self.name
    }
}
