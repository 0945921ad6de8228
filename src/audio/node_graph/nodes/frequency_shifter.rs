use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::{SmoothedValue, WetDryMix};
use std::f32::consts::TAU;

pub const PARAM_FREQUENCY: u32 = 0;

// Olli Niemitalo's 90-degree phase difference all-pass pair
const COEFFICIENTS_I: [f32; 4] = [0.692_387_8, 0.936_065_43, 0.988_229_5, 0.998_748_84];
const COEFFICIENTS_Q: [f32; 4] = [0.402_192_12, 0.856_171_1, 0.972_290_95, 0.995_288_5];

/// Chain of second-order all-pass sections: y[n] = a^2 * (x[n] + y[n-2]) - x[n-2]
#[derive(Default)]
struct AllPassChain {
    x1: [f32; 4],
    x2: [f32; 4],
    y1: [f32; 4],
    y2: [f32; 4],
}

impl AllPassChain {
    #[inline]
    fn process(&mut self, input: f32, coefficients: &[f32; 4]) -> f32 {
        let mut x = input;
        for (i, a) in coefficients.iter().enumerate() {
            let y = a * a * (x + self.y2[i]) - self.x2[i];
            self.x2[i] = self.x1[i];
            self.x1[i] = x;
            self.y2[i] = self.y1[i];
            self.y1[i] = y;
            x = y;
        }
        x
    }
}

/// Analytic signal for one channel
#[derive(Default)]
struct Hilbert {
    in_phase: AllPassChain,
    quadrature: AllPassChain,
    quadrature_delay: f32,
}

impl Hilbert {
    /// Returns (I, Q), 90 degrees apart across most of the audio band
    #[inline]
    fn process(&mut self, input: f32) -> (f32, f32) {
        let i = self.in_phase.process(input, &COEFFICIENTS_I);
        let q = self.quadrature_delay;
        self.quadrature_delay = self.quadrature.process(input, &COEFFICIENTS_Q);
        (i, q)
    }
}

/// Single-sideband frequency shifter; every partial moves by the same number of Hz
pub struct FrequencyShifterNode {
    name: String,
    frequency: SmoothedValue,
    phase: f32,
    hilbert: [Hilbert; 2],
    mix: WetDryMix,
    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl FrequencyShifterNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters = vec![Parameter::new(
            PARAM_FREQUENCY,
            "frequency",
            -5000.0,
            5000.0,
            0.0,
            ParameterUnit::Frequency,
        )
        .smoothed()];
        parameters.extend(WetDryMix::parameters(1.0));

        Self {
            name: name.into(),
            frequency: SmoothedValue::new(0.0),
            phase: 0.0,
            hilbert: [Hilbert::default(), Hilbert::default()],
            mix: WetDryMix::new(1.0),
            inputs,
            outputs,
            parameters,
        }
    }
}

impl AudioNode for FrequencyShifterNode {
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
            PARAM_FREQUENCY => self.frequency.set_target(check_finite(id, value)?.clamp(-5000.0, 5000.0)),
            _ => return self.mix.set_parameter(id, value).unwrap_or(Err(ParameterError::Unavailable(id))),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_FREQUENCY => Some(self.frequency.target()),
            _ => self.mix.get_parameter(id),
        }
    }

    fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]], sample_rate: u32) {
        if inputs.is_empty() || outputs.is_empty() {
            return;
        }

        let input = inputs[0];
        let output = &mut outputs[0];
        let frames = input.len().min(output.len()) / 2;

        for frame in 0..frames {
            let left_in = input[frame * 2];
            let right_in = input[frame * 2 + 1];

            let (sin, cos) = (self.phase * TAU).sin_cos();
            let (li, lq) = self.hilbert[0].process(left_in);
            let (ri, rq) = self.hilbert[1].process(right_in);
            let left = li * cos - lq * sin;
            let right = ri * cos - rq * sin;

            let (dry, wet) = self.mix.gains(sample_rate);
            output[frame * 2] = left_in * dry + left * wet;
            output[frame * 2 + 1] = right_in * dry + right * wet;

            self.phase += self.frequency.next(sample_rate) / sample_rate.max(1) as f32;
            self.phase -= self.phase.floor();
        }
    }

    fn reset(&mut self) {
        self.hilbert = [Hilbert::default(), Hilbert::default()];
        self.phase = 0.0;
        self.frequency.settle();
        self.mix.settle();
    }

    fn node_type(&self) -> &str {
        "FrequencyShifter"
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_shift_keeps_level() {
        let mut node = FrequencyShifterNode::new("shift");
        let input: Vec<f32> = (0..9600)
            .flat_map(|n| {
                let s = (TAU * 1000.0 * n as f32 / 48000.0).sin() * 0.5;
                [s, s]
            })
            .collect();
        let out = super::super::run_block(&mut node, &input, 48000);
        let peak = out[9600..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        // The all-pass pair is lossless, so the unshifted output keeps its amplitude
        assert!((peak - 0.5).abs() < 0.02);
    }

    #[test]
    fn test_shift_is_a_ramp_target() {
        let mut node = FrequencyShifterNode::new("shift");
        node.set_parameter(PARAM_FREQUENCY, 42.0).unwrap();
        assert_eq!(node.get_parameter(PARAM_FREQUENCY), Some(42.0));
    }
}
