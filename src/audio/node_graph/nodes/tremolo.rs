use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::{Lfo, SmoothedValue, WaveShape, WetDryMix};

pub const PARAM_FREQUENCY: u32 = 0;
pub const PARAM_DEPTH: u32 = 1;
pub const PARAM_SPREAD: u32 = 2;
pub const PARAM_TYPE: u32 = 3;

/// Amplitude modulation; the right channel's LFO lags by `spread` degrees
pub struct TremoloNode {
    name: String,
    frequency: SmoothedValue,
    depth: SmoothedValue,
    spread: f32,
    lfo: Lfo,
    mix: WetDryMix,
    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl TremoloNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters = vec![
            Parameter::new(PARAM_FREQUENCY, "frequency", 0.01, 40.0, 10.0, ParameterUnit::Frequency).smoothed(),
            Parameter::new(PARAM_DEPTH, "depth", 0.0, 1.0, 0.5, ParameterUnit::Generic).smoothed(),
            Parameter::new(PARAM_SPREAD, "spread", 0.0, 360.0, 180.0, ParameterUnit::Degrees),
            Parameter::new(PARAM_TYPE, "type", 0.0, 3.0, 0.0, ParameterUnit::Choice),
        ];
        parameters.extend(WetDryMix::parameters(1.0));

        Self {
            name: name.into(),
            frequency: SmoothedValue::new(10.0),
            depth: SmoothedValue::new(0.5),
            spread: 180.0,
            lfo: Lfo::new(10.0, WaveShape::Sine),
            mix: WetDryMix::new(1.0),
            inputs,
            outputs,
            parameters,
        }
    }

    /// Gain for a unipolar LFO value: swings between 1 - depth and 1
    #[inline]
    fn amplitude(lfo01: f32, depth: f32) -> f32 {
        1.0 - depth * lfo01
    }
}

impl AudioNode for TremoloNode {
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
            PARAM_FREQUENCY => self.frequency.set_target(check_finite(id, value)?.clamp(0.01, 40.0)),
            PARAM_DEPTH => self.depth.set_target(check_finite(id, value)?.clamp(0.0, 1.0)),
            PARAM_SPREAD => self.spread = check_finite(id, value)?.clamp(0.0, 360.0),
            PARAM_TYPE => self.lfo.shape = WaveShape::from_index(check_finite(id, value)?.max(0.0) as usize),
            _ => return self.mix.set_parameter(id, value).unwrap_or(Err(ParameterError::Unavailable(id))),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_FREQUENCY => Some(self.frequency.target()),
            PARAM_DEPTH => Some(self.depth.target()),
            PARAM_SPREAD => Some(self.spread),
            PARAM_TYPE => Some(self.lfo.shape.index() as f32),
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
        let right_offset = self.spread / 360.0;

        for frame in 0..frames {
            let left_in = input[frame * 2];
            let right_in = input[frame * 2 + 1];

            self.lfo.frequency = self.frequency.next(sample_rate);
            let depth = self.depth.next(sample_rate);
            let left = left_in * Self::amplitude(self.lfo.unipolar(0.0), depth);
            let right = right_in * Self::amplitude(self.lfo.unipolar(right_offset), depth);

            let (dry, wet) = self.mix.gains(sample_rate);
            output[frame * 2] = left_in * dry + left * wet;
            output[frame * 2 + 1] = right_in * dry + right * wet;

            self.lfo.advance(sample_rate);
        }
    }

    fn reset(&mut self) {
        self.lfo.reset();
        self.frequency.settle();
        self.depth.settle();
        self.mix.settle();
    }

    fn node_type(&self) -> &str {
        "Tremolo"
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude_range() {
        assert_eq!(TremoloNode::amplitude(0.0, 0.5), 1.0);
        assert_eq!(TremoloNode::amplitude(1.0, 0.5), 0.5);
        assert_eq!(TremoloNode::amplitude(1.0, 0.0), 1.0);
    }

    #[test]
    fn test_spread_puts_channels_out_of_phase() {
        let mut node = TremoloNode::new("trem");
        node.set_parameter(PARAM_DEPTH, 1.0).unwrap();
        node.reset();
        // A quarter cycle in: left LFO at its peak, right at its trough
        let frames = 48000 / 10 / 4;
        let out = super::super::run_block(&mut node, &vec![1.0; (frames + 1) * 2], 48000);
        let left = out[frames * 2];
        let right = out[frames * 2 + 1];
        assert!(left < 0.01);
        assert!(right > 0.99);
    }
}
