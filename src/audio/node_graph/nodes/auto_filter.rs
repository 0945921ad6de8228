use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::{BiquadFilter, FilterType, Lfo, SmoothedValue, WaveShape, WetDryMix};

pub const PARAM_FREQUENCY: u32 = 0;
pub const PARAM_DEPTH: u32 = 1;
pub const PARAM_BASE_FREQUENCY: u32 = 2;
pub const PARAM_OCTAVES: u32 = 3;
pub const PARAM_LFO_TYPE: u32 = 4;
pub const PARAM_FILTER_TYPE: u32 = 5;
pub const PARAM_FILTER_Q: u32 = 6;

/// The filter an auto-filter sweeps; its type and resonance are its own controls
struct SweptFilter {
    filter_type: FilterType,
    q: f32,
    biquad: BiquadFilter,
}

/// LFO-swept filter
///
/// The cutoff moves exponentially from `baseFrequency` up to
/// `baseFrequency * 2^octaves`, scaled by `depth`.
pub struct AutoFilterNode {
    name: String,
    frequency: SmoothedValue,
    depth: SmoothedValue,
    base_frequency: f32,
    octaves: f32,

    lfo: Lfo,
    filter: SweptFilter,
    mix: WetDryMix,

    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl AutoFilterNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters = vec![
            Parameter::new(PARAM_FREQUENCY, "frequency", 0.01, 20.0, 1.0, ParameterUnit::Frequency).smoothed(),
            Parameter::new(PARAM_DEPTH, "depth", 0.0, 1.0, 1.0, ParameterUnit::Generic).smoothed(),
            Parameter::new(PARAM_BASE_FREQUENCY, "baseFrequency", 20.0, 10000.0, 200.0, ParameterUnit::Frequency),
            Parameter::new(PARAM_OCTAVES, "octaves", 0.0, 8.0, 2.6, ParameterUnit::Generic),
            Parameter::new(PARAM_LFO_TYPE, "type", 0.0, 3.0, 0.0, ParameterUnit::Choice),
            Parameter::new(PARAM_FILTER_TYPE, "filterType", 0.0, 3.0, 0.0, ParameterUnit::Choice),
            Parameter::new(PARAM_FILTER_Q, "filterQ", 0.1, 30.0, 1.0, ParameterUnit::Generic),
        ];
        parameters.extend(WetDryMix::parameters(1.0));

        Self {
            name: name.into(),
            frequency: SmoothedValue::new(1.0),
            depth: SmoothedValue::new(1.0),
            base_frequency: 200.0,
            octaves: 2.6,
            lfo: Lfo::new(1.0, WaveShape::Sine),
            filter: SweptFilter {
                filter_type: FilterType::Lowpass,
                q: 1.0,
                biquad: BiquadFilter::new(),
            },
            mix: WetDryMix::new(1.0),
            inputs,
            outputs,
            parameters,
        }
    }

    #[inline]
    fn cutoff(&self, lfo01: f32, depth: f32) -> f32 {
        self.base_frequency * 2.0_f32.powf(self.octaves * lfo01 * depth)
    }
}

impl AudioNode for AutoFilterNode {
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
            PARAM_FREQUENCY => self.frequency.set_target(check_finite(id, value)?.clamp(0.01, 20.0)),
            PARAM_DEPTH => self.depth.set_target(check_finite(id, value)?.clamp(0.0, 1.0)),
            PARAM_BASE_FREQUENCY => self.base_frequency = check_finite(id, value)?.clamp(20.0, 10000.0),
            PARAM_OCTAVES => self.octaves = check_finite(id, value)?.clamp(0.0, 8.0),
            PARAM_LFO_TYPE => self.lfo.shape = WaveShape::from_index(check_finite(id, value)?.max(0.0) as usize),
            PARAM_FILTER_TYPE => {
                self.filter.filter_type = FilterType::from_index(check_finite(id, value)?.max(0.0) as usize)
            }
            PARAM_FILTER_Q => self.filter.q = check_finite(id, value)?.clamp(0.1, 30.0),
            _ => return self.mix.set_parameter(id, value).unwrap_or(Err(ParameterError::Unavailable(id))),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_FREQUENCY => Some(self.frequency.target()),
            PARAM_DEPTH => Some(self.depth.target()),
            PARAM_BASE_FREQUENCY => Some(self.base_frequency),
            PARAM_OCTAVES => Some(self.octaves),
            PARAM_LFO_TYPE => Some(self.lfo.shape.index() as f32),
            PARAM_FILTER_TYPE => Some(self.filter.filter_type.index() as f32),
            PARAM_FILTER_Q => Some(self.filter.q),
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
        let sr = sample_rate as f32;

        for frame in 0..frames {
            let left_in = input[frame * 2];
            let right_in = input[frame * 2 + 1];

            self.lfo.frequency = self.frequency.next(sample_rate);
            let depth = self.depth.next(sample_rate);
            let cutoff = self.cutoff(self.lfo.unipolar(0.0), depth);
            self.filter
                .biquad
                .set(self.filter.filter_type, cutoff, self.filter.q, sr);

            let left = self.filter.biquad.process_sample(left_in, 0);
            let right = self.filter.biquad.process_sample(right_in, 1);

            let (dry, wet) = self.mix.gains(sample_rate);
            output[frame * 2] = left_in * dry + left * wet;
            output[frame * 2 + 1] = right_in * dry + right * wet;

            self.lfo.advance(sample_rate);
        }
    }

    fn reset(&mut self) {
        self.filter.biquad.reset();
        self.lfo.reset();
        self.frequency.settle();
        self.depth.settle();
        self.mix.settle();
    }

    fn node_type(&self) -> &str {
        "AutoFilter"
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoff_range() {
        let node = AutoFilterNode::new("af");
        assert!((node.cutoff(0.0, 1.0) - 200.0).abs() < 1.0e-3);
        assert!((node.cutoff(1.0, 1.0) - 200.0 * 2.0_f32.powf(2.6)).abs() < 1.0e-2);
        assert!((node.cutoff(1.0, 0.0) - 200.0).abs() < 1.0e-3);
    }

    #[test]
    fn test_nested_filter_controls() {
        let mut node = AutoFilterNode::new("af");
        node.set_parameter(PARAM_FILTER_TYPE, 1.0).unwrap();
        node.set_parameter(PARAM_FILTER_Q, 4.0).unwrap();
        assert_eq!(node.filter.filter_type, FilterType::Highpass);
        assert_eq!(node.get_parameter(PARAM_FILTER_Q), Some(4.0));
    }
}
