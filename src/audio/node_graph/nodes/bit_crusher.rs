use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::WetDryMix;

pub const PARAM_BITS: u32 = 0;

/// Bit crusher - quantizes the signal to a reduced bit depth
pub struct BitCrusherNode {
    name: String,
    bits: f32, // 1 to 16 bits
    mix: WetDryMix,
    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl BitCrusherNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters = vec![Parameter::new(PARAM_BITS, "bits", 1.0, 16.0, 4.0, ParameterUnit::Generic)];
        parameters.extend(WetDryMix::parameters(1.0));

        Self {
            name: name.into(),
            bits: 4.0,
            mix: WetDryMix::new(1.0),
            inputs,
            outputs,
            parameters,
        }
    }

    /// Quantize sample to the current bit depth
    #[inline]
    fn quantize(&self, sample: f32) -> f32 {
        let step = 1.0 / 2.0_f32.powf(self.bits - 1.0);
        ((sample / step + 0.5).floor() * step).clamp(-1.0, 1.0)
    }
}

impl AudioNode for BitCrusherNode {
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
            PARAM_BITS => self.bits = check_finite(id, value)?.clamp(1.0, 16.0),
            _ => return self.mix.set_parameter(id, value).unwrap_or(Err(ParameterError::Unavailable(id))),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_BITS => Some(self.bits),
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

            let (dry, wet) = self.mix.gains(sample_rate);
            output[frame * 2] = left_in * dry + self.quantize(left_in) * wet;
            output[frame * 2 + 1] = right_in * dry + self.quantize(right_in) * wet;
        }
    }

    fn reset(&mut self) {
        self.mix.settle();
    }

    fn node_type(&self) -> &str {
        "BitCrusher"
    }

    fn name(&self) -> &str {
        &self.name
    }
}
