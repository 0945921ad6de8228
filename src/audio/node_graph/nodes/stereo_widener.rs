use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::{SmoothedValue, WetDryMix};
use std::f32::consts::{FRAC_PI_2, SQRT_2};

pub const PARAM_WIDTH: u32 = 0;

/// Mid/side width control: 0 collapses to mono, 0.5 leaves the image alone, 1 keeps only the sides
pub struct StereoWidenerNode {
    name: String,
    width: SmoothedValue,
    mix: WetDryMix,
    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl StereoWidenerNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters =
            vec![Parameter::new(PARAM_WIDTH, "width", 0.0, 1.0, 0.5, ParameterUnit::Generic).smoothed()];
        parameters.extend(WetDryMix::parameters(1.0));

        Self {
            name: name.into(),
            width: SmoothedValue::new(0.5),
            mix: WetDryMix::new(1.0),
            inputs,
            outputs,
            parameters,
        }
    }

    /// (mid, side) gains, both 1 at width 0.5
    #[inline]
    fn gains(width: f32) -> (f32, f32) {
        let angle = width * FRAC_PI_2;
        (angle.cos() * SQRT_2, angle.sin() * SQRT_2)
    }
}

impl AudioNode for StereoWidenerNode {
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
            PARAM_WIDTH => self.width.set_target(check_finite(id, value)?.clamp(0.0, 1.0)),
            _ => return self.mix.set_parameter(id, value).unwrap_or(Err(ParameterError::Unavailable(id))),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_WIDTH => Some(self.width.target()),
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

            let (mid_gain, side_gain) = Self::gains(self.width.next(sample_rate));
            let mid = (left_in + right_in) * 0.5 * mid_gain;
            let side = (left_in - right_in) * 0.5 * side_gain;

            let (dry, wet) = self.mix.gains(sample_rate);
            output[frame * 2] = left_in * dry + (mid + side) * wet;
            output[frame * 2 + 1] = right_in * dry + (mid - side) * wet;
        }
    }

    fn reset(&mut self) {
        self.width.settle();
        self.mix.settle();
    }

    fn node_type(&self) -> &str {
        "StereoWidener"
    }

    fn name(&self) -> &str {
        &self.name
    }
}
