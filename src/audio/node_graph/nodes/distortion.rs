use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::{Oversample, WaveShaper, WetDryMix};
use std::f32::consts::PI;

pub const PARAM_DISTORTION: u32 = 0;
pub const PARAM_OVERSAMPLE: u32 = 1;

/// Soft-clipping curve; `amount` in [0, 1] sets the drive
fn distortion_curve(amount: f32) -> impl Fn(f32) -> f32 {
    let k = amount * 100.0;
    let deg = PI / 180.0;
    move |x: f32| {
        if x.abs() < 0.001 {
            0.0
        } else {
            (3.0 + k) * x * 20.0 * deg / (PI + k * x.abs())
        }
    }
}

/// Waveshaping distortion
pub struct DistortionNode {
    name: String,
    distortion: f32,
    shaper: [WaveShaper; 2],
    mix: WetDryMix,
    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl DistortionNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters = vec![
            Parameter::new(PARAM_DISTORTION, "distortion", 0.0, 1.0, 0.4, ParameterUnit::Generic),
            Parameter::new(PARAM_OVERSAMPLE, "oversample", 0.0, 2.0, 0.0, ParameterUnit::Choice),
        ];
        parameters.extend(WetDryMix::parameters(1.0));

        Self {
            name: name.into(),
            distortion: 0.4,
            shaper: [WaveShaper::new(distortion_curve(0.4)), WaveShaper::new(distortion_curve(0.4))],
            mix: WetDryMix::new(1.0),
            inputs,
            outputs,
            parameters,
        }
    }
}

impl AudioNode for DistortionNode {
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
            PARAM_DISTORTION => {
                self.distortion = check_finite(id, value)?.clamp(0.0, 1.0);
                for shaper in &mut self.shaper {
                    shaper.set_curve(distortion_curve(self.distortion));
                }
            }
            PARAM_OVERSAMPLE => {
                let oversample = Oversample::from_index(check_finite(id, value)?.max(0.0) as usize);
                for shaper in &mut self.shaper {
                    shaper.oversample = oversample;
                }
            }
            _ => return self.mix.set_parameter(id, value).unwrap_or(Err(ParameterError::Unavailable(id))),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_DISTORTION => Some(self.distortion),
            PARAM_OVERSAMPLE => Some(self.shaper[0].oversample.index() as f32),
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

            let left = self.shaper[0].process_sample(left_in, 0);
            let right = self.shaper[1].process_sample(right_in, 1);

            let (dry, wet) = self.mix.gains(sample_rate);
            output[frame * 2] = left_in * dry + left * wet;
            output[frame * 2 + 1] = right_in * dry + right * wet;
        }
    }

    fn reset(&mut self) {
        for shaper in &mut self.shaper {
            shaper.reset();
        }
        self.mix.settle();
    }

    fn node_type(&self) -> &str {
        "Distortion"
    }

    fn name(&self) -> &str {
        &self.name
    }
}
