use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::{Oversample, WaveShaper, WetDryMix};

pub const PARAM_ORDER: u32 = 0;
pub const PARAM_OVERSAMPLE: u32 = 1;

/// T_n(x) = cos(n * acos(x)) on [-1, 1]
fn chebyshev_curve(order: u32) -> impl Fn(f32) -> f32 {
    move |x: f32| (order as f32 * x.clamp(-1.0, 1.0).acos()).cos()
}

/// Chebyshev waveshaper: adds the harmonic of the chosen order
pub struct ChebyshevNode {
    name: String,
    order: u32,
    shaper: [WaveShaper; 2],
    mix: WetDryMix,
    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl ChebyshevNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters = vec![
            Parameter::new(PARAM_ORDER, "order", 1.0, 100.0, 1.0, ParameterUnit::Generic),
            Parameter::new(PARAM_OVERSAMPLE, "oversample", 0.0, 2.0, 0.0, ParameterUnit::Choice),
        ];
        parameters.extend(WetDryMix::parameters(1.0));

        Self {
            name: name.into(),
            order: 1,
            shaper: [WaveShaper::new(chebyshev_curve(1)), WaveShaper::new(chebyshev_curve(1))],
            mix: WetDryMix::new(1.0),
            inputs,
            outputs,
            parameters,
        }
    }
}

impl AudioNode for ChebyshevNode {
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
            PARAM_ORDER => {
                let order = check_finite(id, value)?.round().clamp(1.0, 100.0) as u32;
                if order != self.order {
                    self.order = order;
                    for shaper in &mut self.shaper {
                        shaper.set_curve(chebyshev_curve(order));
                    }
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
            PARAM_ORDER => Some(self.order as f32),
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
        "Chebyshev"
    }

    fn name(&self) -> &str {
        &self.name
    }
}
