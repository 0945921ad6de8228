use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::SmoothedValue;

pub const PARAM_LEVEL: u32 = 0;

/// Master output node - sums everything routed to it and applies the master level
pub struct MasterOutputNode {
    name: String,
    level: SmoothedValue,
    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl MasterOutputNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let parameters = vec![Parameter::new(PARAM_LEVEL, "level", 0.0, 2.0, 1.0, ParameterUnit::Generic).smoothed()];

        Self {
            name: name.into(),
            level: SmoothedValue::new(1.0),
            inputs,
            outputs,
            parameters,
        }
    }
}

impl AudioNode for MasterOutputNode {
    fn category(&self) -> NodeCategory {
        NodeCategory::Output
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
            PARAM_LEVEL => {
                self.level.set_target(check_finite(id, value)?.clamp(0.0, 2.0));
                Ok(())
            }
            _ => Err(ParameterError::Unavailable(id)),
        }
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_LEVEL => Some(self.level.target()),
            _ => None,
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
            let level = self.level.next(sample_rate);
            output[frame * 2] = input[frame * 2] * level;
            output[frame * 2 + 1] = input[frame * 2 + 1] * level;
        }
    }

    fn reset(&mut self) {
        self.level.settle();
    }

    fn node_type(&self) -> &str {
        "MasterOutput"
    }

    fn name(&self) -> &str {
        &self.name
    }
}
