use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::SmoothedValue;

pub const PARAM_GAIN: u32 = 0;

/// Gain/volume control node
///
/// The gain is ramped, so it doubles as the click-free send between a source
/// bus and an effect unit.
pub struct GainNode {
    name: String,
    gain: SmoothedValue,
    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl GainNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_gain(name, 1.0)
    }

    /// Create a gain node that starts at `gain` without ramping
    pub fn with_gain(name: impl Into<String>, gain: f32) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let parameters = vec![Parameter::new(PARAM_GAIN, "gain", 0.0, 2.0, 1.0, ParameterUnit::Generic).smoothed()];

        Self {
            name: name.into(),
            gain: SmoothedValue::new(gain.clamp(0.0, 2.0)),
            inputs,
            outputs,
            parameters,
        }
    }

    /// Gain applied to the most recent sample
    pub fn current_gain(&self) -> f32 {
        self.gain.current()
    }
}

impl AudioNode for GainNode {
    fn category(&self) -> NodeCategory {
        NodeCategory::Utility
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
            PARAM_GAIN => {
                let value = check_finite(id, value)?;
                self.gain.set_target(value.clamp(0.0, 2.0));
                Ok(())
            }
            _ => Err(ParameterError::Unavailable(id)),
        }
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_GAIN => Some(self.gain.target()),
            _ => None,
        }
    }

    fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]], sample_rate: u32) {
        if inputs.is_empty() || outputs.is_empty() {
            return;
        }

        let input = inputs[0];
        let output = &mut outputs[0];

        // Audio signals are stereo (interleaved L/R)
        let frames = input.len().min(output.len()) / 2;

        for frame in 0..frames {
            let gain = self.gain.next(sample_rate);
            output[frame * 2] = input[frame * 2] * gain;
            output[frame * 2 + 1] = input[frame * 2 + 1] * gain;
        }
    }

    fn reset(&mut self) {
        self.gain.settle();
    }

    fn node_type(&self) -> &str {
        "Gain"
    }

    fn name(&self) -> &str {
        &self.name
    }
}
