use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::{DelayLine, Lfo, SmoothedValue, WaveShape, WetDryMix};

pub const PARAM_FREQUENCY: u32 = 0;
pub const PARAM_DELAY_TIME: u32 = 1;
pub const PARAM_DEPTH: u32 = 2;
pub const PARAM_SPREAD: u32 = 3;
pub const PARAM_FEEDBACK: u32 = 4;
pub const PARAM_TYPE: u32 = 5;

const MAX_DELAY_MS: f32 = 40.0;

/// Stereo chorus: two delay lines modulated by LFOs offset by `spread` degrees
pub struct ChorusNode {
    name: String,
    frequency: SmoothedValue, // modulation rate, Hz
    delay_time: f32,          // centre delay, ms
    depth: f32,
    spread: f32, // degrees
    feedback: SmoothedValue,

    lfo: Lfo,
    delay_left: DelayLine,
    delay_right: DelayLine,
    mix: WetDryMix,
    sample_rate: u32,

    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl ChorusNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters = vec![
            Parameter::new(PARAM_FREQUENCY, "frequency", 0.01, 20.0, 1.5, ParameterUnit::Frequency).smoothed(),
            Parameter::new(PARAM_DELAY_TIME, "delayTime", 0.5, 20.0, 3.5, ParameterUnit::Time),
            Parameter::new(PARAM_DEPTH, "depth", 0.0, 1.0, 0.7, ParameterUnit::Generic),
            Parameter::new(PARAM_SPREAD, "spread", 0.0, 360.0, 180.0, ParameterUnit::Degrees),
            Parameter::new(PARAM_FEEDBACK, "feedback", 0.0, 0.95, 0.0, ParameterUnit::Generic).smoothed(),
            Parameter::new(PARAM_TYPE, "type", 0.0, 3.0, 0.0, ParameterUnit::Choice),
        ];
        parameters.extend(WetDryMix::parameters(1.0));

        let sample_rate = 48000;
        Self {
            name: name.into(),
            frequency: SmoothedValue::new(1.5),
            delay_time: 3.5,
            depth: 0.7,
            spread: 180.0,
            feedback: SmoothedValue::new(0.0),
            lfo: Lfo::new(1.5, WaveShape::Sine),
            delay_left: DelayLine::with_duration(MAX_DELAY_MS / 1000.0, sample_rate),
            delay_right: DelayLine::with_duration(MAX_DELAY_MS / 1000.0, sample_rate),
            mix: WetDryMix::new(1.0),
            sample_rate,
            inputs,
            outputs,
            parameters,
        }
    }

    /// Delay in samples for an LFO value in [-1, 1]
    #[inline]
    fn modulated_delay(&self, lfo: f32) -> f32 {
        let ms = self.delay_time + self.delay_time * self.depth * lfo;
        ms.max(0.0) * 0.001 * self.sample_rate as f32
    }
}

impl AudioNode for ChorusNode {
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
            PARAM_DELAY_TIME => self.delay_time = check_finite(id, value)?.clamp(0.5, 20.0),
            PARAM_DEPTH => self.depth = check_finite(id, value)?.clamp(0.0, 1.0),
            PARAM_SPREAD => self.spread = check_finite(id, value)?.clamp(0.0, 360.0),
            PARAM_FEEDBACK => self.feedback.set_target(check_finite(id, value)?.clamp(0.0, 0.95)),
            PARAM_TYPE => self.lfo.shape = WaveShape::from_index(check_finite(id, value)?.max(0.0) as usize),
            _ => return self.mix.set_parameter(id, value).unwrap_or(Err(ParameterError::Unavailable(id))),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_FREQUENCY => Some(self.frequency.target()),
            PARAM_DELAY_TIME => Some(self.delay_time),
            PARAM_DEPTH => Some(self.depth),
            PARAM_SPREAD => Some(self.spread),
            PARAM_FEEDBACK => Some(self.feedback.target()),
            PARAM_TYPE => Some(self.lfo.shape.index() as f32),
            _ => self.mix.get_parameter(id),
        }
    }

    fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]], sample_rate: u32) {
        if inputs.is_empty() || outputs.is_empty() {
            return;
        }

        // Update sample rate if changed
        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.delay_left = DelayLine::with_duration(MAX_DELAY_MS / 1000.0, sample_rate);
            self.delay_right = DelayLine::with_duration(MAX_DELAY_MS / 1000.0, sample_rate);
        }

        let input = inputs[0];
        let output = &mut outputs[0];
        let frames = input.len().min(output.len()) / 2;
        let right_offset = self.spread / 360.0;

        for frame in 0..frames {
            let left_in = input[frame * 2];
            let right_in = input[frame * 2 + 1];

            self.lfo.frequency = self.frequency.next(sample_rate);
            let feedback = self.feedback.next(sample_rate);

            let left_delayed = self.delay_left.read(self.modulated_delay(self.lfo.peek(0.0)));
            let right_delayed = self.delay_right.read(self.modulated_delay(self.lfo.peek(right_offset)));

            self.delay_left.write(left_in + left_delayed * feedback);
            self.delay_right.write(right_in + right_delayed * feedback);

            let (dry, wet) = self.mix.gains(sample_rate);
            output[frame * 2] = left_in * dry + left_delayed * wet;
            output[frame * 2 + 1] = right_in * dry + right_delayed * wet;

            self.lfo.advance(sample_rate);
        }
    }

    fn reset(&mut self) {
        self.delay_left.clear();
        self.delay_right.clear();
        self.lfo.reset();
        self.frequency.settle();
        self.feedback.settle();
        self.mix.settle();
    }

    fn node_type(&self) -> &str {
        "Chorus"
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_swings_around_centre() {
        let node = ChorusNode::new("chorus");
        let centre = 3.5 * 48.0;
        assert!((node.modulated_delay(0.0) - centre).abs() < 1.0e-3);
        assert!((node.modulated_delay(1.0) - centre * 1.7).abs() < 1.0e-2);
        assert!((node.modulated_delay(-1.0) - centre * 0.3).abs() < 1.0e-2);
    }

    #[test]
    fn test_rate_is_a_ramp_target() {
        let mut node = ChorusNode::new("chorus");
        node.set_parameter(PARAM_FREQUENCY, 4.0).unwrap();
        assert_eq!(node.get_parameter(PARAM_FREQUENCY), Some(4.0));
        assert!(node.frequency.current() < 4.0);
    }
}
