use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::{DelayLine, SmoothedValue, WetDryMix};

pub const PARAM_DELAY_TIME: u32 = 0;
pub const PARAM_FEEDBACK: u32 = 1;

const MAX_DELAY_SECONDS: f32 = 2.0;

/// Delay with feedback; delay time glides, so sweeping it bends pitch like tape
pub struct FeedbackDelayNode {
    name: String,
    delay_time: SmoothedValue, // seconds
    feedback: SmoothedValue,
    delay_left: DelayLine,
    delay_right: DelayLine,
    mix: WetDryMix,
    sample_rate: u32,
    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl FeedbackDelayNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters = vec![
            Parameter::new(PARAM_DELAY_TIME, "delayTime", 0.0, MAX_DELAY_SECONDS, 0.25, ParameterUnit::Time).smoothed(),
            Parameter::new(PARAM_FEEDBACK, "feedback", 0.0, 0.95, 0.125, ParameterUnit::Generic).smoothed(),
        ];
        parameters.extend(WetDryMix::parameters(1.0));

        let sample_rate = 48000;
        Self {
            name: name.into(),
            delay_time: SmoothedValue::new(0.25),
            feedback: SmoothedValue::new(0.125),
            delay_left: DelayLine::with_duration(MAX_DELAY_SECONDS, sample_rate),
            delay_right: DelayLine::with_duration(MAX_DELAY_SECONDS, sample_rate),
            mix: WetDryMix::new(1.0),
            sample_rate,
            inputs,
            outputs,
            parameters,
        }
    }
}

impl AudioNode for FeedbackDelayNode {
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
            PARAM_DELAY_TIME => self
                .delay_time
                .set_target(check_finite(id, value)?.clamp(0.0, MAX_DELAY_SECONDS)),
            PARAM_FEEDBACK => self.feedback.set_target(check_finite(id, value)?.clamp(0.0, 0.95)),
            _ => return self.mix.set_parameter(id, value).unwrap_or(Err(ParameterError::Unavailable(id))),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_DELAY_TIME => Some(self.delay_time.target()),
            PARAM_FEEDBACK => Some(self.feedback.target()),
            _ => self.mix.get_parameter(id),
        }
    }

    fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]], sample_rate: u32) {
        if inputs.is_empty() || outputs.is_empty() {
            return;
        }

        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.delay_left = DelayLine::with_duration(MAX_DELAY_SECONDS, sample_rate);
            self.delay_right = DelayLine::with_duration(MAX_DELAY_SECONDS, sample_rate);
        }

        let input = inputs[0];
        let output = &mut outputs[0];
        let frames = input.len().min(output.len()) / 2;
        let sr = sample_rate as f32;

        for frame in 0..frames {
            let left_in = input[frame * 2];
            let right_in = input[frame * 2 + 1];

            // At least one sample so the feedback path never reads its own write
            let delay_samples = (self.delay_time.next(sample_rate) * sr).max(1.0);
            let feedback = self.feedback.next(sample_rate);

            let left_delayed = self.delay_left.read(delay_samples);
            let right_delayed = self.delay_right.read(delay_samples);

            self.delay_left.write(left_in + left_delayed * feedback);
            self.delay_right.write(right_in + right_delayed * feedback);

            let (dry, wet) = self.mix.gains(sample_rate);
            output[frame * 2] = left_in * dry + left_delayed * wet;
            output[frame * 2 + 1] = right_in * dry + right_delayed * wet;
        }
    }

    fn reset(&mut self) {
        self.delay_left.clear();
        self.delay_right.clear();
        self.delay_time.settle();
        self.feedback.settle();
        self.mix.settle();
    }

    fn node_type(&self) -> &str {
        "FeedbackDelay"
    }

    fn name(&self) -> &str {
        &self.name
    }
}
