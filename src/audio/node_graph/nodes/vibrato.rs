use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::{DelayLine, Lfo, SmoothedValue, WaveShape, WetDryMix};

pub const PARAM_FREQUENCY: u32 = 0;
pub const PARAM_DEPTH: u32 = 1;
pub const PARAM_TYPE: u32 = 2;

/// Longest modulated delay, seconds
const MAX_DELAY: f32 = 0.005;

/// Pitch vibrato from a delay line swept between 0 and `depth * MAX_DELAY`
pub struct VibratoNode {
    name: String,
    frequency: SmoothedValue,
    depth: SmoothedValue,
    lfo: Lfo,
    delay_left: DelayLine,
    delay_right: DelayLine,
    mix: WetDryMix,
    sample_rate: u32,
    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl VibratoNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters = vec![
            Parameter::new(PARAM_FREQUENCY, "frequency", 0.01, 40.0, 5.0, ParameterUnit::Frequency).smoothed(),
            Parameter::new(PARAM_DEPTH, "depth", 0.0, 1.0, 0.1, ParameterUnit::Generic).smoothed(),
            Parameter::new(PARAM_TYPE, "type", 0.0, 3.0, 0.0, ParameterUnit::Choice),
        ];
        parameters.extend(WetDryMix::parameters(1.0));

        let sample_rate = 48000;
        Self {
            name: name.into(),
            frequency: SmoothedValue::new(5.0),
            depth: SmoothedValue::new(0.1),
            lfo: Lfo::new(5.0, WaveShape::Sine),
            delay_left: DelayLine::with_duration(MAX_DELAY, sample_rate),
            delay_right: DelayLine::with_duration(MAX_DELAY, sample_rate),
            mix: WetDryMix::new(1.0),
            sample_rate,
            inputs,
            outputs,
            parameters,
        }
    }
}

impl AudioNode for VibratoNode {
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
            PARAM_TYPE => self.lfo.shape = WaveShape::from_index(check_finite(id, value)?.max(0.0) as usize),
            _ => return self.mix.set_parameter(id, value).unwrap_or(Err(ParameterError::Unavailable(id))),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_FREQUENCY => Some(self.frequency.target()),
            PARAM_DEPTH => Some(self.depth.target()),
            PARAM_TYPE => Some(self.lfo.shape.index() as f32),
            _ => self.mix.get_parameter(id),
        }
    }

    fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]], sample_rate: u32) {
        if inputs.is_empty() || outputs.is_empty() {
            return;
        }

        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.delay_left = DelayLine::with_duration(MAX_DELAY, sample_rate);
            self.delay_right = DelayLine::with_duration(MAX_DELAY, sample_rate);
        }

        let input = inputs[0];
        let output = &mut outputs[0];
        let frames = input.len().min(output.len()) / 2;
        let max_delay_samples = MAX_DELAY * sample_rate as f32;

        for frame in 0..frames {
            let left_in = input[frame * 2];
            let right_in = input[frame * 2 + 1];

            self.lfo.frequency = self.frequency.next(sample_rate);
            let depth = self.depth.next(sample_rate);

            self.delay_left.write(left_in);
            self.delay_right.write(right_in);

            let delay = 1.0 + depth * max_delay_samples * self.lfo.unipolar(0.0);
            let left = self.delay_left.read(delay);
            let right = self.delay_right.read(delay);

            let (dry, wet) = self.mix.gains(sample_rate);
            output[frame * 2] = left_in * dry + left * wet;
            output[frame * 2 + 1] = right_in * dry + right * wet;

            self.lfo.advance(sample_rate);
        }
    }

    fn reset(&mut self) {
        self.delay_left.clear();
        self.delay_right.clear();
        self.lfo.reset();
        self.frequency.settle();
        self.depth.settle();
        self.mix.settle();
    }

    fn node_type(&self) -> &str {
        "Vibrato"
    }

    fn name(&self) -> &str {
        &self.name
    }
}
