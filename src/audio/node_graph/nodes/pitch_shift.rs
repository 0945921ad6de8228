use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::{DelayLine, SmoothedValue, WetDryMix};

pub const PARAM_PITCH: u32 = 0;
pub const PARAM_WINDOW_SIZE: u32 = 1;
pub const PARAM_FEEDBACK: u32 = 2;

const MAX_WINDOW_SECONDS: f32 = 0.5;

/// Delay-line pitch shifter
///
/// Two taps sweep through a window at the rate the pitch ratio implies, half a
/// window apart, and crossfade with triangular gains so one is always silent
/// when the other wraps.
pub struct PitchShiftNode {
    name: String,
    pitch: f32,       // semitones
    window_size: f32, // seconds
    feedback: SmoothedValue,

    phase: f32,
    delay_left: DelayLine,
    delay_right: DelayLine,
    mix: WetDryMix,
    sample_rate: u32,

    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl PitchShiftNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters = vec![
            Parameter::new(PARAM_PITCH, "pitch", -24.0, 24.0, 0.0, ParameterUnit::Semitones),
            Parameter::new(PARAM_WINDOW_SIZE, "windowSize", 0.01, MAX_WINDOW_SECONDS, 0.1, ParameterUnit::Time),
            Parameter::new(PARAM_FEEDBACK, "feedback", 0.0, 0.95, 0.0, ParameterUnit::Generic).smoothed(),
        ];
        parameters.extend(WetDryMix::parameters(1.0));

        let sample_rate = 48000;
        Self {
            name: name.into(),
            pitch: 0.0,
            window_size: 0.1,
            feedback: SmoothedValue::new(0.0),
            phase: 0.0,
            delay_left: DelayLine::with_duration(MAX_WINDOW_SECONDS, sample_rate),
            delay_right: DelayLine::with_duration(MAX_WINDOW_SECONDS, sample_rate),
            mix: WetDryMix::new(1.0),
            sample_rate,
            inputs,
            outputs,
            parameters,
        }
    }

    #[inline]
    fn ratio(&self) -> f32 {
        2.0_f32.powf(self.pitch / 12.0)
    }

    /// Triangle window: 0 at the ends of the sweep, 1 in the middle
    #[inline]
    fn window(phase: f32) -> f32 {
        1.0 - (2.0 * phase - 1.0).abs()
    }
}

impl AudioNode for PitchShiftNode {
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
            PARAM_PITCH => self.pitch = check_finite(id, value)?.clamp(-24.0, 24.0),
            PARAM_WINDOW_SIZE => self.window_size = check_finite(id, value)?.clamp(0.01, MAX_WINDOW_SECONDS),
            PARAM_FEEDBACK => self.feedback.set_target(check_finite(id, value)?.clamp(0.0, 0.95)),
            _ => return self.mix.set_parameter(id, value).unwrap_or(Err(ParameterError::Unavailable(id))),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_PITCH => Some(self.pitch),
            PARAM_WINDOW_SIZE => Some(self.window_size),
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
            self.delay_left = DelayLine::with_duration(MAX_WINDOW_SECONDS, sample_rate);
            self.delay_right = DelayLine::with_duration(MAX_WINDOW_SECONDS, sample_rate);
        }

        let input = inputs[0];
        let output = &mut outputs[0];
        let frames = input.len().min(output.len()) / 2;

        let window_samples = (self.window_size * sample_rate as f32).max(2.0);
        // Delay shrinks when pitching up, grows when pitching down
        let step = (1.0 - self.ratio()) / window_samples;

        for frame in 0..frames {
            let left_in = input[frame * 2];
            let right_in = input[frame * 2 + 1];

            let phase_a = self.phase;
            let phase_b = (self.phase + 0.5).rem_euclid(1.0);
            let (gain_a, gain_b) = (Self::window(phase_a), Self::window(phase_b));
            let (delay_a, delay_b) = (1.0 + phase_a * window_samples, 1.0 + phase_b * window_samples);

            let left = self.delay_left.read(delay_a) * gain_a + self.delay_left.read(delay_b) * gain_b;
            let right = self.delay_right.read(delay_a) * gain_a + self.delay_right.read(delay_b) * gain_b;

            let feedback = self.feedback.next(sample_rate);
            self.delay_left.write(left_in + left * feedback);
            self.delay_right.write(right_in + right * feedback);

            let (dry, wet) = self.mix.gains(sample_rate);
            output[frame * 2] = left_in * dry + left * wet;
            output[frame * 2 + 1] = right_in * dry + right * wet;

            self.phase = (self.phase + step).rem_euclid(1.0);
        }
    }

    fn reset(&mut self) {
        self.delay_left.clear();
        self.delay_right.clear();
        self.phase = 0.0;
        self.feedback.settle();
        self.mix.settle();
    }

    fn node_type(&self) -> &str {
        "PitchShift"
    }

    fn name(&self) -> &str {
        &self.name
    }
}
