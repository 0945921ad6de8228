use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::{BiquadFilter, FilterType, SmoothedValue, WetDryMix};

pub const PARAM_BASE_FREQUENCY: u32 = 0;
pub const PARAM_OCTAVES: u32 = 1;
pub const PARAM_SENSITIVITY: u32 = 2;
pub const PARAM_Q: u32 = 3;
pub const PARAM_GAIN: u32 = 4;
pub const PARAM_ATTACK: u32 = 5;
pub const PARAM_RELEASE: u32 = 6;

/// Envelope-following wah: a bandpass plus peaking boost whose centre tracks
/// the input level
pub struct AutoWahNode {
    name: String,
    base_frequency: f32,
    octaves: f32,
    sensitivity: f32, // dB applied before the follower
    q: SmoothedValue,
    gain: SmoothedValue, // peaking boost, dB
    attack: f32,         // seconds
    release: f32,        // seconds

    envelope: f32,
    bandpass: BiquadFilter,
    peaking: BiquadFilter,
    mix: WetDryMix,

    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl AutoWahNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters = vec![
            Parameter::new(PARAM_BASE_FREQUENCY, "baseFrequency", 20.0, 10000.0, 100.0, ParameterUnit::Frequency),
            Parameter::new(PARAM_OCTAVES, "octaves", 0.0, 8.0, 6.0, ParameterUnit::Generic),
            Parameter::new(PARAM_SENSITIVITY, "sensitivity", -40.0, 0.0, 0.0, ParameterUnit::Decibels),
            Parameter::new(PARAM_Q, "Q", 0.1, 30.0, 2.0, ParameterUnit::Generic).smoothed(),
            Parameter::new(PARAM_GAIN, "gain", -24.0, 24.0, 2.0, ParameterUnit::Decibels).smoothed(),
            Parameter::new(PARAM_ATTACK, "attack", 0.001, 2.0, 0.3, ParameterUnit::Time),
            Parameter::new(PARAM_RELEASE, "release", 0.001, 4.0, 0.5, ParameterUnit::Time),
        ];
        parameters.extend(WetDryMix::parameters(1.0));

        Self {
            name: name.into(),
            base_frequency: 100.0,
            octaves: 6.0,
            sensitivity: 0.0,
            q: SmoothedValue::new(2.0),
            gain: SmoothedValue::new(2.0),
            attack: 0.3,
            release: 0.5,
            envelope: 0.0,
            bandpass: BiquadFilter::new(),
            peaking: BiquadFilter::new(),
            mix: WetDryMix::new(1.0),
            inputs,
            outputs,
            parameters,
        }
    }

    /// Centre frequency for a follower level in [0, 1]
    #[inline]
    fn centre(&self, level: f32) -> f32 {
        let max = self.base_frequency * 2.0_f32.powf(self.octaves);
        self.base_frequency + (max - self.base_frequency) * level.clamp(0.0, 1.0).sqrt()
    }

    #[inline]
    fn follow(&mut self, level: f32, sample_rate: f32) -> f32 {
        let time = if level > self.envelope { self.attack } else { self.release };
        let coefficient = (-1.0 / (time * sample_rate)).exp();
        self.envelope = level + (self.envelope - level) * coefficient;
        self.envelope
    }
}

impl AudioNode for AutoWahNode {
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
            PARAM_BASE_FREQUENCY => self.base_frequency = check_finite(id, value)?.clamp(20.0, 10000.0),
            PARAM_OCTAVES => self.octaves = check_finite(id, value)?.clamp(0.0, 8.0),
            PARAM_SENSITIVITY => self.sensitivity = check_finite(id, value)?.clamp(-40.0, 0.0),
            PARAM_Q => self.q.set_target(check_finite(id, value)?.clamp(0.1, 30.0)),
            PARAM_GAIN => self.gain.set_target(check_finite(id, value)?.clamp(-24.0, 24.0)),
            PARAM_ATTACK => self.attack = check_finite(id, value)?.clamp(0.001, 2.0),
            PARAM_RELEASE => self.release = check_finite(id, value)?.clamp(0.001, 4.0),
            _ => return self.mix.set_parameter(id, value).unwrap_or(Err(ParameterError::Unavailable(id))),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_BASE_FREQUENCY => Some(self.base_frequency),
            PARAM_OCTAVES => Some(self.octaves),
            PARAM_SENSITIVITY => Some(self.sensitivity),
            PARAM_Q => Some(self.q.target()),
            PARAM_GAIN => Some(self.gain.target()),
            PARAM_ATTACK => Some(self.attack),
            PARAM_RELEASE => Some(self.release),
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
        let sr = sample_rate as f32;
        let boost = 10.0_f32.powf(self.sensitivity / 20.0);

        for frame in 0..frames {
            let left_in = input[frame * 2];
            let right_in = input[frame * 2 + 1];

            let level = (left_in.abs().max(right_in.abs())) * boost;
            let envelope = self.follow(level, sr);
            let centre = self.centre(envelope);
            let q = self.q.next(sample_rate);
            let gain = self.gain.next(sample_rate);

            self.bandpass.set(FilterType::Bandpass, centre, q, sr);
            self.peaking.set_peaking(centre, q, gain, sr);

            let left = self.peaking.process_sample(self.bandpass.process_sample(left_in, 0), 0);
            let right = self.peaking.process_sample(self.bandpass.process_sample(right_in, 1), 1);

            let (dry, wet) = self.mix.gains(sample_rate);
            output[frame * 2] = left_in * dry + left * wet;
            output[frame * 2 + 1] = right_in * dry + right * wet;
        }
    }

    fn reset(&mut self) {
        self.envelope = 0.0;
        self.bandpass.reset();
        self.peaking.reset();
        self.q.settle();
        self.gain.settle();
        self.mix.settle();
    }

    fn node_type(&self) -> &str {
        "AutoWah"
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centre_tracks_level() {
        let node = AutoWahNode::new("wah");
        assert_eq!(node.centre(0.0), 100.0);
        assert!((node.centre(1.0) - 6400.0).abs() < 1.0e-2);
        assert!(node.centre(0.25) < node.centre(0.5));
    }

    #[test]
    fn test_follower_rises_and_falls() {
        let mut node = AutoWahNode::new("wah");
        node.set_parameter(PARAM_ATTACK, 0.001).unwrap();
        for _ in 0..480 {
            node.follow(1.0, 48000.0);
        }
        let peak = node.envelope;
        for _ in 0..480 {
            node.follow(0.0, 48000.0);
        }
        assert!(peak > 0.99);
        assert!(node.envelope < peak);
    }
}
