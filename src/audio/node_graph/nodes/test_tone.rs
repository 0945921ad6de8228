use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::{SmoothedValue, WaveShape};

pub const PARAM_FREQUENCY: u32 = 0;
pub const PARAM_LEVEL: u32 = 1;
pub const PARAM_WAVE_SHAPE: u32 = 2;

/// Diagnostic oscillator used to audition an effect or stand in for a sound source
pub struct TestToneNode {
    name: String,
    frequency: f32,
    level: SmoothedValue,
    wave_shape: WaveShape,
    phase: f32,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl TestToneNode {
    pub fn new(name: impl Into<String>, frequency: f32, level: f32, wave_shape: WaveShape) -> Self {
        let parameters = vec![
            Parameter::new(PARAM_FREQUENCY, "frequency", 1.0, 20000.0, 440.0, ParameterUnit::Frequency),
            Parameter::new(PARAM_LEVEL, "level", 0.0, 1.0, 0.5, ParameterUnit::Generic).smoothed(),
            Parameter::new(PARAM_WAVE_SHAPE, "waveShape", 0.0, 3.0, 0.0, ParameterUnit::Choice),
        ];

        Self {
            name: name.into(),
            frequency: frequency.clamp(1.0, 20000.0),
            level: SmoothedValue::new(level.clamp(0.0, 1.0)),
            wave_shape,
            phase: 0.0,
            outputs: vec![NodePort::new("Audio Out", 0)],
            parameters,
        }
    }
}

impl AudioNode for TestToneNode {
    fn category(&self) -> NodeCategory {
        NodeCategory::Generator
    }

    fn inputs(&self) -> &[NodePort] {
        &[]
    }

    fn outputs(&self) -> &[NodePort] {
        &self.outputs
    }

    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn set_parameter(&mut self, id: u32, value: f32) -> Result<(), ParameterError> {
        let value = check_finite(id, value)?;
        match id {
            PARAM_FREQUENCY => self.frequency = value.clamp(1.0, 20000.0),
            PARAM_LEVEL => self.level.set_target(value.clamp(0.0, 1.0)),
            PARAM_WAVE_SHAPE => self.wave_shape = WaveShape::from_index(value.max(0.0).round() as usize),
            _ => return Err(ParameterError::Unavailable(id)),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_FREQUENCY => Some(self.frequency),
            PARAM_LEVEL => Some(self.level.target()),
            PARAM_WAVE_SHAPE => Some(self.wave_shape.index() as f32),
            _ => None,
        }
    }

    fn process(&mut self, _inputs: &[&[f32]], outputs: &mut [&mut [f32]], sample_rate: u32) {
        if outputs.is_empty() {
            return;
        }

        let output = &mut outputs[0];
        let frames = output.len() / 2;
        let increment = self.frequency / sample_rate.max(1) as f32;

        for frame in 0..frames {
            let sample = self.wave_shape.sample(self.phase) * self.level.next(sample_rate);
            output[frame * 2] = sample;
            output[frame * 2 + 1] = sample;

            self.phase += increment;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.level.settle();
    }

    fn node_type(&self) -> &str {
        "TestTone"
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_peaks_at_level() {
        let mut tone = TestToneNode::new("tone", 1000.0, 0.3, WaveShape::Square);
        let out = super::super::run_block(&mut tone, &[0.0; 960], 48000);
        let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!((peak - 0.3).abs() < 1.0e-6);
        assert_eq!(out[0], out[1]);
    }

    #[test]
    fn test_wave_shape_choice() {
        let mut tone = TestToneNode::new("tone", 440.0, 0.5, WaveShape::Sine);
        tone.set_parameter(PARAM_WAVE_SHAPE, 3.0).unwrap();
        assert_eq!(tone.get_parameter(PARAM_WAVE_SHAPE), Some(3.0));
    }
}
