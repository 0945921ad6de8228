use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::{Lfo, SmoothedValue, WaveShape, WetDryMix};
use std::f32::consts::PI;

pub const PARAM_FREQUENCY: u32 = 0;
pub const PARAM_OCTAVES: u32 = 1;
pub const PARAM_BASE_FREQUENCY: u32 = 2;
pub const PARAM_STAGES: u32 = 3;

const MAX_STAGES: usize = 12;

/// First-order all-pass filter for phaser
struct AllPassStage {
    zm1: [f32; 2],
}

impl AllPassStage {
    fn new() -> Self {
        Self { zm1: [0.0; 2] }
    }

    #[inline]
    fn process(&mut self, input: f32, a1: f32, channel: usize) -> f32 {
        // y[n] = a1*x[n] + x[n-1] - a1*y[n-1]
        let output = a1 * input + self.zm1[channel];
        self.zm1[channel] = input - a1 * output;
        output
    }

    fn reset(&mut self) {
        self.zm1 = [0.0; 2];
    }
}

/// a1 = (tan(pi*f/fs) - 1) / (tan(pi*f/fs) + 1)
#[inline]
fn allpass_coefficient(frequency: f32, sample_rate: f32) -> f32 {
    let frequency = frequency.clamp(10.0, sample_rate * 0.45);
    let tan_val = (PI * frequency / sample_rate).tan();
    (tan_val - 1.0) / (tan_val + 1.0)
}

/// Phaser: cascaded all-pass stages swept by an LFO around a base frequency
///
/// The sweep is centred on `baseFrequency` and spans `octaves` in total. The
/// right channel runs half a cycle behind the left.
pub struct PhaserNode {
    name: String,
    frequency: SmoothedValue, // LFO rate in Hz
    octaves: f32,
    base_frequency: f32,
    stages: usize,

    lfo: Lfo,
    filters: Vec<AllPassStage>,
    mix: WetDryMix,

    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl PhaserNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters = vec![
            Parameter::new(PARAM_FREQUENCY, "frequency", 0.01, 20.0, 0.5, ParameterUnit::Frequency).smoothed(),
            Parameter::new(PARAM_OCTAVES, "octaves", 0.0, 8.0, 3.0, ParameterUnit::Generic),
            Parameter::new(PARAM_BASE_FREQUENCY, "baseFrequency", 20.0, 10000.0, 350.0, ParameterUnit::Frequency),
            Parameter::new(PARAM_STAGES, "stages", 2.0, MAX_STAGES as f32, 6.0, ParameterUnit::Generic),
        ];
        parameters.extend(WetDryMix::parameters(1.0));

        Self {
            name: name.into(),
            frequency: SmoothedValue::new(0.5),
            octaves: 3.0,
            base_frequency: 350.0,
            stages: 6,
            lfo: Lfo::new(0.5, WaveShape::Sine),
            filters: (0..MAX_STAGES).map(|_| AllPassStage::new()).collect(),
            mix: WetDryMix::new(1.0),
            inputs,
            outputs,
            parameters,
        }
    }

    #[inline]
    fn sweep_frequency(&self, lfo01: f32) -> f32 {
        self.base_frequency * 2.0_f32.powf(self.octaves * (lfo01 - 0.5))
    }
}

impl AudioNode for PhaserNode {
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
            PARAM_OCTAVES => self.octaves = check_finite(id, value)?.clamp(0.0, 8.0),
            PARAM_BASE_FREQUENCY => self.base_frequency = check_finite(id, value)?.clamp(20.0, 10000.0),
            PARAM_STAGES => {
                // Whole stages only
                self.stages = (check_finite(id, value)?.round() as usize).clamp(2, MAX_STAGES);
            }
            _ => return self.mix.set_parameter(id, value).unwrap_or(Err(ParameterError::Unavailable(id))),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_FREQUENCY => Some(self.frequency.target()),
            PARAM_OCTAVES => Some(self.octaves),
            PARAM_BASE_FREQUENCY => Some(self.base_frequency),
            PARAM_STAGES => Some(self.stages as f32),
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

        for frame in 0..frames {
            let left_in = input[frame * 2];
            let right_in = input[frame * 2 + 1];

            self.lfo.frequency = self.frequency.next(sample_rate);
            let a_left = allpass_coefficient(self.sweep_frequency(self.lfo.unipolar(0.0)), sr);
            let a_right = allpass_coefficient(self.sweep_frequency(self.lfo.unipolar(0.5)), sr);

            let mut left = left_in;
            let mut right = right_in;
            for filter in self.filters.iter_mut().take(self.stages) {
                left = filter.process(left, a_left, 0);
                right = filter.process(right, a_right, 1);
            }

            let (dry, wet) = self.mix.gains(sample_rate);
            output[frame * 2] = left_in * dry + left * wet;
            output[frame * 2 + 1] = right_in * dry + right * wet;

            self.lfo.advance(sample_rate);
        }
    }

    fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
        self.lfo.reset();
        self.frequency.settle();
        self.mix.settle();
    }

    fn node_type(&self) -> &str {
        "Phaser"
    }

    fn name(&self) -> &str {
        &self.name
    }
}
