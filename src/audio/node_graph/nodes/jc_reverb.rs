use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::dsp::reverb_filters::scale_delay;
use crate::dsp::{AllPassFilter, CombFilter, SmoothedValue, WetDryMix};

pub const PARAM_ROOM_SIZE: u32 = 0;

// John Chowning's reverberator: three series all-passes into four parallel combs
const ALLPASS_DELAYS: [usize; 3] = [347, 113, 37];
const COMB_DELAYS: [usize; 4] = [1687, 1601, 2053, 2251];

pub struct JcReverbNode {
    name: String,
    room_size: SmoothedValue,

    allpasses: Vec<AllPassFilter>,
    combs: Vec<CombFilter>,
    mix: WetDryMix,
    sample_rate: u32,

    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl JcReverbNode {
    pub fn new(name: impl Into<String>) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let mut parameters =
            vec![Parameter::new(PARAM_ROOM_SIZE, "roomSize", 0.0, 1.0, 0.5, ParameterUnit::Generic).smoothed()];
        parameters.extend(WetDryMix::parameters(1.0));

        let mut node = Self {
            name: name.into(),
            room_size: SmoothedValue::new(0.5),
            allpasses: Vec::new(),
            combs: Vec::new(),
            mix: WetDryMix::new(1.0),
            sample_rate: 48000,
            inputs,
            outputs,
            parameters,
        };
        node.rebuild(48000);
        node
    }

    fn rebuild(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.allpasses = ALLPASS_DELAYS
            .iter()
            .map(|&d| AllPassFilter::new(scale_delay(d, sample_rate), 0.7))
            .collect();
        self.combs = COMB_DELAYS
            .iter()
            .map(|&d| CombFilter::new(scale_delay(d, sample_rate)))
            .collect();
    }
}

impl AudioNode for JcReverbNode {
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
            PARAM_ROOM_SIZE => self.room_size.set_target(check_finite(id, value)?.clamp(0.0, 1.0)),
            _ => return self.mix.set_parameter(id, value).unwrap_or(Err(ParameterError::Unavailable(id))),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_ROOM_SIZE => Some(self.room_size.target()),
            _ => self.mix.get_parameter(id),
        }
    }

    fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]], sample_rate: u32) {
        if inputs.is_empty() || outputs.is_empty() {
            return;
        }

        if self.sample_rate != sample_rate {
            self.rebuild(sample_rate);
        }

        let input = inputs[0];
        let output = &mut outputs[0];
        let frames = input.len().min(output.len()) / 2;

        for frame in 0..frames {
            let left_in = input[frame * 2];
            let right_in = input[frame * 2 + 1];

            let feedback = 0.6 + 0.37 * self.room_size.next(sample_rate);

            let mut diffused = (left_in + right_in) * 0.5;
            for allpass in &mut self.allpasses {
                diffused = allpass.process(diffused);
            }

            let mut taps = [0.0; 4];
            for (tap, comb) in taps.iter_mut().zip(self.combs.iter_mut()) {
                comb.set_feedback(feedback);
                *tap = comb.process(diffused);
            }

            // Each side hears its own pair of combs
            let left = (taps[0] + taps[2]) * 0.35;
            let right = (taps[1] + taps[3]) * 0.35;

            let (dry, wet) = self.mix.gains(sample_rate);
            output[frame * 2] = left_in * dry + left * wet;
            output[frame * 2 + 1] = right_in * dry + right * wet;
        }
    }

    fn reset(&mut self) {
        self.allpasses.iter_mut().for_each(AllPassFilter::mute);
        self.combs.iter_mut().for_each(CombFilter::mute);
        self.room_size.settle();
        self.mix.settle();
    }

    fn node_type(&self) -> &str {
        "JCReverb"
    }

    fn name(&self) -> &str {
        &self.name
    }
}
