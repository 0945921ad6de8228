use crate::audio::node_graph::{check_finite, AudioNode, NodeCategory, NodePort, Parameter, ParameterError, ParameterUnit};
use crate::config::PannerSettings;
use crate::dsp::SmoothedValue;
use glam::Vec3;
use std::f32::consts::FRAC_PI_2;

pub const PARAM_POSITION_X: u32 = 0;
pub const PARAM_POSITION_Y: u32 = 1;
pub const PARAM_POSITION_Z: u32 = 2;
pub const PARAM_LISTENER_X: u32 = 3;
pub const PARAM_LISTENER_Y: u32 = 4;
pub const PARAM_LISTENER_Z: u32 = 5;
pub const PARAM_REF_DISTANCE: u32 = 6;
pub const PARAM_MAX_DISTANCE: u32 = 7;
pub const PARAM_ROLLOFF: u32 = 8;
pub const PARAM_CONE_INNER: u32 = 9;
pub const PARAM_CONE_OUTER: u32 = 10;
pub const PARAM_CONE_OUTER_GAIN: u32 = 11;
pub const PARAM_ORIENTATION_X: u32 = 12;
pub const PARAM_ORIENTATION_Y: u32 = 13;
pub const PARAM_ORIENTATION_Z: u32 = 14;

/// Positional panner with inverse distance attenuation and equal-power stereo placement
///
/// The listener faces -Z with +Y up, so +X is to the listener's right. Source and
/// listener coordinates are ramped so moving a zone never clicks.
pub struct PannerNode {
    name: String,

    position: [SmoothedValue; 3],
    listener: [SmoothedValue; 3],
    orientation: Vec3,

    ref_distance: f32,
    max_distance: f32,
    rolloff: f32,
    cone_inner: f32,      // degrees
    cone_outer: f32,      // degrees
    cone_outer_gain: f32,

    inputs: Vec<NodePort>,
    outputs: Vec<NodePort>,
    parameters: Vec<Parameter>,
}

impl PannerNode {
    pub fn new(name: impl Into<String>, settings: &PannerSettings) -> Self {
        let (inputs, outputs) = super::stereo_ports();

        let parameters = vec![
            Parameter::new(PARAM_POSITION_X, "positionX", f32::MIN, f32::MAX, 0.0, ParameterUnit::Generic).smoothed(),
            Parameter::new(PARAM_POSITION_Y, "positionY", f32::MIN, f32::MAX, 0.0, ParameterUnit::Generic).smoothed(),
            Parameter::new(PARAM_POSITION_Z, "positionZ", f32::MIN, f32::MAX, 0.0, ParameterUnit::Generic).smoothed(),
            Parameter::new(PARAM_LISTENER_X, "listenerX", f32::MIN, f32::MAX, 0.0, ParameterUnit::Generic).smoothed(),
            Parameter::new(PARAM_LISTENER_Y, "listenerY", f32::MIN, f32::MAX, 0.0, ParameterUnit::Generic).smoothed(),
            Parameter::new(PARAM_LISTENER_Z, "listenerZ", f32::MIN, f32::MAX, 0.0, ParameterUnit::Generic).smoothed(),
            Parameter::new(PARAM_REF_DISTANCE, "refDistance", 0.0, f32::MAX, 1.0, ParameterUnit::Generic),
            Parameter::new(PARAM_MAX_DISTANCE, "maxDistance", 0.0, f32::MAX, 100.0, ParameterUnit::Generic),
            Parameter::new(PARAM_ROLLOFF, "rolloffFactor", 0.0, f32::MAX, 2.0, ParameterUnit::Generic),
            Parameter::new(PARAM_CONE_INNER, "coneInnerAngle", 0.0, 360.0, 360.0, ParameterUnit::Degrees),
            Parameter::new(PARAM_CONE_OUTER, "coneOuterAngle", 0.0, 360.0, 360.0, ParameterUnit::Degrees),
            Parameter::new(PARAM_CONE_OUTER_GAIN, "coneOuterGain", 0.0, 1.0, 0.0, ParameterUnit::Generic),
            Parameter::new(PARAM_ORIENTATION_X, "orientationX", -1.0, 1.0, 1.0, ParameterUnit::Generic),
            Parameter::new(PARAM_ORIENTATION_Y, "orientationY", -1.0, 1.0, 0.0, ParameterUnit::Generic),
            Parameter::new(PARAM_ORIENTATION_Z, "orientationZ", -1.0, 1.0, 0.0, ParameterUnit::Generic),
        ];

        Self {
            name: name.into(),
            position: [SmoothedValue::new(0.0), SmoothedValue::new(0.0), SmoothedValue::new(0.0)],
            listener: [SmoothedValue::new(0.0), SmoothedValue::new(0.0), SmoothedValue::new(0.0)],
            orientation: Vec3::X,
            ref_distance: settings.ref_distance.max(0.0),
            max_distance: settings.max_distance.max(settings.ref_distance),
            rolloff: settings.rolloff_factor.max(0.0),
            cone_inner: settings.cone_inner_angle.clamp(0.0, 360.0),
            cone_outer: settings.cone_outer_angle.clamp(0.0, 360.0),
            cone_outer_gain: settings.cone_outer_gain.clamp(0.0, 1.0),
            inputs,
            outputs,
            parameters,
        }
    }

    /// Target source position
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.position[0].target(), self.position[1].target(), self.position[2].target())
    }

    /// Target listener position
    pub fn listener(&self) -> Vec3 {
        Vec3::new(self.listener[0].target(), self.listener[1].target(), self.listener[2].target())
    }

    /// Inverse distance model, clamped to [ref, max]
    pub fn distance_gain(&self, distance: f32) -> f32 {
        if self.ref_distance <= 0.0 {
            return 1.0;
        }
        let distance = distance.clamp(self.ref_distance, self.max_distance.max(self.ref_distance));
        self.ref_distance / (self.ref_distance + self.rolloff * (distance - self.ref_distance))
    }

    /// Directional attenuation of the source cone toward the listener
    pub fn cone_gain(&self, source: Vec3, listener: Vec3) -> f32 {
        if self.cone_inner >= 360.0 && self.cone_outer >= 360.0 {
            return 1.0;
        }
        let to_listener = listener - source;
        if self.orientation == Vec3::ZERO || to_listener == Vec3::ZERO {
            return 1.0;
        }

        let angle = self.orientation.angle_between(to_listener).to_degrees();
        let inner = self.cone_inner * 0.5;
        let outer = self.cone_outer * 0.5;

        if angle <= inner {
            1.0
        } else if angle >= outer {
            self.cone_outer_gain
        } else {
            let x = (angle - inner) / (outer - inner);
            1.0 + (self.cone_outer_gain - 1.0) * x
        }
    }

    /// Azimuth of the source in degrees, folded into [-90, 90]
    fn azimuth(source: Vec3, listener: Vec3) -> f32 {
        let relative = source - listener;
        let right = relative.x;
        let front = -relative.z;
        if right == 0.0 && front == 0.0 {
            return 0.0;
        }

        let azimuth = right.atan2(front).to_degrees();
        if azimuth > 90.0 {
            180.0 - azimuth
        } else if azimuth < -90.0 {
            -180.0 - azimuth
        } else {
            azimuth
        }
    }

    fn set_axis(values: &mut [SmoothedValue; 3], axis: usize, value: f32) {
        values[axis].set_target(value);
    }
}

impl AudioNode for PannerNode {
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
        let value = check_finite(id, value)?;
        match id {
            PARAM_POSITION_X..=PARAM_POSITION_Z => {
                Self::set_axis(&mut self.position, (id - PARAM_POSITION_X) as usize, value)
            }
            PARAM_LISTENER_X..=PARAM_LISTENER_Z => {
                Self::set_axis(&mut self.listener, (id - PARAM_LISTENER_X) as usize, value)
            }
            PARAM_REF_DISTANCE => self.ref_distance = value.max(0.0),
            PARAM_MAX_DISTANCE => self.max_distance = value.max(0.0),
            PARAM_ROLLOFF => self.rolloff = value.max(0.0),
            PARAM_CONE_INNER => self.cone_inner = value.clamp(0.0, 360.0),
            PARAM_CONE_OUTER => self.cone_outer = value.clamp(0.0, 360.0),
            PARAM_CONE_OUTER_GAIN => self.cone_outer_gain = value.clamp(0.0, 1.0),
            PARAM_ORIENTATION_X => self.orientation.x = value,
            PARAM_ORIENTATION_Y => self.orientation.y = value,
            PARAM_ORIENTATION_Z => self.orientation.z = value,
            _ => return Err(ParameterError::Unavailable(id)),
        }
        Ok(())
    }

    fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_POSITION_X..=PARAM_POSITION_Z => Some(self.position[(id - PARAM_POSITION_X) as usize].target()),
            PARAM_LISTENER_X..=PARAM_LISTENER_Z => Some(self.listener[(id - PARAM_LISTENER_X) as usize].target()),
            PARAM_REF_DISTANCE => Some(self.ref_distance),
            PARAM_MAX_DISTANCE => Some(self.max_distance),
            PARAM_ROLLOFF => Some(self.rolloff),
            PARAM_CONE_INNER => Some(self.cone_inner),
            PARAM_CONE_OUTER => Some(self.cone_outer),
            PARAM_CONE_OUTER_GAIN => Some(self.cone_outer_gain),
            PARAM_ORIENTATION_X => Some(self.orientation.x),
            PARAM_ORIENTATION_Y => Some(self.orientation.y),
            PARAM_ORIENTATION_Z => Some(self.orientation.z),
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
            let source = Vec3::new(
                self.position[0].next(sample_rate),
                self.position[1].next(sample_rate),
                self.position[2].next(sample_rate),
            );
            let listener = Vec3::new(
                self.listener[0].next(sample_rate),
                self.listener[1].next(sample_rate),
                self.listener[2].next(sample_rate),
            );

            let gain = self.distance_gain(source.distance(listener)) * self.cone_gain(source, listener);
            let azimuth = Self::azimuth(source, listener);

            let left_in = input[frame * 2];
            let right_in = input[frame * 2 + 1];

            // Equal-power panning of a stereo input
            let x = if azimuth <= 0.0 { (azimuth + 90.0) / 90.0 } else { azimuth / 90.0 };
            let gain_l = (x * FRAC_PI_2).cos();
            let gain_r = (x * FRAC_PI_2).sin();

            let (left, right) = if azimuth <= 0.0 {
                (left_in + right_in * gain_l, right_in * gain_r)
            } else {
                (left_in * gain_l, right_in + left_in * gain_r)
            };

            output[frame * 2] = left * gain;
            output[frame * 2 + 1] = right * gain;
        }
    }

    fn reset(&mut self) {
        for value in self.position.iter_mut().chain(self.listener.iter_mut()) {
            value.settle();
        }
    }

    fn node_type(&self) -> &str {
        "Panner"
    }

    fn name(&self) -> &str {
        &self.name
    }
}
