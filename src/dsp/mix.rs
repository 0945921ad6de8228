use super::smoothed::SmoothedValue;
use crate::audio::node_graph::{check_finite, Parameter, ParameterError, ParameterUnit, PARAM_DRY, PARAM_WET};
use std::f32::consts::FRAC_PI_2;

/// Equal-power wet/dry crossfade carried by every effect node
///
/// `wet` is the only state; `dry` reads and writes its complement.
#[derive(Debug, Clone)]
pub struct WetDryMix {
    wet: SmoothedValue,
}

impl WetDryMix {
    pub fn new(wet: f32) -> Self {
        Self {
            wet: SmoothedValue::new(wet.clamp(0.0, 1.0)),
        }
    }

    /// Parameter definitions to append to a node's own list
    pub fn parameters(default_wet: f32) -> [Parameter; 2] {
        [
            Parameter::new(PARAM_WET, "wet", 0.0, 1.0, default_wet, ParameterUnit::Generic).smoothed(),
            Parameter::new(PARAM_DRY, "dry", 0.0, 1.0, 1.0 - default_wet, ParameterUnit::Generic).smoothed(),
        ]
    }

    /// Handle the shared mix ids. Returns `None` when `id` is not a mix control.
    pub fn set_parameter(&mut self, id: u32, value: f32) -> Option<Result<(), ParameterError>> {
        let target = match id {
            PARAM_WET => value,
            PARAM_DRY => 1.0 - value,
            _ => return None,
        };
        Some(check_finite(id, value).map(|_| self.wet.set_target(target.clamp(0.0, 1.0))))
    }

    pub fn get_parameter(&self, id: u32) -> Option<f32> {
        match id {
            PARAM_WET => Some(self.wet.target()),
            PARAM_DRY => Some(1.0 - self.wet.target()),
            _ => None,
        }
    }

    /// Blend one sample pair, advancing the ramp
    #[inline]
    pub fn mix(&mut self, dry: f32, wet: f32, sample_rate: u32) -> f32 {
        let (dry_gain, wet_gain) = self.gains(sample_rate);
        dry * dry_gain + wet * wet_gain
    }

    /// Advance the ramp one frame and return (dry, wet) gains
    #[inline]
    pub fn gains(&mut self, sample_rate: u32) -> (f32, f32) {
        let angle = self.wet.next(sample_rate) * FRAC_PI_2;
        (angle.cos(), angle.sin())
    }

    pub fn settle(&mut self) {
        self.wet.settle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_is_complement_of_wet() {
        let mut mix = WetDryMix::new(1.0);
        mix.set_parameter(PARAM_DRY, 0.25).unwrap().unwrap();
        assert_eq!(mix.get_parameter(PARAM_WET), Some(0.75));
        assert_eq!(mix.get_parameter(PARAM_DRY), Some(0.25));
    }

    #[test]
    fn test_other_ids_pass_through() {
        let mut mix = WetDryMix::new(1.0);
        assert!(mix.set_parameter(3, 0.5).is_none());
    }

    #[test]
    fn test_full_wet_mutes_dry() {
        let mut mix = WetDryMix::new(1.0);
        let out = mix.mix(1.0, 0.0, 48000);
        assert!(out.abs() < 1.0e-6);
    }

    #[test]
    fn test_rejects_nan() {
        let mut mix = WetDryMix::new(1.0);
        assert_eq!(
            mix.set_parameter(PARAM_WET, f32::NAN),
            Some(Err(ParameterError::NonFinite { id: PARAM_WET }))
        );
    }
}
