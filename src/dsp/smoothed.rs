/// Time constant for parameter ramps
const SMOOTHING_SECONDS: f32 = 0.02;

/// One-pole parameter smoother
///
/// Setting a new target never steps the running value; `next` glides toward
/// it with a ~20 ms time constant, which keeps gain changes click free.
#[derive(Debug, Clone)]
pub struct SmoothedValue {
    current: f32,
    target: f32,
    coefficient: f32,
    sample_rate: u32,
}

impl SmoothedValue {
    pub fn new(value: f32) -> Self {
        let mut smoothed = Self {
            current: value,
            target: value,
            coefficient: 0.0,
            sample_rate: 0,
        };
        smoothed.update_coefficient(48000);
        smoothed
    }

    fn update_coefficient(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.coefficient = 1.0 - (-1.0 / (SMOOTHING_SECONDS * sample_rate.max(1) as f32)).exp();
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    /// Jump straight to the target
    pub fn settle(&mut self) {
        self.current = self.target;
    }

    /// Advance one sample and return the new value
    #[inline]
    pub fn next(&mut self, sample_rate: u32) -> f32 {
        if sample_rate != self.sample_rate {
            self.update_coefficient(sample_rate);
        }
        self.current += (self.target - self.current) * self.coefficient;
        if (self.target - self.current).abs() < 1.0e-6 {
            self.current = self.target;
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_does_not_step() {
        let mut value = SmoothedValue::new(0.0);
        value.set_target(1.0);
        let first = value.next(48000);
        assert!(first > 0.0 && first < 0.01);
        assert_eq!(value.target(), 1.0);
    }

    #[test]
    fn test_converges_within_a_few_time_constants() {
        let mut value = SmoothedValue::new(0.0);
        value.set_target(1.0);
        for _ in 0..48000 / 5 {
            value.next(48000);
        }
        assert!((value.current() - 1.0).abs() < 1.0e-3);
    }

    #[test]
    fn test_settle_jumps() {
        let mut value = SmoothedValue::new(0.2);
        value.set_target(0.8);
        value.settle();
        assert_eq!(value.current(), 0.8);
    }
}
