use super::waveform::WaveShape;

/// Free-running low frequency oscillator
#[derive(Debug, Clone)]
pub struct Lfo {
    pub frequency: f32,
    pub shape: WaveShape,
    phase: f32,
}

impl Lfo {
    pub fn new(frequency: f32, shape: WaveShape) -> Self {
        Self {
            frequency,
            shape,
            phase: 0.0,
        }
    }

    /// Start the cycle at a phase offset, in degrees
    pub fn with_phase_degrees(mut self, degrees: f32) -> Self {
        self.phase = (degrees / 360.0).rem_euclid(1.0);
        self
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Value in [-1, 1] at `offset` cycles past the current phase, without advancing
    #[inline]
    pub fn peek(&self, offset: f32) -> f32 {
        self.shape.sample((self.phase + offset).rem_euclid(1.0))
    }

    /// Unipolar value in [0, 1] at the current phase
    #[inline]
    pub fn unipolar(&self, offset: f32) -> f32 {
        self.peek(offset) * 0.5 + 0.5
    }

    #[inline]
    pub fn advance(&mut self, sample_rate: u32) {
        self.phase += self.frequency / sample_rate.max(1) as f32;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_cycle_per_period() {
        let mut lfo = Lfo::new(1.0, WaveShape::Sawtooth);
        for _ in 0..1000 {
            lfo.advance(1000);
        }
        assert!(lfo.phase() < 1.0e-3 || lfo.phase() > 0.999);
    }

    #[test]
    fn test_phase_offset() {
        let lfo = Lfo::new(1.0, WaveShape::Sine).with_phase_degrees(90.0);
        assert!((lfo.peek(0.0) - 1.0).abs() < 1.0e-5);
        assert!((lfo.unipolar(0.5)).abs() < 1.0e-5);
    }
}
