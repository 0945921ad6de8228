use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Response shapes the filter-driven effects can select by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
}

impl FilterType {
    pub const ALL: [FilterType; 4] = [
        FilterType::Lowpass,
        FilterType::Highpass,
        FilterType::Bandpass,
        FilterType::Notch,
    ];

    pub const NAMES: [&'static str; 4] = ["lowpass", "highpass", "bandpass", "notch"];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Biquad filter implementation (2-pole IIR filter)
///
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
/// Coefficients follow the RBJ audio EQ cookbook.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    // Direct Form II Transposed state, one pair per stereo channel
    z1: [f32; 2],
    z2: [f32; 2],
}

impl BiquadFilter {
    /// Create a new biquad filter with unity gain (pass-through)
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: [0.0; 2],
            z2: [0.0; 2],
        }
    }

    /// Create a filter of the given response
    pub fn with_type(filter_type: FilterType, frequency: f32, q: f32, sample_rate: f32) -> Self {
        let mut filter = Self::new();
        filter.set(filter_type, frequency, q, sample_rate);
        filter
    }

    /// Recompute coefficients for a named response, keeping the running state
    pub fn set(&mut self, filter_type: FilterType, frequency: f32, q: f32, sample_rate: f32) {
        let (omega, alpha) = Self::prewarp(frequency, q, sample_rate);
        let cos_omega = omega.cos();
        let a0 = 1.0 + alpha;
        let (b0, b1, b2) = match filter_type {
            FilterType::Lowpass => ((1.0 - cos_omega) / 2.0, 1.0 - cos_omega, (1.0 - cos_omega) / 2.0),
            FilterType::Highpass => ((1.0 + cos_omega) / 2.0, -(1.0 + cos_omega), (1.0 + cos_omega) / 2.0),
            // Constant 0 dB peak gain
            FilterType::Bandpass => (alpha, 0.0, -alpha),
            FilterType::Notch => (1.0, -2.0 * cos_omega, 1.0),
        };
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = (-2.0 * cos_omega) / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    /// Set coefficients for a peaking EQ filter
    pub fn set_peaking(&mut self, frequency: f32, q: f32, gain_db: f32, sample_rate: f32) {
        let (omega, alpha) = Self::prewarp(frequency, q, sample_rate);
        let cos_omega = omega.cos();
        let a_gain = 10.0_f32.powf(gain_db / 40.0);

        let a0 = 1.0 + alpha / a_gain;
        self.b0 = (1.0 + alpha * a_gain) / a0;
        self.b1 = (-2.0 * cos_omega) / a0;
        self.b2 = (1.0 - alpha * a_gain) / a0;
        self.a1 = (-2.0 * cos_omega) / a0;
        self.a2 = (1.0 - alpha / a_gain) / a0;
    }

    fn prewarp(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32) {
        // Keep the centre strictly inside (0, nyquist) so tan/sin stay finite
        let nyquist = sample_rate * 0.5;
        let frequency = frequency.clamp(10.0, nyquist * 0.99);
        let omega = 2.0 * PI * frequency / sample_rate;
        let alpha = omega.sin() / (2.0 * q.max(0.001));
        (omega, alpha)
    }

    /// Process a single sample on channel 0 (left) or 1 (right)
    #[inline]
    pub fn process_sample(&mut self, input: f32, channel: usize) -> f32 {
        let channel = channel.min(1);

        let output = self.b0 * input + self.z1[channel];
        self.z1[channel] = self.b1 * input - self.a1 * output + self.z2[channel];
        self.z2[channel] = self.b2 * input - self.a2 * output;

        output
    }

    /// Process a buffer of interleaved stereo samples in place
    pub fn process_buffer(&mut self, buffer: &mut [f32]) {
        for frame in buffer.chunks_exact_mut(2) {
            frame[0] = self.process_sample(frame[0], 0);
            frame[1] = self.process_sample(frame[1], 1);
        }
    }

    /// Reset filter state (clear delay lines)
    pub fn reset(&mut self) {
        self.z1 = [0.0; 2];
        self.z2 = [0.0; 2];
    }
}

impl Default for BiquadFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_sine(filter: &mut BiquadFilter, frequency: f32, sample_rate: f32) -> f32 {
        let mut peak: f32 = 0.0;
        for n in 0..4800 {
            let x = (2.0 * PI * frequency * n as f32 / sample_rate).sin();
            let y = filter.process_sample(x, 0);
            if n > 2400 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn test_lowpass_attenuates_highs() {
        let mut filter = BiquadFilter::with_type(FilterType::Lowpass, 500.0, 0.707, 48000.0);
        let low = run_sine(&mut filter, 100.0, 48000.0);
        filter.reset();
        let high = run_sine(&mut filter, 8000.0, 48000.0);
        assert!(low > 0.9);
        assert!(high < 0.1);
    }

    #[test]
    fn test_notch_removes_centre() {
        let mut filter = BiquadFilter::with_type(FilterType::Notch, 1000.0, 1.0, 48000.0);
        assert!(run_sine(&mut filter, 1000.0, 48000.0) < 0.05);
    }

    #[test]
    fn test_extreme_frequency_stays_finite() {
        let mut filter = BiquadFilter::with_type(FilterType::Bandpass, 1.0e9, 0.0, 48000.0);
        assert!(run_sine(&mut filter, 440.0, 48000.0).is_finite());
    }

    #[test]
    fn test_filter_type_index_roundtrip() {
        for (i, t) in FilterType::ALL.iter().enumerate() {
            assert_eq!(t.index(), i);
            assert_eq!(FilterType::from_index(i), *t);
        }
        assert_eq!(FilterType::from_index(99), FilterType::Notch);
    }
}
