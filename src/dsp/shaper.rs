use serde::{Deserialize, Serialize};

const CURVE_LENGTH: usize = 4096;

/// Oversampling applied around a nonlinear curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Oversample {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "2x")]
    X2,
    #[serde(rename = "4x")]
    X4,
}

impl Oversample {
    pub const ALL: [Oversample; 3] = [Oversample::None, Oversample::X2, Oversample::X4];

    pub const NAMES: [&'static str; 3] = ["none", "2x", "4x"];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn factor(self) -> usize {
        match self {
            Oversample::None => 1,
            Oversample::X2 => 2,
            Oversample::X4 => 4,
        }
    }
}

/// Table-driven waveshaper over the input range [-1, 1]
#[derive(Debug, Clone)]
pub struct WaveShaper {
    curve: Vec<f32>,
    pub oversample: Oversample,
    // Previous input per channel, for the linear upsampler
    last: [f32; 2],
}

impl WaveShaper {
    pub fn new<F: Fn(f32) -> f32>(curve: F) -> Self {
        let mut shaper = Self {
            curve: vec![0.0; CURVE_LENGTH],
            oversample: Oversample::None,
            last: [0.0; 2],
        };
        shaper.set_curve(curve);
        shaper
    }

    /// Rebuild the lookup table
    pub fn set_curve<F: Fn(f32) -> f32>(&mut self, curve: F) {
        let last = (CURVE_LENGTH - 1) as f32;
        for (i, slot) in self.curve.iter_mut().enumerate() {
            let x = i as f32 / last * 2.0 - 1.0;
            let y = curve(x);
            *slot = if y.is_finite() { y } else { 0.0 };
        }
    }

    #[inline]
    fn lookup(&self, x: f32) -> f32 {
        let last = CURVE_LENGTH - 1;
        let pos = (x.clamp(-1.0, 1.0) + 1.0) * 0.5 * last as f32;
        let index = (pos.floor() as usize).min(last - 1);
        let frac = pos - index as f32;
        self.curve[index] * (1.0 - frac) + self.curve[index + 1] * frac
    }

    /// Shape one sample, upsampling linearly and averaging back down
    #[inline]
    pub fn process_sample(&mut self, input: f32, channel: usize) -> f32 {
        let channel = channel.min(1);
        let factor = self.oversample.factor();
        if factor == 1 {
            return self.lookup(input);
        }

        let previous = self.last[channel];
        self.last[channel] = input;
        let mut sum = 0.0;
        for step in 1..=factor {
            let t = step as f32 / factor as f32;
            sum += self.lookup(previous + (input - previous) * t);
        }
        sum / factor as f32
    }

    pub fn reset(&mut self) {
        self.last = [0.0; 2];
    }
}
