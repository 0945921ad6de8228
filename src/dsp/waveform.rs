use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Basic periodic waveforms shared by oscillators and LFOs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveShape {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl WaveShape {
    pub const ALL: [WaveShape; 4] = [WaveShape::Sine, WaveShape::Square, WaveShape::Sawtooth, WaveShape::Triangle];

    pub const NAMES: [&'static str; 4] = ["sine", "square", "sawtooth", "triangle"];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        Self::NAMES[self.index()]
    }

    /// Bipolar sample in [-1, 1] for a phase in [0, 1)
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            WaveShape::Sine => (phase * 2.0 * PI).sin(),
            WaveShape::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            WaveShape::Sawtooth => 2.0 * phase - 1.0,
            WaveShape::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes_stay_bipolar() {
        for shape in WaveShape::ALL {
            for i in 0..100 {
                let s = shape.sample(i as f32 / 100.0);
                assert!((-1.0..=1.0).contains(&s), "{:?} produced {}", shape, s);
            }
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&WaveShape::Sawtooth).unwrap();
        assert_eq!(json, "\"sawtooth\"");
        assert_eq!(WaveShape::Triangle.name(), "triangle");
    }
}
