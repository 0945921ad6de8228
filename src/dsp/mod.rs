pub mod biquad;
pub mod delay_line;
pub mod lfo;
pub mod mix;
pub mod reverb_filters;
pub mod shaper;
pub mod smoothed;
pub mod waveform;

pub use biquad::{BiquadFilter, FilterType};
pub use delay_line::DelayLine;
pub use lfo::Lfo;
pub use mix::WetDryMix;
pub use reverb_filters::{AllPassFilter, CombFilter};
pub use shaper::{Oversample, WaveShaper};
pub use smoothed::SmoothedValue;
pub use waveform::WaveShape;
