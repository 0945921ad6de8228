use crate::error::EffectError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of effect kinds a zone can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    Phaser,
    AutoFilter,
    AutoWah,
    BitCrusher,
    Chebyshev,
    Distortion,
    Chorus,
    FeedbackDelay,
    PingPongDelay,
    Reverb,
    Freeverb,
    JcReverb,
    FrequencyShifter,
    PitchShift,
    StereoWidener,
    Tremolo,
    Vibrato,
}

impl EffectKind {
    /// Every kind, in catalog order
    pub const ALL: [EffectKind; 17] = [
        EffectKind::Phaser,
        EffectKind::AutoFilter,
        EffectKind::AutoWah,
        EffectKind::BitCrusher,
        EffectKind::Chebyshev,
        EffectKind::Distortion,
        EffectKind::Chorus,
        EffectKind::FeedbackDelay,
        EffectKind::PingPongDelay,
        EffectKind::Reverb,
        EffectKind::Freeverb,
        EffectKind::JcReverb,
        EffectKind::FrequencyShifter,
        EffectKind::PitchShift,
        EffectKind::StereoWidener,
        EffectKind::Tremolo,
        EffectKind::Vibrato,
    ];

    /// Stable string id used by scenes, commands and UI
    pub fn id(self) -> &'static str {
        match self {
            EffectKind::Phaser => "phaser",
            EffectKind::AutoFilter => "autoFilter",
            EffectKind::AutoWah => "autoWah",
            EffectKind::BitCrusher => "bitCrusher",
            EffectKind::Chebyshev => "chebyshev",
            EffectKind::Distortion => "distortion",
            EffectKind::Chorus => "chorus",
            EffectKind::FeedbackDelay => "feedbackDelay",
            EffectKind::PingPongDelay => "pingPongDelay",
            EffectKind::Reverb => "reverb",
            EffectKind::Freeverb => "freeverb",
            EffectKind::JcReverb => "jcReverb",
            EffectKind::FrequencyShifter => "frequencyShifter",
            EffectKind::PitchShift => "pitchShift",
            EffectKind::StereoWidener => "stereoWidener",
            EffectKind::Tremolo => "tremolo",
            EffectKind::Vibrato => "vibrato",
        }
    }
}

impl FromStr for EffectKind {
    type Err = EffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EffectKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| EffectError::UnsupportedKind(s.to_string()))
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_parse_back() {
        for kind in EffectKind::ALL {
            assert_eq!(kind.id().parse::<EffectKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_serde_uses_ids() {
        for kind in EffectKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.id()));
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        match "flanger".parse::<EffectKind>() {
            Err(EffectError::UnsupportedKind(id)) => assert_eq!(id, "flanger"),
            other => panic!("expected UnsupportedKind, got {:?}", other),
        }
        // Ids are case sensitive
        assert!("Phaser".parse::<EffectKind>().is_err());
    }
}
