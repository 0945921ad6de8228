use super::kind::EffectKind;
use crate::audio::node_graph::nodes::{
    auto_filter, auto_wah, bit_crusher, chebyshev, chorus, distortion, feedback_delay, freeverb, frequency_shifter,
    jc_reverb, phaser, ping_pong_delay, pitch_shift, reverb, stereo_widener, tremolo, vibrato,
};
use crate::audio::node_graph::{AudioNode, ParameterError, PARAM_DRY, PARAM_WET};
use crate::dsp::{FilterType, Oversample, WaveShape};
use crate::error::EffectError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named control value as the UI sends and reads it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f32),
    /// Choice controls (filter type, oversampling, LFO shape) by name
    Text(String),
    /// Read-back sentinel for a control the unit cannot report; `null` in JSON
    Unavailable,
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Number(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Sparse set of named control changes
pub type ParamBag = BTreeMap<String, ParamValue>;

/// Parse a JSON object of control names to values
pub fn parse_param_bag(json: &str) -> Result<ParamBag, EffectError> {
    Ok(serde_json::from_str(json)?)
}

/// Outcome of one `update` call, field by field
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub applied: Vec<String>,
    /// Names the kind does not know; skipped so newer UIs keep working
    pub ignored: Vec<String>,
    pub failed: Vec<(String, ParameterError)>,
}

impl UpdateReport {
    pub fn is_clean(&self) -> bool {
        self.ignored.is_empty() && self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum ControlValue {
    Scalar,
    Choice(&'static [&'static str]),
}

/// Maps a public control name onto a unit parameter id
#[derive(Debug, Clone, Copy)]
struct Control {
    name: &'static str,
    param: u32,
    value: ControlValue,
    /// Alternate spelling; accepted on update, skipped on read-back
    alias: bool,
}

const fn scalar(name: &'static str, param: u32) -> Control {
    Control {
        name,
        param,
        value: ControlValue::Scalar,
        alias: false,
    }
}

const fn choice(name: &'static str, param: u32, names: &'static [&'static str]) -> Control {
    Control {
        name,
        param,
        value: ControlValue::Choice(names),
        alias: false,
    }
}

const fn alias(name: &'static str, param: u32) -> Control {
    Control {
        name,
        param,
        value: ControlValue::Scalar,
        alias: true,
    }
}

/// Shared by every kind, resolved after the kind's own table
const MIX_CONTROLS: &[Control] = &[scalar("wet", PARAM_WET), scalar("dry", PARAM_DRY)];

const PHASER: &[Control] = &[
    scalar("frequency", phaser::PARAM_FREQUENCY),
    scalar("octaves", phaser::PARAM_OCTAVES),
    scalar("baseFrequency", phaser::PARAM_BASE_FREQUENCY),
    scalar("stages", phaser::PARAM_STAGES),
];

const AUTO_FILTER: &[Control] = &[
    scalar("frequency", auto_filter::PARAM_FREQUENCY),
    scalar("depth", auto_filter::PARAM_DEPTH),
    scalar("baseFrequency", auto_filter::PARAM_BASE_FREQUENCY),
    scalar("octaves", auto_filter::PARAM_OCTAVES),
    choice("type", auto_filter::PARAM_LFO_TYPE, &WaveShape::NAMES),
    // Controls of the swept sub-filter
    choice("filterType", auto_filter::PARAM_FILTER_TYPE, &FilterType::NAMES),
    scalar("filterQ", auto_filter::PARAM_FILTER_Q),
];

const AUTO_WAH: &[Control] = &[
    scalar("baseFrequency", auto_wah::PARAM_BASE_FREQUENCY),
    scalar("octaves", auto_wah::PARAM_OCTAVES),
    scalar("sensitivity", auto_wah::PARAM_SENSITIVITY),
    scalar("Q", auto_wah::PARAM_Q),
    scalar("gain", auto_wah::PARAM_GAIN),
    scalar("attack", auto_wah::PARAM_ATTACK),
    scalar("release", auto_wah::PARAM_RELEASE),
];

const BIT_CRUSHER: &[Control] = &[scalar("bits", bit_crusher::PARAM_BITS)];

const CHEBYSHEV: &[Control] = &[
    scalar("order", chebyshev::PARAM_ORDER),
    choice("oversample", chebyshev::PARAM_OVERSAMPLE, &Oversample::NAMES),
];

const DISTORTION: &[Control] = &[
    scalar("distortion", distortion::PARAM_DISTORTION),
    choice("oversample", distortion::PARAM_OVERSAMPLE, &Oversample::NAMES),
];

const CHORUS: &[Control] = &[
    // The UI calls the modulation rate `chorusFrequency`
    scalar("chorusFrequency", chorus::PARAM_FREQUENCY),
    alias("frequency", chorus::PARAM_FREQUENCY),
    scalar("delayTime", chorus::PARAM_DELAY_TIME),
    scalar("depth", chorus::PARAM_DEPTH),
    scalar("spread", chorus::PARAM_SPREAD),
    scalar("feedback", chorus::PARAM_FEEDBACK),
    choice("type", chorus::PARAM_TYPE, &WaveShape::NAMES),
];

const FEEDBACK_DELAY: &[Control] = &[
    scalar("delayTime", feedback_delay::PARAM_DELAY_TIME),
    scalar("feedback", feedback_delay::PARAM_FEEDBACK),
];

const PING_PONG_DELAY: &[Control] = &[
    scalar("delayTime", ping_pong_delay::PARAM_DELAY_TIME),
    scalar("feedback", ping_pong_delay::PARAM_FEEDBACK),
];

const REVERB: &[Control] = &[
    scalar("decay", reverb::PARAM_DECAY),
    scalar("preDelay", reverb::PARAM_PRE_DELAY),
];

const FREEVERB: &[Control] = &[
    scalar("roomSize", freeverb::PARAM_ROOM_SIZE),
    scalar("dampening", freeverb::PARAM_DAMPENING),
];

const JC_REVERB: &[Control] = &[scalar("roomSize", jc_reverb::PARAM_ROOM_SIZE)];

const FREQUENCY_SHIFTER: &[Control] = &[scalar("frequency", frequency_shifter::PARAM_FREQUENCY)];

const PITCH_SHIFT: &[Control] = &[
    scalar("pitch", pitch_shift::PARAM_PITCH),
    scalar("windowSize", pitch_shift::PARAM_WINDOW_SIZE),
    scalar("feedback", pitch_shift::PARAM_FEEDBACK),
];

const STEREO_WIDENER: &[Control] = &[scalar("width", stereo_widener::PARAM_WIDTH)];

const TREMOLO: &[Control] = &[
    scalar("frequency", tremolo::PARAM_FREQUENCY),
    scalar("depth", tremolo::PARAM_DEPTH),
    scalar("spread", tremolo::PARAM_SPREAD),
    choice("type", tremolo::PARAM_TYPE, &WaveShape::NAMES),
];

const VIBRATO: &[Control] = &[
    scalar("frequency", vibrato::PARAM_FREQUENCY),
    scalar("depth", vibrato::PARAM_DEPTH),
    choice("type", vibrato::PARAM_TYPE, &WaveShape::NAMES),
];

fn controls(kind: EffectKind) -> &'static [Control] {
    match kind {
        EffectKind::Phaser => PHASER,
        EffectKind::AutoFilter => AUTO_FILTER,
        EffectKind::AutoWah => AUTO_WAH,
        EffectKind::BitCrusher => BIT_CRUSHER,
        EffectKind::Chebyshev => CHEBYSHEV,
        EffectKind::Distortion => DISTORTION,
        EffectKind::Chorus => CHORUS,
        EffectKind::FeedbackDelay => FEEDBACK_DELAY,
        EffectKind::PingPongDelay => PING_PONG_DELAY,
        EffectKind::Reverb => REVERB,
        EffectKind::Freeverb => FREEVERB,
        EffectKind::JcReverb => JC_REVERB,
        EffectKind::FrequencyShifter => FREQUENCY_SHIFTER,
        EffectKind::PitchShift => PITCH_SHIFT,
        EffectKind::StereoWidener => STEREO_WIDENER,
        EffectKind::Tremolo => TREMOLO,
        EffectKind::Vibrato => VIBRATO,
    }
}

fn resolve(kind: EffectKind, name: &str) -> Option<&'static Control> {
    controls(kind)
        .iter()
        .chain(MIX_CONTROLS)
        .find(|control| control.name == name)
}

/// Applies named control changes to live units and reads them back
pub struct ParameterUpdater;

impl ParameterUpdater {
    /// Apply every recognised control in `params`
    ///
    /// Each field stands alone: an unknown name is skipped and a bad value is
    /// recorded, and neither stops the remaining fields from applying. Ramped
    /// controls take the value as their new target.
    pub fn update(unit: &mut dyn AudioNode, kind: EffectKind, params: &ParamBag) -> UpdateReport {
        let mut report = UpdateReport::default();

        for (name, value) in params {
            let Some(control) = resolve(kind, name) else {
                log::debug!("Ignoring unknown control '{}' for {}", name, kind);
                report.ignored.push(name.clone());
                continue;
            };

            match Self::apply(unit, control, value) {
                Ok(()) => report.applied.push(name.clone()),
                Err(e) => {
                    log::warn!("Failed to set '{}' on {}: {}", name, kind, e);
                    report.failed.push((name.clone(), e));
                }
            }
        }

        report
    }

    fn apply(unit: &mut dyn AudioNode, control: &Control, value: &ParamValue) -> Result<(), ParameterError> {
        let raw = match (control.value, value) {
            (ControlValue::Scalar, ParamValue::Number(n)) => *n,
            (ControlValue::Choice(names), ParamValue::Text(text)) => {
                names
                    .iter()
                    .position(|candidate| candidate == text)
                    .ok_or_else(|| ParameterError::UnknownChoice {
                        name: control.name.to_string(),
                        value: text.clone(),
                    })? as f32
            }
            // Choices may also be addressed by index
            (ControlValue::Choice(names), ParamValue::Number(n)) => {
                if n.fract() != 0.0 || *n < 0.0 || *n as usize >= names.len() {
                    return Err(ParameterError::UnknownChoice {
                        name: control.name.to_string(),
                        value: n.to_string(),
                    });
                }
                *n
            }
            _ => {
                return Err(ParameterError::ExpectedNumber {
                    name: control.name.to_string(),
                })
            }
        };

        unit.set_parameter(control.param, raw)
    }

    /// Read the unit back in the same vocabulary `update` accepts
    pub fn current_params(unit: &dyn AudioNode, kind: EffectKind) -> ParamBag {
        controls(kind)
            .iter()
            .chain(MIX_CONTROLS)
            .filter(|control| !control.alias)
            .map(|control| {
                let value = match (unit.get_parameter(control.param), control.value) {
                    (None, _) => ParamValue::Unavailable,
                    (Some(v), ControlValue::Scalar) => ParamValue::Number(v),
                    (Some(v), ControlValue::Choice(names)) => names
                        .get(v.max(0.0) as usize)
                        .map(|name| ParamValue::Text((*name).to_string()))
                        .unwrap_or(ParamValue::Unavailable),
                };
                (control.name.to_string(), value)
            })
            .collect()
    }

    /// Public control names for a kind, mix controls included
    pub fn control_names(kind: EffectKind) -> Vec<&'static str> {
        controls(kind)
            .iter()
            .chain(MIX_CONTROLS)
            .filter(|control| !control.alias)
            .map(|control| control.name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::node_graph::nodes::GainNode;
    use crate::effects::EffectCatalog;

    fn bag(entries: &[(&str, ParamValue)]) -> ParamBag {
        entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_partial_update_applies_valid_fields() {
        let mut unit = EffectCatalog::create(EffectKind::Phaser);
        let params = bag(&[
            ("octaves", 3.0.into()),
            ("baseFrequency", 500.0.into()),
            ("bogus", 1.0.into()),
            ("stages", "many".into()),
            ("wet", 0.5.into()),
        ]);

        let report = ParameterUpdater::update(unit.as_mut(), EffectKind::Phaser, &params);

        assert_eq!(report.applied, vec!["baseFrequency", "octaves", "wet"]);
        assert_eq!(report.ignored, vec!["bogus"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "stages");
        assert_eq!(unit.get_parameter(phaser::PARAM_OCTAVES), Some(3.0));
        assert_eq!(unit.get_parameter(phaser::PARAM_BASE_FREQUENCY), Some(500.0));
        assert_eq!(unit.get_parameter(PARAM_WET), Some(0.5));
    }

    #[test]
    fn test_chorus_frequency_maps_to_modulation_rate() {
        let mut unit = EffectCatalog::create(EffectKind::Chorus);
        let report = ParameterUpdater::update(
            unit.as_mut(),
            EffectKind::Chorus,
            &bag(&[("chorusFrequency", 4.0.into())]),
        );
        assert!(report.is_clean());
        assert_eq!(unit.get_parameter(chorus::PARAM_FREQUENCY), Some(4.0));

        // The bare name still works, and read-back uses the public name only
        ParameterUpdater::update(unit.as_mut(), EffectKind::Chorus, &bag(&[("frequency", 2.0.into())]));
        let current = ParameterUpdater::current_params(unit.as_ref(), EffectKind::Chorus);
        assert_eq!(current.get("chorusFrequency"), Some(&ParamValue::Number(2.0)));
        assert!(!current.contains_key("frequency"));
    }

    #[test]
    fn test_auto_filter_nested_filter_controls() {
        let mut unit = EffectCatalog::create(EffectKind::AutoFilter);
        let report = ParameterUpdater::update(
            unit.as_mut(),
            EffectKind::AutoFilter,
            &bag(&[("filterType", "bandpass".into()), ("filterQ", 6.0.into())]),
        );
        assert!(report.is_clean());

        let current = ParameterUpdater::current_params(unit.as_ref(), EffectKind::AutoFilter);
        assert_eq!(current.get("filterType"), Some(&ParamValue::Text("bandpass".into())));
        assert_eq!(current.get("filterQ"), Some(&ParamValue::Number(6.0)));
    }

    #[test]
    fn test_unknown_choice_is_reported() {
        let mut unit = EffectCatalog::create(EffectKind::Distortion);
        let report = ParameterUpdater::update(
            unit.as_mut(),
            EffectKind::Distortion,
            &bag(&[("oversample", "8x".into()), ("distortion", 0.8.into())]),
        );
        assert_eq!(report.applied, vec!["distortion"]);
        assert!(matches!(report.failed[0].1, ParameterError::UnknownChoice { .. }));
    }

    #[test]
    fn test_choice_by_index() {
        let mut unit = EffectCatalog::create(EffectKind::Tremolo);
        ParameterUpdater::update(unit.as_mut(), EffectKind::Tremolo, &bag(&[("type", 2.0.into())]));
        let current = ParameterUpdater::current_params(unit.as_ref(), EffectKind::Tremolo);
        assert_eq!(current.get("type"), Some(&ParamValue::Text("sawtooth".into())));
    }

    #[test]
    fn test_dry_is_written_through_wet() {
        let mut unit = EffectCatalog::create(EffectKind::Freeverb);
        ParameterUpdater::update(unit.as_mut(), EffectKind::Freeverb, &bag(&[("dry", 0.25.into())]));
        assert_eq!(unit.get_parameter(PARAM_WET), Some(0.75));
    }

    #[test]
    fn test_unavailable_sentinel() {
        // A unit that is not the kind it claims to be cannot report its controls
        let unit = GainNode::new("not-a-phaser");
        let current = ParameterUpdater::current_params(&unit, EffectKind::Phaser);
        assert_eq!(current.get("octaves"), Some(&ParamValue::Unavailable));
        assert_eq!(current.get("wet"), Some(&ParamValue::Unavailable));

        let json = serde_json::to_value(&current).unwrap();
        assert!(json["octaves"].is_null());
    }

    #[test]
    fn test_every_kind_reads_back_fully() {
        for &kind in EffectCatalog::supported_kinds() {
            let unit = EffectCatalog::create(kind);
            let current = ParameterUpdater::current_params(unit.as_ref(), kind);
            assert_eq!(current.len(), ParameterUpdater::control_names(kind).len());
            for (name, value) in &current {
                assert_ne!(value, &ParamValue::Unavailable, "{} of {} unavailable", name, kind);
            }
        }
    }

    #[test]
    fn test_parse_param_bag() {
        let params = parse_param_bag(r#"{"decay": 3.5, "preDelay": 0.02, "filterType": "notch", "x": null}"#).unwrap();
        assert_eq!(params.get("decay"), Some(&ParamValue::Number(3.5)));
        assert_eq!(params.get("filterType"), Some(&ParamValue::Text("notch".into())));
        assert_eq!(params.get("x"), Some(&ParamValue::Unavailable));
        assert!(parse_param_bag("[1, 2]").is_err());
    }
}
