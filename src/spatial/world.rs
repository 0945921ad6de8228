use crate::effects::EffectKind;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of an effect zone and of the effect instance realizing it
    ZoneId
);

string_id!(
    /// Identifier of a sound-emitting object
    SourceId
);

/// A sound-emitting object as the world reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundSource {
    pub id: SourceId,
    pub position: Vec3,
}

impl SoundSource {
    pub fn new(id: impl Into<SourceId>, position: Vec3) -> Self {
        Self { id: id.into(), position }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneShape {
    Sphere,
    Cube,
}

/// An effect zone as the world reports it; read every frame, never written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectZone {
    pub id: ZoneId,
    pub kind: EffectKind,
    pub shape: ZoneShape,
    pub position: Vec3,
    /// Euler angles in radians, applied X then Y then Z
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub locked: bool,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl EffectZone {
    pub fn sphere(id: impl Into<ZoneId>, kind: EffectKind, position: Vec3, radius: f32) -> Self {
        Self {
            id: id.into(),
            kind,
            shape: ZoneShape::Sphere,
            position,
            rotation: Vec3::ZERO,
            scale: Vec3::splat(radius),
            locked: false,
        }
    }

    pub fn cube(id: impl Into<ZoneId>, kind: EffectKind, position: Vec3, half_extent: f32, rotation: Vec3) -> Self {
        Self {
            id: id.into(),
            kind,
            shape: ZoneShape::Cube,
            position,
            rotation,
            scale: Vec3::splat(half_extent),
            locked: false,
        }
    }

    /// Sphere radius, or cube half-extent
    pub fn radius(&self) -> f32 {
        self.scale.x
    }
}

/// Read-only view of the world for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    #[serde(default)]
    pub sources: Vec<SoundSource>,
    #[serde(default)]
    pub zones: Vec<EffectZone>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_from_json() {
        let zone: EffectZone = serde_json::from_str(
            r#"{"id": "z1", "kind": "pingPongDelay", "shape": "cube", "position": [1.0, 2.0, 3.0], "scale": [2.0, 2.0, 2.0]}"#,
        )
        .unwrap();
        assert_eq!(zone.id, ZoneId::from("z1"));
        assert_eq!(zone.kind, EffectKind::PingPongDelay);
        assert_eq!(zone.shape, ZoneShape::Cube);
        assert_eq!(zone.rotation, Vec3::ZERO);
        assert_eq!(zone.radius(), 2.0);
        assert!(!zone.locked);
    }

    #[test]
    fn test_ids_serialize_as_strings() {
        let source = SoundSource::new("drum", Vec3::X);
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["id"], "drum");
        assert_eq!(source.id.to_string(), "drum");
    }
}
