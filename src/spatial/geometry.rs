use super::world::{EffectZone, ZoneShape};
use glam::{EulerRot, Quat, Vec3};

/// Result of testing one point against one zone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Containment {
    pub contained: bool,
    /// Euclidean distance from the zone centre
    pub distance: f32,
    /// Send amount in [0, 1]; zero whenever `contained` is false
    pub amount: f32,
}

/// Linear falloff from 1 at the centre to 0 at `radius`
///
/// A non-positive or non-finite radius describes an empty volume and yields 0.
pub fn radial_amount(distance: f32, radius: f32) -> f32 {
    if !is_valid_radius(radius) {
        return 0.0;
    }
    (1.0 - distance / radius).clamp(0.0, 1.0)
}

/// Whether `radius` describes a non-empty volume
pub fn is_valid_radius(radius: f32) -> bool {
    radius > 0.0 && radius.is_finite()
}

/// Rotation of a zone built from its Euler angles
pub fn zone_rotation(rotation: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z)
}

/// Test `point` against `zone`
///
/// Spheres contain points within `scale.x` of the centre. Cubes are oriented
/// boxes of half-extent `scale.x`: the point is carried into the box's local
/// frame and compared per axis. Both shapes use the same radial falloff so a
/// cube fades like a sphere of the same half-extent.
pub fn evaluate(zone: &EffectZone, point: Vec3) -> Containment {
    let radius = zone.radius();
    let offset = point - zone.position;
    let distance = offset.length();

    let contained = if !is_valid_radius(radius) {
        false
    } else {
        match zone.shape {
            ZoneShape::Sphere => distance <= radius,
            ZoneShape::Cube => {
                let local = zone_rotation(zone.rotation).inverse() * offset;
                local.abs().max_element() <= radius
            }
        }
    };

    Containment {
        contained,
        distance,
        amount: if contained { radial_amount(distance, radius) } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKind;
    use std::f32::consts::FRAC_PI_4;

    fn sphere(radius: f32) -> EffectZone {
        EffectZone::sphere("s", EffectKind::Reverb, Vec3::ZERO, radius)
    }

    fn cube(half_extent: f32, rotation: Vec3) -> EffectZone {
        EffectZone::cube("c", EffectKind::Reverb, Vec3::ZERO, half_extent, rotation)
    }

    #[test]
    fn test_sphere_scenario() {
        let zone = sphere(2.0);
        let inside = evaluate(&zone, Vec3::new(1.0, 0.0, 0.0));
        assert!(inside.contained);
        assert!((inside.amount - 0.5).abs() < 1.0e-6);

        let outside = evaluate(&zone, Vec3::new(3.0, 0.0, 0.0));
        assert!(!outside.contained);
        assert_eq!(outside.amount, 0.0);
        assert_eq!(outside.distance, 3.0);
    }

    #[test]
    fn test_sphere_boundary_and_centre() {
        let zone = sphere(2.0);
        assert_eq!(evaluate(&zone, Vec3::ZERO).amount, 1.0);
        let edge = evaluate(&zone, Vec3::new(0.0, 2.0, 0.0));
        assert!(edge.contained);
        assert_eq!(edge.amount, 0.0);
    }

    #[test]
    fn test_unrotated_cube_contains_corner_region() {
        let zone = cube(2.0, Vec3::ZERO);
        let result = evaluate(&zone, Vec3::new(1.0, 1.0, 1.0));
        assert!(result.contained);
        // Radial law against the half-extent
        assert!((result.amount - (1.0 - 3.0_f32.sqrt() / 2.0)).abs() < 1.0e-6);

        // Inside the box corner but beyond the radial falloff
        let corner = evaluate(&zone, Vec3::new(1.9, 1.9, 0.0));
        assert!(corner.contained);
        assert_eq!(corner.amount, 0.0);
    }

    #[test]
    fn test_rotation_governs_cube_containment() {
        let point = Vec3::new(1.9, 0.0, 1.9);
        assert!(evaluate(&cube(2.0, Vec3::ZERO), point).contained);

        // Rotated 45 degrees about Y the box's corner no longer covers the point
        let rotated = cube(2.0, Vec3::new(0.0, FRAC_PI_4, 0.0));
        assert!(!evaluate(&rotated, point).contained);

        // ...but it now reaches further along X than the axis-aligned box
        assert!(!evaluate(&cube(2.0, Vec3::ZERO), Vec3::new(2.5, 0.0, 0.0)).contained);
        assert!(evaluate(&rotated, Vec3::new(2.5, 0.0, 0.0)).contained);
    }

    #[test]
    fn test_degenerate_radius_contains_nothing() {
        for radius in [0.0, -1.0, f32::NAN] {
            let result = evaluate(&sphere(radius), Vec3::ZERO);
            assert!(!result.contained);
            assert_eq!(result.amount, 0.0);
            assert!(!evaluate(&cube(radius, Vec3::ZERO), Vec3::ZERO).contained);
        }
        assert_eq!(radial_amount(1.0, 0.0), 0.0);
    }
}
