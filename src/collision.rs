//! Ray hit data returned by physics queries.

use bevy::prelude::*;

/// World-up used by every slope measurement.
pub const WORLD_UP: Vec2 = Vec2::Y;

/// Information about a raycast hit against ground geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionData {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at hit point.
    pub normal: Vec2,
    /// World position of the hit point.
    pub point: Vec2,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a collision result.
    pub fn new(distance: f32, normal: Vec2, point: Vec2, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }

    /// Whether the hit carries a surface normal.
    ///
    /// Solid rays cast from inside a shape report a hit at distance 0 with a
    /// zero normal.
    pub fn has_surface(&self) -> bool {
        self.normal.normalize_or_zero() != Vec2::ZERO
    }

    /// Unsigned angle in degrees between the hit normal and world-up.
    pub fn angle_from_up(&self) -> f32 {
        angle_from_up(self.normal)
    }

    /// Unit vector tangent to the hit surface.
    ///
    /// This is the normal rotated a quarter turn counter-clockwise, so flat
    /// ground yields `-X`.
    pub fn surface_perpendicular(&self) -> Vec2 {
        surface_perpendicular(self.normal)
    }
}

/// Unsigned angle in degrees between `normal` and world-up, in `[0, 180]`.
///
/// A zero-length normal measures as flat.
pub fn angle_from_up(normal: Vec2) -> f32 {
    let normal = normal.normalize_or_zero();
    if normal == Vec2::ZERO {
        return 0.0;
    }
    normal.dot(WORLD_UP).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Counter-clockwise perpendicular of `normal`, normalized.
pub fn surface_perpendicular(normal: Vec2) -> Vec2 {
    normal.perp().normalize_or_zero()
}
