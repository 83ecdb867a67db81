//! Ground and slope sensing.
//!
//! Sensors only talk to the physics world through [`PhysicsQuery`], so the
//! same code runs against Rapier, a custom engine, or a scripted test world.

use bevy::prelude::*;

use crate::collision::{surface_perpendicular, CollisionData, WORLD_UP};
use crate::config::{GroundMask, LocomotionConfig, SlopeChangeTrigger};
use crate::state::LocomotionState;

/// Tangent used when no ground is found under the feet.
///
/// This is the perpendicular of world-up, which makes slope-projected movement
/// identical to flat movement.
pub const FLAT_PERPENDICULAR: Vec2 = Vec2::NEG_X;

/// Capability interface the sensors need from a physics world.
pub trait PhysicsQuery {
    /// Whether `shape` centered at `center` overlaps anything on `mask`.
    fn overlap(&self, center: Vec2, shape: ProbeShape, mask: GroundMask) -> bool;

    /// Cast a ray and return the closest hit on `mask` within `max_distance`.
    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: GroundMask,
    ) -> Option<CollisionData>;
}

/// Shape used for an overlap query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeShape {
    Circle { radius: f32 },
    /// Axis-aligned rectangle with full extents `size`.
    Rect { size: Vec2 },
}

/// The ground overlap shapes derived from a config.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroundProbe {
    pub radius: Option<f32>,
    pub size: Option<Vec2>,
}

impl GroundProbe {
    pub fn from_config(config: &LocomotionConfig) -> Self {
        let radius = (config.ground_check_radius > 0.0).then_some(config.ground_check_radius);
        let size = (config.ground_check_size.x > 0.0 && config.ground_check_size.y > 0.0)
            .then_some(config.ground_check_size);
        Self { radius, size }
    }
}

/// Feet overlap test against ground geometry.
pub struct GroundSensor;

impl GroundSensor {
    /// Returns whether the probe overlaps ground.
    ///
    /// Both shapes are queried when configured; the box answer wins.
    pub fn probe<Q: PhysicsQuery + ?Sized>(
        query: &Q,
        center: Vec2,
        probe: GroundProbe,
        mask: GroundMask,
    ) -> bool {
        let circle = probe
            .radius
            .map(|radius| query.overlap(center, ProbeShape::Circle { radius }, mask));
        let rect = probe
            .size
            .map(|size| query.overlap(center, ProbeShape::Rect { size }, mask));

        rect.or(circle).unwrap_or(false)
    }
}

/// Where the probes were cast this tick, kept for debug drawing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProbeGeometry {
    /// Origin of all three slope rays.
    pub feet: Vec2,
    /// Direction of the forward ray; the backward ray is its negation.
    pub forward: Vec2,
    pub max_distance: f32,
    /// Center of the ground overlap shapes.
    pub ground_center: Vec2,
    pub ground_probe: GroundProbe,
}

impl ProbeGeometry {
    /// Start and end points of the forward, backward and downward rays.
    pub fn rays(&self) -> [(Vec2, Vec2); 3] {
        let reach = |direction: Vec2| (self.feet, self.feet + direction * self.max_distance);
        [reach(self.forward), reach(-self.forward), reach(-WORLD_UP)]
    }
}

/// Raw result of the three slope probes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SlopeReading {
    pub front: Option<CollisionData>,
    pub back: Option<CollisionData>,
    pub down: Option<CollisionData>,
}

impl SlopeReading {
    /// The horizontal hit in use. Forward beats backward.
    pub fn side_hit(&self) -> Option<&CollisionData> {
        self.front.as_ref().or(self.back.as_ref())
    }

    /// Whether any of the three probes found ground.
    pub fn hit_any(&self) -> bool {
        self.side_hit().is_some() || self.down.is_some()
    }

    /// Side angle in degrees, 0 without a horizontal hit.
    pub fn side_angle(&self) -> f32 {
        self.side_hit()
            .map(CollisionData::angle_from_up)
            .unwrap_or(0.0)
    }

    /// Down angle in degrees, 0 without a downward hit.
    pub fn down_angle(&self) -> f32 {
        self.down
            .as_ref()
            .map(CollisionData::angle_from_up)
            .unwrap_or(0.0)
    }

    /// Unit tangent of the ground under the feet.
    pub fn normal_perp(&self) -> Vec2 {
        self.down
            .map(|hit| surface_perpendicular(hit.normal))
            .filter(|perp| *perp != Vec2::ZERO)
            .unwrap_or(FLAT_PERPENDICULAR)
    }

    /// Fold this reading into the slope fields of `state`.
    pub fn apply(&self, state: &mut LocomotionState, config: &LocomotionConfig) {
        // Horizontal pass
        state.slope_side_angle = self.side_angle();
        state.is_on_slope = self.side_hit().is_some();

        // Vertical pass
        let down_angle = self.down_angle();
        state.slope_normal_perp = self.normal_perp();
        if self.down.is_some() && down_angle != state.last_slope_angle {
            let counts = match config.slope_change_trigger {
                SlopeChangeTrigger::AnyChange => true,
                SlopeChangeTrigger::CrossesWalkable => {
                    config.is_walkable_angle(down_angle)
                        != config.is_walkable_angle(state.last_slope_angle)
                }
            };
            if counts {
                state.is_on_slope = true;
            }
        }
        state.slope_down_angle = down_angle;
        state.last_slope_angle = down_angle;

        state.can_walk_on_slope = config.is_walkable_angle(state.slope_down_angle)
            && config.is_walkable_angle(state.slope_side_angle);
    }
}

/// Forward, backward and downward ray probes from the feet.
pub struct SlopeSensor;

impl SlopeSensor {
    pub fn evaluate<Q: PhysicsQuery + ?Sized>(
        query: &Q,
        feet: Vec2,
        forward: Vec2,
        max_distance: f32,
        mask: GroundMask,
    ) -> SlopeReading {
        let forward = forward.normalize_or_zero();
        // Rays starting inside ground have no surface to measure
        let cast = |direction: Vec2| {
            query
                .raycast(feet, direction, max_distance, mask)
                .filter(CollisionData::has_surface)
        };
        SlopeReading {
            front: cast(forward),
            back: cast(-forward),
            down: cast(-WORLD_UP),
        }
    }
}

/// Everything the sensors measured for one physics tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorFrame {
    pub grounded: bool,
    pub slope: SlopeReading,
    pub geometry: ProbeGeometry,
}

impl SensorFrame {
    /// Run the ground and slope sensors for a character whose feet are at
    /// `feet` and who faces along `forward`.
    pub fn sense<Q: PhysicsQuery + ?Sized>(
        query: &Q,
        config: &LocomotionConfig,
        feet: Vec2,
        forward: Vec2,
    ) -> Self {
        let ground_probe = GroundProbe::from_config(config);
        let ground_center = feet + config.ground_check_offset;

        Self {
            grounded: GroundSensor::probe(query, ground_center, ground_probe, config.ground_mask),
            slope: SlopeSensor::evaluate(
                query,
                feet,
                forward,
                config.slope_check_distance,
                config.ground_mask,
            ),
            geometry: ProbeGeometry {
                feet,
                forward: forward.normalize_or_zero(),
                max_distance: config.slope_check_distance,
                ground_center,
                ground_probe,
            },
        }
    }
}

/// Scripted physics world answering queries from fixed values.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedPhysics {
    /// Answer for circle overlaps.
    pub circle: bool,
    /// Answer for rectangle overlaps.
    pub rect: bool,
    /// Hit returned for rays pointing right.
    pub right: Option<CollisionData>,
    /// Hit returned for rays pointing left.
    pub left: Option<CollisionData>,
    /// Hit returned for rays pointing down.
    pub down: Option<CollisionData>,
    /// Layers the scripted geometry lives on. Zero means every layer.
    pub layers: u32,
}

#[cfg(test)]
impl ScriptedPhysics {
    /// Standing on flat ground.
    pub fn flat() -> Self {
        Self {
            circle: true,
            rect: true,
            down: Some(CollisionData::new(0.1, Vec2::Y, Vec2::ZERO, None)),
            ..Default::default()
        }
    }

    /// Standing on a slope with the given ground normal; the uphill side is hit too.
    pub fn slope(normal: Vec2) -> Self {
        let normal = normal.normalize();
        let hit = CollisionData::new(0.1, normal, Vec2::ZERO, None);
        // Uphill lies opposite the horizontal component of the normal
        let (right, left) = if normal.x < 0.0 {
            (Some(hit), None)
        } else {
            (None, Some(hit))
        };
        Self {
            circle: true,
            rect: true,
            right,
            left,
            down: Some(hit),
            ..Default::default()
        }
    }

    /// Nothing anywhere.
    pub fn empty() -> Self {
        Self::default()
    }

    fn on_mask(&self, mask: GroundMask) -> bool {
        self.layers == 0 || mask.intersects(self.layers)
    }
}

#[cfg(test)]
impl PhysicsQuery for ScriptedPhysics {
    fn overlap(&self, _center: Vec2, shape: ProbeShape, mask: GroundMask) -> bool {
        if !self.on_mask(mask) {
            return false;
        }
        match shape {
            ProbeShape::Circle { .. } => self.circle,
            ProbeShape::Rect { .. } => self.rect,
        }
    }

    fn raycast(
        &self,
        _origin: Vec2,
        direction: Vec2,
        _max_distance: f32,
        mask: GroundMask,
    ) -> Option<CollisionData> {
        if !self.on_mask(mask) {
            return None;
        }
        if direction.y < -0.5 {
            self.down
        } else if direction.x > 0.0 {
            self.right
        } else if direction.x < 0.0 {
            self.left
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LocomotionConfig {
        LocomotionConfig::default().with_max_slope_angle(45.0)
    }

    fn slope_normal(degrees: f32) -> Vec2 {
        // Rises to the right: the normal leans left
        let radians = degrees.to_radians();
        Vec2::new(-radians.sin(), radians.cos())
    }

    // ==================== GroundSensor Tests ====================

    #[test]
    fn ground_probe_from_config() {
        let probe = GroundProbe::from_config(&config());
        assert_eq!(probe.radius, Some(4.0));
        assert_eq!(probe.size, Some(Vec2::new(10.0, 4.0)));

        let circle_only =
            GroundProbe::from_config(&config().with_ground_check_size(Vec2::ZERO));
        assert_eq!(circle_only.size, None);
    }

    #[test]
    fn no_overlap_is_not_grounded() {
        let world = ScriptedPhysics::empty();
        let probe = GroundProbe::from_config(&config());
        assert!(!GroundSensor::probe(&world, Vec2::ZERO, probe, GroundMask::ALL));
    }

    #[test]
    fn box_result_wins_over_circle() {
        let probe = GroundProbe::from_config(&config());

        // Box catches an edge the circle misses
        let edge = ScriptedPhysics {
            circle: false,
            rect: true,
            ..Default::default()
        };
        assert!(GroundSensor::probe(&edge, Vec2::ZERO, probe, GroundMask::ALL));

        let circle_only_hit = ScriptedPhysics {
            circle: true,
            rect: false,
            ..Default::default()
        };
        assert!(!GroundSensor::probe(&circle_only_hit, Vec2::ZERO, probe, GroundMask::ALL));
    }

    #[test]
    fn circle_used_without_box() {
        let probe = GroundProbe {
            radius: Some(1.0),
            size: None,
        };
        let world = ScriptedPhysics {
            circle: true,
            rect: false,
            ..Default::default()
        };
        assert!(GroundSensor::probe(&world, Vec2::ZERO, probe, GroundMask::ALL));
    }

    #[test]
    fn ground_mask_filters_overlap() {
        let world = ScriptedPhysics {
            layers: 0b10,
            ..ScriptedPhysics::flat()
        };
        let probe = GroundProbe::from_config(&config());
        assert!(GroundSensor::probe(&world, Vec2::ZERO, probe, GroundMask(0b10)));
        assert!(!GroundSensor::probe(&world, Vec2::ZERO, probe, GroundMask(0b01)));
    }

    // ==================== SlopeSensor Tests ====================

    #[test]
    fn flat_ground_reading() {
        let reading = SlopeSensor::evaluate(
            &ScriptedPhysics::flat(),
            Vec2::ZERO,
            Vec2::X,
            8.0,
            GroundMask::ALL,
        );
        assert!(reading.hit_any());
        assert_eq!(reading.down_angle(), 0.0);
        assert_eq!(reading.side_angle(), 0.0);
        assert!((reading.normal_perp() - Vec2::NEG_X).length() < 1e-5);
    }

    #[test]
    fn forward_hit_beats_backward_hit() {
        let front = CollisionData::new(1.0, slope_normal(30.0), Vec2::ZERO, None);
        let back = CollisionData::new(1.0, slope_normal(60.0), Vec2::ZERO, None);
        let world = ScriptedPhysics {
            right: Some(front),
            left: Some(back),
            ..Default::default()
        };

        let reading = SlopeSensor::evaluate(&world, Vec2::ZERO, Vec2::X, 8.0, GroundMask::ALL);
        assert!((reading.side_angle() - 30.0).abs() < 1e-3);

        // Facing left swaps which ray is "forward"
        let reading =
            SlopeSensor::evaluate(&world, Vec2::ZERO, Vec2::NEG_X, 8.0, GroundMask::ALL);
        assert!((reading.side_angle() - 60.0).abs() < 1e-3);
    }

    #[test]
    fn backward_hit_used_when_forward_misses() {
        let back = CollisionData::new(1.0, slope_normal(20.0), Vec2::ZERO, None);
        let world = ScriptedPhysics {
            left: Some(back),
            ..Default::default()
        };
        let reading = SlopeSensor::evaluate(&world, Vec2::ZERO, Vec2::X, 8.0, GroundMask::ALL);
        assert!((reading.side_angle() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn no_hits_reset_angles_and_slope_flag() {
        let config = config();
        let mut state = LocomotionState::new(&config);
        state.slope_down_angle = 30.0;
        state.slope_side_angle = 30.0;
        state.last_slope_angle = 30.0;
        state.is_on_slope = true;
        state.slope_normal_perp = Vec2::new(0.8, 0.6);

        let reading = SlopeSensor::evaluate(
            &ScriptedPhysics::empty(),
            Vec2::ZERO,
            Vec2::X,
            8.0,
            GroundMask::ALL,
        );
        assert!(!reading.hit_any());
        reading.apply(&mut state, &config);

        assert_eq!(state.slope_down_angle, 0.0);
        assert_eq!(state.slope_side_angle, 0.0);
        assert_eq!(state.last_slope_angle, 0.0);
        assert!(!state.is_on_slope);
        assert!(state.can_walk_on_slope);
        assert_eq!(state.slope_normal_perp, FLAT_PERPENDICULAR);
    }

    #[test]
    fn rays_starting_inside_ground_count_as_misses() {
        let config = config();
        let mut state = LocomotionState::new(&config);
        let inside = CollisionData::new(0.0, Vec2::ZERO, Vec2::ZERO, None);
        let world = ScriptedPhysics {
            circle: true,
            rect: true,
            right: Some(inside),
            left: Some(inside),
            down: Some(inside),
            ..Default::default()
        };

        let reading = SlopeSensor::evaluate(&world, Vec2::ZERO, Vec2::X, 8.0, GroundMask::ALL);
        assert!(!reading.hit_any());

        reading.apply(&mut state, &config);
        assert!(!state.is_on_slope);
        assert!(state.can_walk_on_slope);
        assert_eq!(state.slope_normal_perp, FLAT_PERPENDICULAR);
    }

    #[test]
    fn angle_change_marks_slope_even_without_side_hit() {
        let config = config();
        let mut state = LocomotionState::new(&config);
        let world = ScriptedPhysics {
            down: Some(CollisionData::new(0.1, slope_normal(10.0), Vec2::ZERO, None)),
            ..Default::default()
        };

        let reading = SlopeSensor::evaluate(&world, Vec2::ZERO, Vec2::X, 8.0, GroundMask::ALL);
        reading.apply(&mut state, &config);
        assert!(state.is_on_slope);
        assert!((state.last_slope_angle - 10.0).abs() < 1e-3);

        // Same angle next tick and no side hit: no longer a slope
        reading.apply(&mut state, &config);
        assert!(!state.is_on_slope);
    }

    #[test]
    fn crosses_walkable_trigger_ignores_small_changes() {
        let config = config().with_slope_change_trigger(SlopeChangeTrigger::CrossesWalkable);
        let mut state = LocomotionState::new(&config);

        let gentle = ScriptedPhysics {
            down: Some(CollisionData::new(0.1, slope_normal(10.0), Vec2::ZERO, None)),
            ..Default::default()
        };
        SlopeSensor::evaluate(&gentle, Vec2::ZERO, Vec2::X, 8.0, GroundMask::ALL)
            .apply(&mut state, &config);
        assert!(!state.is_on_slope);

        let steep = ScriptedPhysics {
            down: Some(CollisionData::new(0.1, slope_normal(60.0), Vec2::ZERO, None)),
            ..Default::default()
        };
        SlopeSensor::evaluate(&steep, Vec2::ZERO, Vec2::X, 8.0, GroundMask::ALL)
            .apply(&mut state, &config);
        assert!(state.is_on_slope);
        assert!(!state.can_walk_on_slope);
    }

    #[test]
    fn walkability_is_conjunction_of_both_angles() {
        let config = config();
        let mut state = LocomotionState::new(&config);

        // Gentle ground underfoot, steep wall ahead
        let world = ScriptedPhysics {
            right: Some(CollisionData::new(1.0, slope_normal(70.0), Vec2::ZERO, None)),
            down: Some(CollisionData::new(0.1, slope_normal(10.0), Vec2::ZERO, None)),
            ..Default::default()
        };
        SlopeSensor::evaluate(&world, Vec2::ZERO, Vec2::X, 8.0, GroundMask::ALL)
            .apply(&mut state, &config);

        assert!(config.is_walkable_angle(state.slope_down_angle));
        assert!(!config.is_walkable_angle(state.slope_side_angle));
        assert!(!state.can_walk_on_slope);
    }

    #[test]
    fn angles_stay_in_range() {
        let config = config();
        let mut state = LocomotionState::new(&config);
        let ceiling = CollisionData::new(0.1, Vec2::NEG_Y, Vec2::ZERO, None);
        let world = ScriptedPhysics {
            right: Some(ceiling),
            down: Some(ceiling),
            ..Default::default()
        };
        SlopeSensor::evaluate(&world, Vec2::ZERO, Vec2::X, 8.0, GroundMask::ALL)
            .apply(&mut state, &config);

        assert!((0.0..=180.0).contains(&state.slope_down_angle));
        assert!((0.0..=180.0).contains(&state.slope_side_angle));
    }

    #[test]
    fn sensor_frame_records_geometry() {
        let config = config().with_ground_check_offset(Vec2::new(0.0, -1.0));
        let feet = Vec2::new(3.0, 4.0);
        let frame = SensorFrame::sense(&ScriptedPhysics::flat(), &config, feet, Vec2::NEG_X);

        assert!(frame.grounded);
        assert_eq!(frame.geometry.feet, feet);
        assert_eq!(frame.geometry.ground_center, Vec2::new(3.0, 3.0));

        let [front, back, down] = frame.geometry.rays();
        assert_eq!(front.1, feet + Vec2::NEG_X * 8.0);
        assert_eq!(back.1, feet + Vec2::X * 8.0);
        assert_eq!(down.1, feet + Vec2::NEG_Y * 8.0);
    }
}
