//! Locomotion state record and state marker components.
//!
//! [`LocomotionState`] is the single mutable record every resolver reads and
//! writes during a tick. The marker components mirror parts of it onto the
//! entity so gameplay code can filter queries with `With<Grounded>` and friends.

use bevy::prelude::*;

use crate::config::LocomotionConfig;

/// Horizontal facing of a character.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    Right,
    Left,
}

impl Facing {
    /// Sign of the forward axis (`1.0` right, `-1.0` left).
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Right => 1.0,
            Facing::Left => -1.0,
        }
    }

    /// World-space forward direction.
    #[inline]
    pub fn forward(self) -> Vec2 {
        Vec2::X * self.sign()
    }

    /// The opposite facing.
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Facing::Right => Facing::Left,
            Facing::Left => Facing::Right,
        }
    }
}

/// Jump phase derived from the state flags. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpPhase {
    Grounded,
    Jumping,
    Falling,
}

/// Per-character locomotion record, mutated once per tick.
///
/// Only `facing` and the jump resources (`can_jump`, `jump_count`,
/// `jump_time_remaining`) carry memory across ticks; every other field is
/// recomputed from fresh input and sensor readings.
#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct LocomotionState {
    // === Input ===
    pub facing: Facing,
    /// Horizontal input in `[-1, 1]`.
    pub horizontal_input: f32,

    // === Ground ===
    pub is_grounded: bool,

    // === Slope ===
    pub is_on_slope: bool,
    /// Degrees between the ground normal under the feet and world-up.
    pub slope_down_angle: f32,
    /// Degrees between the forward/backward probe normal and world-up.
    pub slope_side_angle: f32,
    /// Down-angle measured on the previous tick.
    pub last_slope_angle: f32,
    pub can_walk_on_slope: bool,
    /// Unit tangent of the ground under the feet.
    pub slope_normal_perp: Vec2,

    // === Jumping ===
    pub is_jumping: bool,
    pub is_falling: bool,
    pub can_jump: bool,
    pub jump_count: u32,
    /// Seconds of hold-to-rise left in the current jump.
    pub jump_time_remaining: f32,

    // === Output ===
    /// Velocity issued on the last physics tick, `None` when no rule fired.
    pub velocity_command: Option<Vec2>,
}

impl LocomotionState {
    /// Fresh state with jump resources at their configured maxima.
    pub fn new(config: &LocomotionConfig) -> Self {
        Self {
            facing: Facing::Right,
            horizontal_input: 0.0,
            is_grounded: false,
            is_on_slope: false,
            slope_down_angle: 0.0,
            slope_side_angle: 0.0,
            last_slope_angle: 0.0,
            can_walk_on_slope: true,
            slope_normal_perp: Vec2::NEG_X,
            is_jumping: false,
            is_falling: false,
            can_jump: true,
            jump_count: config.max_jump_count,
            jump_time_remaining: config.max_jump_time,
            velocity_command: None,
        }
    }

    /// Current jump phase.
    pub fn jump_phase(&self) -> JumpPhase {
        if self.is_jumping {
            JumpPhase::Jumping
        } else if self.is_grounded {
            JumpPhase::Grounded
        } else {
            JumpPhase::Falling
        }
    }

    /// Recompute `is_falling` from the grounded and jumping flags.
    #[inline]
    pub(crate) fn refresh_falling(&mut self) {
        self.is_falling = !self.is_grounded && !self.is_jumping;
    }
}

impl Default for LocomotionState {
    fn default() -> Self {
        Self::new(&LocomotionConfig::default())
    }
}

/// Marker component indicating the character is grounded.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component indicating the character stands on a slope.
///
/// Carries the measured down-angle and whether it is walkable.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct OnSlope {
    /// Degrees from world-up.
    pub angle: f32,
    pub walkable: bool,
}
