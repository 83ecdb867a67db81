//! Movement regime selection and the per-tick velocity command.

use bevy::prelude::*;

use crate::config::LocomotionConfig;
use crate::state::LocomotionState;

/// The movement rule that fires on a tick. Exactly one applies.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementRegime {
    /// Grounded on flat ground and not jumping.
    FlatGround,
    /// Grounded on a walkable slope and not jumping; movement follows the surface.
    SlopeWalk,
    /// In the air; horizontal control only.
    Airborne,
    /// Grounded on an unwalkable slope, or grounded while still rising.
    /// The body keeps whatever velocity the physics world gives it.
    NoCommand,
}

impl MovementRegime {
    /// Pick the regime for the current state, in priority order.
    pub fn select(state: &LocomotionState) -> Self {
        if state.is_grounded && !state.is_on_slope && !state.is_jumping {
            MovementRegime::FlatGround
        } else if state.is_grounded
            && state.is_on_slope
            && state.can_walk_on_slope
            && !state.is_jumping
        {
            MovementRegime::SlopeWalk
        } else if !state.is_grounded {
            MovementRegime::Airborne
        } else {
            MovementRegime::NoCommand
        }
    }

    /// Whether this regime writes a velocity to the body.
    #[inline]
    pub fn issues_command(self) -> bool {
        self != MovementRegime::NoCommand
    }
}

/// Velocity for `regime` given the body's current velocity.
pub fn regime_velocity(
    regime: MovementRegime,
    state: &LocomotionState,
    config: &LocomotionConfig,
    current: Vec2,
) -> Option<Vec2> {
    let speed = config.movement_speed;
    let input = state.horizontal_input;

    match regime {
        MovementRegime::FlatGround => Some(Vec2::new(speed * input, 0.0)),
        // Tangent points toward -X on flat ground
        MovementRegime::SlopeWalk => Some(state.slope_normal_perp * speed * -input),
        MovementRegime::Airborne => Some(Vec2::new(speed * input, current.y)),
        MovementRegime::NoCommand => None,
    }
}
