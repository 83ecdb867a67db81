//! Surface friction selection.

use bevy::prelude::*;

use crate::state::LocomotionState;

/// Friction the body should carry this tick.
///
/// `High` pins an idle character in place on a walkable slope; everywhere
/// else friction is dropped so the velocity commands alone drive movement.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrictionMode {
    High,
    #[default]
    Zero,
}

impl FrictionMode {
    /// `High` iff standing idle on a walkable slope.
    pub fn select(state: &LocomotionState) -> Self {
        if state.is_on_slope && state.can_walk_on_slope && state.horizontal_input == 0.0 {
            FrictionMode::High
        } else {
            FrictionMode::Zero
        }
    }

    /// Friction coefficient for this mode.
    #[inline]
    pub fn coefficient(self, high: f32) -> f32 {
        match self {
            FrictionMode::High => high,
            FrictionMode::Zero => 0.0,
        }
    }
}
