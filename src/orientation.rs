//! Facing updates from horizontal input.

use bevy::prelude::*;

use crate::state::{Facing, LocomotionState};

/// Turn the character when input points against its facing.
///
/// Returns the new facing when a flip happened. Zero input never flips.
pub fn update_facing(state: &mut LocomotionState) -> Option<Facing> {
    let input = state.horizontal_input;
    let disagrees = match state.facing {
        Facing::Right => input < 0.0,
        Facing::Left => input > 0.0,
    };
    if !disagrees {
        return None;
    }

    state.facing = state.facing.flipped();
    trace!(facing = ?state.facing, "facing flipped");
    Some(state.facing)
}
