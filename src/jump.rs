//! Jump resources and the hold/release state machine.
//!
//! A jump rises at a constant `jump_speed` for as long as the input is held,
//! capped by `max_jump_time`. Releasing early cuts the ascent. Each release
//! spends one jump from `jump_count`; while jumps remain the hold budget is
//! re-armed so the next press is an extra mid-air jump.

use bevy::prelude::*;

use crate::config::LocomotionConfig;
use crate::state::LocomotionState;

/// Handle a held jump input for one input frame.
///
/// Returns the new body velocity when the jump changed it, `None` when the
/// jump was not available (a silent no-op).
pub fn hold(
    state: &mut LocomotionState,
    config: &LocomotionConfig,
    dt: f32,
    velocity: Vec2,
) -> Option<Vec2> {
    if !state.can_jump || state.jump_count == 0 {
        return None;
    }

    if !state.is_jumping {
        debug!(jumps_left = state.jump_count, "jump started");
    }
    state.is_jumping = true;
    let mut velocity = Vec2::new(velocity.x, config.jump_speed);

    state.jump_time_remaining -= dt;
    if state.jump_time_remaining <= 0.0 {
        state.can_jump = false;
        velocity.y = 0.0;
        trace!("jump hold time exhausted");
    }

    Some(velocity)
}

/// Handle the held-to-released edge of the jump input.
///
/// Returns the new body velocity when an active ascent was cut.
pub fn release(
    state: &mut LocomotionState,
    config: &LocomotionConfig,
    velocity: Vec2,
) -> Option<Vec2> {
    let cut = state
        .is_jumping
        .then(|| Vec2::new(velocity.x, 0.0));

    state.jump_count = state.jump_count.saturating_sub(1);
    state.can_jump = state.jump_count > 0;
    if state.can_jump {
        state.jump_time_remaining = config.max_jump_time;
        debug!(jumps_left = state.jump_count, "extra jump armed");
    }

    cut
}

/// Clear `is_jumping` once the ascent has stopped.
pub fn end_ascent(state: &mut LocomotionState, vertical_velocity: f32) {
    if vertical_velocity <= 0.0 {
        if state.is_jumping {
            trace!("ascent ended");
        }
        state.is_jumping = false;
    }
}

/// Restore jump resources when standing on walkable ground.
///
/// This is the only path that increases `jump_count`.
pub fn replenish(state: &mut LocomotionState, config: &LocomotionConfig) {
    if state.is_grounded && !state.is_jumping && config.is_walkable_angle(state.slope_down_angle)
    {
        if state.jump_count != config.max_jump_count {
            debug!(jumps = config.max_jump_count, "jumps replenished");
        }
        state.can_jump = true;
        state.jump_count = config.max_jump_count;
        state.jump_time_remaining = config.max_jump_time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn config() -> LocomotionConfig {
        LocomotionConfig::default()
            .with_jump(10.0, 0.1)
            .with_max_jump_count(2)
    }

    #[test]
    fn hold_sets_jump_speed_and_keeps_horizontal() {
        let config = config();
        let mut state = LocomotionState::new(&config);

        let velocity = hold(&mut state, &config, DT, Vec2::new(3.0, -2.0)).unwrap();

        assert!(state.is_jumping);
        assert_eq!(velocity, Vec2::new(3.0, 10.0));
        assert!((state.jump_time_remaining - (0.1 - DT)).abs() < 1e-6);
    }

    #[test]
    fn hold_without_budget_is_noop() {
        let config = config();
        let mut state = LocomotionState::new(&config);

        state.can_jump = false;
        assert_eq!(hold(&mut state, &config, DT, Vec2::ZERO), None);
        assert!(!state.is_jumping);

        state.can_jump = true;
        state.jump_count = 0;
        assert_eq!(hold(&mut state, &config, DT, Vec2::ZERO), None);
        assert!(!state.is_jumping);
    }

    #[test]
    fn hold_time_caps_the_ascent() {
        let config = config().with_jump(10.0, 0.5);
        let mut state = LocomotionState::new(&config);

        assert_eq!(
            hold(&mut state, &config, 0.25, Vec2::ZERO),
            Some(Vec2::new(0.0, 10.0))
        );
        // Second quarter second exhausts the budget and stops the rise
        assert_eq!(hold(&mut state, &config, 0.25, Vec2::ZERO), Some(Vec2::ZERO));
        assert!(!state.can_jump);

        // Further holding does nothing
        assert_eq!(hold(&mut state, &config, DT, Vec2::new(1.0, 5.0)), None);
    }

    #[test]
    fn release_while_jumping_cuts_vertical_velocity() {
        let config = config();
        let mut state = LocomotionState::new(&config);
        hold(&mut state, &config, DT, Vec2::ZERO);

        let cut = release(&mut state, &config, Vec2::new(2.0, 9.0));
        assert_eq!(cut, Some(Vec2::new(2.0, 0.0)));
        // Budget remained, but release cuts regardless
        assert!(state.jump_time_remaining > 0.0);
    }

    #[test]
    fn release_rearms_extra_jump() {
        let config = config();
        let mut state = LocomotionState::new(&config);
        for _ in 0..3 {
            hold(&mut state, &config, DT, Vec2::ZERO);
        }

        release(&mut state, &config, Vec2::ZERO);
        assert_eq!(state.jump_count, 1);
        assert!(state.can_jump);
        assert_eq!(state.jump_time_remaining, config.max_jump_time);
    }

    #[test]
    fn last_release_disarms_jumping() {
        let config = config();
        let mut state = LocomotionState::new(&config);
        state.jump_count = 1;
        state.is_grounded = false;

        let velocity = hold(&mut state, &config, DT, Vec2::new(1.0, -3.0)).unwrap();
        assert!(state.is_jumping);
        assert_eq!(velocity.y, config.jump_speed);

        let cut = release(&mut state, &config, velocity);
        assert_eq!(cut, Some(Vec2::new(1.0, 0.0)));
        assert_eq!(state.jump_count, 0);
        assert!(!state.can_jump);
    }

    #[test]
    fn release_when_not_jumping_keeps_velocity() {
        let config = config();
        let mut state = LocomotionState::new(&config);
        assert_eq!(release(&mut state, &config, Vec2::new(1.0, 4.0)), None);
        assert_eq!(state.jump_count, 1);
    }

    #[test]
    fn jump_count_never_underflows() {
        let config = config();
        let mut state = LocomotionState::new(&config);
        for _ in 0..5 {
            release(&mut state, &config, Vec2::ZERO);
        }
        assert_eq!(state.jump_count, 0);
        assert!(!state.can_jump);
    }

    #[test]
    fn end_ascent_on_non_positive_vertical_velocity() {
        let mut state = LocomotionState::default();
        state.is_jumping = true;

        end_ascent(&mut state, 0.5);
        assert!(state.is_jumping);

        end_ascent(&mut state, 0.0);
        assert!(!state.is_jumping);
    }

    #[test]
    fn replenish_requires_grounded_walkable_and_not_jumping() {
        let config = config().with_max_slope_angle(45.0);
        let mut state = LocomotionState::new(&config);
        state.jump_count = 0;
        state.can_jump = false;
        state.jump_time_remaining = 0.0;

        // Airborne
        replenish(&mut state, &config);
        assert_eq!(state.jump_count, 0);

        // Grounded but still rising
        state.is_grounded = true;
        state.is_jumping = true;
        replenish(&mut state, &config);
        assert_eq!(state.jump_count, 0);

        // Grounded on a steep slope
        state.is_jumping = false;
        state.slope_down_angle = 60.0;
        replenish(&mut state, &config);
        assert_eq!(state.jump_count, 0);
        assert!(!state.can_jump);

        // Grounded on walkable ground
        state.slope_down_angle = 45.0;
        replenish(&mut state, &config);
        assert_eq!(state.jump_count, config.max_jump_count);
        assert_eq!(state.jump_time_remaining, config.max_jump_time);
        assert!(state.can_jump);
    }
}
