//! Locomotion intent component.
//!
//! The intent is the controller's only input surface. Game code writes the
//! current horizontal axis and jump button state each frame; the controller
//! derives the release edge itself.

use bevy::prelude::*;

/// Desired locomotion from player input or AI.
///
/// # Example
///
/// ```rust
/// use slope_controller::prelude::*;
///
/// let mut intent = LocomotionIntent::new();
/// intent.set_horizontal(3.0);
/// assert_eq!(intent.horizontal, 1.0);
/// assert!(intent.is_moving());
///
/// intent.set_jump_held(true);
/// assert!(intent.is_jump_held());
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct LocomotionIntent {
    /// Horizontal axis (-1.0 = left, 1.0 = right).
    pub horizontal: f32,
    /// Whether the jump button is currently held.
    ///
    /// Set this every frame from whatever input source drives the character.
    /// Holding extends the ascent; releasing cuts it and spends a jump.
    pub jump_held: bool,
    /// Jump state seen by the previous input pass. Managed by the controller.
    pub(crate) jump_held_prev: bool,
}

impl LocomotionIntent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the horizontal axis, clamped to `[-1, 1]`.
    ///
    /// Non-finite values are treated as no input.
    pub fn set_horizontal(&mut self, axis: f32) {
        self.horizontal = if axis.is_finite() {
            axis.clamp(-1.0, 1.0)
        } else {
            0.0
        };
    }

    /// Set the jump button state.
    pub fn set_jump_held(&mut self, held: bool) {
        self.jump_held = held;
    }

    /// Clear horizontal input and release jump.
    pub fn clear(&mut self) {
        self.horizontal = 0.0;
        self.jump_held = false;
    }

    pub fn is_moving(&self) -> bool {
        self.horizontal != 0.0
    }

    pub fn is_jump_held(&self) -> bool {
        self.jump_held
    }

    /// Held on the previous input pass and released now.
    pub fn jump_released(&self) -> bool {
        self.jump_held_prev && !self.jump_held
    }

    /// Record the current jump state as seen. Called after each input pass.
    pub(crate) fn latch(&mut self) {
        self.jump_held_prev = self.jump_held;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_horizontal_clamps() {
        let mut intent = LocomotionIntent::new();
        intent.set_horizontal(0.5);
        assert_eq!(intent.horizontal, 0.5);

        intent.set_horizontal(5.0);
        assert_eq!(intent.horizontal, 1.0);

        intent.set_horizontal(-5.0);
        assert_eq!(intent.horizontal, -1.0);

        intent.set_horizontal(f32::NAN);
        assert_eq!(intent.horizontal, 0.0);
        assert!(!intent.is_moving());
    }

    #[test]
    fn release_edge_needs_previous_hold() {
        let mut intent = LocomotionIntent::new();
        assert!(!intent.jump_released());

        intent.set_jump_held(true);
        assert!(!intent.jump_released());
        intent.latch();

        // Still held
        assert!(!intent.jump_released());

        intent.set_jump_held(false);
        assert!(intent.jump_released());
        intent.latch();

        // Edge fires once
        assert!(!intent.jump_released());
    }

    #[test]
    fn clear_releases_jump() {
        let mut intent = LocomotionIntent::new();
        intent.set_horizontal(-1.0);
        intent.set_jump_held(true);
        intent.latch();

        intent.clear();
        assert!(!intent.is_moving());
        assert!(!intent.is_jump_held());
        assert!(intent.jump_released());
    }
}
