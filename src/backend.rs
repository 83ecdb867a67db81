//! Physics backend abstraction.
//!
//! The controller never names a physics engine. Body reads and writes go
//! through [`LocomotionPhysicsBackend`]; geometry queries go through
//! [`PhysicsQuery`](crate::detection::PhysicsQuery), which the backend's own
//! plugin drives from a system in [`LocomotionSet::Sensors`](crate::LocomotionSet).

use bevy::prelude::*;

use crate::collision::WORLD_UP;
use crate::friction::FrictionMode;

/// Frame delta used when the world has no clock.
pub const FALLBACK_TIMESTEP: f32 = 1.0 / 60.0;

/// Trait for physics backend implementations.
///
/// All methods are static and take the world, so the generic controller
/// systems can run as exclusive systems and stay engine-agnostic. See
/// `Rapier2dBackend` for the bundled implementation.
pub trait LocomotionPhysicsBackend: 'static + Send + Sync {
    /// The velocity component type used by this backend.
    type VelocityComponent: Component;

    /// Returns the plugin that sets up this backend, including its sensor system.
    fn plugin() -> impl Plugin;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec2;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2);

    /// Apply a friction mode to an entity's surface.
    ///
    /// `High` maps to `high_coefficient` and must win against whatever it
    /// touches; `Zero` must remove friction entirely.
    fn set_friction(world: &mut World, entity: Entity, mode: FrictionMode, high_coefficient: f32);

    /// Get the current position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec2;

    /// Get the delta of the current rendered frame.
    ///
    /// A paused clock reports 0; only a world without a clock falls back.
    fn get_frame_delta(world: &World) -> f32 {
        world
            .get_resource::<Time>()
            .map(|t| t.delta_secs())
            .unwrap_or(FALLBACK_TIMESTEP)
    }

    /// Distance from the body's origin down to the bottom of its collider.
    fn get_collider_bottom_offset(_world: &World, _entity: Entity) -> f32 {
        0.0
    }

    /// Origin of the slope probes: the bottom of the collider.
    fn get_feet_position(world: &World, entity: Entity) -> Vec2 {
        feet_position(
            Self::get_position(world, entity),
            Self::get_collider_bottom_offset(world, entity),
        )
    }
}

/// Bottom of a collider whose origin is at `position`.
#[inline]
pub fn feet_position(position: Vec2, bottom_offset: f32) -> Vec2 {
    position - WORLD_UP * bottom_offset
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
