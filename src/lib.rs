//! # `slope_controller`
//!
//! A slope-aware 2D character locomotion controller with physics backend abstraction.
//!
//! Each fixed step the controller:
//! - tests for ground under the feet with an overlap probe
//! - casts forward, backward and downward rays to measure the slope
//! - replenishes jumps on walkable ground
//! - picks high friction when idling on a walkable slope, zero otherwise
//! - issues a velocity along the ground tangent, the flat axis or the air
//!
//! Each rendered frame it reads [`LocomotionIntent`](intent::LocomotionIntent)
//! to turn the character and to drive variable-height, multi-count jumps.
//!
//! ## Usage
//!
//! ```rust
//! use slope_controller::prelude::*;
//!
//! let config = LocomotionConfig::player().with_max_slope_angle(40.0);
//! let controller = SlopeController::new(config).unwrap();
//! let intent = LocomotionIntent::default();
//!
//! assert!(controller.state().can_jump);
//! assert!(!intent.is_moving());
//! // Spawn both next to a physics body handled by the active backend.
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod controller;
pub mod detection;
pub mod friction;
pub mod intent;
pub mod jump;
pub mod orientation;
pub mod state;
pub mod systems;
pub mod velocity;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::LocomotionPhysicsBackend;
    pub use crate::collision::CollisionData;
    pub use crate::config::{ConfigError, GroundMask, LocomotionConfig, SlopeChangeTrigger};
    pub use crate::controller::{InputOutcome, LocomotionCommand, SlopeController};
    pub use crate::detection::{PhysicsQuery, ProbeGeometry, ProbeShape, SensorFrame};
    pub use crate::friction::FrictionMode;
    pub use crate::intent::LocomotionIntent;
    pub use crate::state::{Airborne, Facing, Grounded, JumpPhase, LocomotionState, OnSlope};
    pub use crate::velocity::MovementRegime;
    pub use crate::{FacingFlipped, LocomotionSet, SlopeControllerPlugin};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{Rapier2dBackend, Rapier2dCharacterBundle};
}

/// System sets for the locomotion pipeline.
///
/// `Input` runs in `Update`. The rest run chained in `FixedUpdate`:
/// sensors stage readings, `Resolve` turns them into velocity and friction,
/// `Sync` mirrors the state onto marker components.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocomotionSet {
    Input,
    Sensors,
    Resolve,
    Sync,
}

/// Sent when a character turns around.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct FacingFlipped {
    pub entity: Entity,
    /// Facing after the turn.
    pub facing: state::Facing,
}

/// Main plugin for the locomotion controller.
///
/// Generic over the physics backend `B`, whose plugin is added alongside and
/// supplies the sensor system.
///
/// # Examples
///
/// With Rapier2D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use slope_controller::prelude::*;
///
/// App::new()
///     .add_plugins(MinimalPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(SlopeControllerPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct SlopeControllerPlugin<B: backend::LocomotionPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::LocomotionPhysicsBackend> Default for SlopeControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::LocomotionPhysicsBackend> Plugin for SlopeControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::LocomotionConfig>();
        app.register_type::<config::GroundMask>();
        app.register_type::<config::SlopeChangeTrigger>();
        app.register_type::<controller::SlopeController>();
        app.register_type::<intent::LocomotionIntent>();
        app.register_type::<state::LocomotionState>();
        app.register_type::<state::Facing>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::OnSlope>();
        app.register_type::<velocity::MovementRegime>();
        app.register_type::<friction::FrictionMode>();

        app.add_event::<FacingFlipped>();

        app.configure_sets(Update, LocomotionSet::Input);
        app.configure_sets(
            FixedUpdate,
            (
                LocomotionSet::Sensors,
                LocomotionSet::Resolve,
                LocomotionSet::Sync,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            Update,
            systems::apply_input_pass::<B>.in_set(LocomotionSet::Input),
        );
        app.add_systems(
            FixedUpdate,
            (
                systems::resolve_locomotion::<B>.in_set(LocomotionSet::Resolve),
                systems::sync_state_markers.in_set(LocomotionSet::Sync),
            ),
        );
    }
}
