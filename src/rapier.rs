//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.

use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

use crate::backend::{feet_position, LocomotionPhysicsBackend};
use crate::collision::CollisionData;
use crate::config::GroundMask;
use crate::controller::SlopeController;
use crate::detection::{PhysicsQuery, ProbeShape};
use crate::friction::FrictionMode;
use crate::LocomotionSet;

/// Rapier2D physics backend for the locomotion controller.
///
/// Velocity and friction are written straight to the `Velocity` and
/// `Friction` components. Geometry queries need `RapierContext` as a system
/// parameter, so sensing happens in a dedicated system added by
/// [`Rapier2dBackendPlugin`].
pub struct Rapier2dBackend;

impl LocomotionPhysicsBackend for Rapier2dBackend {
    type VelocityComponent = Velocity;

    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        } else {
            warn!(?entity, "character has no Velocity component");
        }
    }

    fn set_friction(world: &mut World, entity: Entity, mode: FrictionMode, high_coefficient: f32) {
        let wanted = rapier_friction(mode, high_coefficient);

        if let Some(mut friction) = world.get_mut::<Friction>(entity) {
            // Only touch the component on change to keep change detection quiet
            if friction.coefficient != wanted.coefficient
                || friction.combine_rule != wanted.combine_rule
            {
                *friction = wanted;
            }
            return;
        }

        if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.insert(wanted);
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation.xy())
            .or_else(|| {
                world
                    .get::<GlobalTransform>(entity)
                    .map(|t| t.translation().xy())
            })
            .unwrap_or(Vec2::ZERO)
    }

    fn get_collider_bottom_offset(world: &World, entity: Entity) -> f32 {
        world
            .get::<Collider>(entity)
            .map(get_collider_bottom_offset)
            .unwrap_or(0.0)
    }
}

/// Rapier friction for a friction mode.
///
/// High friction takes the larger coefficient of the contact pair so the
/// character sticks; zero friction takes the smaller so it always slides.
pub fn rapier_friction(mode: FrictionMode, high_coefficient: f32) -> Friction {
    match mode {
        FrictionMode::High => Friction {
            coefficient: high_coefficient,
            combine_rule: CoefficientCombineRule::Max,
        },
        FrictionMode::Zero => Friction {
            coefficient: 0.0,
            combine_rule: CoefficientCombineRule::Min,
        },
    }
}

/// Plugin that sets up Rapier2D-specific systems for the locomotion controller.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            rapier_slope_sensors.in_set(LocomotionSet::Sensors),
        );
    }
}

/// Get the distance from collider center to bottom for a given collider.
pub fn get_collider_bottom_offset(collider: &Collider) -> f32 {
    if let Some(capsule) = collider.as_capsule() {
        // Half the segment plus the cap
        let segment = capsule.segment();
        let half_height = (segment.a().y - segment.b().y).abs() / 2.0;
        half_height + capsule.radius()
    } else if let Some(ball) = collider.as_ball() {
        ball.radius()
    } else if let Some(cuboid) = collider.as_cuboid() {
        cuboid.half_extents().y
    } else {
        0.0
    }
}

/// [`PhysicsQuery`] over a Rapier context, ignoring the querying character.
pub struct RapierGroundQuery<'a, 'w> {
    context: &'a RapierContext<'w>,
    exclude: Entity,
}

impl<'a, 'w> RapierGroundQuery<'a, 'w> {
    pub fn new(context: &'a RapierContext<'w>, exclude: Entity) -> Self {
        Self { context, exclude }
    }

    fn filter(&self, mask: GroundMask) -> QueryFilter<'static> {
        QueryFilter::default()
            .exclude_rigid_body(self.exclude)
            .exclude_collider(self.exclude)
            .exclude_sensors()
            .groups(CollisionGroups::new(
                Group::ALL,
                Group::from_bits_truncate(mask.0),
            ))
    }
}

impl PhysicsQuery for RapierGroundQuery<'_, '_> {
    fn overlap(&self, center: Vec2, shape: ProbeShape, mask: GroundMask) -> bool {
        let collider = match shape {
            ProbeShape::Circle { radius } => Collider::ball(radius),
            ProbeShape::Rect { size } => Collider::cuboid(size.x / 2.0, size.y / 2.0),
        };
        self.context
            .intersection_with_shape(center, 0.0, &collider, self.filter(mask))
            .is_some()
    }

    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: GroundMask,
    ) -> Option<CollisionData> {
        self.context
            .cast_ray_and_get_normal(origin, direction, max_distance, true, self.filter(mask))
            .map(|(hit_entity, hit)| {
                CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity))
            })
    }
}

/// Rapier-specific sensor system.
///
/// Probes originate at the bottom of the character's collider.
fn rapier_slope_sensors(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(
        Entity,
        &GlobalTransform,
        &mut SlopeController,
        Option<&Collider>,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, mut controller, collider) in &mut q_controllers {
        let bottom = collider.map(get_collider_bottom_offset).unwrap_or(0.0);
        let feet = feet_position(transform.translation().xy(), bottom);

        let query = RapierGroundQuery::new(&context, entity);
        controller.sense(&query, feet);
    }
}

/// Bundle of Rapier2D physics components for a locomotion character.
///
/// Add this alongside [`SlopeController`], a
/// [`LocomotionIntent`](crate::intent::LocomotionIntent) and a `Collider`.
///
/// # Example
///
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use slope_controller::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 100.0, 0.0),
///         SlopeController::new(LocomotionConfig::player()).unwrap(),
///         LocomotionIntent::default(),
///         Rapier2dCharacterBundle::new(),
///         Collider::capsule_y(8.0, 4.0),
///     ));
/// }
/// ```
#[derive(Bundle)]
pub struct Rapier2dCharacterBundle {
    pub rigid_body: RigidBody,
    /// Written by the controller every fixed step a movement rule fires.
    pub velocity: Velocity,
    pub locked_axes: LockedAxes,
    /// Rewritten by the controller from the selected friction mode.
    pub friction: Friction,
    pub sleeping: Sleeping,
}

impl Default for Rapier2dCharacterBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier2dCharacterBundle {
    /// A rotation-locked dynamic body that starts frictionless and never sleeps.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::zero(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            friction: rapier_friction(FrictionMode::Zero, 0.0),
            sleeping: Sleeping::disabled(),
        }
    }

    /// Set the starting velocity.
    pub fn with_velocity(mut self, linvel: Vec2) -> Self {
        self.velocity = Velocity::linear(linvel);
        self
    }
}
