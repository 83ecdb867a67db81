//! Core controller systems.
//!
//! These systems are generic over the physics backend. They run as exclusive
//! systems: entities are collected first, then each one is read, stepped and
//! written back through the backend.

use bevy::prelude::*;

use crate::backend::LocomotionPhysicsBackend;
use crate::controller::SlopeController;
use crate::detection::PhysicsQuery;
use crate::intent::LocomotionIntent;
use crate::state::{Airborne, Grounded, OnSlope};
use crate::FacingFlipped;

/// Run the input pass for every character: facing, jump hold and release.
///
/// Runs once per rendered frame so held jumps integrate over frame time.
pub fn apply_input_pass<B: LocomotionPhysicsBackend>(world: &mut World) {
    let dt = B::get_frame_delta(world);

    let entities: Vec<Entity> = world
        .query_filtered::<Entity, (
            With<SlopeController>,
            With<LocomotionIntent>,
            With<B::VelocityComponent>,
        )>()
        .iter(world)
        .collect();

    let mut characters = world.query::<(&mut SlopeController, &mut LocomotionIntent)>();

    for entity in entities {
        let velocity = B::get_velocity(world, entity);

        let Ok((mut controller, mut intent)) = characters.get_mut(world, entity) else {
            continue;
        };
        let outcome = controller.input_pass(&mut intent, dt, velocity);

        if let Some(facing) = outcome.flipped {
            debug!(?entity, ?facing, "character turned");
            world.send_event(FacingFlipped { entity, facing });
        }
        if let Some(velocity) = outcome.velocity {
            B::set_velocity(world, entity, velocity);
        }
    }
}

/// Sense with a [`PhysicsQuery`] stored as a resource.
///
/// Backends whose geometry queries don't need system parameters (custom
/// engines, scripted test worlds) can register this in
/// [`LocomotionSet::Sensors`](crate::LocomotionSet) instead of writing their own.
pub fn sense_with_resource<B, Q>(world: &mut World)
where
    B: LocomotionPhysicsBackend,
    Q: PhysicsQuery + Resource,
{
    if !world.contains_resource::<Q>() {
        return;
    }

    let entities: Vec<Entity> = world
        .query_filtered::<Entity, With<SlopeController>>()
        .iter(world)
        .collect();

    world.resource_scope(|world, query: Mut<Q>| {
        for entity in entities {
            let feet = B::get_feet_position(world, entity);
            if let Some(mut controller) = world.get_mut::<SlopeController>(entity) {
                controller.sense(&*query, feet);
            }
        }
    });
}

/// Run the physics pass on the frames staged by the sensors and apply the
/// resulting velocity and friction.
pub fn resolve_locomotion<B: LocomotionPhysicsBackend>(world: &mut World) {
    let entities: Vec<Entity> = world
        .query_filtered::<Entity, (With<SlopeController>, With<B::VelocityComponent>)>()
        .iter(world)
        .collect();

    for entity in entities {
        let velocity = B::get_velocity(world, entity);

        let Some(mut controller) = world.get_mut::<SlopeController>(entity) else {
            continue;
        };
        let high_friction = controller.config().high_friction;
        let Some(command) = controller.resolve(velocity) else {
            continue;
        };

        if let Some(velocity) = command.velocity {
            B::set_velocity(world, entity, velocity);
        }
        B::set_friction(world, entity, command.friction, high_friction);
    }
}

/// Sync state marker components from the controller state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &SlopeController,
        Has<Grounded>,
        Has<Airborne>,
        Option<&OnSlope>,
    )>,
) {
    for (entity, controller, has_grounded, has_airborne, on_slope) in &q_controllers {
        let state = controller.state();

        if state.is_grounded && !has_grounded {
            commands.entity(entity).insert(Grounded).remove::<Airborne>();
        } else if !state.is_grounded && !has_airborne {
            commands.entity(entity).insert(Airborne).remove::<Grounded>();
        }

        if state.is_grounded && state.is_on_slope {
            let marker = OnSlope {
                angle: state.slope_down_angle,
                walkable: state.can_walk_on_slope,
            };
            if on_slope != Some(&marker) {
                commands.entity(entity).insert(marker);
            }
        } else if on_slope.is_some() {
            commands.entity(entity).remove::<OnSlope>();
        }
    }
}
