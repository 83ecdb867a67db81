//! The per-character locomotion controller.
//!
//! [`SlopeController`] owns a validated config and the [`LocomotionState`]
//! record, and runs the two passes of a tick:
//!
//! - the input pass, once per rendered frame: facing, jump hold and release;
//! - the physics pass, once per fixed step: ground, end of ascent, slope,
//!   replenishment, friction and finally the velocity command.
//!
//! Neither pass touches the physics world directly. Sensing goes through
//! [`PhysicsQuery`] and the results come back as commands the caller applies.

use bevy::prelude::*;

use crate::config::{ConfigError, LocomotionConfig};
use crate::detection::{PhysicsQuery, ProbeGeometry, SensorFrame};
use crate::friction::FrictionMode;
use crate::intent::LocomotionIntent;
use crate::jump;
use crate::orientation::update_facing;
use crate::state::{Facing, LocomotionState};
use crate::velocity::{regime_velocity, MovementRegime};

/// What the input pass wants applied to the body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputOutcome {
    /// New facing when the character turned this frame.
    pub flipped: Option<Facing>,
    /// New body velocity when a jump started, continued or was cut.
    pub velocity: Option<Vec2>,
}

/// What the physics pass wants applied to the body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionCommand {
    pub regime: MovementRegime,
    /// Velocity to write, `None` to leave the body alone.
    pub velocity: Option<Vec2>,
    pub friction: FrictionMode,
}

/// Slope-aware locomotion controller component.
///
/// Add next to a [`LocomotionIntent`] and a physics body handled by the
/// active backend.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct SlopeController {
    config: LocomotionConfig,
    state: LocomotionState,
    /// Sensed this fixed step, not yet resolved.
    #[reflect(ignore)]
    pending: Option<SensorFrame>,
    /// Last resolved frame, kept for diagnostics.
    #[reflect(ignore)]
    last_frame: Option<SensorFrame>,
    last_regime: Option<MovementRegime>,
    last_friction: Option<FrictionMode>,
}

impl Default for SlopeController {
    fn default() -> Self {
        Self::from_valid(LocomotionConfig::default())
    }
}

impl SlopeController {
    /// Create a controller after validating `config`.
    pub fn new(config: LocomotionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: LocomotionConfig) -> Self {
        Self {
            state: LocomotionState::new(&config),
            config,
            pending: None,
            last_frame: None,
            last_regime: None,
            last_friction: None,
        }
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn state(&self) -> &LocomotionState {
        &self.state
    }

    pub fn facing(&self) -> Facing {
        self.state.facing
    }

    /// Regime chosen on the last physics pass.
    pub fn regime(&self) -> Option<MovementRegime> {
        self.last_regime
    }

    /// Friction chosen on the last physics pass.
    pub fn friction(&self) -> Option<FrictionMode> {
        self.last_friction
    }

    /// Sensor readings used by the last physics pass.
    pub fn sensor_frame(&self) -> Option<&SensorFrame> {
        self.last_frame.as_ref()
    }

    /// Where the ground and slope probes were cast on the last physics pass.
    pub fn probe_geometry(&self) -> Option<ProbeGeometry> {
        self.last_frame.map(|frame| frame.geometry)
    }

    /// Run the input pass.
    ///
    /// `dt` is the frame delta, `velocity` the body's current velocity.
    pub fn input_pass(
        &mut self,
        intent: &mut LocomotionIntent,
        dt: f32,
        velocity: Vec2,
    ) -> InputOutcome {
        let state = &mut self.state;
        state.horizontal_input = intent.horizontal;

        let flipped = update_facing(state);
        let velocity = if intent.jump_held {
            jump::hold(state, &self.config, dt, velocity)
        } else if intent.jump_released() {
            jump::release(state, &self.config, velocity)
        } else {
            None
        };
        intent.latch();

        InputOutcome { flipped, velocity }
    }

    /// Probe the world around feet at `feet` and stage the readings for the
    /// next [`resolve`](Self::resolve).
    pub fn sense<Q: PhysicsQuery + ?Sized>(&mut self, query: &Q, feet: Vec2) {
        let frame = SensorFrame::sense(query, &self.config, feet, self.state.facing.forward());
        self.pending = Some(frame);
    }

    /// Stage readings produced elsewhere, e.g. by a backend sensor system.
    pub fn set_sensor_frame(&mut self, frame: SensorFrame) {
        self.pending = Some(frame);
    }

    /// Run the physics pass on the staged readings.
    ///
    /// Returns `None` when nothing was sensed since the last pass.
    pub fn resolve(&mut self, velocity: Vec2) -> Option<LocomotionCommand> {
        let frame = self.pending.take()?;
        Some(self.resolve_frame(frame, velocity))
    }

    /// Sense and resolve in one step.
    pub fn step<Q: PhysicsQuery + ?Sized>(
        &mut self,
        query: &Q,
        feet: Vec2,
        velocity: Vec2,
    ) -> LocomotionCommand {
        self.pending = None;
        let frame = SensorFrame::sense(query, &self.config, feet, self.state.facing.forward());
        self.resolve_frame(frame, velocity)
    }

    fn resolve_frame(&mut self, frame: SensorFrame, velocity: Vec2) -> LocomotionCommand {
        let config = &self.config;
        let state = &mut self.state;

        state.is_grounded = frame.grounded;
        jump::end_ascent(state, velocity.y);
        frame.slope.apply(state, config);
        jump::replenish(state, config);
        state.refresh_falling();

        let friction = FrictionMode::select(state);
        let regime = MovementRegime::select(state);
        let command = regime_velocity(regime, state, config, velocity);
        state.velocity_command = command;

        if self.last_regime != Some(regime) {
            debug!(?regime, grounded = state.is_grounded, "movement regime changed");
        }
        if self.last_friction != Some(friction) {
            trace!(?friction, "friction changed");
        }
        self.last_regime = Some(regime);
        self.last_friction = Some(friction);
        self.last_frame = Some(frame);

        LocomotionCommand {
            regime,
            velocity: command,
            friction,
        }
    }
}
