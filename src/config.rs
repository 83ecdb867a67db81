//! Controller configuration.
//!
//! All values are fixed when a [`SlopeController`](crate::controller::SlopeController)
//! is constructed. Angles are in degrees, distances in world units.

use std::fmt;
use std::fs;
use std::path::Path;

use bevy::prelude::*;
use ron::extensions::Extensions;
use ron::Options;
use serde::{Deserialize, Serialize};

/// Collision layer bitmask selecting what counts as ground.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroundMask(pub u32);

impl GroundMask {
    /// Every layer is ground.
    pub const ALL: Self = Self(u32::MAX);
    /// Nothing is ground.
    pub const NONE: Self = Self(0);

    /// Mask containing only the given layer index (0-31).
    pub fn layer(index: u32) -> Self {
        Self(1u32.checked_shl(index).unwrap_or(0))
    }

    /// Whether any bit of `layers` is selected by this mask.
    #[inline]
    pub fn intersects(&self, layers: u32) -> bool {
        self.0 & layers != 0
    }
}

impl Default for GroundMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// When a change of the down-angle between ticks marks the character as on a slope.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlopeChangeTrigger {
    /// Any change of the measured down-angle counts, even between two walkable angles.
    #[default]
    AnyChange,
    /// The change only counts when it moves the angle across the walkable limit.
    CrossesWalkable,
}

/// Configuration parameters for the locomotion controller.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    // === Movement ===
    /// Horizontal movement speed (units/second) at full input.
    pub movement_speed: f32,

    // === Ground Check ===
    /// Radius of the circular ground overlap probe. Zero disables the circle.
    pub ground_check_radius: f32,
    /// Full extents of the rectangular ground overlap probe. Zero disables the box.
    ///
    /// When both shapes are configured the box result is the effective one.
    pub ground_check_size: Vec2,
    /// Offset of the ground check point from the character's feet.
    pub ground_check_offset: Vec2,
    /// Layers considered ground by every probe.
    pub ground_mask: GroundMask,

    // === Jumping ===
    /// Upward speed applied while the jump input is held.
    pub jump_speed: f32,
    /// Seconds a single jump keeps rising while held.
    pub max_jump_time: f32,
    /// Jumps available before touching walkable ground again (ground jump included).
    pub max_jump_count: u32,

    // === Slopes ===
    /// Length of the forward, backward and downward slope probes.
    pub slope_check_distance: f32,
    /// Steepest walkable surface, in degrees from world-up.
    pub max_slope_angle: f32,
    /// Policy for flagging a down-angle change as a slope.
    pub slope_change_trigger: SlopeChangeTrigger,

    // === Friction ===
    /// Friction coefficient used while idling on a walkable slope.
    pub high_friction: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            movement_speed: 100.0,

            ground_check_radius: 4.0,
            ground_check_size: Vec2::new(10.0, 4.0),
            ground_check_offset: Vec2::ZERO,
            ground_mask: GroundMask::ALL,

            jump_speed: 250.0,
            max_jump_time: 0.25,
            max_jump_count: 2,

            slope_check_distance: 8.0,
            max_slope_angle: 45.0,
            slope_change_trigger: SlopeChangeTrigger::AnyChange,

            high_friction: 1.0,
        }
    }
}

impl LocomotionConfig {
    /// Create a config tuned for a responsive player character.
    pub fn player() -> Self {
        Self {
            movement_speed: 140.0,
            jump_speed: 300.0,
            max_jump_time: 0.2,
            ..default()
        }
    }

    /// Whether a surface at `angle` degrees from world-up is walkable.
    #[inline]
    pub fn is_walkable_angle(&self, angle: f32) -> bool {
        angle <= self.max_slope_angle
    }

    /// Set the horizontal movement speed.
    pub fn with_movement_speed(mut self, speed: f32) -> Self {
        self.movement_speed = speed;
        self
    }

    /// Set the circular ground probe radius.
    pub fn with_ground_check_radius(mut self, radius: f32) -> Self {
        self.ground_check_radius = radius;
        self
    }

    /// Set the rectangular ground probe extents.
    pub fn with_ground_check_size(mut self, size: Vec2) -> Self {
        self.ground_check_size = size;
        self
    }

    /// Set the ground check offset from the feet.
    pub fn with_ground_check_offset(mut self, offset: Vec2) -> Self {
        self.ground_check_offset = offset;
        self
    }

    /// Set the ground layer mask.
    pub fn with_ground_mask(mut self, mask: GroundMask) -> Self {
        self.ground_mask = mask;
        self
    }

    /// Set jump speed and the per-jump hold time.
    pub fn with_jump(mut self, speed: f32, max_time: f32) -> Self {
        self.jump_speed = speed;
        self.max_jump_time = max_time;
        self
    }

    /// Set the number of jumps available between landings.
    pub fn with_max_jump_count(mut self, count: u32) -> Self {
        self.max_jump_count = count;
        self
    }

    /// Set the slope probe length.
    pub fn with_slope_check_distance(mut self, distance: f32) -> Self {
        self.slope_check_distance = distance;
        self
    }

    /// Set the steepest walkable angle in degrees.
    pub fn with_max_slope_angle(mut self, degrees: f32) -> Self {
        self.max_slope_angle = degrees;
        self
    }

    /// Set the slope change trigger policy.
    pub fn with_slope_change_trigger(mut self, trigger: SlopeChangeTrigger) -> Self {
        self.slope_change_trigger = trigger;
        self
    }

    /// Set the high friction coefficient.
    pub fn with_high_friction(mut self, coefficient: f32) -> Self {
        self.high_friction = coefficient;
        self
    }

    /// Reject configurations that cannot produce a valid physical state.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("movement_speed", self.movement_speed),
            ("ground_check_radius", self.ground_check_radius),
            ("ground_check_size.x", self.ground_check_size.x),
            ("ground_check_size.y", self.ground_check_size.y),
            ("ground_check_offset.x", self.ground_check_offset.x),
            ("ground_check_offset.y", self.ground_check_offset.y),
            ("jump_speed", self.jump_speed),
            ("max_jump_time", self.max_jump_time),
            ("slope_check_distance", self.slope_check_distance),
            ("max_slope_angle", self.max_slope_angle),
            ("high_friction", self.high_friction),
        ];
        if let Some(&(field, _)) = scalars.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::NotFinite { field });
        }

        let non_negative = [
            ("movement_speed", self.movement_speed),
            ("ground_check_radius", self.ground_check_radius),
            ("ground_check_size.x", self.ground_check_size.x),
            ("ground_check_size.y", self.ground_check_size.y),
            ("jump_speed", self.jump_speed),
            ("high_friction", self.high_friction),
        ];
        if let Some(&(field, value)) = non_negative.iter().find(|(_, value)| *value < 0.0) {
            return Err(ConfigError::Negative { field, value });
        }

        if self.max_jump_time <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "max_jump_time",
                value: self.max_jump_time,
            });
        }
        if self.slope_check_distance <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "slope_check_distance",
                value: self.slope_check_distance,
            });
        }
        if !(0.0..=180.0).contains(&self.max_slope_angle) {
            return Err(ConfigError::SlopeAngleOutOfRange {
                value: self.max_slope_angle,
            });
        }

        let has_circle = self.ground_check_radius > 0.0;
        let has_box = self.ground_check_size.x > 0.0 && self.ground_check_size.y > 0.0;
        if !has_circle && !has_box {
            return Err(ConfigError::NoGroundProbe);
        }

        Ok(())
    }

    /// Parse and validate a config from RON text.
    ///
    /// Missing fields fall back to [`LocomotionConfig::default`].
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        Self::parse_ron(source, "<inline>")
    }

    /// Load and validate a config from a RON file.
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            file: file.clone(),
            message: e.to_string(),
        })?;
        Self::parse_ron(&contents, &file)
    }

    fn parse_ron(source: &str, file: &str) -> Result<Self, ConfigError> {
        let config: Self = ron_options()
            .from_str(source)
            .map_err(|e| ConfigError::Parse {
                file: file.to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }
}

fn ron_options() -> Options {
    Options::default().with_default_extension(Extensions::IMPLICIT_SOME)
}

/// A configuration rejected at construction or load time.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A numeric field is NaN or infinite.
    NotFinite { field: &'static str },
    /// A field that must be zero or greater is negative.
    Negative { field: &'static str, value: f32 },
    /// A field that must be strictly positive is not.
    NotPositive { field: &'static str, value: f32 },
    /// `max_slope_angle` lies outside `[0, 180]` degrees.
    SlopeAngleOutOfRange { value: f32 },
    /// Neither the circle nor the box ground probe has a usable size.
    NoGroundProbe,
    /// The config file could not be read.
    Io { file: String, message: String },
    /// The config file is not valid RON for this type.
    Parse { file: String, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFinite { field } => write!(f, "'{}' must be finite", field),
            Self::Negative { field, value } => {
                write!(f, "'{}' must not be negative, got {}", field, value)
            }
            Self::NotPositive { field, value } => {
                write!(f, "'{}' must be greater than zero, got {}", field, value)
            }
            Self::SlopeAngleOutOfRange { value } => write!(
                f,
                "'max_slope_angle' must be within 0..=180 degrees, got {}",
                value
            ),
            Self::NoGroundProbe => write!(
                f,
                "ground check needs a positive radius or a box with positive extents"
            ),
            Self::Io { file, message } => write!(f, "Failed to read {}: {}", file, message),
            Self::Parse { file, message } => write!(f, "Failed to parse {}: {}", file, message),
        }
    }
}

impl std::error::Error for ConfigError {}
