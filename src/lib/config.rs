//! Board-independent configuration of the drive core.
//!
//! The firmware assembles a [`RoverConfig`] from its compile-time constants
//! and hands it to [`crate::controller::rover::Rover::new`], which refuses to
//! start on a [`ConfigError`].

use core::fmt;

use crate::controller::pid_params::TuningParams;
use crate::time::Duration;
use crate::wheel::{PerWheel, Polarity};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    pub wheel_radius_m: f32,
    /// Half the distance between left and right wheel contact points (lx).
    pub half_track_m: f32,
    /// Half the distance between front and back axles (ly).
    pub half_wheelbase_m: f32,
}

impl Geometry {
    /// lx + ly, the lever arm of a rotation command on each wheel.
    pub fn lever_arm_m(&self) -> f32 {
        self.half_track_m + self.half_wheelbase_m
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncoderConfig {
    /// Decoded edges per wheel revolution (4 per quadrature cycle).
    pub ticks_per_rev: u32,
}

impl EncoderConfig {
    pub fn radians_per_tick(&self) -> f32 {
        2.0 * core::f32::consts::PI / self.ticks_per_rev as f32
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limits {
    pub max_linear_mps: f32,
    pub max_angular_radps: f32,
    pub max_wheel_radps: f32,
    /// Largest duty fraction a loop may request, in (0, 1].
    pub max_duty: f32,
}

/// What the H-bridge does when a wheel is told to stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrakeMode {
    /// Both direction inputs low, enable fully on: motor terminals shorted
    /// through the low-side switches.
    Short,
    /// Enable off, the motor free-wheels.
    Coast,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoverConfig {
    pub geometry: Geometry,
    pub encoder: EncoderConfig,
    pub limits: Limits,
    pub tuning: TuningParams,
    pub polarity: PerWheel<Polarity>,
    /// Longest gap between commands before the motors are stopped.
    pub watchdog: Duration,
    pub brake_mode: BrakeMode,
    /// Exponential smoothing factor for measured velocity, 1.0 disables it.
    pub velocity_filter_alpha: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    WheelRadius,
    LeverArm,
    TicksPerRev,
    SpeedLimit,
    DutyLimit,
    Gains,
    Watchdog,
    FilterAlpha,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::WheelRadius => "wheel radius must be positive",
            ConfigError::LeverArm => "half track and half wheelbase must be positive",
            ConfigError::TicksPerRev => "encoder ticks per revolution must be non-zero",
            ConfigError::SpeedLimit => "speed limits must be positive",
            ConfigError::DutyLimit => "max duty must be in (0, 1]",
            ConfigError::Gains => "PID gains must be finite and non-negative",
            ConfigError::Watchdog => "watchdog window must be non-zero",
            ConfigError::FilterAlpha => "velocity filter alpha must be in (0, 1]",
        };
        f.write_str(msg)
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

fn gain(v: f32) -> bool {
    v.is_finite() && v >= 0.0
}

impl RoverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.geometry;
        if !positive(g.wheel_radius_m) {
            return Err(ConfigError::WheelRadius);
        }
        if !positive(g.half_track_m) || !positive(g.half_wheelbase_m) {
            return Err(ConfigError::LeverArm);
        }
        if self.encoder.ticks_per_rev == 0 {
            return Err(ConfigError::TicksPerRev);
        }
        let l = &self.limits;
        if !positive(l.max_linear_mps)
            || !positive(l.max_angular_radps)
            || !positive(l.max_wheel_radps)
        {
            return Err(ConfigError::SpeedLimit);
        }
        if !positive(l.max_duty) || l.max_duty > 1.0 {
            return Err(ConfigError::DutyLimit);
        }
        let t = &self.tuning;
        if !gain(t.kp) || !gain(t.ki) || !gain(t.kd) {
            return Err(ConfigError::Gains);
        }
        if self.watchdog.ticks() == 0 {
            return Err(ConfigError::Watchdog);
        }
        if !positive(self.velocity_filter_alpha) || self.velocity_filter_alpha > 1.0 {
            return Err(ConfigError::FilterAlpha);
        }
        Ok(())
    }
}
