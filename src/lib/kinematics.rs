//! Mecanum wheel kinematics.
//!
//! Sign convention, used everywhere in this crate: `forward` (vx) is +x out
//! of the front of the rover, `strafe` (vy) is +y to the left, `turn` (w) is
//! counter-clockwise seen from above. Wheel velocities are in rad/s and
//! positive when the wheel pushes the rover forward. Rollers form an "X"
//! seen from above, which gives
//!
//! ```text
//! FL = (vx - vy - w(lx+ly)) / r      FR = (vx + vy + w(lx+ly)) / r
//! BL = (vx + vy - w(lx+ly)) / r      BR = (vx - vy + w(lx+ly)) / r
//! ```

use libm::{cosf, fabsf, sinf, sqrtf};

use crate::config::{Geometry, Limits};
use crate::wheel::PerWheel;

/// Robot-frame velocity request.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RobotCommand {
    /// m/s
    pub forward: f32,
    /// m/s, positive to the left
    pub strafe: f32,
    /// rad/s, counter-clockwise
    pub turn: f32,
}

impl RobotCommand {
    pub const STOP: RobotCommand = RobotCommand {
        forward: 0.0,
        strafe: 0.0,
        turn: 0.0,
    };

    pub const fn new(forward: f32, strafe: f32, turn: f32) -> Self {
        RobotCommand {
            forward,
            strafe,
            turn,
        }
    }

    /// Travel at `speed` along `heading_rad` (0 = straight ahead, +pi/2 =
    /// straight left) while turning at `turn`.
    pub fn from_polar(speed: f32, heading_rad: f32, turn: f32) -> Self {
        RobotCommand {
            forward: speed * cosf(heading_rad),
            strafe: speed * sinf(heading_rad),
            turn,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.forward.is_finite() && self.strafe.is_finite() && self.turn.is_finite()
    }

    /// Bring the command inside `limits`. The planar part keeps its direction
    /// and is shortened to `max_linear_mps`; turn is clamped on its own.
    /// Non-finite components are treated as zero.
    pub fn clamped(self, limits: &Limits) -> Self {
        let finite = |v: f32| if v.is_finite() { v } else { 0.0 };
        let (mut forward, mut strafe) = (finite(self.forward), finite(self.strafe));
        let speed = sqrtf(forward * forward + strafe * strafe);
        if speed > limits.max_linear_mps {
            let k = limits.max_linear_mps / speed;
            forward *= k;
            strafe *= k;
        }
        let turn = finite(self.turn).clamp(-limits.max_angular_radps, limits.max_angular_radps);
        RobotCommand {
            forward,
            strafe,
            turn,
        }
    }
}

/// Robot-frame command to wheel velocity setpoints, without any limiting.
pub fn inverse(cmd: &RobotCommand, geometry: &Geometry) -> PerWheel<f32> {
    let r = geometry.wheel_radius_m;
    let w = cmd.turn * geometry.lever_arm_m();
    PerWheel::new(
        (cmd.forward - cmd.strafe - w) / r,
        (cmd.forward + cmd.strafe + w) / r,
        (cmd.forward + cmd.strafe - w) / r,
        (cmd.forward - cmd.strafe + w) / r,
    )
}

/// Wheel velocities back to the robot-frame motion they produce.
pub fn forward(wheels: &PerWheel<f32>, geometry: &Geometry) -> RobotCommand {
    let r = geometry.wheel_radius_m;
    let (fl, fr, bl, br) = (
        wheels.front_left,
        wheels.front_right,
        wheels.back_left,
        wheels.back_right,
    );
    RobotCommand {
        forward: r * (fl + fr + bl + br) / 4.0,
        strafe: r * (-fl + fr + bl - br) / 4.0,
        turn: r * (-fl + fr - bl + br) / (4.0 * geometry.lever_arm_m()),
    }
}

/// Scale all four setpoints by one common factor so the fastest wheel sits at
/// `max_wheel_radps`. Returns the factor applied (1.0 when nothing saturated).
pub fn desaturate(setpoints: &mut PerWheel<f32>, max_wheel_radps: f32) -> f32 {
    let current = *setpoints;
    let peak = current
        .into_iter()
        .fold(0.0f32, |peak, v| if fabsf(v) > peak { fabsf(v) } else { peak });
    if peak <= max_wheel_radps {
        return 1.0;
    }
    let k = max_wheel_radps / peak;
    *setpoints = current.map(|v| v * k);
    k
}

/// Full setpoint computation for one control cycle: limit the command,
/// run the inverse kinematics, then desaturate.
pub fn wheel_setpoints(cmd: &RobotCommand, geometry: &Geometry, limits: &Limits) -> PerWheel<f32> {
    let cmd = cmd.clamped(limits);
    let mut setpoints = inverse(&cmd, geometry);
    desaturate(&mut setpoints, limits.max_wheel_radps);
    setpoints
}
