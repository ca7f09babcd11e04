//! Velocity PID for one wheel.
//!
//! Output is a signed duty fraction clamped to `[-limit, limit]`. The
//! integral uses conditional integration: while the unclamped output is
//! already past the limit, error pushing further in that direction is not
//! accumulated, so the loop comes off saturation as soon as the error
//! changes sign.

use super::pid_params::TuningParams;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlOutput {
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub output: f32,
}

pub struct WheelPid {
    gains: TuningParams,
    limit: f32,
    /// Integral of error over time (not yet multiplied by ki).
    integral: f32,
    prev_error: f32,
    primed: bool,
}

impl WheelPid {
    pub fn new(gains: TuningParams, limit: f32) -> Self {
        WheelPid {
            gains,
            limit,
            integral: 0.0,
            prev_error: 0.0,
            primed: false,
        }
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.primed = false;
    }

    /// One step with `dt` seconds since the previous one (`dt` > 0).
    pub fn next_control_output(
        &mut self,
        setpoint: f32,
        measurement: f32,
        dt: f32,
    ) -> ControlOutput {
        let TuningParams { kp, ki, kd } = self.gains;
        let error = setpoint - measurement;

        let p = kp * error;
        // no derivative kick on the first step after a reset
        let d = if self.primed {
            kd * (error - self.prev_error) / dt
        } else {
            0.0
        };

        let candidate = self.integral + error * dt;
        let unclamped = p + ki * candidate + d;
        let winding_up =
            (unclamped > self.limit && error > 0.0) || (unclamped < -self.limit && error < 0.0);
        if !winding_up {
            self.integral = candidate;
        }
        let i = ki * self.integral;

        self.prev_error = error;
        self.primed = true;

        ControlOutput {
            p,
            i,
            d,
            output: (p + i + d).clamp(-self.limit, self.limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libm::fabsf;

    fn gains(kp: f32, ki: f32, kd: f32) -> TuningParams {
        TuningParams { kp, ki, kd }
    }

    #[test]
    fn proportional_only() {
        let mut pid = WheelPid::new(gains(0.1, 0.0, 0.0), 1.0);
        let out = pid.next_control_output(5.0, 3.0, 0.01);
        assert!(fabsf(out.output - 0.2) < 1e-6);
        assert_eq!(out.i, 0.0);
        assert_eq!(out.d, 0.0);
    }

    #[test]
    fn integral_grows_linearly_for_constant_error() {
        let mut pid = WheelPid::new(gains(0.1, 0.5, 0.0), 1.0);
        let mut out = ControlOutput::default();
        for _ in 0..100 {
            out = pid.next_control_output(1.0, 0.0, 0.01);
        }
        // kp*e + ki*e*t = 0.1 + 0.5 * 1.0
        assert!(fabsf(out.output - 0.6) < 1e-4, "{out:?}");
    }

    #[test]
    fn saturates_and_does_not_wind_up() {
        let mut pid = WheelPid::new(gains(0.1, 0.5, 0.0), 1.0);
        for _ in 0..1000 {
            let out = pid.next_control_output(1.0, 0.0, 0.01);
            assert!(out.output <= 1.0);
        }
        // accumulation stopped once p + ki*integral reached the limit
        assert!(pid.integral() < 1.8 + 0.011, "{}", pid.integral());

        // error flips: output leaves saturation on the very next step
        let out = pid.next_control_output(0.0, 1.0, 0.01);
        assert!(out.output < 1.0 && out.output > 0.0, "{out:?}");
    }

    #[test]
    fn negative_saturation_is_symmetric() {
        let mut pid = WheelPid::new(gains(0.0, 10.0, 0.0), 0.5);
        for _ in 0..500 {
            let out = pid.next_control_output(-1.0, 0.0, 0.01);
            assert!(out.output >= -0.5);
        }
        assert!(pid.integral() > -0.05 - 0.011);
    }

    #[test]
    fn derivative_on_error_change() {
        let mut pid = WheelPid::new(gains(0.0, 0.0, 0.02), 1.0);
        assert_eq!(pid.next_control_output(1.0, 0.0, 0.01).d, 0.0);
        let out = pid.next_control_output(1.0, 0.5, 0.01);
        // (0.5 - 1.0) / 0.01 * 0.02
        assert!(fabsf(out.d + 1.0) < 1e-4, "{out:?}");
    }

    #[test]
    fn reset_clears_history() {
        let mut pid = WheelPid::new(gains(0.0, 1.0, 1.0), 1.0);
        pid.next_control_output(1.0, 0.0, 0.01);
        pid.next_control_output(0.5, 0.0, 0.01);
        assert!(pid.integral() > 0.0);
        pid.reset();
        assert_eq!(pid.integral(), 0.0);
        let out = pid.next_control_output(0.0, 0.0, 0.01);
        assert_eq!(out.d, 0.0);
        assert_eq!(out.output, 0.0);
    }
}
