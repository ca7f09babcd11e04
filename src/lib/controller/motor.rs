use crate::controller::pid::{ControlOutput, WheelPid};
use crate::controller::pid_params::TuningParams;
use crate::controller::velocity::VelocityEstimator;
use crate::drivers::motor::{MotorCommand, MotorOutput};
use crate::wheel::PerWheel;

/// The four motor outputs as one unit, so a cycle's commands are written
/// together.
pub trait DriveOutputs {
    fn start(&mut self);
    fn write(&mut self, commands: &PerWheel<MotorCommand>);
}

pub struct Motors<M1, M2, M3, M4> {
    front_left: M1,
    front_right: M2,
    back_left: M3,
    back_right: M4,
}

impl<M1, M2, M3, M4> Motors<M1, M2, M3, M4>
where
    M1: MotorOutput,
    M2: MotorOutput,
    M3: MotorOutput,
    M4: MotorOutput,
{
    pub fn new(front_left: M1, front_right: M2, back_left: M3, back_right: M4) -> Self {
        Motors {
            front_left,
            front_right,
            back_left,
            back_right,
        }
    }
}

impl<M1, M2, M3, M4> DriveOutputs for Motors<M1, M2, M3, M4>
where
    M1: MotorOutput,
    M2: MotorOutput,
    M3: MotorOutput,
    M4: MotorOutput,
{
    fn start(&mut self) {
        self.front_left.start();
        self.front_right.start();
        self.back_left.start();
        self.back_right.start();
    }

    fn write(&mut self, commands: &PerWheel<MotorCommand>) {
        self.front_left.apply(commands.front_left);
        self.front_right.apply(commands.front_right);
        self.back_left.apply(commands.back_left);
        self.back_right.apply(commands.back_right);
    }
}

/// Estimator and PID loop of one wheel.
pub struct WheelController {
    estimator: VelocityEstimator,
    pid: WheelPid,
}

impl WheelController {
    pub fn new(t: TuningParams, max_duty: f32, radians_per_tick: f32, filter_alpha: f32) -> Self {
        WheelController {
            estimator: VelocityEstimator::new(radians_per_tick, filter_alpha),
            pid: WheelPid::new(t, max_duty),
        }
    }

    pub fn estimator(&mut self) -> &mut VelocityEstimator {
        &mut self.estimator
    }

    pub fn step(&mut self, setpoint: f32, dt: f32) -> ControlOutput {
        let measured = self.estimator.velocity();
        self.pid.next_control_output(setpoint, measured, dt)
    }

    pub fn integral(&self) -> f32 {
        self.pid.integral()
    }

    pub fn stop(&mut self) {
        self.pid.reset();
    }
}
