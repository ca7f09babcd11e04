pub mod hbridge;

pub use hbridge::HBridge;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
    Brake,
}

/// What one motor is told to do for one control period. Direction and duty
/// always travel together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotorCommand {
    pub direction: Direction,
    /// Fraction of the PWM period, in [0, max_duty].
    pub duty: f32,
}

impl MotorCommand {
    pub const BRAKE: MotorCommand = MotorCommand {
        direction: Direction::Brake,
        duty: 0.0,
    };

    /// Signed loop output to direction + duty. The magnitude is clamped to
    /// `max_duty`; zero (or NaN) is a brake.
    pub fn from_output(output: f32, max_duty: f32) -> Self {
        if output > 0.0 {
            MotorCommand {
                direction: Direction::Forward,
                duty: output.min(max_duty),
            }
        } else if output < 0.0 {
            MotorCommand {
                direction: Direction::Reverse,
                duty: (-output).min(max_duty),
            }
        } else {
            MotorCommand::BRAKE
        }
    }

    /// Same command for a motor mounted the other way round.
    pub fn reversed(self) -> Self {
        let direction = match self.direction {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
            Direction::Brake => Direction::Brake,
        };
        MotorCommand { direction, ..self }
    }
}

/// Anything that can drive one wheel motor.
pub trait MotorOutput {
    /// Enable the output stage in a braked state.
    fn start(&mut self);
    fn apply(&mut self, command: MotorCommand);
}
