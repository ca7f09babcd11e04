use embedded_hal::digital::v2::OutputPin;
use embedded_hal::PwmPin;

use super::{Direction, MotorCommand, MotorOutput};
use crate::config::BrakeMode;

/*
Dual-input H-bridge with a PWM enable line (L298N style).
  forward: A high, B low, enable = duty
  reverse: A low,  B high, enable = duty
  brake:   A low,  B low,  enable full on (short) or off (coast)
With A == B the bridge puts no voltage across the motor, so a zero duty never
drives it regardless of the enable level.
*/
pub struct HBridge<P, A, B> {
    enable: P,
    in_a: A,
    in_b: B,
    brake_mode: BrakeMode,
    last: Option<Direction>,
}

impl<P, A, B> HBridge<P, A, B>
where
    P: PwmPin<Duty = u16>,
    A: OutputPin,
    B: OutputPin,
{
    pub fn new(enable: P, in_a: A, in_b: B, brake_mode: BrakeMode) -> Self {
        Self {
            enable,
            in_a,
            in_b,
            brake_mode,
            last: None,
        }
    }

    fn duty_counts(&self, duty: f32) -> u16 {
        let max = self.enable.get_max_duty();
        let duty = duty.clamp(0.0, 1.0);
        // truncate, never round up past max
        ((duty * max as f32) as u16).min(max)
    }

    fn set_inputs(&mut self, a: bool, b: bool) {
        // the HAL pins used here cannot fail; a failed write leaves the
        // previous level which the next cycle rewrites
        let _ = if a { self.in_a.set_high() } else { self.in_a.set_low() };
        let _ = if b { self.in_b.set_high() } else { self.in_b.set_low() };
    }
}

impl<P, A, B> MotorOutput for HBridge<P, A, B>
where
    P: PwmPin<Duty = u16>,
    A: OutputPin,
    B: OutputPin,
{
    fn start(&mut self) {
        self.enable.set_duty(0);
        self.enable.enable();
        self.apply(MotorCommand::BRAKE);
    }

    fn apply(&mut self, command: MotorCommand) {
        if self.last != Some(command.direction) {
            // never switch the bridge under load
            self.enable.set_duty(0);
        }
        match command.direction {
            Direction::Forward => {
                self.set_inputs(true, false);
                self.enable.set_duty(self.duty_counts(command.duty));
            }
            Direction::Reverse => {
                self.set_inputs(false, true);
                self.enable.set_duty(self.duty_counts(command.duty));
            }
            Direction::Brake => {
                self.set_inputs(false, false);
                let hold = match self.brake_mode {
                    BrakeMode::Short => self.enable.get_max_duty(),
                    BrakeMode::Coast => 0,
                };
                self.enable.set_duty(hold);
            }
        }
        self.last = Some(command.direction);
    }
}
