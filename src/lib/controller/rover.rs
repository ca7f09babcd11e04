//! The periodic control pass.
//!
//! ```text
//! Idle --fresh command--> Running --watchdog--> Disabled(Watchdog)
//!   ^                        |  ^                      |
//!   |                   disable  +----fresh command----+
//!   +--enable-- Disabled(Commanded) <--disable-- (any state)
//! ```
//!
//! Encoders are sampled every cycle whatever the state, so velocity is
//! current the moment the loops start again. Outside `Running` every motor
//! is braked and every PID is held at reset.
//!
//! Every `disable()` costs at least one braked cycle in
//! `Disabled(Commanded)`, even when `enable()` follows before the next tick.
//! A command withdrawn while running drops back to `Idle`.
//!
//! The watchdog only guards a link that has delivered a command: with no
//! command since boot or since `enable()` the rover sits braked in `Idle`
//! rather than `Disabled(Watchdog)`, and `CommsLost` is never reported.

use core::fmt;

use crate::config::{ConfigError, RoverConfig};
use crate::controller::inputs::{DriveInputs, StampedCommand};
use crate::controller::motor::{DriveOutputs, WheelController};
use crate::drivers::motor::MotorCommand;
use crate::kinematics::{self, RobotCommand};
use crate::time::{seconds_between, Instant};
use crate::wheel::{PerWheel, Polarity, WheelId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisableCause {
    Commanded,
    Watchdog,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriveState {
    Idle,
    Running,
    Disabled(DisableCause),
}

impl fmt::Display for DriveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveState::Idle => f.write_str("idle"),
            DriveState::Running => f.write_str("running"),
            DriveState::Disabled(DisableCause::Commanded) => f.write_str("disabled"),
            DriveState::Disabled(DisableCause::Watchdog) => f.write_str("disabled (watchdog)"),
        }
    }
}

/// State changes a supervisor should hear about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoverEvent {
    /// No command within the watchdog window, motors stopped.
    CommsLost,
    /// Commands are arriving again after a watchdog stop.
    CommsRestored,
}

impl fmt::Display for RoverEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoverEvent::CommsLost => f.write_str("command link lost, motors stopped"),
            RoverEvent::CommsRestored => f.write_str("command link restored"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub state: DriveState,
    pub event: Option<RoverEvent>,
    /// Measured wheel velocity, rad/s, positive = rover forward.
    pub velocity: PerWheel<f32>,
    pub setpoint: PerWheel<f32>,
    /// What was written to each motor, after mounting polarity.
    pub output: PerWheel<MotorCommand>,
}

pub struct Rover<'a, O> {
    inputs: &'a DriveInputs,
    outputs: O,
    config: RoverConfig,
    wheels: PerWheel<WheelController>,
    state: DriveState,
    last_tick: Option<Instant>,
    commands: PerWheel<MotorCommand>,
}

impl<'a, O> Rover<'a, O>
where
    O: DriveOutputs,
{
    pub fn new(
        inputs: &'a DriveInputs,
        mut outputs: O,
        config: RoverConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        outputs.start();
        let radians_per_tick = config.encoder.radians_per_tick();
        let wheels = PerWheel::from_fn(|_| {
            WheelController::new(
                config.tuning,
                config.limits.max_duty,
                radians_per_tick,
                config.velocity_filter_alpha,
            )
        });
        Ok(Rover {
            inputs,
            outputs,
            config,
            wheels,
            state: DriveState::Idle,
            last_tick: None,
            commands: PerWheel::splat(MotorCommand::BRAKE),
        })
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    pub fn outputs(&self) -> &O {
        &self.outputs
    }

    /// Accumulated PID integrals, for diagnostics.
    pub fn integrals(&self) -> PerWheel<f32> {
        PerWheel::from_fn(|id| self.wheels[id].integral())
    }

    /// One control period.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let encoders = self.inputs.snapshot_encoders();
        let command = self.inputs.latest_command();

        let dt = self.last_tick.and_then(|last| seconds_between(last, now));
        if dt.is_some() || self.last_tick.is_none() {
            self.last_tick = Some(now);
        }

        let polarity = self.config.polarity;
        let velocity = PerWheel::from_fn(|id| {
            let ticks = polarity[id] * encoders.ticks[id];
            self.wheels[id].estimator().sample(ticks, now)
        });

        let (state, event) = self.next_state(command, now);
        self.state = state;

        let mut setpoint = PerWheel::splat(0.0);
        if state == DriveState::Running {
            let target = command.map_or(RobotCommand::STOP, |c| c.command);
            let (geometry, limits) = (&self.config.geometry, &self.config.limits);
            setpoint = kinematics::wheel_setpoints(&target, geometry, limits);
            // no usable interval: hold last cycle's outputs
            if let Some(dt) = dt {
                let max_duty = self.config.limits.max_duty;
                for (id, pol) in polarity.iter() {
                    let out = self.wheels[id].step(setpoint[id], dt).output;
                    let cmd = MotorCommand::from_output(out, max_duty);
                    self.commands[id] = match pol {
                        Polarity::Forward => cmd,
                        Polarity::Backward => cmd.reversed(),
                    };
                }
            }
        } else {
            for id in WheelId::ALL {
                self.wheels[id].stop();
            }
            self.commands = PerWheel::splat(MotorCommand::BRAKE);
        }

        self.outputs.write(&self.commands);

        TickReport {
            state,
            event,
            velocity,
            setpoint,
            output: self.commands,
        }
    }

    fn next_state(
        &self,
        command: Option<StampedCommand>,
        now: Instant,
    ) -> (DriveState, Option<RoverEvent>) {
        let disable_requested = self.inputs.take_disable_request();
        if disable_requested || self.inputs.is_disabled() {
            return (DriveState::Disabled(DisableCause::Commanded), None);
        }

        let fresh = command.map(|c| match now.checked_duration_since(c.received) {
            Some(age) => age <= self.config.watchdog,
            // stamped after `now` was read
            None => true,
        });

        match (self.state, fresh) {
            (DriveState::Disabled(DisableCause::Watchdog), Some(true)) => {
                (DriveState::Running, Some(RoverEvent::CommsRestored))
            }
            (_, Some(true)) => (DriveState::Running, None),
            (state, Some(false)) => {
                if let Some(stale) = command {
                    self.inputs.expire(stale);
                }
                match state {
                    DriveState::Running => (
                        DriveState::Disabled(DisableCause::Watchdog),
                        Some(RoverEvent::CommsLost),
                    ),
                    DriveState::Disabled(DisableCause::Commanded) => (DriveState::Idle, None),
                    other => (other, None),
                }
            }
            (DriveState::Disabled(DisableCause::Commanded), None)
            | (DriveState::Running, None) => (DriveState::Idle, None),
            (state, None) => (state, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::unit_config;
    use crate::drivers::encoder::Channel;
    use crate::drivers::motor::Direction;
    use crate::time::Duration;
    use libm::fabsf;

    #[derive(Default)]
    struct Recorder {
        started: bool,
        writes: usize,
        last: Option<PerWheel<MotorCommand>>,
    }

    impl DriveOutputs for Recorder {
        fn start(&mut self) {
            self.started = true;
        }
        fn write(&mut self, commands: &PerWheel<MotorCommand>) {
            self.writes += 1;
            self.last = Some(*commands);
        }
    }

    fn ms(ms: u64) -> Instant {
        Instant::from_ticks(ms * 1_000)
    }

    fn all_braked(r: &TickReport) -> bool {
        r.output.into_iter().all(|c| c == MotorCommand::BRAKE)
    }

    #[test]
    fn rejects_invalid_config() {
        let inputs = DriveInputs::new();
        let mut config = unit_config();
        config.geometry.half_track_m = -1.0;
        assert_eq!(
            Rover::new(&inputs, Recorder::default(), config).err(),
            Some(ConfigError::LeverArm)
        );
    }

    #[test]
    fn idle_until_first_command() {
        let inputs = DriveInputs::new();
        let mut rover = Rover::new(&inputs, Recorder::default(), unit_config()).unwrap();
        assert!(rover.outputs().started);

        let r = rover.tick(ms(0));
        assert_eq!(r.state, DriveState::Idle);
        assert!(all_braked(&r));
        let r = rover.tick(ms(10));
        assert_eq!(r.state, DriveState::Idle);
        assert_eq!(rover.outputs().writes, 2);
    }

    #[test]
    fn forward_command_drives_all_wheels_forward() {
        let inputs = DriveInputs::new();
        let mut rover = Rover::new(&inputs, Recorder::default(), unit_config()).unwrap();
        rover.tick(ms(0));

        inputs.submit_command(RobotCommand::new(1.0, 0.0, 0.0), ms(5));
        let r = rover.tick(ms(10));
        assert_eq!(r.state, DriveState::Running);
        assert_eq!(r.setpoint, PerWheel::splat(1.0));
        for cmd in r.output {
            assert_eq!(cmd.direction, Direction::Forward);
            // kp * (1.0 - 0.0)
            assert!(fabsf(cmd.duty - 0.1) < 1e-6);
        }
        assert_eq!(rover.outputs().last, Some(r.output));
    }

    #[test]
    fn rotation_splits_left_and_right() {
        let inputs = DriveInputs::new();
        let mut rover = Rover::new(&inputs, Recorder::default(), unit_config()).unwrap();
        rover.tick(ms(0));
        inputs.submit_command(RobotCommand::new(0.0, 0.0, 1.0), ms(1));
        let r = rover.tick(ms(10));
        assert_eq!(r.setpoint, PerWheel::new(-1.0, 1.0, -1.0, 1.0));
        assert_eq!(r.output.front_left.direction, Direction::Reverse);
        assert_eq!(r.output.front_right.direction, Direction::Forward);
        assert_eq!(r.output.back_left.direction, Direction::Reverse);
        assert_eq!(r.output.back_right.direction, Direction::Forward);
    }

    #[test]
    fn watchdog_stops_and_command_resumes() {
        let inputs = DriveInputs::new();
        let mut rover = Rover::new(&inputs, Recorder::default(), unit_config()).unwrap();
        rover.tick(ms(0));
        inputs.submit_command(RobotCommand::new(1.0, 0.0, 0.0), ms(0));
        assert_eq!(rover.tick(ms(10)).state, DriveState::Running);
        // still inside the 500 ms window
        assert_eq!(rover.tick(ms(500)).state, DriveState::Running);

        let r = rover.tick(ms(510));
        assert_eq!(r.state, DriveState::Disabled(DisableCause::Watchdog));
        assert_eq!(r.event, Some(RoverEvent::CommsLost));
        assert!(all_braked(&r));
        assert_eq!(inputs.latest_command(), None);

        // reported once
        let r = rover.tick(ms(520));
        assert_eq!(r.event, None);
        assert!(all_braked(&r));

        inputs.submit_command(RobotCommand::new(0.5, 0.0, 0.0), ms(525));
        let r = rover.tick(ms(530));
        assert_eq!(r.state, DriveState::Running);
        assert_eq!(r.event, Some(RoverEvent::CommsRestored));
    }

    #[test]
    fn disable_brakes_within_one_cycle_and_clears_integrals() {
        let inputs = DriveInputs::new();
        let mut config = unit_config();
        config.tuning.ki = 1.0;
        let mut rover = Rover::new(&inputs, Recorder::default(), config).unwrap();
        rover.tick(ms(0));
        inputs.submit_command(RobotCommand::new(1.0, 0.0, 0.0), ms(0));
        for i in 1..=5 {
            rover.tick(ms(10 * i));
        }
        assert!(rover.integrals().into_iter().all(|i| i > 0.0));

        inputs.disable();
        let r = rover.tick(ms(60));
        assert_eq!(r.state, DriveState::Disabled(DisableCause::Commanded));
        assert_eq!(r.event, None);
        assert!(all_braked(&r));
        assert_eq!(rover.integrals(), PerWheel::splat(0.0));

        // commands are refused while disabled
        assert!(!inputs.submit_command(RobotCommand::new(1.0, 0.0, 0.0), ms(65)));
        assert!(all_braked(&rover.tick(ms(70))));

        inputs.enable();
        let r = rover.tick(ms(80));
        assert_eq!(r.state, DriveState::Idle);
        assert_eq!(rover.integrals(), PerWheel::splat(0.0));

        inputs.submit_command(RobotCommand::new(1.0, 0.0, 0.0), ms(85));
        assert_eq!(rover.tick(ms(90)).state, DriveState::Running);
    }

    #[test]
    fn encoder_feedback_closes_the_loop() {
        let inputs = DriveInputs::new();
        let mut config = unit_config();
        config.limits.max_linear_mps = 50.0;
        config.limits.max_wheel_radps = 50.0;
        let mut rover = Rover::new(&inputs, Recorder::default(), config).unwrap();

        // 10 ticks per 10 ms at 400 ticks/rev
        let wheel_speed = 1000.0 * 2.0 * core::f32::consts::PI / 400.0;
        rover.tick(ms(0));
        inputs.submit_command(RobotCommand::new(wheel_speed, 0.0, 0.0), ms(0));
        for id in WheelId::ALL {
            inputs.add_ticks(id, 10, ms(10));
        }
        let r = rover.tick(ms(10));
        for (id, v) in r.velocity.iter() {
            assert!(fabsf(v - wheel_speed) < 1e-3, "{id:?} {v}");
        }
        for c in r.output {
            assert!(c.duty < 1e-3, "{c:?}");
        }
    }

    #[test]
    fn edge_events_reach_the_estimator() {
        let inputs = DriveInputs::new();
        let mut rover = Rover::new(&inputs, Recorder::default(), unit_config()).unwrap();
        rover.tick(ms(0));
        for (ch, level) in [
            (Channel::B, true),
            (Channel::A, true),
            (Channel::B, false),
            (Channel::A, false),
        ] {
            inputs.on_encoder_edge(WheelId::FrontLeft, ch, level, ms(5));
        }
        let r = rover.tick(ms(10));
        // 4 ticks of 2pi/400 in 10 ms
        let expected = 4.0 * 2.0 * core::f32::consts::PI / 400.0 / 0.01;
        assert!(fabsf(r.velocity.front_left - expected) < 1e-3);
        assert_eq!(r.velocity.front_right, 0.0);
        // decoding continues while idle
        assert_eq!(r.state, DriveState::Idle);
    }

    #[test]
    fn mirrored_wheels_flip_both_ways() {
        let inputs = DriveInputs::new();
        let mut config = unit_config();
        config.polarity.front_right = Polarity::Backward;
        config.polarity.back_right = Polarity::Backward;
        let mut rover = Rover::new(&inputs, Recorder::default(), config).unwrap();
        rover.tick(ms(0));

        // a right-side motor shaft turning "backwards" moves the rover forward
        inputs.add_ticks(WheelId::FrontRight, -4, ms(5));
        inputs.submit_command(RobotCommand::new(1.0, 0.0, 0.0), ms(5));
        let r = rover.tick(ms(10));
        assert!(r.velocity.front_right > 0.0);
        assert_eq!(r.output.front_left.direction, Direction::Forward);
        assert_eq!(r.output.back_right.direction, Direction::Reverse);
    }

    #[test]
    fn saturated_command_keeps_wheel_ratios() {
        let inputs = DriveInputs::new();
        let mut config = unit_config();
        config.limits.max_wheel_radps = 2.0;
        let mut rover = Rover::new(&inputs, Recorder::default(), config).unwrap();
        rover.tick(ms(0));
        inputs.submit_command(RobotCommand::new(3.0, 1.0, 0.0), ms(1));
        let r = rover.tick(ms(10));
        // raw FL=2, FR=4, BL=4, BR=2 scaled by 0.5
        assert_eq!(r.setpoint, PerWheel::new(1.0, 2.0, 2.0, 1.0));
    }

    #[test]
    fn time_standing_still_holds_outputs() {
        let inputs = DriveInputs::new();
        let mut rover = Rover::new(&inputs, Recorder::default(), unit_config()).unwrap();
        rover.tick(ms(0));
        inputs.submit_command(RobotCommand::new(1.0, 0.0, 0.0), ms(1));
        let first = rover.tick(ms(10));
        let again = rover.tick(ms(10));
        assert_eq!(again.output, first.output);
        assert_eq!(rover.outputs().writes, 3);
    }

    #[test]
    fn watchdog_window_is_configurable() {
        let inputs = DriveInputs::new();
        let mut config = unit_config();
        config.watchdog = Duration::millis(20);
        let mut rover = Rover::new(&inputs, Recorder::default(), config).unwrap();
        inputs.submit_command(RobotCommand::new(1.0, 0.0, 0.0), ms(0));
        assert_eq!(rover.tick(ms(10)).state, DriveState::Running);
        assert_eq!(
            rover.tick(ms(30)).state,
            DriveState::Disabled(DisableCause::Watchdog)
        );
    }

    #[test]
    fn disable_and_enable_between_ticks_still_brakes_once() {
        let inputs = DriveInputs::new();
        let mut config = unit_config();
        config.tuning.ki = 1.0;
        let mut rover = Rover::new(&inputs, Recorder::default(), config).unwrap();
        rover.tick(ms(0));
        inputs.submit_command(RobotCommand::new(1.0, 0.0, 0.0), ms(0));
        for i in 1..=5 {
            rover.tick(ms(10 * i));
        }
        assert!(rover.integrals().into_iter().all(|i| i > 0.0));

        inputs.disable();
        inputs.enable();
        let r = rover.tick(ms(60));
        assert_eq!(r.state, DriveState::Disabled(DisableCause::Commanded));
        assert!(all_braked(&r));
        assert_eq!(rover.integrals(), PerWheel::splat(0.0));

        // nothing to resume: the old command went with the disable
        let r = rover.tick(ms(70));
        assert_eq!(r.state, DriveState::Idle);
        assert!(all_braked(&r));
        let r = rover.tick(ms(3000));
        assert_eq!(r.state, DriveState::Idle);
        assert!(all_braked(&r));
    }

    #[test]
    fn withdrawn_command_drops_to_idle() {
        let inputs = DriveInputs::new();
        let mut config = unit_config();
        config.tuning.ki = 1.0;
        let mut rover = Rover::new(&inputs, Recorder::default(), config).unwrap();
        rover.tick(ms(0));
        inputs.submit_command(RobotCommand::new(1.0, 0.0, 0.0), ms(0));
        assert_eq!(rover.tick(ms(10)).state, DriveState::Running);

        let current = inputs.latest_command().unwrap();
        inputs.expire(current);
        let r = rover.tick(ms(20));
        assert_eq!(r.state, DriveState::Idle);
        assert_eq!(r.event, None);
        assert!(all_braked(&r));
        assert_eq!(rover.integrals(), PerWheel::splat(0.0));
    }
}
