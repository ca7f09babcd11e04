use crate::app::{self, monotonics};
use crate::config::sys_config;
use crate::INPUTS;
use core::fmt::Write;
use rover::controller::motor::Motors;
use rover::controller::{DriveInputs, Rover};
use rover::drivers::encoder::QeiCounter;
use rover::drivers::motor::HBridge;
use rover::time::Instant;
use rover::wheel::WheelId;
use rtic::Mutex;
use stm32f4xx_hal::{
    gpio::{Alternate, Output, Pin, PushPull},
    pac::{TIM1, TIM2, TIM3, TIM4, TIM5},
    qei::Qei,
    timer::pwm::PwmChannel,
};
use systick_monotonic::fugit::Duration;

type DirPin<const N: u8> = Pin<'C', N, Output<PushPull>>;
type Bridge<const CH: u8, const A: u8, const B: u8> =
    HBridge<PwmChannel<TIM1, CH>, DirPin<A>, DirPin<B>>;
type QeiPin<const P: char, const N: u8, const AF: u8> = Pin<P, N, Alternate<AF>>;

pub type DriveMotors =
    Motors<Bridge<0, 0, 1>, Bridge<1, 2, 3>, Bridge<2, 5, 10>, Bridge<3, 11, 12>>;

pub struct Encoders {
    pub front_left: QeiCounter<Qei<TIM2, (QeiPin<'A', 5, 1>, QeiPin<'B', 3, 1>)>>,
    pub front_right: QeiCounter<Qei<TIM3, (QeiPin<'A', 6, 2>, QeiPin<'A', 7, 2>)>>,
    pub back_left: QeiCounter<Qei<TIM4, (QeiPin<'B', 6, 2>, QeiPin<'B', 7, 2>)>>,
    pub back_right: QeiCounter<Qei<TIM5, (QeiPin<'A', 0, 2>, QeiPin<'A', 1, 2>)>>,
}

impl Encoders {
    fn poll(&mut self, inputs: &DriveInputs, now: Instant) {
        inputs.add_ticks(WheelId::FrontLeft, self.front_left.delta(), now);
        inputs.add_ticks(WheelId::FrontRight, self.front_right.delta(), now);
        inputs.add_ticks(WheelId::BackLeft, self.back_left.delta(), now);
        inputs.add_ticks(WheelId::BackRight, self.back_right.delta(), now);
    }
}

pub type DriveLoop = Rover<'static, DriveMotors>;

pub fn now() -> Instant {
    Instant::from_ticks(monotonics::now().ticks() * sys_config::US_PER_MONO_TICK)
}

pub fn control(mut cx: app::control::Context) {
    let now = now();
    cx.local.encoders.poll(&INPUTS, now);
    let report = cx.local.rover.tick(now);

    if report.state != *cx.local.last_state || report.event.is_some() {
        let prev = *cx.local.last_state;
        cx.shared.tx.lock(|tx| {
            if let Some(event) = report.event {
                writeln!(tx, "{event}\r").ok();
            }
            if report.state != prev {
                writeln!(tx, "drive: {prev} -> {}\r", report.state).ok();
            }
        });
        *cx.local.last_state = report.state;
    }

    // run at 100 Hz
    let period = Duration::<u64, 1, 10_000>::millis(sys_config::CONTROL_PERIOD_MS);
    app::control::spawn_after(period).unwrap();
}
