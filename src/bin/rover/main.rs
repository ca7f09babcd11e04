#![no_main]
#![no_std]

mod comms;
mod config;
mod control;

use rover::controller::DriveInputs;

/// Written by the receive and button interrupts, read by the control task.
static INPUTS: DriveInputs = DriveInputs::new();

#[rtic::app(device = stm32f4xx_hal::pac, peripherals = true, dispatchers = [SPI1])]
mod app {
    use crate::comms::command_rx;
    use crate::config::{self, sys_config};
    use crate::control::{control, DriveLoop, Encoders};
    use crate::INPUTS;
    use core::fmt::Write;
    use cortex_m::asm;
    use panic_write::PanicHandler;
    use rover::controller::motor::Motors;
    use rover::controller::{DriveState, Rover};
    use rover::drivers::encoder::QeiCounter;
    use rover::drivers::motor::HBridge;
    use rover::protocol::{CommandLink, FrameReader};
    use stm32f4xx_hal::{
        gpio::{Edge, PC13},
        pac::{USART2, USART6},
        prelude::*,
        qei::Qei,
        serial::{Config, Rx, Serial, Tx},
    };
    use systick_monotonic::{fugit::Duration, Systick};

    #[shared]
    struct Shared {
        tx: core::pin::Pin<panic_write::PanicHandler<Tx<USART2>>>,
    }

    #[local]
    struct Local {
        rover: DriveLoop,
        encoders: Encoders,
        last_state: DriveState,
        rx: Rx<USART6>,
        reader: FrameReader<{ sys_config::FRAME_BUFFER_LEN }>,
        link: CommandLink,
        user_button: PC13,
    }

    #[monotonic(binds = SysTick, default = true)]
    type MonoTimer = Systick<10_000>;

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local, init::Monotonics) {
        // configure clocks
        let rcc = ctx.device.RCC.constrain();
        let mono = Systick::new(ctx.core.SYST, sys_config::SYSCLK_HZ);
        let clocks = rcc.cfgr.sysclk(sys_config::SYSCLK_HZ.Hz()).freeze();

        let gpioa = ctx.device.GPIOA.split();
        let gpiob = ctx.device.GPIOB.split();
        let gpioc = ctx.device.GPIOC.split();

        // set up debug uart tx
        let tx_pin = gpioa.pa2.into_alternate();
        let serial = Serial::tx(
            ctx.device.USART2,
            tx_pin,
            Config::default()
                .baudrate(sys_config::DEBUG_BAUD.bps())
                .wordlength_8()
                .parity_none(),
            &clocks,
        )
        .unwrap();
        let mut tx = PanicHandler::new(serial);

        // command link rx
        let mut rx = Serial::rx(
            ctx.device.USART6,
            gpioc.pc7.into_alternate(),
            Config::default()
                .baudrate(sys_config::COMMAND_BAUD.bps())
                .wordlength_8()
                .parity_none(),
            &clocks,
        )
        .unwrap();
        rx.listen();

        // encoders, TIM2 and TIM5 are 32 bit
        let encoders = Encoders {
            front_left: QeiCounter::new(Qei::new(
                ctx.device.TIM2,
                (gpioa.pa5.into_alternate(), gpiob.pb3.into_alternate()),
            )),
            front_right: QeiCounter::new(Qei::new(
                ctx.device.TIM3,
                (gpioa.pa6.into_alternate(), gpioa.pa7.into_alternate()),
            )),
            back_left: QeiCounter::new(Qei::new(
                ctx.device.TIM4,
                (gpiob.pb6.into_alternate(), gpiob.pb7.into_alternate()),
            )),
            back_right: QeiCounter::new(Qei::new(
                ctx.device.TIM5,
                (gpioa.pa0.into_alternate(), gpioa.pa1.into_alternate()),
            )),
        };

        // motor enables on TIM1, direction pins on port C
        let channels = (
            gpioa.pa8.into_alternate(),
            gpioa.pa9.into_alternate(),
            gpioa.pa10.into_alternate(),
            gpioa.pa11.into_alternate(),
        );
        let (en_fl, en_fr, en_bl, en_br) = ctx
            .device
            .TIM1
            .pwm_hz(channels, sys_config::PWM_FREQ_HZ.Hz(), &clocks)
            .split();
        let brake = sys_config::BRAKE_MODE;
        let motors = Motors::new(
            HBridge::new(
                en_fl,
                gpioc.pc0.into_push_pull_output(),
                gpioc.pc1.into_push_pull_output(),
                brake,
            ),
            HBridge::new(
                en_fr,
                gpioc.pc2.into_push_pull_output(),
                gpioc.pc3.into_push_pull_output(),
                brake,
            ),
            HBridge::new(
                en_bl,
                gpioc.pc5.into_push_pull_output(),
                gpioc.pc10.into_push_pull_output(),
                brake,
            ),
            HBridge::new(
                en_br,
                gpioc.pc11.into_push_pull_output(),
                gpioc.pc12.into_push_pull_output(),
                brake,
            ),
        );

        let rover = match Rover::new(&INPUTS, motors, config::rover_config()) {
            Ok(rover) => rover,
            Err(e) => {
                writeln!(tx, "rover config rejected: {e}\r").unwrap();
                panic!("invalid rover config");
            }
        };

        // user button toggles drive enable
        let mut syscfg = ctx.device.SYSCFG.constrain();
        let mut exti = ctx.device.EXTI;
        let mut button = gpioc.pc13.into_pull_up_input();
        button.make_interrupt_source(&mut syscfg);
        button.enable_interrupt(&mut exti);
        button.trigger_on_edge(&mut exti, Edge::Falling);

        writeln!(tx, "system initialized\r").unwrap();

        let period = Duration::<u64, 1, 10_000>::millis(sys_config::CONTROL_PERIOD_MS);
        control::spawn_after(period).unwrap();

        (
            Shared { tx },
            Local {
                rover,
                encoders,
                last_state: DriveState::Idle,
                rx,
                reader: FrameReader::new(),
                link: CommandLink::new(),
                user_button: button,
            },
            init::Monotonics(mono),
        )
    }

    #[task(binds = EXTI15_10, priority = 2, local = [user_button], shared = [tx])]
    fn button(mut cx: button::Context) {
        cx.local.user_button.clear_interrupt_pending_bit();
        let msg = if INPUTS.is_disabled() {
            INPUTS.enable();
            "drive enabled\r"
        } else {
            INPUTS.disable();
            "drive disabled\r"
        };
        cx.shared.tx.lock(|tx| writeln!(tx, "{msg}").ok());
    }

    #[idle]
    fn idle(_ctx: idle::Context) -> ! {
        loop {
            asm::nop();
        }
    }

    extern "Rust" {
        #[task(local = [rover, encoders, last_state], shared = [tx])]
        fn control(cx: control::Context);

        #[task(binds = USART6, priority = 2, local = [rx, reader, link], shared = [tx])]
        fn command_rx(cx: command_rx::Context);
    }
}
