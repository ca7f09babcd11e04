use rover::config::{BrakeMode, EncoderConfig, Geometry};
use rover::time::Duration;
use rover::wheel::{PerWheel, Polarity};

pub const SYSCLK_HZ: u32 = 84_000_000;
// SysTick monotonic runs at 10 kHz
pub const US_PER_MONO_TICK: u64 = 100;

pub const DEBUG_BAUD: u32 = 115_200;
pub const COMMAND_BAUD: u32 = 115_200;
pub const FRAME_BUFFER_LEN: usize = 64;

pub const PWM_FREQ_HZ: u32 = 1_000;
pub const CONTROL_PERIOD_MS: u64 = 10;
pub const COMMAND_WATCHDOG: Duration = Duration::millis(500);

pub const GEOMETRY: Geometry = Geometry {
    wheel_radius_m: 0.0485,
    half_track_m: 0.1,
    half_wheelbase_m: 0.085,
};

// 330 CPR at the output shaft, x4 decoding
pub const ENCODER: EncoderConfig = EncoderConfig { ticks_per_rev: 1320 };

pub const WHEEL_POLARITY: PerWheel<Polarity> = PerWheel::new(
    Polarity::Forward,
    Polarity::Backward,
    Polarity::Forward,
    Polarity::Backward,
);

pub const BRAKE_MODE: BrakeMode = BrakeMode::Short;
