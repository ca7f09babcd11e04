pub mod sys_config;
pub mod tuning;

use rover::config::RoverConfig;

pub fn rover_config() -> RoverConfig {
    RoverConfig {
        geometry: sys_config::GEOMETRY,
        encoder: sys_config::ENCODER,
        limits: tuning::LIMITS,
        tuning: tuning::WHEEL_TUNING,
        polarity: sys_config::WHEEL_POLARITY,
        watchdog: sys_config::COMMAND_WATCHDOG,
        brake_mode: sys_config::BRAKE_MODE,
        velocity_filter_alpha: tuning::VELOCITY_FILTER_ALPHA,
    }
}
