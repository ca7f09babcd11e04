use rover::config::Limits;
use rover::controller::pid_params::TuningParams;

pub const WHEEL_TUNING: TuningParams = TuningParams {
    kp: 0.04,
    ki: 0.35,
    kd: 0.0005,
};

pub const LIMITS: Limits = Limits {
    max_linear_mps: 0.8,
    max_angular_radps: 3.0,
    max_wheel_radps: 20.0,
    max_duty: 0.95,
};

pub const VELOCITY_FILTER_ALPHA: f32 = 0.6;
