use crate::filtering::ExponentialFilter;
use crate::time::{seconds_between, Instant};

/// Wheel angular velocity from successive tick counts. Uses the measured
/// time between samples rather than the nominal control period, so
/// scheduling jitter does not bias the estimate.
pub struct VelocityEstimator {
    radians_per_tick: f32,
    last: Option<(i64, Instant)>,
    filter: ExponentialFilter<f32>,
    velocity: f32,
}

impl VelocityEstimator {
    pub fn new(radians_per_tick: f32, filter_alpha: f32) -> Self {
        VelocityEstimator {
            radians_per_tick,
            last: None,
            filter: ExponentialFilter::new(filter_alpha),
            velocity: 0.0,
        }
    }

    /// Latest estimate in rad/s.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Feed the current tick count. The first sample only primes the
    /// estimator; a sample with no elapsed time keeps the previous estimate.
    pub fn sample(&mut self, ticks: i64, now: Instant) -> f32 {
        match self.last {
            None => self.last = Some((ticks, now)),
            Some((last_ticks, last_time)) => {
                if let Some(dt) = seconds_between(last_time, now) {
                    let raw = (ticks - last_ticks) as f32 * self.radians_per_tick / dt;
                    self.velocity = self.filter.update(raw);
                    self.last = Some((ticks, now));
                }
            }
        }
        self.velocity
    }
}
