/// Microsecond timestamp from the board's monotonic clock.
pub type Instant = fugit::TimerInstantU64<1_000_000>;
pub type Duration = fugit::TimerDurationU64<1_000_000>;

/// Elapsed seconds from `earlier` to `later`, `None` if time did not advance.
pub fn seconds_between(earlier: Instant, later: Instant) -> Option<f32> {
    match later.checked_duration_since(earlier) {
        Some(d) if d.ticks() > 0 => Some(d.ticks() as f32 / 1_000_000.0),
        _ => None,
    }
}
