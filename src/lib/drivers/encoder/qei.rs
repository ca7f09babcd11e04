use embedded_hal::Qei;

/// Turns a free-running hardware quadrature counter (a timer in encoder
/// mode) into signed tick deltas. Works for 16 and 32 bit counters as long
/// as it is polled before the counter moves half its range.
pub struct QeiCounter<X>
where
    X: Qei,
{
    encoder: X,
    last: u32,
}

impl<X> QeiCounter<X>
where
    X: Qei,
    X::Count: Into<u32>,
{
    const BITS: u32 = 8 * core::mem::size_of::<X::Count>() as u32;

    pub fn new(qei: X) -> Self {
        let last = qei.count().into();
        Self { encoder: qei, last }
    }

    /// Ticks counted since the previous call.
    pub fn delta(&mut self) -> i64 {
        let count: u32 = self.encoder.count().into();
        let diff = count.wrapping_sub(self.last);
        self.last = count;
        let shift = 32 - Self::BITS;
        (((diff << shift) as i32) >> shift) as i64
    }
}
