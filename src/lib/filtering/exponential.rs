use num_traits::Float;

/// First-order low-pass: y += alpha * (x - y). The first sample passes
/// through unchanged so the output does not ramp up from zero.
pub struct ExponentialFilter<ItemT> {
    alpha: ItemT,
    prev: Option<ItemT>,
}

impl<ItemT> ExponentialFilter<ItemT>
where
    ItemT: Float,
{
    pub fn new(alpha: ItemT) -> ExponentialFilter<ItemT> {
        ExponentialFilter { alpha, prev: None }
    }

    pub fn reset(&mut self) {
        self.prev = None;
    }

    pub fn value(&self) -> Option<ItemT> {
        self.prev
    }

    pub fn update(&mut self, data: ItemT) -> ItemT {
        let next = match self.prev {
            Some(prev) => prev + self.alpha * (data - prev),
            None => data,
        };
        self.prev = Some(next);
        next
    }
}
