use core::ops::{Index, IndexMut, Mul};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WheelId {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

impl WheelId {
    pub const ALL: [WheelId; 4] = [
        WheelId::FrontLeft,
        WheelId::FrontRight,
        WheelId::BackLeft,
        WheelId::BackRight,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One value per wheel, stored in [`WheelId::ALL`] order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerWheel<T> {
    pub front_left: T,
    pub front_right: T,
    pub back_left: T,
    pub back_right: T,
}

impl<T> PerWheel<T> {
    pub const fn new(front_left: T, front_right: T, back_left: T, back_right: T) -> Self {
        PerWheel {
            front_left,
            front_right,
            back_left,
            back_right,
        }
    }

    pub fn from_fn(mut f: impl FnMut(WheelId) -> T) -> Self {
        PerWheel {
            front_left: f(WheelId::FrontLeft),
            front_right: f(WheelId::FrontRight),
            back_left: f(WheelId::BackLeft),
            back_right: f(WheelId::BackRight),
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> PerWheel<U> {
        PerWheel {
            front_left: f(self.front_left),
            front_right: f(self.front_right),
            back_left: f(self.back_left),
            back_right: f(self.back_right),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (WheelId, &T)> {
        WheelId::ALL.into_iter().map(move |id| (id, &self[id]))
    }
}

impl<T: Copy> PerWheel<T> {
    pub const fn splat(value: T) -> Self {
        PerWheel::new(value, value, value, value)
    }
}

impl<T> Index<WheelId> for PerWheel<T> {
    type Output = T;
    fn index(&self, id: WheelId) -> &T {
        match id {
            WheelId::FrontLeft => &self.front_left,
            WheelId::FrontRight => &self.front_right,
            WheelId::BackLeft => &self.back_left,
            WheelId::BackRight => &self.back_right,
        }
    }
}

impl<T> IndexMut<WheelId> for PerWheel<T> {
    fn index_mut(&mut self, id: WheelId) -> &mut T {
        match id {
            WheelId::FrontLeft => &mut self.front_left,
            WheelId::FrontRight => &mut self.front_right,
            WheelId::BackLeft => &mut self.back_left,
            WheelId::BackRight => &mut self.back_right,
        }
    }
}

impl<T> IntoIterator for PerWheel<T> {
    type Item = T;
    type IntoIter = core::array::IntoIter<T, 4>;
    fn into_iter(self) -> Self::IntoIter {
        [self.front_left, self.front_right, self.back_left, self.back_right].into_iter()
    }
}

/// Mounting sign of a wheel. Motors on the right side are usually mirrored,
/// so "forward" for the rover is backwards for the motor shaft.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    Backward = -1,
    Forward = 1,
}

impl Mul<f32> for Polarity {
    type Output = f32;
    fn mul(self, rhs: f32) -> Self::Output {
        self as i32 as f32 * rhs
    }
}

impl Mul<i64> for Polarity {
    type Output = i64;
    fn mul(self, rhs: i64) -> Self::Output {
        self as i64 * rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_follows_wheel_order() {
        let w = PerWheel::new(1, 2, 3, 4);
        for (i, id) in WheelId::ALL.into_iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(w[id], i + 1);
        }
        assert_eq!(w.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn polarity_flips_sign() {
        assert_eq!(Polarity::Backward * 2.5, -2.5);
        assert_eq!(Polarity::Forward * 2.5, 2.5);
        assert_eq!(Polarity::Backward * 7i64, -7);
    }
}
