//! Software x4 quadrature decoding.
//!
//! The AB state walks 00 -> 01 -> 11 -> 10 -> 00 when the wheel turns
//! forward and the reverse way backward. Every valid step moves the count by
//! one, so one full cycle is four ticks. A change that skips a step (both
//! channels flipped between two observations) carries no direction
//! information and is dropped; the new levels are still latched so the next
//! valid edge decodes correctly.

use crate::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    A,
    B,
}

/// Position of each AB pattern along the forward sequence.
const GRAY_INDEX: [u8; 4] = [
    0, // 00
    1, // 01
    3, // 10
    2, // 11
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Forward,
    Reverse,
    None,
    Glitch,
}

#[derive(Clone, Copy, Debug)]
pub struct QuadratureDecoder {
    /// Last latched levels, A in bit 1 and B in bit 0.
    ab: u8,
    ticks: i64,
    last_edge: Option<Instant>,
}

impl QuadratureDecoder {
    pub const fn new() -> Self {
        QuadratureDecoder {
            ab: 0,
            ticks: 0,
            last_edge: None,
        }
    }

    pub fn ticks(&self) -> i64 {
        self.ticks
    }

    pub fn last_edge(&self) -> Option<Instant> {
        self.last_edge
    }

    /// One channel changed level.
    pub fn on_edge(&mut self, channel: Channel, level: bool, timestamp: Instant) -> Step {
        let ab = match channel {
            Channel::A => (self.ab & 0b01) | ((level as u8) << 1),
            Channel::B => (self.ab & 0b10) | level as u8,
        };
        let step = self.update(ab);
        if matches!(step, Step::Forward | Step::Reverse) {
            self.last_edge = Some(timestamp);
        }
        step
    }

    /// Both channels sampled at once, `ab` = A in bit 1, B in bit 0.
    pub fn update(&mut self, ab: u8) -> Step {
        let ab = ab & 0b11;
        let from = GRAY_INDEX[self.ab as usize];
        let to = GRAY_INDEX[ab as usize];
        self.ab = ab;
        match to.wrapping_sub(from) & 0b11 {
            0 => Step::None,
            1 => {
                self.ticks += 1;
                Step::Forward
            }
            3 => {
                self.ticks -= 1;
                Step::Reverse
            }
            _ => Step::Glitch,
        }
    }

    /// Count decoded elsewhere, e.g. by a timer in encoder mode.
    pub fn add_ticks(&mut self, delta: i64, timestamp: Instant) {
        if delta != 0 {
            self.ticks += delta;
            self.last_edge = Some(timestamp);
        }
    }
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}
