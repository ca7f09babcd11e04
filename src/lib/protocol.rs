//! Command link framing.
//!
//! Each message is a postcard-serialized [`DriveMessage`], COBS encoded and
//! terminated by a single `0x00`. The reader is fed one byte at a time from
//! the receive interrupt and hands back a message whenever a frame closes.
//!
//! [`CommandLink`] keeps the last polar request so an [`DriveMessage::Update`]
//! only has to carry the components that changed.

use core::fmt;

use heapless::Vec;
use libm::{atan2f, sqrtf};
use serde::{Deserialize, Serialize};

use crate::controller::DriveInputs;
use crate::kinematics::RobotCommand;
use crate::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum DriveMessage {
    /// Robot-frame velocity: m/s, m/s (left positive), rad/s (CCW positive).
    Drive { forward: f32, strafe: f32, turn: f32 },
    /// Travel at `speed` m/s along `heading_rad` (0 = ahead, +pi/2 = left).
    Polar { speed: f32, heading_rad: f32, turn: f32 },
    /// Polar request where absent components keep their last value.
    Update {
        speed: Option<f32>,
        heading_rad: Option<f32>,
        turn: Option<f32>,
    },
    Stop,
    Resume,
}

impl DriveMessage {
    /// The velocity request carried by the message, if any.
    pub fn command(&self) -> Option<RobotCommand> {
        match *self {
            DriveMessage::Drive {
                forward,
                strafe,
                turn,
            } => Some(RobotCommand::new(forward, strafe, turn)),
            DriveMessage::Polar {
                speed,
                heading_rad,
                turn,
            } => Some(RobotCommand::from_polar(speed, heading_rad, turn)),
            DriveMessage::Update { .. } | DriveMessage::Stop | DriveMessage::Resume => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameError {
    /// Frame longer than the reader's buffer; it was dropped whole.
    Overflow,
    /// Bad COBS or postcard payload.
    Decode,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Overflow => f.write_str("frame too long, dropped"),
            FrameError::Decode => f.write_str("undecodable frame"),
        }
    }
}

pub struct FrameReader<const N: usize> {
    buf: Vec<u8, N>,
    overflowed: bool,
}

impl<const N: usize> FrameReader<N> {
    pub const fn new() -> Self {
        FrameReader {
            buf: Vec::new(),
            overflowed: false,
        }
    }

    pub fn push(&mut self, byte: u8) -> Result<Option<DriveMessage>, FrameError> {
        if byte != 0 {
            if !self.overflowed && self.buf.push(byte).is_err() {
                self.overflowed = true;
            }
            return Ok(None);
        }

        if self.overflowed {
            self.overflowed = false;
            self.buf.clear();
            return Err(FrameError::Overflow);
        }
        if self.buf.is_empty() {
            // back-to-back delimiters
            return Ok(None);
        }
        let decoded = postcard::from_bytes_cobs::<DriveMessage>(&mut self.buf);
        self.buf.clear();
        decoded.map(Some).map_err(|_| FrameError::Decode)
    }
}

impl<const N: usize> Default for FrameReader<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Route one decoded message to the shared inputs. Returns `false` when a
/// velocity request was refused, either because it is not finite or because
/// driving is disabled. An `Update` needs the state held by a
/// [`CommandLink`] and is always refused here.
pub fn apply(msg: DriveMessage, inputs: &DriveInputs, now: Instant) -> bool {
    match msg {
        DriveMessage::Stop => {
            inputs.disable();
            true
        }
        DriveMessage::Resume => {
            inputs.enable();
            true
        }
        _ => match msg.command() {
            Some(cmd) if cmd.is_finite() => inputs.submit_command(cmd, now),
            _ => false,
        },
    }
}

/// Receiving end of the command link. Remembers the last polar request
/// (speed, heading, turn) that partial updates are merged into.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CommandLink {
    speed: f32,
    heading_rad: f32,
    turn: f32,
}

impl CommandLink {
    pub const fn new() -> Self {
        CommandLink {
            speed: 0.0,
            heading_rad: 0.0,
            turn: 0.0,
        }
    }

    /// Current polar request as `(speed, heading_rad, turn)`.
    pub fn held(&self) -> (f32, f32, f32) {
        (self.speed, self.heading_rad, self.turn)
    }

    /// Merge `msg` into the held request and pass it on like [`apply`]. A
    /// message with a non-finite component is refused and changes nothing.
    pub fn handle(&mut self, msg: DriveMessage, inputs: &DriveInputs, now: Instant) -> bool {
        let msg = match msg {
            DriveMessage::Drive {
                forward,
                strafe,
                turn,
            } => {
                if !(forward.is_finite() && strafe.is_finite() && turn.is_finite()) {
                    return false;
                }
                self.speed = sqrtf(forward * forward + strafe * strafe);
                self.heading_rad = atan2f(strafe, forward);
                self.turn = turn;
                msg
            }
            DriveMessage::Polar {
                speed,
                heading_rad,
                turn,
            } => {
                if !(speed.is_finite() && heading_rad.is_finite() && turn.is_finite()) {
                    return false;
                }
                self.speed = speed;
                self.heading_rad = heading_rad;
                self.turn = turn;
                msg
            }
            DriveMessage::Update {
                speed,
                heading_rad,
                turn,
            } => {
                let finite = |v: Option<f32>| v.map_or(true, f32::is_finite);
                if !(finite(speed) && finite(heading_rad) && finite(turn)) {
                    return false;
                }
                self.speed = speed.unwrap_or(self.speed);
                self.heading_rad = heading_rad.unwrap_or(self.heading_rad);
                self.turn = turn.unwrap_or(self.turn);
                DriveMessage::Polar {
                    speed: self.speed,
                    heading_rad: self.heading_rad,
                    turn: self.turn,
                }
            }
            DriveMessage::Stop => {
                *self = CommandLink::new();
                msg
            }
            DriveMessage::Resume => msg,
        };
        apply(msg, inputs, now)
    }
}
