//! Everything the control loop reads that is written from somewhere else:
//! encoder counts (edge interrupt or counter poll), the latest motion
//! command (serial receive) and the disable latch (command source or a
//! safety button). Each cell is only touched inside a short critical
//! section, so a reader never sees half an update, and the whole struct can
//! live in a `static`.

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;

use crate::drivers::encoder::{Channel, QuadratureDecoder};
use crate::kinematics::RobotCommand;
use crate::time::Instant;
use crate::wheel::{PerWheel, WheelId};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StampedCommand {
    pub command: RobotCommand,
    pub received: Instant,
}

/// Encoder state of all four wheels taken at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncoderSnapshot {
    pub ticks: PerWheel<i64>,
    pub last_edge: PerWheel<Option<Instant>>,
}

pub struct DriveInputs {
    encoders: Mutex<RefCell<PerWheel<QuadratureDecoder>>>,
    command: Mutex<Cell<Option<StampedCommand>>>,
    disabled: AtomicBool,
    /// Set by every `disable()`, cleared by the control loop once it has
    /// braked, so a disable/enable pair between two ticks is not lost.
    disable_pending: AtomicBool,
}

impl DriveInputs {
    pub const fn new() -> Self {
        DriveInputs {
            encoders: Mutex::new(RefCell::new(PerWheel::splat(QuadratureDecoder::new()))),
            command: Mutex::new(Cell::new(None)),
            disabled: AtomicBool::new(false),
            disable_pending: AtomicBool::new(false),
        }
    }

    /// One A or B transition seen on a wheel's encoder.
    pub fn on_encoder_edge(
        &self,
        wheel: WheelId,
        channel: Channel,
        level: bool,
        timestamp: Instant,
    ) {
        critical_section::with(|cs| {
            self.encoders.borrow_ref_mut(cs)[wheel].on_edge(channel, level, timestamp);
        });
    }

    /// Ticks already decoded by hardware.
    pub fn add_ticks(&self, wheel: WheelId, delta: i64, timestamp: Instant) {
        critical_section::with(|cs| {
            self.encoders.borrow_ref_mut(cs)[wheel].add_ticks(delta, timestamp);
        });
    }

    pub fn snapshot_encoders(&self) -> EncoderSnapshot {
        critical_section::with(|cs| {
            let encoders = *self.encoders.borrow_ref(cs);
            EncoderSnapshot {
                ticks: encoders.map(|e| e.ticks()),
                last_edge: encoders.map(|e| e.last_edge()),
            }
        })
    }

    /// Replace the latest command and feed the watchdog. Ignored while
    /// disabled; returns whether the command was taken.
    pub fn submit_command(&self, command: RobotCommand, now: Instant) -> bool {
        critical_section::with(|cs| {
            if self.disabled.load(Ordering::Acquire) {
                return false;
            }
            self.command.borrow(cs).set(Some(StampedCommand {
                command,
                received: now,
            }));
            true
        })
    }

    pub fn latest_command(&self) -> Option<StampedCommand> {
        critical_section::with(|cs| self.command.borrow(cs).get())
    }

    /// Drop `stale` unless a newer command has replaced it meanwhile.
    pub fn expire(&self, stale: StampedCommand) {
        critical_section::with(|cs| {
            let slot = self.command.borrow(cs);
            if slot.get() == Some(stale) {
                slot.set(None);
            }
        });
    }

    /// Stop driving: the stored command is zeroed and further commands are
    /// refused until [`DriveInputs::enable`].
    pub fn disable(&self) {
        critical_section::with(|cs| {
            self.disabled.store(true, Ordering::Release);
            self.disable_pending.store(true, Ordering::Release);
            self.command.borrow(cs).set(None);
        });
    }

    /// Whether `disable()` was called since the last call, clearing the
    /// request.
    pub fn take_disable_request(&self) -> bool {
        self.disable_pending.swap(false, Ordering::AcqRel)
    }

    pub fn enable(&self) {
        self.disabled.store(false, Ordering::Release);
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }
}

impl Default for DriveInputs {
    fn default() -> Self {
        Self::new()
    }
}
