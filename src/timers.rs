//! One-second countdown timers with latched expiry.
//!
//! A timer is armed with a whole number of seconds and ticked once per
//! second. The tick that takes the counter from 1 to 0 latches the expiry
//! flag; [`TimerBank::expired`] reports and clears it, so each arming is
//! seen exactly once by a caller that polls.
//!
//! ```rust
//! use rs_layout::timers::TimerBank;
//!
//! let mut timers = TimerBank::new();
//! timers.init(0, 2).unwrap();
//!
//! timers.tick_all();
//! assert!(!timers.expired(0).unwrap());
//! timers.tick_all();
//! assert!(timers.expired(0).unwrap());
//! assert!(!timers.expired(0).unwrap()); // consumed
//! ```

use crate::error::LayoutError;

/// Number of timers in the bank.
pub const TIMER_COUNT: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Timer {
    remaining: u32,
    expired: bool,
}

/// Fixed bank of countdown timers, indexed 0..10.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimerBank {
    timers: [Timer; TIMER_COUNT],
}

impl TimerBank {
    /// All timers stopped, no expiry pending.
    pub const fn new() -> Self {
        Self {
            timers: [Timer {
                remaining: 0,
                expired: false,
            }; TIMER_COUNT],
        }
    }

    fn timer_mut(&mut self, id: usize) -> Result<&mut Timer, LayoutError> {
        self.timers
            .get_mut(id)
            .ok_or(LayoutError::TimerOutOfRange(id))
    }

    /// Arms timer `id` for `seconds`. Zero stops it.
    ///
    /// Either way a pending expiry is discarded.
    pub fn init(&mut self, id: usize, seconds: u32) -> Result<(), LayoutError> {
        let timer = self.timer_mut(id)?;
        timer.remaining = seconds;
        timer.expired = false;
        Ok(())
    }

    /// One second elapsed for timer `id`.
    pub fn tick(&mut self, id: usize) -> Result<(), LayoutError> {
        let timer = self.timer_mut(id)?;
        if timer.remaining > 0 {
            timer.remaining -= 1;
            if timer.remaining == 0 {
                timer.expired = true;
                tracing::debug!(timer = id, "timer expired");
            }
        }
        Ok(())
    }

    /// One second elapsed for every timer.
    pub fn tick_all(&mut self) {
        for id in 0..TIMER_COUNT {
            // in range by construction
            let _ = self.tick(id);
        }
    }

    /// Returns and clears the expiry latch of timer `id`.
    pub fn expired(&mut self, id: usize) -> Result<bool, LayoutError> {
        let timer = self.timer_mut(id)?;
        Ok(core::mem::take(&mut timer.expired))
    }

    /// Seconds left on timer `id` (0 when stopped or expired).
    pub fn remaining(&self, id: usize) -> Result<u32, LayoutError> {
        self.timers
            .get(id)
            .map(|t| t.remaining)
            .ok_or(LayoutError::TimerOutOfRange(id))
    }

    /// True while timer `id` is counting down.
    pub fn is_running(&self, id: usize) -> Result<bool, LayoutError> {
        self.remaining(id).map(|r| r > 0)
    }
}
