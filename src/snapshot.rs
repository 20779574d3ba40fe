//! Point-in-time view of the whole layout.
//!
//! [`LayoutState`] is what the simulator prints and what a diagnostics
//! endpoint would serve. With the `serde-json-core` feature it encodes to
//! JSON into a caller-provided buffer, without allocating.

use heapless::Vec;

use crate::exits::EXIT_QUEUE_LEN;
use crate::machine::MACHINE_COUNT;
use crate::timers::TIMER_COUNT;

/// Full state snapshot for diagnostics.
///
/// # Example
///
/// ```rust
/// use rs_layout::{Config, Layout};
/// use rs_layout::hal::{MockDelay, MockEeprom, MockLines};
///
/// let mut layout = Layout::new(MockLines::new(), MockEeprom::new(), MockDelay::new(), Config::default());
/// layout.init(false);
///
/// let state = layout.state();
/// assert_eq!(state.points, 0);
/// assert!(state.queued.is_empty());
/// assert_eq!(state.active_exit, None);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutState {
    /// Desired point positions (bit 0 = point 1).
    pub points: u32,
    /// Occupancy from the last scan (bit 0 = TOTI 1).
    pub totis: u32,
    /// Raw bytes of the waiting exit requests, front first.
    pub queued: Vec<u8, EXIT_QUEUE_LEN>,
    /// Raw byte of the active exit request.
    pub active_exit: Option<u8>,
    /// Indicator encoding (lit high nibble, flashing low nibble).
    pub indicator: u8,
    /// Current blink phase.
    pub blink_phase: bool,
    /// Machine state bytes (repeat flag in bit 7), MERGE first.
    pub machines: [u8; MACHINE_COUNT as usize],
    /// Seconds left on each timer.
    pub timers: [u32; TIMER_COUNT],
    /// Driver ticks since start.
    pub ticks: u64,
}

impl LayoutState {
    /// Serializes the snapshot as JSON into `buf`, returning the length written.
    #[cfg(feature = "serde-json-core")]
    pub fn write_json(&self, buf: &mut [u8]) -> serde_json_core::ser::Result<usize> {
        serde_json_core::to_slice(self, buf)
    }
}
