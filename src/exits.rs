//! Siding exit dispatch queue and destination indicators.
//!
//! An exit request asks for a train to leave a siding towards a destination.
//! It packs into one byte:
//!
//! ```text
//!  7       4 3       0
//! +---------+---------+
//! |  dest   | siding  |   dest: THROUGH | BRANCH | GOODS | MAIN
//! +---------+---------+   siding: 1..=8 (0 only for through routes)
//! ```
//!
//! Requests wait in an [`ExitQueue`] (capacity [`EXIT_QUEUE_LEN`]) and are
//! dispatched in order. The most recently popped request stays "active"
//! until cleared, and the panel shows every queued destination steadily lit
//! with the active one flashing.
//!
//! # Example
//!
//! ```rust
//! use rs_layout::exits::{Destinations, ExitQueue, ExitRequest};
//!
//! let mut queue = ExitQueue::new();
//! let req = ExitRequest::new(Destinations::MAIN, 1).unwrap();
//! queue.push(req).unwrap();
//!
//! let active = queue.pop();
//! assert_eq!(active, Some(req));
//! assert!(queue.is_siding_queued(1)); // still being serviced
//!
//! let display = queue.encode_indicator(active);
//! assert_eq!(display.lit(), Destinations::MAIN);
//! assert_eq!(display.flashing(), Destinations::MAIN);
//!
//! queue.clear_active();
//! assert!(!queue.is_siding_queued(1));
//! ```

use bitflags::bitflags;
use heapless::Deque;

use crate::config::INDICATOR_LINES;
use crate::error::LayoutError;

/// Number of exit requests the queue can hold.
pub const EXIT_QUEUE_LEN: usize = 4;

/// Highest siding number.
pub const MAX_SIDING: u8 = 8;

bitflags! {
    /// Destination route classes, as a nibble.
    ///
    /// Several may be lit at once on the indicator panel; a single request
    /// normally carries one, plus THROUGH for through routes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Destinations: u8 {
        /// Main line.
        const MAIN = 0x1;
        /// Goods yard.
        const GOODS = 0x2;
        /// Branch line.
        const BRANCH = 0x4;
        /// Through route (no siding).
        const THROUGH = 0x8;
    }
}

impl Destinations {
    /// Parse a destination name (case-insensitive).
    ///
    /// ```
    /// use rs_layout::exits::Destinations;
    ///
    /// assert_eq!(Destinations::from_text("main"), Some(Destinations::MAIN));
    /// assert_eq!(Destinations::from_text(" Goods "), Some(Destinations::GOODS));
    /// assert_eq!(Destinations::from_text("yard"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        [
            ("main", Self::MAIN),
            ("goods", Self::GOODS),
            ("branch", Self::BRANCH),
            ("through", Self::THROUGH),
        ]
        .into_iter()
        .find(|(name, _)| s.eq_ignore_ascii_case(name))
        .map(|(_, dest)| dest)
    }
}

/// One siding exit request. Never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExitRequest(u8);

impl ExitRequest {
    /// Builds a request from a destination and a siding.
    ///
    /// Siding 0 is only valid for through routes.
    pub fn new(destination: Destinations, siding: u8) -> Result<Self, LayoutError> {
        let raw = (destination.bits() << 4) | (siding & 0x0F);
        if destination.is_empty() {
            return Err(LayoutError::NoDestination(raw));
        }
        if siding > MAX_SIDING || (siding == 0 && !destination.contains(Destinations::THROUGH)) {
            return Err(LayoutError::SidingOutOfRange(siding));
        }
        Ok(Self(raw))
    }

    /// Interprets a raw request byte. Zero means "no request".
    pub fn from_raw(raw: u8) -> Result<Option<Self>, LayoutError> {
        if raw == 0 {
            return Ok(None);
        }
        Self::new(Destinations::from_bits_truncate(raw >> 4), raw & 0x0F).map(Some)
    }

    /// The packed request byte.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Destination nibble.
    #[inline]
    pub const fn destination(self) -> Destinations {
        Destinations::from_bits_truncate(self.0 >> 4)
    }

    /// Siding nibble.
    #[inline]
    pub const fn siding(self) -> u8 {
        self.0 & 0x0F
    }
}

/// Indicator panel encoding.
///
/// High nibble: destinations to light. Low nibble: lit destinations that
/// flash instead of glowing steadily.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndicatorEncoding(u8);

impl IndicatorEncoding {
    /// Everything off.
    pub const OFF: Self = Self(0);

    /// Wraps a raw encoding byte.
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// The raw encoding byte.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Destinations that are lit.
    #[inline]
    pub const fn lit(self) -> Destinations {
        Destinations::from_bits_truncate(self.0 >> 4)
    }

    /// Destinations that flash.
    #[inline]
    pub const fn flashing(self) -> Destinations {
        Destinations::from_bits_truncate(self.0 & 0x0F)
    }

    /// Output levels for the MAIN, GOODS, BRANCH and THROUGH lines.
    ///
    /// A lit destination is high if steady, or follows `phase` if flashing.
    pub fn line_levels(self, phase: bool) -> [bool; INDICATOR_LINES] {
        core::array::from_fn(|bit| {
            let lit = self.0 & (0x10 << bit) != 0;
            let flash = self.0 & (0x01 << bit) != 0;
            lit && (!flash || phase)
        })
    }
}

/// Half-second phase generator for flashing indicators.
///
/// Counts driver ticks; every `period` ticks the shared phase toggles and
/// the indicators are due to be redriven.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlinkClock {
    period: u8,
    remaining: u8,
    phase: bool,
}

impl BlinkClock {
    /// Creates a clock toggling every `period` ticks (minimum 1).
    pub fn new(period: u8) -> Self {
        let period = period.max(1);
        Self {
            period,
            remaining: period,
            phase: false,
        }
    }

    /// Advances one tick. Returns the new phase when it toggles.
    pub fn tick(&mut self) -> Option<bool> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.remaining = self.period;
            self.phase = !self.phase;
            Some(self.phase)
        } else {
            None
        }
    }

    /// Makes the next tick toggle, so a new encoding shows at once.
    pub fn redrive_soon(&mut self) {
        self.remaining = 1;
    }

    /// Current phase (true = flashing indicators on).
    #[inline]
    pub fn phase(&self) -> bool {
        self.phase
    }
}

/// Fixed-capacity FIFO of exit requests plus the active request.
#[derive(Clone, Debug, Default)]
pub struct ExitQueue {
    queue: Deque<ExitRequest, EXIT_QUEUE_LEN>,
    active: Option<ExitRequest>,
}

impl ExitQueue {
    /// Creates an empty queue with no active request.
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
            active: None,
        }
    }

    /// Appends a request behind those already waiting.
    ///
    /// Duplicate sidings are not checked; use
    /// [`is_siding_queued`](Self::is_siding_queued) first.
    pub fn push(&mut self, request: ExitRequest) -> Result<(), LayoutError> {
        self.queue.push_back(request).map_err(|_| {
            tracing::warn!(request = request.raw(), "exit queue full");
            LayoutError::QueueFull
        })?;
        tracing::debug!(request = request.raw(), queued = self.queue.len(), "exit queued");
        Ok(())
    }

    /// Raw-byte entry point: `0` purges, anything else is validated and queued.
    ///
    /// Returns the queued request, or `None` when the queue was purged.
    pub fn add_request(&mut self, raw: u8) -> Result<Option<ExitRequest>, LayoutError> {
        let request = ExitRequest::from_raw(raw)?;
        match request {
            Some(request) => self.push(request)?,
            None => self.purge(),
        }
        Ok(request)
    }

    /// Empties the queue and forgets the active request.
    pub fn purge(&mut self) {
        self.queue.clear();
        self.active = None;
        tracing::debug!("exit queue purged");
    }

    /// Removes the front request and makes it the active one.
    ///
    /// Popping an empty queue returns `None` and clears the active request.
    pub fn pop(&mut self) -> Option<ExitRequest> {
        let popped = self.queue.pop_front();
        self.active = popped;
        popped
    }

    /// The front request, without removing it.
    pub fn peek(&self) -> Option<ExitRequest> {
        self.queue.front().copied()
    }

    /// True if any request is waiting.
    #[inline]
    pub fn not_empty(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Number of waiting requests.
    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if no request is waiting.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Waiting requests, front first.
    pub fn iter(&self) -> impl Iterator<Item = ExitRequest> + '_ {
        self.queue.iter().copied()
    }

    /// The request currently being serviced.
    #[inline]
    pub fn active(&self) -> Option<ExitRequest> {
        self.active
    }

    /// Forgets the active request; the queue is untouched.
    pub fn clear_active(&mut self) {
        self.active = None;
    }

    /// True if `siding` is waiting in the queue or is the active request.
    pub fn is_siding_queued(&self, siding: u8) -> bool {
        self.queue
            .iter()
            .chain(self.active.iter())
            .any(|request| request.siding() == siding)
    }

    /// Computes the indicator encoding for the queue with `current` flashing.
    pub fn encode_indicator(&self, current: Option<ExitRequest>) -> IndicatorEncoding {
        let queued = self
            .queue
            .iter()
            .fold(Destinations::empty(), |acc, request| acc | request.destination());
        let flashing = current.map(ExitRequest::destination).unwrap_or_default();
        IndicatorEncoding(((queued | flashing).bits() << 4) | flashing.bits())
    }
}
