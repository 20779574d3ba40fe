//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for every hardware seam, enabling
//! development and testing of the layout controller on desktop.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockLines`] | [`DigitalLines`] | Records an ordered write trace, scripted inputs |
//! | [`MockEeprom`] | [`PersistentStore`] | Erased-by-default byte store with wear counters |
//! | [`MockDelay`] | [`DelayNs`] | Accumulates requested wait time |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//!
//! # Example
//!
//! ```rust
//! use rs_layout::{Config, Layout, PointId};
//! use rs_layout::hal::{MockDelay, MockEeprom, MockLines};
//!
//! let mut layout = Layout::new(
//!     MockLines::new(),
//!     MockEeprom::new(),
//!     MockDelay::new(),
//!     Config::default(),
//! );
//! layout.init(false);
//!
//! layout.set_point(PointId::new(25).unwrap(), true);
//! layout.tick();
//!
//! // Point 25 is driven directly on line 9
//! assert!(layout.lines().output(9));
//! ```
//!
//! [`DigitalLines`]: crate::traits::DigitalLines
//! [`PersistentStore`]: crate::traits::PersistentStore
//! [`DelayNs`]: crate::traits::DelayNs
//! [`Clock`]: crate::traits::Clock

use alloc::vec;
use alloc::vec::Vec;

use crate::nv;
use crate::traits::{Clock, DelayNs, DigitalLines, PersistentStore};

/// Highest line number the mock tracks.
pub const MOCK_LINE_COUNT: usize = 64;

// ============================================================================
// Digital Lines
// ============================================================================

/// Mock digital I/O lines.
///
/// Every write is appended to a trace so tests can check the exact order of
/// edges. Inputs idle high (an unoccupied detector); a test can pin a level
/// with [`set_input`](Self::set_input) or script a sequence of reads with
/// [`queue_inputs`](Self::queue_inputs).
///
/// # Example
///
/// ```rust
/// use rs_layout::hal::MockLines;
/// use rs_layout::traits::DigitalLines;
///
/// let mut lines = MockLines::new();
/// lines.write_line(4, true);
/// assert!(lines.output(4));
/// assert_eq!(lines.writes(), &[(4, true)]);
///
/// assert!(lines.read_line(5)); // idle high
/// lines.queue_inputs(5, &[false, true]);
/// assert!(!lines.read_line(5));
/// assert!(lines.read_line(5));
/// ```
#[derive(Debug, Clone)]
pub struct MockLines {
    outputs: [bool; MOCK_LINE_COUNT],
    inputs: [bool; MOCK_LINE_COUNT],
    scripted: Vec<(u8, Vec<bool>)>,
    writes: Vec<(u8, bool)>,
    reads: usize,
}

impl Default for MockLines {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLines {
    /// Creates mock lines with all outputs low and all inputs high.
    pub fn new() -> Self {
        Self {
            outputs: [false; MOCK_LINE_COUNT],
            inputs: [true; MOCK_LINE_COUNT],
            scripted: Vec::new(),
            writes: Vec::new(),
            reads: 0,
        }
    }

    /// Last level written to `line` (low if never written).
    pub fn output(&self, line: u8) -> bool {
        self.outputs.get(line as usize).copied().unwrap_or(false)
    }

    /// Sets the steady level returned when `line` is read.
    pub fn set_input(&mut self, line: u8, level: bool) {
        if let Some(slot) = self.inputs.get_mut(line as usize) {
            *slot = level;
        }
    }

    /// Queues levels to be returned by successive reads of `line`, after
    /// which reads fall back to the steady level.
    pub fn queue_inputs(&mut self, line: u8, levels: &[bool]) {
        match self.scripted.iter_mut().find(|(l, _)| *l == line) {
            Some((_, queue)) => queue.extend_from_slice(levels),
            None => self.scripted.push((line, levels.to_vec())),
        }
    }

    /// Every write so far, oldest first.
    pub fn writes(&self) -> &[(u8, bool)] {
        &self.writes
    }

    /// Forgets the write trace (outputs keep their levels).
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    /// Number of line reads so far.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl DigitalLines for MockLines {
    fn read_line(&mut self, line: u8) -> bool {
        self.reads += 1;
        if let Some((_, queue)) = self.scripted.iter_mut().find(|(l, _)| *l == line) {
            if !queue.is_empty() {
                return queue.remove(0);
            }
        }
        self.inputs.get(line as usize).copied().unwrap_or(true)
    }

    fn write_line(&mut self, line: u8, high: bool) {
        if let Some(slot) = self.outputs.get_mut(line as usize) {
            *slot = high;
        }
        self.writes.push((line, high));
    }
}

// ============================================================================
// Persistent Store
// ============================================================================

/// Mock byte-addressed persistent store.
///
/// Starts fully erased (`0xFF`). Writes follow update-if-changed semantics,
/// and only writes that change a cell count towards its wear counter.
///
/// # Example
///
/// ```rust
/// use rs_layout::hal::MockEeprom;
/// use rs_layout::traits::PersistentStore;
///
/// let mut eeprom = MockEeprom::new();
/// assert_eq!(eeprom.read_byte(0x100), 0xFF);
///
/// eeprom.write_byte(0x100, 0xFE);
/// eeprom.write_byte(0x100, 0xFE); // unchanged, not counted
/// assert_eq!(eeprom.writes_at(0x100), 1);
/// assert_eq!(eeprom.total_writes(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockEeprom {
    cells: Vec<u8>,
    wear: Vec<u32>,
}

impl Default for MockEeprom {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEeprom {
    /// Creates an erased store covering the whole layout storage map.
    pub fn new() -> Self {
        Self::with_size(nv::STORE_SIZE as usize)
    }

    /// Creates an erased store of `size` bytes.
    pub fn with_size(size: usize) -> Self {
        Self {
            cells: vec![nv::ERASED; size],
            wear: vec![0; size],
        }
    }

    /// Creates a store holding a saved image. Wear counters start at zero.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            cells: bytes.to_vec(),
            wear: vec![0; bytes.len()],
        }
    }

    /// Reads a cell without going through the trait.
    pub fn peek(&self, addr: u16) -> u8 {
        self.cells.get(addr as usize).copied().unwrap_or(nv::ERASED)
    }

    /// Sets a cell directly, without counting wear.
    pub fn poke(&mut self, addr: u16, value: u8) {
        if let Some(cell) = self.cells.get_mut(addr as usize) {
            *cell = value;
        }
    }

    /// Physical writes to `addr` so far.
    pub fn writes_at(&self, addr: u16) -> u32 {
        self.wear.get(addr as usize).copied().unwrap_or(0)
    }

    /// Physical writes across the whole store.
    pub fn total_writes(&self) -> u32 {
        self.wear.iter().sum()
    }

    /// Highest per-cell write count.
    pub fn max_writes(&self) -> u32 {
        self.wear.iter().copied().max().unwrap_or(0)
    }

    /// The raw cell contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }
}

impl PersistentStore for MockEeprom {
    fn read_byte(&mut self, addr: u16) -> u8 {
        self.peek(addr)
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        if let Some(cell) = self.cells.get_mut(addr as usize) {
            if *cell != value {
                *cell = value;
                self.wear[addr as usize] += 1;
            }
        }
    }
}

// ============================================================================
// Delay
// ============================================================================

/// Mock delay that returns at once and remembers how long it was asked to wait.
///
/// Clones share nothing; each keeps its own total.
///
/// # Example
///
/// ```rust
/// use rs_layout::hal::MockDelay;
/// use rs_layout::traits::DelayNs;
///
/// let mut delay = MockDelay::new();
/// delay.delay_ms(7);
/// delay.delay_us(25);
/// assert_eq!(delay.total_us(), 7_025);
/// assert_eq!(delay.total_ms(), 7);
/// assert_eq!(delay.calls(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockDelay {
    total_ns: u64,
    calls: usize,
}

impl MockDelay {
    /// Creates a delay with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total requested wait in nanoseconds.
    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }

    /// Total requested wait in whole microseconds.
    pub fn total_us(&self) -> u64 {
        self.total_ns / 1_000
    }

    /// Total requested wait in whole milliseconds.
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }

    /// Number of delay calls.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Forgets everything recorded so far.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.calls += 1;
    }

    fn delay_us(&mut self, us: u32) {
        self.total_ns += u64::from(us) * 1_000;
        self.calls += 1;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns += u64::from(ms) * 1_000_000;
        self.calls += 1;
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Mock clock for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use rs_layout::hal::MockClock;
/// use rs_layout::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances time by the given milliseconds.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}
