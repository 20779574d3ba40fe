//! Hardware abstraction traits for digital lines, persistent storage and time.
//!
//! This module defines the hardware interfaces that let the layout controller
//! run on different platforms (ESP32, desktop mocks, etc.).
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`DigitalLines`] | Numbered digital I/O lines (shift-register bus, direct outputs, indicators) |
//! | [`PersistentStore`] | Byte-addressed non-volatile storage (EEPROM-like) |
//! | [`Clock`] | Time source for the driver loop |
//! | [`DelayNs`] | Blocking delays for pulse widths and storage settle times |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use rs_layout::traits::{DigitalLines, PersistentStore};
//! use rs_layout::hal::{MockEeprom, MockLines};
//!
//! let mut lines = MockLines::new();
//! lines.write_line(26, true);
//! assert!(lines.output(26));
//!
//! let mut eeprom = MockEeprom::new();
//! assert_eq!(eeprom.read_byte(0x000), 0xFF); // never written
//! eeprom.write_byte(0x000, 0xFE);
//! assert_eq!(eeprom.read_byte(0x000), 0xFE);
//! ```

pub use embedded_hal::delay::DelayNs;

/// Numbered digital I/O lines.
///
/// Lines are addressed by the logical numbers used throughout
/// [`crate::config`] (strobe, clock, data, direct point outputs, indicator
/// LEDs). A platform backend maps each number to a physical pin.
///
/// Neither operation can fail observably: the layout treats line I/O as
/// fire-and-forget, exactly like the wiring it drives.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rs_layout::traits::DigitalLines;
///
/// struct PortLines { /* register handles */ }
///
/// impl DigitalLines for PortLines {
///     fn read_line(&mut self, line: u8) -> bool {
///         // Read input register bit for `line`...
///         true
///     }
///
///     fn write_line(&mut self, line: u8, high: bool) {
///         // Set or clear output register bit for `line`...
///     }
/// }
/// ```
pub trait DigitalLines {
    /// Returns true if the line currently reads high.
    fn read_line(&mut self, line: u8) -> bool;

    /// Drives an output line high or low.
    fn write_line(&mut self, line: u8, high: bool);

    /// Emits a high-then-low pulse on `line`, holding each level for `width_us`.
    fn pulse<D: DelayNs>(&mut self, line: u8, delay: &mut D, width_us: u32) {
        self.write_line(line, true);
        delay.delay_us(width_us);
        self.write_line(line, false);
        delay.delay_us(width_us);
    }
}

/// Byte-addressed non-volatile storage.
///
/// Models a small EEPROM. A cell that has never been written reads back
/// [`ERASED`](crate::nv::ERASED) (`0xFF`).
///
/// # Implementation Notes
///
/// - `write_byte` should only touch the medium when the value differs
///   (update-if-changed), to save endurance
/// - Settle delays are NOT the backend's job; they are applied by
///   [`NvStore`](crate::nv::NvStore), which is shared by every component
pub trait PersistentStore {
    /// Reads the byte at `addr`.
    fn read_byte(&mut self, addr: u16) -> u8;

    /// Writes `value` at `addr` if it differs from the stored value.
    fn write_byte(&mut self, addr: u16, value: u8);
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for the driver loop cadence.
/// On desktop, this can wrap `std::time::Instant`. On embedded,
/// use a hardware timer.
///
/// # Example
///
/// ```rust
/// use rs_layout::traits::Clock;
/// use rs_layout::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(20);
/// assert_eq!(clock.now_ms(), 20);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}
