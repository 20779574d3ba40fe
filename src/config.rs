//! Shared configuration system for desktop and ESP32.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`. Defaults are the values of the
//! reference layout wiring.
//!
//! # Example
//!
//! ```rust
//! use rs_layout::config::{Config, ScanConfig, StorageConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.scan.pulse_width_us, 25);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_scan(ScanConfig::default().with_pulse_width_us(40))
//!     .with_storage(StorageConfig::default().with_write_settle_ms(10));
//! ```

use heapless::String as HString;

/// Maximum length for short config strings (device names)
pub const MAX_SHORT_STRING: usize = 32;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Number of directly driven point outputs (points 25..=29).
pub const DIRECT_POINTS: usize = 5;

/// Number of destination indicator lines (MAIN, GOODS, BRANCH, THROUGH).
pub const INDICATOR_LINES: usize = 4;

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let take = s.len().min(MAX_SHORT_STRING);
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete controller configuration
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Device identification
    pub device: DeviceConfig,
    /// Shift-register scan wiring and timing
    pub scan: ScanConfig,
    /// Destination indicator wiring and blink rate
    pub indicators: IndicatorConfig,
    /// Persistent storage settle times
    pub storage: StorageConfig,
    /// Driver loop cadence
    pub driver: DriverConfig,
}

impl Config {
    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Set scan configuration
    pub fn with_scan(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    /// Set indicator configuration
    pub fn with_indicators(mut self, indicators: IndicatorConfig) -> Self {
        self.indicators = indicators;
        self
    }

    /// Set storage configuration
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// Set driver configuration
    pub fn with_driver(mut self, driver: DriverConfig) -> Self {
        self.driver = driver;
        self
    }
}

// ============================================================================
// Scan Config
// ============================================================================

/// Shift-register bus and direct output wiring.
///
/// The 24 shift-register positions are fixed by the DPR boards; only the
/// bus lines and the pulse width are configurable.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScanConfig {
    /// Latch strobe output
    pub strobe_line: u8,
    /// Shift clock output
    pub clock_line: u8,
    /// Serial data to the boards
    pub data_out_line: u8,
    /// Serial occupancy data from the boards (low = occupied)
    pub data_in_line: u8,
    /// Output lines for points 25..=29, in point order
    pub direct_lines: [u8; DIRECT_POINTS],
    /// Hold time for every strobe, data and clock edge, in microseconds
    pub pulse_width_us: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            strobe_line: 3,
            clock_line: 2,
            data_out_line: 4,
            data_in_line: 5,
            // Point 29 sits on line 8: line 13 was not available.
            direct_lines: [9, 10, 11, 12, 8],
            pulse_width_us: 25,
        }
    }
}

impl ScanConfig {
    /// Set the bus lines (strobe, clock, data out, data in)
    pub fn with_bus_lines(mut self, strobe: u8, clock: u8, data_out: u8, data_in: u8) -> Self {
        self.strobe_line = strobe;
        self.clock_line = clock;
        self.data_out_line = data_out;
        self.data_in_line = data_in;
        self
    }

    /// Set the direct output lines for points 25..=29
    pub fn with_direct_lines(mut self, lines: [u8; DIRECT_POINTS]) -> Self {
        self.direct_lines = lines;
        self
    }

    /// Set the pulse width
    pub fn with_pulse_width_us(mut self, us: u32) -> Self {
        self.pulse_width_us = us;
        self
    }
}

// ============================================================================
// Indicator Config
// ============================================================================

/// Destination indicator wiring.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IndicatorConfig {
    /// Line of the MAIN indicator; GOODS, BRANCH and THROUGH follow in sequence
    pub base_line: u8,
    /// Driver ticks per blink phase (25 x 20 ms = 0.5 s)
    pub blink_ticks: u8,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            base_line: 26,
            blink_ticks: 25,
        }
    }
}

impl IndicatorConfig {
    /// Set the first indicator line
    pub fn with_base_line(mut self, line: u8) -> Self {
        self.base_line = line;
        self
    }

    /// Set the blink phase length in ticks (minimum 1)
    pub fn with_blink_ticks(mut self, ticks: u8) -> Self {
        self.blink_ticks = ticks.max(1);
        self
    }

    /// Line driving the indicator for destination bit `index` (0..4)
    pub fn line(&self, index: usize) -> u8 {
        self.base_line.wrapping_add(index as u8)
    }
}

// ============================================================================
// Storage Config
// ============================================================================

/// Persistent storage settle times.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StorageConfig {
    /// Blocking wait after every write, in milliseconds
    pub write_settle_ms: u32,
    /// Blocking wait after a settled read, in milliseconds
    pub read_settle_ms: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            // Shorter waits reset the reference board under load.
            write_settle_ms: 7,
            read_settle_ms: 1,
        }
    }
}

impl StorageConfig {
    /// Set the write settle time
    pub fn with_write_settle_ms(mut self, ms: u32) -> Self {
        self.write_settle_ms = ms;
        self
    }

    /// Set the read settle time
    pub fn with_read_settle_ms(mut self, ms: u32) -> Self {
        self.read_settle_ms = ms;
        self
    }
}

// ============================================================================
// Driver Config
// ============================================================================

/// Driver loop cadence.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DriverConfig {
    /// Scan period in milliseconds
    pub tick_ms: u32,
    /// Timer bank tick period in milliseconds
    pub timer_tick_ms: u32,
    /// Factory reset input, held low at power-up to wipe storage
    pub reset_line: u8,
    /// How long the reset input must stay low, in milliseconds
    pub reset_hold_ms: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_ms: 20,
            timer_tick_ms: 1000,
            reset_line: 7,
            reset_hold_ms: 2000,
        }
    }
}

impl DriverConfig {
    /// Set the scan period
    pub fn with_tick_ms(mut self, ms: u32) -> Self {
        self.tick_ms = ms.max(1);
        self
    }

    /// Set the timer tick period
    pub fn with_timer_tick_ms(mut self, ms: u32) -> Self {
        self.timer_tick_ms = ms.max(1);
        self
    }

    /// Set the factory reset input and its hold time
    pub fn with_reset(mut self, line: u8, hold_ms: u32) -> Self {
        self.reset_line = line;
        self.reset_hold_ms = hold_ms;
        self
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceConfig {
    /// Human-readable layout name
    pub name: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("rs-layout"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
