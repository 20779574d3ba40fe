//! ESP32 hardware abstraction layer for the layout controller.
//!
//! This module binds the controller's logical lines to GPIO and its
//! persistent storage map to NVS.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-WROOM-32 DevKit (dual core 240MHz, 4MB Flash)
//! - **Point/occupancy bus**: cascaded DPR relay boards (3 x 8 points) with
//!   TOTI detector shift registers, via 3.3V/5V level shifters
//! - **Direct points**: 5 relay channels for points 25..=29
//! - **Destination panel**: 4 LEDs (MAIN, GOODS, BRANCH, THROUGH)
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for the line to GPIO mapping.

mod clock;
mod eeprom;
mod lines;

pub use clock::Esp32Clock;
pub use eeprom::{Esp32Eeprom, PAGE_SIZE};
pub use lines::{Esp32Lines, MAX_INPUTS, MAX_OUTPUTS};

/// GPIO assignments for the reference wiring.
///
/// Each constant is the ESP32 GPIO carrying the logical line named in its
/// doc comment (the defaults of [`Config`](crate::Config)).
pub mod pins {
    // =========================================================================
    // Shift-Register Bus
    // =========================================================================

    /// Strobe / latch (line 3)
    pub const STROBE: i32 = 16;

    /// Shift clock (line 2)
    pub const CLOCK: i32 = 17;

    /// Serial point data out (line 4)
    pub const DATA_OUT: i32 = 18;

    /// Serial occupancy data in (line 5), active low
    pub const DATA_IN: i32 = 19;

    /// Factory reset (line 7): the BOOT button, active low
    pub const FACTORY_RESET: i32 = 0;

    // =========================================================================
    // Direct Points
    // =========================================================================

    /// Point 25 (line 9)
    pub const POINT_25: i32 = 21;

    /// Point 26 (line 10)
    pub const POINT_26: i32 = 22;

    /// Point 27 (line 11)
    pub const POINT_27: i32 = 23;

    /// Point 28 (line 12)
    pub const POINT_28: i32 = 25;

    /// Point 29 (line 8)
    pub const POINT_29: i32 = 26;

    // =========================================================================
    // Destination Indicators
    // =========================================================================

    /// MAIN indicator (line 26)
    pub const IND_MAIN: i32 = 27;

    /// GOODS indicator (line 27)
    pub const IND_GOODS: i32 = 32;

    /// BRANCH indicator (line 28)
    pub const IND_BRANCH: i32 = 33;

    /// THROUGH indicator (line 29)
    pub const IND_THROUGH: i32 = 13;
}
