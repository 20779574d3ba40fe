//! GPIO-backed digital lines for ESP32.
//!
//! The controller addresses its I/O by logical line number (the numbers in
//! [`ScanConfig`](crate::config::ScanConfig) and
//! [`IndicatorConfig`](crate::config::IndicatorConfig)). [`Esp32Lines`]
//! binds each line number to a GPIO pin driver.

use crate::traits::DigitalLines;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Input, Level, Output, PinDriver, Pull};
use esp_idf_hal::sys::EspError;

/// Maximum number of bound output lines.
pub const MAX_OUTPUTS: usize = 16;

/// Maximum number of bound input lines.
pub const MAX_INPUTS: usize = 4;

/// Logical lines mapped onto ESP32 GPIO.
///
/// Reading an unbound line returns high (idle); writing one is ignored.
///
/// # Example
///
/// ```ignore
/// use rs_layout::hal::esp32::Esp32Lines;
///
/// let peripherals = Peripherals::take()?;
/// let lines = Esp32Lines::new()
///     .with_output(3, peripherals.pins.gpio16.downgrade_output())? // strobe
///     .with_input(5, peripherals.pins.gpio19.downgrade())?; // occupancy
/// ```
pub struct Esp32Lines<'d> {
    outputs: heapless::Vec<(u8, PinDriver<'d, AnyOutputPin, Output>), MAX_OUTPUTS>,
    inputs: heapless::Vec<(u8, PinDriver<'d, AnyIOPin, Input>), MAX_INPUTS>,
}

impl<'d> Esp32Lines<'d> {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self {
            outputs: heapless::Vec::new(),
            inputs: heapless::Vec::new(),
        }
    }

    /// Binds `line` to an output pin, initially low.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin cannot be configured. Bindings beyond
    /// [`MAX_OUTPUTS`] are dropped with a warning.
    pub fn with_output(mut self, line: u8, pin: AnyOutputPin) -> Result<Self, EspError> {
        let mut driver = PinDriver::output(pin)?;
        driver.set_low()?;
        if self.outputs.push((line, driver)).is_err() {
            tracing::warn!(line, "too many output lines, binding ignored");
        }
        Ok(self)
    }

    /// Binds `line` to an input pin with the internal pull-up enabled.
    ///
    /// The detector boards pull low when a section is occupied. Pull
    /// configuration needs a bidirectional pin, hence [`AnyIOPin`].
    pub fn with_input(mut self, line: u8, pin: AnyIOPin) -> Result<Self, EspError> {
        let mut driver = PinDriver::input(pin)?;
        driver.set_pull(Pull::Up)?;
        if self.inputs.push((line, driver)).is_err() {
            tracing::warn!(line, "too many input lines, binding ignored");
        }
        Ok(self)
    }
}

impl Default for Esp32Lines<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl DigitalLines for Esp32Lines<'_> {
    fn read_line(&mut self, line: u8) -> bool {
        self.inputs
            .iter()
            .find(|(l, _)| *l == line)
            .map(|(_, driver)| driver.is_high())
            .unwrap_or(true)
    }

    fn write_line(&mut self, line: u8, high: bool) {
        if let Some((_, driver)) = self.outputs.iter_mut().find(|(l, _)| *l == line) {
            if let Err(e) = driver.set_level(Level::from(high)) {
                tracing::warn!(line, error = %e, "gpio write failed");
            }
        }
    }
}
