//! Trait definitions for hardware abstraction.
//!
//! This module defines the seams that allow rs-layout to:
//! - Run on different hardware (ESP32, desktop mock)
//! - Keep the control logic free of pin numbers and storage drivers
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`DigitalLines`]: numbered digital inputs and outputs
//! - [`PersistentStore`]: EEPROM-style byte storage
//! - [`Clock`]: Time source for `no_std` environments
//! - [`DelayNs`]: blocking delays (re-exported from `embedded-hal`)

pub mod hardware;

pub use hardware::*;
