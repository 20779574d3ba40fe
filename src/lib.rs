//! # rs-layout
//!
//! A model railway layout controller: track points driven through cascaded
//! shift-register relay boards, track occupancy detectors (TOTIs), a siding
//! exit dispatch queue with a flashing destination panel, and wear-levelled
//! state machines that survive power loss.
//!
//! ## Features
//!
//! - **Point/occupancy scan**: 24 points and 24 detectors over one
//!   shift-register bus, plus 5 directly driven points
//! - **Durable point mirror**: every point change is persisted at once
//! - **Exit dispatch**: 4-deep FIFO of siding exit requests, active request
//!   tracking, steady/flashing destination indicators
//! - **Wear-levelled state machines**: each state has its own storage slot,
//!   so transitions spread wear over up to 128 cells
//! - **Timer bank**: ten one-second countdowns with latched expiry
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware seams (lines, persistent store, delay, clock)
//! - `nv` - Storage map and the shared write-settle barrier
//! - `points`, `exits`, `machine`, `timers` - The components
//! - `layout` - Main controller that ties everything together
//! - `commands` - Text command parsing for consoles and scripts
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_layout::{Config, Layout, MachineId, PointId, TotiId};
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
//! // Throw a point; the boards pick it up on the next scan
//! layout.set_point(PointId::new(5).unwrap(), true);
//! layout.tick();
//! assert!(!layout.test_toti(TotiId::new(1).unwrap()));
//!
//! // Sequence a merge
//! layout.move_machine(MachineId::MERGE, 2).unwrap();
//! assert_eq!(layout.fetch_machine(MachineId::MERGE).value(), 2);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Text command parsing for consoles and scripts.
pub mod commands;
/// Shared configuration system for desktop and ESP32.
pub mod config;
/// Error types.
pub mod error;
/// Siding exit dispatch queue and destination indicators.
pub mod exits;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Main layout controller.
pub mod layout;
/// Wear-levelled persistent state machines.
pub mod machine;
/// Persistent storage map and settle barrier.
pub mod nv;
/// Points, occupancy detectors and the shift-register scan.
pub mod points;
/// Layout state snapshots.
pub mod snapshot;
/// Countdown timer bank.
pub mod timers;
/// Core traits for hardware abstraction.
pub mod traits;

// Re-exports for convenience
pub use commands::{CommandOutcome, LayoutCommand};
pub use config::{
    Config, DeviceConfig, DriverConfig, IndicatorConfig, ScanConfig, StorageConfig,
};
pub use error::{CommandError, LayoutError};
pub use exits::{Destinations, ExitQueue, ExitRequest, IndicatorEncoding};
pub use layout::Layout;
pub use machine::{MachineId, MachineState, PersistentMachine};
pub use points::{PointId, PointStore, TotiId};
pub use snapshot::LayoutState;
pub use timers::TimerBank;
pub use traits::{Clock, DelayNs, DigitalLines, PersistentStore};
