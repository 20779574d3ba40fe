//! Persistent storage map and the write-settle barrier.
//!
//! Every durable byte the layout owns lives in one small EEPROM-style store:
//!
//! | Region | Base | Extent | Meaning |
//! |---|---|---|---|
//! | Points | `0x000` | 32 bytes | one byte per point, LSB clear = point set |
//! | Reserved | `0x020` | 8 bytes | wiped with the points, otherwise unused |
//! | Machine 1 | `0x100` | 128 bytes | slot = state, LSB clear = active |
//! | Machine 2 | `0x180` | 128 bytes | same |
//! | Machine 3 | `0x200` | 128 bytes | same |
//!
//! All components reach the store through a single [`NvStore`], which
//! blocks for the settle time after every write. Two writes can therefore
//! never be issued closer together than `write_settle_ms`, whichever
//! component issued them.

use crate::config::StorageConfig;
use crate::traits::{DelayNs, PersistentStore};

/// Base address of the per-point mirror bytes.
pub const POINTS_BASE: u16 = 0x000;
/// Number of point mirror bytes.
pub const POINTS_LEN: u16 = 32;
/// Base address of the reserved bytes following the points.
pub const RESERVED_BASE: u16 = 0x020;
/// Number of reserved bytes wiped together with the points.
pub const RESERVED_LEN: u16 = 8;
/// Base address of the first state machine's slots.
pub const MACHINE_BASE: u16 = 0x100;
/// Slots (and bytes) owned by each state machine.
pub const MACHINE_SLOTS: u16 = 0x80;
/// Total bytes addressed by the layout.
pub const STORE_SIZE: u16 = MACHINE_BASE + 3 * MACHINE_SLOTS;

/// Value of a cell that was never written (or was reset).
pub const ERASED: u8 = 0xFF;
/// Marker with the LSB clear: "point set" or "state active".
pub const ACTIVE: u8 = 0xFE;

/// Returns true if a stored byte carries the active marker (LSB clear).
#[inline]
pub const fn is_active(byte: u8) -> bool {
    byte & 0x01 == 0
}

/// Settle-aware access to the persistent store.
///
/// Owns the raw store and a delay. Writes block for
/// [`StorageConfig::write_settle_ms`] after the byte is handed to the
/// backend; settled reads block for [`StorageConfig::read_settle_ms`].
///
/// # Example
///
/// ```rust
/// use rs_layout::nv::{NvStore, ACTIVE};
/// use rs_layout::config::StorageConfig;
/// use rs_layout::hal::{MockDelay, MockEeprom};
///
/// let mut nv = NvStore::new(MockEeprom::new(), MockDelay::new(), StorageConfig::default());
/// nv.update(0x105, ACTIVE);
///
/// assert_eq!(nv.read(0x105), ACTIVE);
/// assert_eq!(nv.delay().total_ms(), 7);
/// ```
pub struct NvStore<S, D> {
    store: S,
    delay: D,
    config: StorageConfig,
}

impl<S: PersistentStore, D: DelayNs> NvStore<S, D> {
    /// Wraps a raw store.
    pub fn new(store: S, delay: D, config: StorageConfig) -> Self {
        Self {
            store,
            delay,
            config,
        }
    }

    /// Reads a byte without waiting.
    ///
    /// Used by boot-time scans that read many cells back to back.
    #[inline]
    pub fn read(&mut self, addr: u16) -> u8 {
        self.store.read_byte(addr)
    }

    /// Reads a byte, then waits the read settle time.
    pub fn read_settled(&mut self, addr: u16) -> u8 {
        let value = self.store.read_byte(addr);
        self.delay.delay_ms(self.config.read_settle_ms);
        value
    }

    /// Writes a byte, then waits the write settle time.
    ///
    /// The wait happens even when the backend skips an unchanged value.
    pub fn update(&mut self, addr: u16, value: u8) {
        self.store.write_byte(addr, value);
        self.delay.delay_ms(self.config.write_settle_ms);
    }

    /// Resets `len` bytes starting at `base` to [`ERASED`].
    pub fn erase(&mut self, base: u16, len: u16) {
        for addr in base..base + len {
            self.update(addr, ERASED);
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the underlying store mutably.
    ///
    /// Bypasses the settle barrier; meant for tests and diagnostics.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Returns the delay used for settle times.
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Returns the storage timing configuration.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Consumes the wrapper, returning the raw store.
    ///
    /// Useful for simulating a power cycle: hand the store to a fresh
    /// controller and let it rebuild its state.
    pub fn into_store(self) -> S {
        self.store
    }
}
