//! NVS-backed persistent byte store for ESP32.
//!
//! The ESP32 has no byte-addressable EEPROM. [`Esp32Eeprom`] keeps a RAM
//! image of the whole storage map and persists it to NVS in fixed-size
//! pages, one blob per page. A byte write that changes the image rewrites
//! only its page; an unchanged write touches nothing.
//!
//! NVS does its own wear levelling underneath, so the slot rotation done by
//! the state machines is harmless here and still bounds page rewrites.

use core::fmt::Write as _;

use crate::nv::{ERASED, STORE_SIZE};
use crate::traits::PersistentStore;
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use esp_idf_svc::sys::EspError;

/// Bytes per NVS blob.
pub const PAGE_SIZE: usize = 32;

const IMAGE_SIZE: usize = STORE_SIZE as usize;
const PAGE_COUNT: usize = IMAGE_SIZE.div_ceil(PAGE_SIZE);

/// Storage map persisted in the default NVS partition.
///
/// # Example
///
/// ```ignore
/// use esp_idf_svc::nvs::EspDefaultNvsPartition;
/// use rs_layout::hal::esp32::Esp32Eeprom;
///
/// let nvs = EspDefaultNvsPartition::take()?;
/// let eeprom = Esp32Eeprom::new(nvs, "layout")?;
/// ```
pub struct Esp32Eeprom {
    nvs: EspNvs<NvsDefault>,
    image: [u8; IMAGE_SIZE],
}

impl Esp32Eeprom {
    /// Opens (or creates) the namespace and loads every stored page.
    ///
    /// Pages never written read as erased.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace cannot be opened.
    pub fn new(partition: EspDefaultNvsPartition, namespace: &str) -> Result<Self, EspError> {
        let nvs = EspNvs::new(partition, namespace, true)?;
        let mut store = Self {
            nvs,
            image: [ERASED; IMAGE_SIZE],
        };

        let mut loaded = 0;
        for page in 0..PAGE_COUNT {
            let key = page_key(page);
            let range = page_range(page);
            match store.nvs.get_raw(&key, &mut store.image[range]) {
                Ok(Some(_)) => loaded += 1,
                Ok(None) => {}
                Err(e) => tracing::warn!(page, error = %e, "nvs page read failed"),
            }
        }
        tracing::info!(pages = loaded, "layout storage loaded from nvs");
        Ok(store)
    }

    fn persist_page(&mut self, page: usize) {
        let key = page_key(page);
        if let Err(e) = self.nvs.set_raw(&key, &self.image[page_range(page)]) {
            tracing::warn!(page, error = %e, "nvs page write failed");
        }
    }
}

impl PersistentStore for Esp32Eeprom {
    fn read_byte(&mut self, addr: u16) -> u8 {
        self.image.get(addr as usize).copied().unwrap_or(ERASED)
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        let Some(cell) = self.image.get_mut(addr as usize) else {
            tracing::warn!(addr, "write outside layout storage ignored");
            return;
        };
        if *cell != value {
            *cell = value;
            self.persist_page(addr as usize / PAGE_SIZE);
        }
    }
}

fn page_range(page: usize) -> core::ops::Range<usize> {
    let start = page * PAGE_SIZE;
    start..(start + PAGE_SIZE).min(IMAGE_SIZE)
}

fn page_key(page: usize) -> heapless::String<8> {
    let mut key = heapless::String::new();
    // "p" + at most two digits always fits
    let _ = write!(key, "p{page:02}");
    key
}
