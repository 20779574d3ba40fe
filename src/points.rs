//! Points, occupancy detectors and the shift-register scan.
//!
//! [`PointStore`] holds two bit vectors:
//!
//! - **desired point positions** (bit 0 = point 1), set by control logic and
//!   mirrored one byte per point in persistent storage
//! - **occupancy** (bit 0 = TOTI 1), overwritten on every scan, never persisted
//!
//! # Scan Protocol
//!
//! Points 1..=24 sit on cascaded DPR relay boards driven through a shift
//! register. Each scan:
//!
//! 1. pulses the strobe to reset the board latches
//! 2. for each of the 24 register positions: puts the (permuted) point bit on
//!    the data line, samples the occupancy line, pulses the clock
//! 3. pulses the strobe again to latch the new outputs
//!
//! Points 25..=29 are written straight to their own output lines.
//!
//! ```rust
//! use rs_layout::points::{PointId, PointStore};
//! use rs_layout::config::{ScanConfig, StorageConfig};
//! use rs_layout::nv::NvStore;
//! use rs_layout::hal::{MockDelay, MockEeprom, MockLines};
//!
//! let mut nv = NvStore::new(MockEeprom::new(), MockDelay::new(), StorageConfig::default());
//! let mut points = PointStore::new();
//! let p5 = PointId::new(5).unwrap();
//!
//! points.set_point(&mut nv, p5, true);
//! assert!(points.point(p5));
//! assert!(PointStore::get_point(&mut nv, p5)); // durable mirror agrees
//!
//! let mut lines = MockLines::new();
//! let mut delay = MockDelay::new();
//! points.scan(&mut lines, &mut delay, &ScanConfig::default());
//! ```

use crate::config::{ScanConfig, DIRECT_POINTS};
use crate::error::LayoutError;
use crate::nv::{self, NvStore};
use crate::traits::{DelayNs, DigitalLines, PersistentStore};

/// Number of points addressable by the store.
pub const POINT_COUNT: u8 = 32;

/// Number of occupancy detectors addressable by the store.
pub const TOTI_COUNT: u8 = 32;

/// Number of points on the shift-register boards (points 1..=24).
pub const SHIFT_LENGTH: usize = 24;

/// Points set to "clear" by [`PointStore::clear_siding_entries`] (points 1..=8).
pub const SIDING_ENTRY_POINTS: u8 = 8;

/// Logical point bit for each shift-register position.
///
/// The DPR boards wire their relays in an unusual order; position `i` on the
/// bus drives point `DPR_MAP[i] + 1`.
pub const DPR_MAP: [u8; SHIFT_LENGTH] = [
    6, 4, 2, 0, 7, 5, 3, 1, 14, 12, 10, 8, 15, 13, 11, 9, 22, 20, 18, 16, 23, 21, 19, 17,
];

/// A track point, numbered 1..=32.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointId(u8);

impl PointId {
    /// Validates a point number.
    pub const fn new(n: u8) -> Result<Self, LayoutError> {
        if n >= 1 && n <= POINT_COUNT {
            Ok(Self(n))
        } else {
            Err(LayoutError::PointOutOfRange(n))
        }
    }

    /// Maps any number onto 1..=32 the way the legacy wiring did
    /// (`0` becomes point 32, `33` becomes point 1).
    pub const fn wrapping(n: u8) -> Self {
        Self((n.wrapping_sub(1) & 0x1F) + 1)
    }

    /// The point number (1..=32).
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Bit index in the point vector and offset in the storage region.
    #[inline]
    pub const fn index(self) -> u8 {
        self.0 - 1
    }

    /// Storage address of this point's mirror byte.
    #[inline]
    pub const fn address(self) -> u16 {
        nv::POINTS_BASE + self.index() as u16
    }
}

/// A track occupancy detector (TOTI), numbered 1..=32.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TotiId(u8);

impl TotiId {
    /// Validates a detector number.
    pub const fn new(n: u8) -> Result<Self, LayoutError> {
        if n >= 1 && n <= TOTI_COUNT {
            Ok(Self(n))
        } else {
            Err(LayoutError::TotiOutOfRange(n))
        }
    }

    /// Maps any number onto 1..=32 the way the legacy wiring did.
    pub const fn wrapping(n: u8) -> Self {
        Self((n.wrapping_sub(1) & 0x1F) + 1)
    }

    /// The detector number (1..=32).
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Bit index in the occupancy vector.
    #[inline]
    pub const fn index(self) -> u8 {
        self.0 - 1
    }
}

/// In-memory point and occupancy state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PointStore {
    point_values: u32,
    toti_values: u32,
}

impl PointStore {
    /// Creates a store with every point clear and nothing occupied.
    pub const fn new() -> Self {
        Self {
            point_values: 0,
            toti_values: 0,
        }
    }

    /// Resets every point mirror byte, and the reserved bytes after them,
    /// to the erased value. Clears the in-memory point vector.
    pub fn wipe<S: PersistentStore, D: DelayNs>(&mut self, nv: &mut NvStore<S, D>) {
        self.point_values = 0;
        nv.erase(nv::POINTS_BASE, nv::POINTS_LEN + nv::RESERVED_LEN);
        tracing::info!("point mirror wiped");
    }

    /// Rebuilds the point vector from the durable mirror.
    ///
    /// Each read waits the read settle time, so this is a boot-time operation.
    pub fn load<S: PersistentStore, D: DelayNs>(&mut self, nv: &mut NvStore<S, D>) {
        let mut values = 0u32;
        for n in 1..=POINT_COUNT {
            let id = PointId(n);
            if Self::get_point(nv, id) {
                values |= 1 << id.index();
            }
        }
        self.point_values = values;
        tracing::debug!(points = values, "point vector loaded");
    }

    /// Sets or clears a point.
    ///
    /// The in-memory bit changes at once and takes effect on the next
    /// [`scan`](Self::scan). The durable mirror is written unconditionally
    /// and is up to date when this returns.
    pub fn set_point<S: PersistentStore, D: DelayNs>(
        &mut self,
        nv: &mut NvStore<S, D>,
        id: PointId,
        set: bool,
    ) {
        let mask = 1u32 << id.index();
        if set {
            self.point_values |= mask;
        } else {
            self.point_values &= !mask;
        }
        nv.update(id.address(), if set { nv::ACTIVE } else { nv::ERASED });
        tracing::debug!(point = id.get(), set, "point written");
    }

    /// Clears the siding entry points, highest first.
    pub fn clear_siding_entries<S: PersistentStore, D: DelayNs>(&mut self, nv: &mut NvStore<S, D>) {
        for n in (1..=SIDING_ENTRY_POINTS).rev() {
            self.set_point(nv, PointId(n), false);
        }
    }

    /// Reads a point's desired state from the durable mirror.
    ///
    /// Only the mirror byte's LSB matters: clear means "set".
    pub fn get_point<S: PersistentStore, D: DelayNs>(nv: &mut NvStore<S, D>, id: PointId) -> bool {
        nv::is_active(nv.read_settled(id.address()))
    }

    /// Returns a point's desired state from memory.
    #[inline]
    pub fn point(&self, id: PointId) -> bool {
        self.point_values & (1 << id.index()) != 0
    }

    /// Returns whether a detector saw its section occupied on the last scan.
    #[inline]
    pub fn test_toti(&self, id: TotiId) -> bool {
        self.toti_values & (1 << id.index()) != 0
    }

    /// The desired point vector (bit 0 = point 1).
    #[inline]
    pub fn point_bits(&self) -> u32 {
        self.point_values
    }

    /// The occupancy vector from the last scan (bit 0 = TOTI 1).
    #[inline]
    pub fn toti_bits(&self) -> u32 {
        self.toti_values
    }

    /// Pushes desired point states to the hardware and samples occupancy.
    ///
    /// Takes roughly `100 * pulse_width_us` microseconds.
    pub fn scan<L: DigitalLines, D: DelayNs>(
        &mut self,
        lines: &mut L,
        delay: &mut D,
        config: &ScanConfig,
    ) {
        let width = config.pulse_width_us;

        // Reset the board shift registers
        lines.pulse(config.strobe_line, delay, width);

        let mut totis = 0u32;
        for (position, &bit) in DPR_MAP.iter().enumerate() {
            lines.write_line(config.data_out_line, self.point_values & (1 << bit) != 0);
            delay.delay_us(width);

            // Occupancy arrives last-board-first; input low means occupied
            if !lines.read_line(config.data_in_line) {
                totis |= 1 << (SHIFT_LENGTH - 1 - position);
            }
            delay.delay_us(width);

            lines.pulse(config.clock_line, delay, width);
        }

        // Latch the new outputs
        lines.pulse(config.strobe_line, delay, width);
        self.toti_values = totis;

        for (offset, &line) in config.direct_lines.iter().enumerate() {
            let bit = SHIFT_LENGTH + offset;
            lines.write_line(line, self.point_values & (1 << bit) != 0);
        }
    }
}

const _: () = assert!(SHIFT_LENGTH + DIRECT_POINTS <= POINT_COUNT as usize);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::hal::{MockDelay, MockEeprom, MockLines};

    fn nv() -> NvStore<MockEeprom, MockDelay> {
        NvStore::new(MockEeprom::new(), MockDelay::new(), StorageConfig::default())
    }

    fn pid(n: u8) -> PointId {
        PointId::new(n).unwrap()
    }

    // =========================================================================
    // Identifier Tests
    // =========================================================================

    #[test]
    fn point_id_range() {
        assert!(PointId::new(1).is_ok());
        assert!(PointId::new(32).is_ok());
        assert_eq!(PointId::new(0), Err(LayoutError::PointOutOfRange(0)));
        assert_eq!(PointId::new(33), Err(LayoutError::PointOutOfRange(33)));
    }

    #[test]
    fn point_id_wrapping_matches_legacy() {
        assert_eq!(PointId::wrapping(1).get(), 1);
        assert_eq!(PointId::wrapping(32).get(), 32);
        assert_eq!(PointId::wrapping(33).get(), 1);
        assert_eq!(PointId::wrapping(0).get(), 32);
        assert_eq!(PointId::wrapping(255).get(), 31);
    }

    #[test]
    fn toti_id_range() {
        assert!(TotiId::new(24).is_ok());
        assert_eq!(TotiId::new(0), Err(LayoutError::TotiOutOfRange(0)));
        assert_eq!(TotiId::wrapping(34).get(), 2);
    }

    #[test]
    fn point_addresses() {
        assert_eq!(pid(1).address(), 0x000);
        assert_eq!(pid(32).address(), 0x01F);
    }

    #[test]
    fn dpr_map_is_a_permutation() {
        let mut seen = 0u32;
        for &bit in DPR_MAP.iter() {
            assert!((bit as usize) < SHIFT_LENGTH);
            seen |= 1 << bit;
        }
        assert_eq!(seen, (1 << SHIFT_LENGTH) - 1);
    }

    // =========================================================================
    // Set / Get Tests
    // =========================================================================

    #[test]
    fn set_point_writes_mirror_and_memory() {
        let mut nv = nv();
        let mut points = PointStore::new();

        points.set_point(&mut nv, pid(5), true);
        assert!(points.point(pid(5)));
        assert_eq!(nv.store().peek(0x004), nv::ACTIVE);
        assert!(PointStore::get_point(&mut nv, pid(5)));

        points.set_point(&mut nv, pid(5), false);
        assert!(!points.point(pid(5)));
        assert_eq!(nv.store().peek(0x004), nv::ERASED);
        assert!(!PointStore::get_point(&mut nv, pid(5)));
    }

    #[test]
    fn set_point_always_waits_settle() {
        let mut nv = nv();
        let mut points = PointStore::new();
        points.set_point(&mut nv, pid(1), false);
        points.set_point(&mut nv, pid(1), false);
        assert_eq!(nv.delay().total_ms(), 14);
    }

    #[test]
    fn get_point_only_uses_lsb() {
        let mut nv = nv();
        nv.store_mut().poke(0x002, 0x10); // LSB clear
        nv.store_mut().poke(0x003, 0x11); // LSB set
        assert!(PointStore::get_point(&mut nv, pid(3)));
        assert!(!PointStore::get_point(&mut nv, pid(4)));
    }

    #[test]
    fn load_rebuilds_vector() {
        let mut nv = nv();
        let mut points = PointStore::new();
        points.set_point(&mut nv, pid(1), true);
        points.set_point(&mut nv, pid(29), true);
        points.set_point(&mut nv, pid(32), true);

        let mut fresh = PointStore::new();
        fresh.load(&mut nv);
        assert_eq!(fresh.point_bits(), (1 << 0) | (1 << 28) | (1 << 31));
    }

    #[test]
    fn wipe_erases_points_and_reserved() {
        let mut nv = nv();
        let mut points = PointStore::new();
        points.set_point(&mut nv, pid(7), true);
        nv.store_mut().poke(0x027, 0x00);
        nv.store_mut().poke(0x028, 0x00);

        points.wipe(&mut nv);

        assert_eq!(points.point_bits(), 0);
        assert_eq!(nv.store().peek(0x006), nv::ERASED);
        assert_eq!(nv.store().peek(0x027), nv::ERASED);
        // first byte past the reserved region is untouched
        assert_eq!(nv.store().peek(0x028), 0x00);
    }

    #[test]
    fn clear_siding_entries_clears_points_one_to_eight() {
        let mut nv = nv();
        let mut points = PointStore::new();
        for n in 1..=10 {
            points.set_point(&mut nv, pid(n), true);
        }

        points.clear_siding_entries(&mut nv);

        assert_eq!(points.point_bits(), (1 << 8) | (1 << 9));
        assert!(!PointStore::get_point(&mut nv, pid(8)));
        assert!(PointStore::get_point(&mut nv, pid(9)));
    }

    // =========================================================================
    // Scan Tests
    // =========================================================================

    #[test]
    fn scan_frames_with_strobe_pulses() {
        let mut lines = MockLines::new();
        let mut delay = MockDelay::new();
        let config = ScanConfig::default();
        let mut points = PointStore::new();

        points.scan(&mut lines, &mut delay, &config);

        let strobes: alloc::vec::Vec<bool> = lines
            .writes()
            .iter()
            .filter(|(line, _)| *line == config.strobe_line)
            .map(|(_, high)| *high)
            .collect();
        assert_eq!(strobes, [true, false, true, false]);

        let clocks = lines
            .writes()
            .iter()
            .filter(|(line, high)| *line == config.clock_line && *high)
            .count();
        assert_eq!(clocks, SHIFT_LENGTH);

        // 4 strobe edges + 24 * (2 data waits + 2 clock edges)
        assert_eq!(delay.total_us(), 25 * (4 + 24 * 4));
    }

    fn data_trace(lines: &MockLines, config: &ScanConfig) -> alloc::vec::Vec<bool> {
        lines
            .writes()
            .iter()
            .filter(|(line, _)| *line == config.data_out_line)
            .map(|(_, high)| *high)
            .collect()
    }

    #[test]
    fn scan_shifts_points_in_dpr_order() {
        // Point driven by each bus position, as wired on the DPR boards
        const WIRING: [u8; SHIFT_LENGTH] = [
            7, 5, 3, 1, 8, 6, 4, 2, 15, 13, 11, 9, 16, 14, 12, 10, 23, 21, 19, 17, 24, 22, 20, 18,
        ];
        let config = ScanConfig::default();

        for (position, &point) in WIRING.iter().enumerate() {
            let mut nv = nv();
            let mut lines = MockLines::new();
            let mut delay = MockDelay::new();
            let mut points = PointStore::new();

            points.set_point(&mut nv, pid(point), true);
            points.scan(&mut lines, &mut delay, &config);

            let data = data_trace(&lines, &config);
            assert_eq!(data.len(), SHIFT_LENGTH);
            for (i, high) in data.iter().enumerate() {
                assert_eq!(*high, i == position, "point {point}, bus position {i}");
            }
        }
    }

    #[test]
    fn scan_samples_occupancy_inverted_and_reversed() {
        let mut lines = MockLines::new();
        let mut delay = MockDelay::new();
        let config = ScanConfig::default();
        let mut points = PointStore::new();

        // Input idles high (nothing occupied); the first two samples read low
        let mut samples = [true; SHIFT_LENGTH];
        samples[0] = false;
        samples[1] = false;
        lines.queue_inputs(config.data_in_line, &samples);

        points.scan(&mut lines, &mut delay, &config);

        assert!(points.test_toti(TotiId::new(24).unwrap()));
        assert!(points.test_toti(TotiId::new(23).unwrap()));
        assert!(!points.test_toti(TotiId::new(1).unwrap()));
        assert_eq!(points.toti_bits(), (1 << 23) | (1 << 22));
    }

    #[test]
    fn scan_overwrites_occupancy_wholesale() {
        let mut lines = MockLines::new();
        let mut delay = MockDelay::new();
        let config = ScanConfig::default();
        let mut points = PointStore::new();

        lines.set_input(config.data_in_line, false); // everything occupied
        points.scan(&mut lines, &mut delay, &config);
        assert_eq!(points.toti_bits(), (1 << SHIFT_LENGTH) - 1);

        lines.set_input(config.data_in_line, true);
        points.scan(&mut lines, &mut delay, &config);
        assert_eq!(points.toti_bits(), 0);
    }

    #[test]
    fn scan_drives_direct_points_with_remapped_line() {
        let mut nv = nv();
        let mut lines = MockLines::new();
        let mut delay = MockDelay::new();
        let config = ScanConfig::default();
        let mut points = PointStore::new();

        points.set_point(&mut nv, pid(25), true);
        points.set_point(&mut nv, pid(29), true);
        points.scan(&mut lines, &mut delay, &config);

        assert!(lines.output(9)); // point 25
        assert!(!lines.output(10));
        assert!(!lines.output(11));
        assert!(!lines.output(12));
        assert!(lines.output(8)); // point 29, out of sequence
        assert!(!lines.output(13));
    }
}
