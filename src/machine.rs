//! Wear-levelled persistent state machines.
//!
//! Each machine owns 128 storage slots, one per possible state. The slot of
//! the current state holds the active marker (LSB clear); every other slot
//! is erased. A transition erases the old slot and marks the new one, so
//! writes spread over all the states the machine actually visits instead
//! of hammering a single cell. The device gets no warning of power loss, so
//! the current state is rebuilt at boot by scanning the slots.
//!
//! The in-memory state carries an extra "repeat" flag in its high bit: set
//! when the machine re-entered the state it was already in. The flag is never
//! persisted, so every state looks freshly entered after a power cycle.
//!
//! ```rust
//! use rs_layout::machine::{MachineId, PersistentMachine};
//! use rs_layout::config::StorageConfig;
//! use rs_layout::nv::NvStore;
//! use rs_layout::hal::{MockDelay, MockEeprom};
//!
//! let mut nv = NvStore::new(MockEeprom::new(), MockDelay::new(), StorageConfig::default());
//! let mut exit = PersistentMachine::new(MachineId::EXIT);
//! exit.init(&mut nv, false);
//!
//! exit.move_to_state(&mut nv, 4).unwrap();
//! assert_eq!(exit.fetch().value(), 4);
//! assert!(!exit.fetch().is_repeat());
//!
//! exit.move_to_state(&mut nv, 4).unwrap();
//! assert!(exit.fetch().is_repeat());
//!
//! // After a power cycle the state comes back from the slots
//! let mut rebooted = PersistentMachine::new(MachineId::EXIT);
//! rebooted.init(&mut nv, false);
//! assert_eq!(rebooted.fetch().value(), 4);
//! ```

use crate::error::LayoutError;
use crate::nv::{self, NvStore};
use crate::traits::{DelayNs, PersistentStore};

/// Number of persistent machines the storage map provides for.
pub const MACHINE_COUNT: u8 = 3;

/// Highest state value (states are 7-bit).
pub const MAX_STATE: u8 = 0x7F;

const REPEAT_FLAG: u8 = 0x80;

/// Machine identity, 1..=3. Selects the machine's storage region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MachineId(u8);

impl MachineId {
    /// Train merge sequencing.
    pub const MERGE: Self = Self(1);
    /// Siding entry sequencing.
    pub const ENTER: Self = Self(2);
    /// Siding exit sequencing.
    pub const EXIT: Self = Self(3);

    /// All machine identities in storage order.
    pub const ALL: [Self; MACHINE_COUNT as usize] = [Self::MERGE, Self::ENTER, Self::EXIT];

    /// Validates a machine number.
    pub const fn new(n: u8) -> Result<Self, LayoutError> {
        if n >= 1 && n <= MACHINE_COUNT {
            Ok(Self(n))
        } else {
            Err(LayoutError::MachineOutOfRange(n))
        }
    }

    /// The machine number (1..=3).
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Position in [`MachineId::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Storage address of the slot for `state` (low 7 bits).
    #[inline]
    pub const fn slot_address(self, state: u8) -> u16 {
        nv::MACHINE_BASE + (self.0 as u16 - 1) * nv::MACHINE_SLOTS + (state & MAX_STATE) as u16
    }
}

/// A machine's in-memory state: 7-bit value plus the repeat flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MachineState(u8);

impl MachineState {
    /// Wraps a raw state byte (repeat flag in bit 7).
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// State value, 0..=127.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0 & MAX_STATE
    }

    /// True if this is not the first entry into the state since the last
    /// distinct transition.
    #[inline]
    pub const fn is_repeat(self) -> bool {
        self.0 & REPEAT_FLAG != 0
    }

    /// The raw byte, repeat flag included.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

/// One persistent state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistentMachine {
    id: MachineId,
    state: MachineState,
}

impl PersistentMachine {
    /// Creates a machine in state 0. Call [`init`](Self::init) before use.
    pub const fn new(id: MachineId) -> Self {
        Self {
            id,
            state: MachineState(0),
        }
    }

    /// This machine's identity.
    #[inline]
    pub fn id(&self) -> MachineId {
        self.id
    }

    /// Optionally erases every slot, then rebuilds the current state from
    /// the lowest active slot (state 0 if there is none).
    pub fn init<S: PersistentStore, D: DelayNs>(&mut self, nv: &mut NvStore<S, D>, wipe: bool) {
        if wipe {
            nv.erase(self.id.slot_address(0), nv::MACHINE_SLOTS);
            tracing::info!(machine = self.id.get(), "machine slots wiped");
        }

        let found = (0..=MAX_STATE).find(|&state| nv::is_active(nv.read(self.id.slot_address(state))));
        self.state = MachineState(found.unwrap_or(0));
        tracing::debug!(
            machine = self.id.get(),
            state = self.state.value(),
            recovered = found.is_some(),
            "machine state rebuilt"
        );
    }

    /// Moves to `new_state`, recording the transition durably.
    ///
    /// Erases the old slot, then marks the new one. Moving to the current
    /// state sets the repeat flag; any other move clears it.
    pub fn move_to_state<S: PersistentStore, D: DelayNs>(
        &mut self,
        nv: &mut NvStore<S, D>,
        new_state: u8,
    ) -> Result<(), LayoutError> {
        if new_state > MAX_STATE {
            return Err(LayoutError::StateOutOfRange(new_state));
        }

        let old = self.state.value();
        nv.update(self.id.slot_address(old), nv::ERASED);

        self.state = if old == new_state {
            MachineState(new_state | REPEAT_FLAG)
        } else {
            MachineState(new_state)
        };

        nv.update(self.id.slot_address(new_state), nv::ACTIVE);
        tracing::debug!(
            machine = self.id.get(),
            from = old,
            to = new_state,
            repeat = self.state.is_repeat(),
            "machine transition"
        );
        Ok(())
    }

    /// Current state, repeat flag included.
    #[inline]
    pub fn fetch(&self) -> MachineState {
        self.state
    }
}
