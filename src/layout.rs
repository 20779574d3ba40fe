//! The layout controller that ties everything together.
//!
//! [`Layout`] owns the hardware seams and every component:
//!
//! - the [`PointStore`] and its scan protocol
//! - the [`ExitQueue`], the current indicator encoding and the blink clock
//! - the three [`PersistentMachine`]s
//! - the [`TimerBank`]
//!
//! Points and machines share a single [`NvStore`], so every durable write,
//! whichever component issues it, waits out the settle time before the
//! next one can start.
//!
//! # Example
//!
//! ```rust
//! use rs_layout::{Config, Layout, PointId};
//! use rs_layout::exits::{Destinations, ExitRequest};
//! use rs_layout::hal::{MockDelay, MockEeprom, MockLines};
//!
//! let mut layout = Layout::new(MockLines::new(), MockEeprom::new(), MockDelay::new(), Config::default());
//! layout.init(false);
//!
//! layout.set_point(PointId::new(3).unwrap(), true);
//! layout.push_exit(ExitRequest::new(Destinations::GOODS, 2).unwrap()).unwrap();
//!
//! let active = layout.pop_exit();
//! layout.show_exit(active);
//!
//! // Main loop - call tick() every 20ms
//! for _ in 0..25 {
//!     layout.tick();
//! }
//! assert!(layout.is_siding_queued(2));
//! ```

use crate::commands::{CommandOutcome, LayoutCommand};
use crate::config::Config;
use crate::error::LayoutError;
use crate::exits::{BlinkClock, ExitQueue, ExitRequest, IndicatorEncoding};
use crate::machine::{MachineId, MachineState, PersistentMachine};
use crate::nv::NvStore;
use crate::points::{PointId, PointStore, TotiId};
use crate::snapshot::LayoutState;
use crate::timers::TimerBank;
use crate::traits::{DelayNs, DigitalLines, PersistentStore};

/// Interval between factory reset input samples.
const RESET_SAMPLE_MS: u32 = 50;

/// Main layout controller.
///
/// # Type Parameters
///
/// - `L`: digital I/O lines ([`DigitalLines`])
/// - `S`: raw persistent byte store ([`PersistentStore`])
/// - `D`: blocking delay ([`DelayNs`]); cloned once so the scan and the
///   storage settle barrier each own one
///
/// Not thread-safe: the driver tick and the event handlers must run
/// strictly one after another.
pub struct Layout<L, S, D> {
    lines: L,
    delay: D,
    nv: NvStore<S, D>,
    points: PointStore,
    exits: ExitQueue,
    indicator: IndicatorEncoding,
    blink: BlinkClock,
    machines: [PersistentMachine; 3],
    timers: TimerBank,
    config: Config,
    ticks: u64,
}

impl<L, S, D> Layout<L, S, D>
where
    L: DigitalLines,
    S: PersistentStore,
    D: DelayNs + Clone,
{
    /// Creates a controller. Call [`init`](Self::init) before anything else.
    pub fn new(lines: L, store: S, delay: D, config: Config) -> Self {
        let nv = NvStore::new(store, delay.clone(), config.storage.clone());
        Self {
            lines,
            delay,
            nv,
            points: PointStore::new(),
            exits: ExitQueue::new(),
            indicator: IndicatorEncoding::OFF,
            blink: BlinkClock::new(config.indicators.blink_ticks),
            machines: MachineId::ALL.map(PersistentMachine::new),
            timers: TimerBank::new(),
            config,
            ticks: 0,
        }
    }

    /// Boot-time initialisation.
    ///
    /// With `wipe`, the point mirror (plus the reserved bytes after it) and
    /// every machine slot are erased first. Then the point vector and the
    /// machine states are rebuilt from storage, and the exit queue starts
    /// empty with the indicators off.
    pub fn init(&mut self, wipe: bool) {
        if wipe {
            tracing::info!("factory reset: wiping persistent storage");
            self.points.wipe(&mut self.nv);
        }
        self.points.load(&mut self.nv);

        for machine in self.machines.iter_mut() {
            machine.init(&mut self.nv, wipe);
        }

        self.purge_exits();

        tracing::info!(
            name = self.config.device.name.as_str(),
            points = self.points.point_bits(),
            merge = self.machines[0].fetch().value(),
            enter = self.machines[1].fetch().value(),
            exit = self.machines[2].fetch().value(),
            "layout initialised"
        );
    }

    /// Power-up initialisation driven by the factory reset input.
    ///
    /// Storage is wiped only when the reset line reads low on every sample
    /// across `reset_hold_ms`; a release or a bounce keeps the stored state.
    /// Returns whether storage was wiped.
    pub fn boot(&mut self) -> bool {
        let line = self.config.driver.reset_line;
        let samples = (self.config.driver.reset_hold_ms / RESET_SAMPLE_MS).max(1);

        let mut held = true;
        for n in 0..samples {
            if self.lines.read_line(line) {
                held = false;
                break;
            }
            if n + 1 < samples {
                self.delay.delay_ms(RESET_SAMPLE_MS);
            }
        }

        self.init(held);
        held
    }

    /// One driver tick: scan the boards, then redrive the indicators when
    /// the blink phase toggles.
    pub fn tick(&mut self) {
        self.points
            .scan(&mut self.lines, &mut self.delay, &self.config.scan);
        self.ticks += 1;

        if let Some(phase) = self.blink.tick() {
            self.drive_indicators(phase);
        }
    }

    fn drive_indicators(&mut self, phase: bool) {
        for (bit, level) in self.indicator.line_levels(phase).into_iter().enumerate() {
            self.lines.write_line(self.config.indicators.line(bit), level);
        }
    }

    /// One second elapsed: ticks every timer.
    pub fn second_tick(&mut self) {
        self.timers.tick_all();
    }

    // =========================================================================
    // Points and Occupancy
    // =========================================================================

    /// Sets or clears a point; the hardware follows on the next tick.
    pub fn set_point(&mut self, id: PointId, set: bool) {
        self.points.set_point(&mut self.nv, id, set);
    }

    /// Clears the siding entry points (the legacy "point 0" request).
    pub fn clear_siding_entry_points(&mut self) {
        self.points.clear_siding_entries(&mut self.nv);
    }

    /// Reads a point's desired state back from durable storage.
    pub fn get_point(&mut self, id: PointId) -> bool {
        PointStore::get_point(&mut self.nv, id)
    }

    /// A point's desired state from memory.
    pub fn point(&self, id: PointId) -> bool {
        self.points.point(id)
    }

    /// Whether a detector saw its section occupied on the last tick.
    pub fn test_toti(&self, id: TotiId) -> bool {
        self.points.test_toti(id)
    }

    // =========================================================================
    // Exit Dispatch
    // =========================================================================

    /// Raw-byte request entry: `0` purges, anything else is queued.
    pub fn add_exit(&mut self, raw: u8) -> Result<(), LayoutError> {
        if self.exits.add_request(raw)?.is_none() {
            self.indicators_off();
        }
        Ok(())
    }

    /// Queues an exit request. Fails with [`LayoutError::QueueFull`] and
    /// changes nothing when the queue is full.
    pub fn push_exit(&mut self, request: ExitRequest) -> Result<(), LayoutError> {
        self.exits.push(request)
    }

    /// Dispatches the front request, which becomes the active one.
    pub fn pop_exit(&mut self) -> Option<ExitRequest> {
        self.exits.pop()
    }

    /// The front request, left in place.
    pub fn peek_exit(&self) -> Option<ExitRequest> {
        self.exits.peek()
    }

    /// True if any request is waiting.
    pub fn exits_pending(&self) -> bool {
        self.exits.not_empty()
    }

    /// True if `siding` is waiting or being serviced.
    pub fn is_siding_queued(&self, siding: u8) -> bool {
        self.exits.is_siding_queued(siding)
    }

    /// The request being serviced.
    pub fn active_exit(&self) -> Option<ExitRequest> {
        self.exits.active()
    }

    /// Forgets the active request.
    pub fn clear_active_exit(&mut self) {
        self.exits.clear_active();
    }

    /// Empties the queue, forgets the active request and turns the
    /// indicators off at the next tick.
    pub fn purge_exits(&mut self) {
        self.exits.purge();
        self.indicators_off();
    }

    fn indicators_off(&mut self) {
        self.indicator = IndicatorEncoding::OFF;
        self.blink.redrive_soon();
    }

    /// Re-encodes the indicators with `current` flashing and redrives them
    /// at the next tick.
    pub fn show_exit(&mut self, current: Option<ExitRequest>) -> IndicatorEncoding {
        self.indicator = self.exits.encode_indicator(current);
        self.blink.redrive_soon();
        tracing::debug!(indicator = self.indicator.raw(), "indicator encoded");
        self.indicator
    }

    /// The current indicator encoding.
    pub fn indicator(&self) -> IndicatorEncoding {
        self.indicator
    }

    // =========================================================================
    // State Machines and Timers
    // =========================================================================

    /// Moves a state machine, recording the transition durably.
    pub fn move_machine(&mut self, id: MachineId, state: u8) -> Result<MachineState, LayoutError> {
        let machine = &mut self.machines[id.index()];
        machine.move_to_state(&mut self.nv, state)?;
        Ok(machine.fetch())
    }

    /// A machine's current state, repeat flag included.
    pub fn fetch_machine(&self, id: MachineId) -> MachineState {
        self.machines[id.index()].fetch()
    }

    /// The timer bank.
    pub fn timers(&self) -> &TimerBank {
        &self.timers
    }

    /// The timer bank, mutably.
    pub fn timers_mut(&mut self) -> &mut TimerBank {
        &mut self.timers
    }

    // =========================================================================
    // Commands and State
    // =========================================================================

    /// Applies a parsed command.
    pub fn apply(&mut self, cmd: LayoutCommand) -> Result<CommandOutcome, LayoutError> {
        let outcome = match cmd {
            LayoutCommand::SetPoint { point, set } => {
                self.set_point(point, set);
                CommandOutcome::Applied
            }
            LayoutCommand::ClearSidingEntries => {
                self.clear_siding_entry_points();
                CommandOutcome::Applied
            }
            LayoutCommand::Exit(request) => {
                self.push_exit(request)?;
                CommandOutcome::Applied
            }
            LayoutCommand::Pop => CommandOutcome::Dispatched(self.pop_exit()),
            LayoutCommand::Purge => {
                self.purge_exits();
                CommandOutcome::Indicator(self.indicator)
            }
            LayoutCommand::Done => {
                self.clear_active_exit();
                CommandOutcome::Applied
            }
            LayoutCommand::Show => {
                let active = self.active_exit();
                CommandOutcome::Indicator(self.show_exit(active))
            }
            LayoutCommand::MoveState { machine, state } => {
                CommandOutcome::Machine(self.move_machine(machine, state)?)
            }
            LayoutCommand::ArmTimer { timer, seconds } => {
                self.timers.init(timer, seconds)?;
                CommandOutcome::Applied
            }
            LayoutCommand::Tick(n) => {
                for _ in 0..n {
                    self.tick();
                }
                CommandOutcome::Advanced(n)
            }
            LayoutCommand::Second(n) => {
                for _ in 0..n {
                    self.second_tick();
                }
                CommandOutcome::Advanced(n)
            }
        };
        Ok(outcome)
    }

    /// Snapshot for diagnostics.
    pub fn state(&self) -> LayoutState {
        let mut queued = heapless::Vec::new();
        for request in self.exits.iter() {
            // Same capacity as the queue
            let _ = queued.push(request.raw());
        }
        LayoutState {
            points: self.points.point_bits(),
            totis: self.points.toti_bits(),
            queued,
            active_exit: self.exits.active().map(ExitRequest::raw),
            indicator: self.indicator.raw(),
            blink_phase: self.blink.phase(),
            machines: core::array::from_fn(|i| self.machines[i].fetch().raw()),
            timers: core::array::from_fn(|id| self.timers.remaining(id).unwrap_or(0)),
            ticks: self.ticks,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The digital lines.
    pub fn lines(&self) -> &L {
        &self.lines
    }

    /// The digital lines, mutably (e.g. to script inputs in tests).
    pub fn lines_mut(&mut self) -> &mut L {
        &mut self.lines
    }

    /// The shared storage wrapper.
    pub fn nv(&self) -> &NvStore<S, D> {
        &self.nv
    }

    /// The raw persistent store.
    pub fn store(&self) -> &S {
        self.nv.store()
    }

    /// The scan delay.
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The point and occupancy store.
    pub fn points(&self) -> &PointStore {
        &self.points
    }

    /// The exit queue.
    pub fn exits(&self) -> &ExitQueue {
        &self.exits
    }

    /// Driver ticks since creation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Takes the controller apart, returning lines, store and delay.
    ///
    /// Handing the store to a new controller simulates a power cycle.
    pub fn into_parts(self) -> (L, S, D) {
        (self.lines, self.nv.into_store(), self.delay)
    }
}
