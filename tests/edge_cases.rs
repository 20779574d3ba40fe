//! Edge case and boundary condition tests for the layout controller

use rs_layout::hal::{MockDelay, MockEeprom, MockLines};
use rs_layout::nv::{self, NvStore};
use rs_layout::{
    CommandError, Config, Destinations, ExitRequest, IndicatorConfig, Layout, LayoutCommand,
    LayoutError, MachineId, PersistentMachine, PointId, ScanConfig, StorageConfig, TimerBank,
    TotiId,
};

fn new_layout(config: Config) -> Layout<MockLines, MockEeprom, MockDelay> {
    let mut layout = Layout::new(MockLines::new(), MockEeprom::new(), MockDelay::new(), config);
    layout.init(false);
    layout
}

// ============================================================================
// Identifier Boundaries
// ============================================================================

#[test]
fn point_and_toti_bounds() {
    assert_eq!(PointId::new(0), Err(LayoutError::PointOutOfRange(0)));
    assert_eq!(PointId::new(1).map(PointId::get), Ok(1));
    assert_eq!(PointId::new(32).map(PointId::get), Ok(32));
    assert_eq!(PointId::new(33), Err(LayoutError::PointOutOfRange(33)));
    assert_eq!(TotiId::new(33), Err(LayoutError::TotiOutOfRange(33)));
}

#[test]
fn wrapping_ids_match_legacy_modulo() {
    // 33 aliases point 1 on the legacy wiring
    assert_eq!(PointId::wrapping(33), PointId::new(1).unwrap());
    assert_eq!(PointId::wrapping(64), PointId::new(32).unwrap());
    assert_eq!(TotiId::wrapping(0), TotiId::new(32).unwrap());
}

#[test]
fn highest_point_has_no_hardware_but_is_stored() {
    let mut layout = new_layout(Config::default());
    let p32 = PointId::new(32).unwrap();
    layout.set_point(p32, true);
    layout.tick();
    assert!(layout.point(p32));
    assert_eq!(layout.store().peek(0x01F), nv::ACTIVE);
}

#[test]
fn siding_bounds() {
    assert!(ExitRequest::new(Destinations::MAIN, 8).is_ok());
    assert_eq!(
        ExitRequest::new(Destinations::MAIN, 9),
        Err(LayoutError::SidingOutOfRange(9))
    );
    assert_eq!(
        ExitRequest::new(Destinations::MAIN, 0),
        Err(LayoutError::SidingOutOfRange(0))
    );
    assert!(ExitRequest::new(Destinations::THROUGH, 0).is_ok());
}

#[test]
fn machine_and_state_bounds() {
    assert_eq!(MachineId::new(0), Err(LayoutError::MachineOutOfRange(0)));
    let mut layout = new_layout(Config::default());
    assert!(layout.move_machine(MachineId::EXIT, 127).is_ok());
    assert_eq!(
        layout.move_machine(MachineId::EXIT, 128),
        Err(LayoutError::StateOutOfRange(128))
    );
    // a rejected move leaves the state alone
    assert_eq!(layout.fetch_machine(MachineId::EXIT).value(), 127);
}

#[test]
fn timer_bounds() {
    let mut timers = TimerBank::new();
    assert!(timers.init(9, 1).is_ok());
    assert_eq!(timers.init(10, 1), Err(LayoutError::TimerOutOfRange(10)));
}

// ============================================================================
// Queue Edges
// ============================================================================

#[test]
fn pop_on_empty_queue_clears_active() {
    let mut layout = new_layout(Config::default());
    layout.push_exit(ExitRequest::new(Destinations::GOODS, 3).unwrap()).unwrap();
    layout.pop_exit();
    assert!(layout.is_siding_queued(3));

    assert_eq!(layout.pop_exit(), None);
    assert_eq!(layout.active_exit(), None);
    assert!(!layout.is_siding_queued(3));
}

#[test]
fn duplicate_sidings_are_allowed_by_the_queue() {
    let mut layout = new_layout(Config::default());
    let r = ExitRequest::new(Destinations::MAIN, 2).unwrap();
    layout.push_exit(r).unwrap();
    layout.push_exit(r).unwrap();
    assert_eq!(layout.exits().len(), 2);
}

#[test]
fn queue_accepts_again_after_pop() {
    let mut layout = new_layout(Config::default());
    for siding in 1..=4 {
        layout.add_exit(0x10 | siding).unwrap();
    }
    assert_eq!(layout.add_exit(0x15), Err(LayoutError::QueueFull));
    layout.pop_exit();
    assert!(layout.add_exit(0x15).is_ok());
    let queued: Vec<u8> = layout.exits().iter().map(ExitRequest::raw).collect();
    assert_eq!(queued, [0x12, 0x13, 0x14, 0x15]);
}

#[test]
fn show_with_nothing_active_is_steady() {
    let mut layout = new_layout(Config::default());
    layout.push_exit(ExitRequest::new(Destinations::BRANCH, 1).unwrap()).unwrap();
    let encoding = layout.show_exit(None);
    assert_eq!(encoding.raw(), 0x40);
    assert_eq!(encoding.line_levels(false), [false, false, true, false]);
}

// ============================================================================
// Storage Edges
// ============================================================================

#[test]
fn fresh_store_boots_to_defaults() {
    let layout = new_layout(Config::default());
    assert_eq!(layout.points().point_bits(), 0);
    for id in MachineId::ALL {
        assert_eq!(layout.fetch_machine(id).raw(), 0);
    }
}

#[test]
fn corrupt_slots_resolve_to_lowest_active() {
    let mut nv = NvStore::new(MockEeprom::new(), MockDelay::new(), StorageConfig::default());
    // Two active slots can only come from writes outside the machine
    nv.store_mut().poke(MachineId::MERGE.slot_address(70), 0x00);
    nv.store_mut().poke(MachineId::MERGE.slot_address(12), 0xFE);

    let mut machine = PersistentMachine::new(MachineId::MERGE);
    machine.init(&mut nv, false);
    assert_eq!(machine.fetch().value(), 12);

    // The next move erases slot 12 only; 70 stays as a stray
    machine.move_to_state(&mut nv, 20).unwrap();
    machine.init(&mut nv, false);
    assert_eq!(machine.fetch().value(), 20);
}

#[test]
fn zero_settle_times_skip_waits() {
    let config = Config::default().with_storage(
        StorageConfig::default()
            .with_write_settle_ms(0)
            .with_read_settle_ms(0),
    );
    let mut layout = new_layout(config);
    layout.set_point(PointId::new(1).unwrap(), true);
    assert_eq!(layout.nv().delay().total_ns(), 0);
}

// ============================================================================
// Configuration Edges
// ============================================================================

#[test]
fn custom_wiring_is_honoured() {
    let config = Config::default()
        .with_scan(
            ScanConfig::default()
                .with_bus_lines(40, 41, 42, 43)
                .with_direct_lines([50, 51, 52, 53, 54])
                .with_pulse_width_us(1),
        )
        .with_indicators(IndicatorConfig::default().with_base_line(60).with_blink_ticks(2));
    let mut layout = new_layout(config);

    layout.set_point(PointId::new(29).unwrap(), true);
    layout.push_exit(ExitRequest::new(Destinations::THROUGH, 0).unwrap()).unwrap();
    layout.show_exit(None);
    layout.tick();

    assert!(layout.lines().output(54));
    assert!(layout.lines().output(63));
    assert!(layout.lines().writes().iter().all(|(line, _)| *line >= 40));
    assert_eq!(layout.delay().total_us(), 100);
}

#[test]
fn command_errors_do_not_touch_the_layout() {
    let mut layout = new_layout(Config::default());
    assert_eq!(
        LayoutCommand::parse("exit main"),
        Err(CommandError::MissingArgument("siding"))
    );
    assert_eq!(
        LayoutCommand::parse("point x set"),
        Err(CommandError::InvalidNumber("point"))
    );
    assert!(!layout.exits_pending());
    assert_eq!(layout.store().total_writes(), 0);
    layout.tick();
    assert_eq!(layout.store().total_writes(), 0);
}
