//! Integration tests for the layout controller on mock hardware

use rs_layout::hal::{MockDelay, MockEeprom, MockLines};
use rs_layout::{
    Config, Destinations, ExitRequest, IndicatorEncoding, Layout, LayoutCommand, LayoutError,
    MachineId, PointId, TotiId,
};

type MockLayout = Layout<MockLines, MockEeprom, MockDelay>;

fn new_layout() -> MockLayout {
    let mut layout = Layout::new(
        MockLines::new(),
        MockEeprom::new(),
        MockDelay::new(),
        Config::default(),
    );
    layout.init(false);
    layout
}

fn reboot(layout: MockLayout) -> MockLayout {
    let (_, store, _) = layout.into_parts();
    let mut layout = Layout::new(
        MockLines::new(),
        store,
        MockDelay::new(),
        Config::default(),
    );
    layout.init(false);
    layout
}

fn pid(n: u8) -> PointId {
    PointId::new(n).unwrap()
}

fn req(dest: Destinations, siding: u8) -> ExitRequest {
    ExitRequest::new(dest, siding).unwrap()
}

// ============================================================================
// Exit Queue Properties
// ============================================================================

#[test]
fn fifth_request_is_rejected_and_queue_unchanged() {
    let mut layout = new_layout();
    for siding in 1..=4 {
        layout.push_exit(req(Destinations::MAIN, siding)).unwrap();
    }
    let before = layout.state().queued;

    assert_eq!(
        layout.push_exit(req(Destinations::GOODS, 5)),
        Err(LayoutError::QueueFull)
    );
    assert_eq!(layout.state().queued, before);
    assert!(!layout.is_siding_queued(5));
}

#[test]
fn dispatch_order_is_fifo() {
    let mut layout = new_layout();
    let requests = [
        req(Destinations::BRANCH, 3),
        req(Destinations::MAIN, 1),
        req(Destinations::THROUGH | Destinations::GOODS, 0),
        req(Destinations::GOODS, 8),
    ];
    for r in requests {
        layout.push_exit(r).unwrap();
    }

    for r in requests {
        assert_eq!(layout.peek_exit(), Some(r));
        assert_eq!(layout.pop_exit(), Some(r));
        assert_eq!(layout.active_exit(), Some(r));
    }
    assert_eq!(layout.pop_exit(), None);
    assert_eq!(layout.active_exit(), None);
}

#[test]
fn siding_stays_queued_while_active() {
    let mut layout = new_layout();
    layout.push_exit(req(Destinations::GOODS, 6)).unwrap();
    assert!(layout.is_siding_queued(6));

    layout.pop_exit();
    assert!(!layout.exits_pending());
    assert!(layout.is_siding_queued(6));

    layout.clear_active_exit();
    assert!(!layout.is_siding_queued(6));
}

#[test]
fn main_siding_one_scenario() {
    let mut layout = new_layout();
    layout.push_exit(req(Destinations::MAIN, 1)).unwrap();
    let active = layout.pop_exit();
    assert_eq!(active.map(ExitRequest::raw), Some(0x11));

    let encoding = layout.show_exit(active);
    assert_eq!(encoding.lit(), Destinations::MAIN);
    assert_eq!(encoding.flashing(), Destinations::MAIN);
    assert_eq!(encoding.raw(), 0x11);
}

#[test]
fn queued_destinations_glow_active_one_flashes() {
    let mut layout = new_layout();
    layout.push_exit(req(Destinations::MAIN, 1)).unwrap();
    layout.push_exit(req(Destinations::BRANCH, 2)).unwrap();
    layout.push_exit(req(Destinations::THROUGH | Destinations::MAIN, 0)).unwrap();

    let active = layout.pop_exit();
    let encoding = layout.show_exit(active);
    assert_eq!(
        encoding.lit(),
        Destinations::MAIN | Destinations::BRANCH | Destinations::THROUGH
    );
    assert_eq!(encoding.flashing(), Destinations::MAIN);
}

#[test]
fn raw_zero_purges_everything() {
    let mut layout = new_layout();
    layout.add_exit(0x21).unwrap();
    layout.add_exit(0x42).unwrap();
    layout.pop_exit();
    layout.show_exit(layout.active_exit());

    layout.add_exit(0).unwrap();

    assert!(!layout.exits_pending());
    assert_eq!(layout.active_exit(), None);
    assert_eq!(layout.indicator(), IndicatorEncoding::OFF);
    assert!(!layout.is_siding_queued(1));
    assert!(!layout.is_siding_queued(2));
}

// ============================================================================
// Points and Occupancy
// ============================================================================

#[test]
fn point_five_durable_round_trip() {
    let mut layout = new_layout();
    layout.set_point(pid(5), true);
    assert!(layout.get_point(pid(5)));
    layout.set_point(pid(5), false);
    assert!(!layout.get_point(pid(5)));
}

#[test]
fn points_survive_restart() {
    let mut layout = new_layout();
    for n in [2, 9, 24, 25, 29, 32] {
        layout.set_point(pid(n), true);
    }
    layout.set_point(pid(9), false);

    let layout = reboot(layout);
    for n in 1..=32 {
        let expected = matches!(n, 2 | 24 | 25 | 29 | 32);
        assert_eq!(layout.point(pid(n)), expected, "point {n}");
    }
}

#[test]
fn factory_reset_applies_only_to_the_boot_it_was_held_for() {
    let mut layout = new_layout();
    layout.set_point(pid(3), true);
    layout.move_machine(MachineId::EXIT, 9).unwrap();

    // Power up with the reset input held low
    let (_, store, _) = layout.into_parts();
    let mut lines = MockLines::new();
    lines.set_input(Config::default().driver.reset_line, false);
    let mut layout = Layout::new(lines, store, MockDelay::new(), Config::default());
    assert!(layout.boot());
    assert!(!layout.point(pid(3)));
    layout.set_point(pid(4), true);
    layout.move_machine(MachineId::EXIT, 10).unwrap();

    // Next power up without it restores what was stored since
    let (_, store, _) = layout.into_parts();
    let mut layout = Layout::new(MockLines::new(), store, MockDelay::new(), Config::default());
    assert!(!layout.boot());
    assert!(layout.point(pid(4)));
    assert_eq!(layout.fetch_machine(MachineId::EXIT).value(), 10);
}

#[test]
fn physical_point_follows_on_next_tick() {
    let mut layout = new_layout();
    layout.tick();
    layout.set_point(pid(27), true);
    assert!(!layout.lines().output(11));
    layout.tick();
    assert!(layout.lines().output(11));
}

#[test]
fn occupancy_is_sensed_every_tick() {
    let mut layout = new_layout();
    // First register position reports occupied
    let mut samples = [true; 24];
    samples[0] = false;
    layout.lines_mut().queue_inputs(5, &samples);

    layout.tick();
    assert!(layout.test_toti(TotiId::new(24).unwrap()));

    layout.tick();
    assert!(!layout.test_toti(TotiId::new(24).unwrap()));
}

#[test]
fn clear_siding_entry_points_leaves_others() {
    let mut layout = new_layout();
    for n in 1..=12 {
        layout.set_point(pid(n), true);
    }
    layout.apply(LayoutCommand::ClearSidingEntries).unwrap();

    for n in 1..=8 {
        assert!(!layout.point(pid(n)));
    }
    for n in 9..=12 {
        assert!(layout.point(pid(n)));
    }
}

// ============================================================================
// State Machines
// ============================================================================

#[test]
fn repeat_flag_false_then_true() {
    let mut layout = new_layout();
    assert!(!layout.move_machine(MachineId::ENTER, 17).unwrap().is_repeat());
    assert!(layout.move_machine(MachineId::ENTER, 17).unwrap().is_repeat());
}

#[test]
fn distinct_moves_never_repeat() {
    let mut layout = new_layout();
    assert!(!layout.move_machine(MachineId::EXIT, 1).unwrap().is_repeat());
    assert!(!layout.move_machine(MachineId::EXIT, 2).unwrap().is_repeat());
}

#[test]
fn machines_restore_after_restart() {
    let mut layout = new_layout();
    let history: [(MachineId, u8); 7] = [
        (MachineId::MERGE, 5),
        (MachineId::ENTER, 100),
        (MachineId::MERGE, 6),
        (MachineId::EXIT, 127),
        (MachineId::MERGE, 6),
        (MachineId::ENTER, 0),
        (MachineId::EXIT, 33),
    ];
    for (id, state) in history {
        layout.move_machine(id, state).unwrap();
    }

    let layout = reboot(layout);
    assert_eq!(layout.fetch_machine(MachineId::MERGE).value(), 6);
    assert_eq!(layout.fetch_machine(MachineId::ENTER).value(), 0);
    assert_eq!(layout.fetch_machine(MachineId::EXIT).value(), 33);
    // repeat flag is not persisted
    assert!(!layout.fetch_machine(MachineId::MERGE).is_repeat());
}

#[test]
fn machine_wear_is_spread() {
    let mut layout = new_layout();
    for _ in 0..50 {
        for state in 0..32 {
            layout.move_machine(MachineId::MERGE, state).unwrap();
        }
    }
    // 1600 transitions, 2 writes each, spread over 32 cells
    assert!(layout.store().max_writes() <= 101);
}

// ============================================================================
// Timers
// ============================================================================

#[test]
fn three_second_timer_scenario() {
    let mut layout = new_layout();
    layout.timers_mut().init(0, 3).unwrap();
    for _ in 0..3 {
        layout.second_tick();
    }
    assert_eq!(layout.timers_mut().expired(0), Ok(true));
    assert_eq!(layout.timers_mut().expired(0), Ok(false));
}

// ============================================================================
// Scripted Sessions
// ============================================================================

#[test]
fn scripted_dispatch_session() {
    let mut layout = new_layout();
    let script = "
        # morning service
        point 1 set
        exit main 1
        exit goods 2
        pop
        show
        tick 1
        state exit 4
        timer 1 2
        second 2
    ";
    for line in script.lines() {
        match LayoutCommand::parse(line) {
            Ok(cmd) => {
                layout.apply(cmd).unwrap();
            }
            Err(rs_layout::CommandError::Empty) => {}
            Err(e) => panic!("{line}: {e}"),
        }
    }

    let state = layout.state();
    assert_eq!(state.points, 1);
    assert_eq!(state.queued.as_slice(), &[0x22]);
    assert_eq!(state.active_exit, Some(0x11));
    assert_eq!(state.indicator, 0x31);
    assert!(state.blink_phase);
    assert_eq!(state.machines[2], 4);
    assert_eq!(state.ticks, 1);
    // MAIN flashing (phase on), GOODS steady
    assert!(layout.lines().output(26));
    assert!(layout.lines().output(27));
    assert!(layout.timers_mut().expired(1).unwrap());
}
