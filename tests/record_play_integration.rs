//! Record -> text -> parse -> play round trips

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::builders::{MachineBuilder, TableBuilder};
use common::trace::{hold, write, Event, Trace};
use stateplay_rs::history::{parse, serialize};
use stateplay_rs::session::{Player, PlaybackState, Recorder};
use stateplay_rs::timing::{ManualClock, ManualContext};
use stateplay_rs::{ChannelDirectory, HistoryRow, ReplayError};

#[test]
fn test_recorded_session_replays_exactly() {
    let machine = MachineBuilder::new()
        .motor("left_drive", 0.0)
        .motor("right_drive", 0.0)
        .servo("pusher", 0.0)
        .build();
    let left = machine.channel("left_drive");
    let right = machine.channel("right_drive");
    let pusher = machine.channel("pusher");

    let clock = ManualClock::new();
    let mut recorder =
        Recorder::start_with_clock(&machine.directory, Arc::new(clock.clone())).unwrap();

    // Operator drives forward, turns, fires the pusher, stops
    clock.advance(Duration::from_millis(300));
    left.set(1.0);
    right.set(1.0);
    recorder.update().unwrap();

    clock.advance(Duration::from_millis(800));
    left.set(0.5);
    right.set(-0.5);
    recorder.update().unwrap();

    clock.advance(Duration::from_millis(200));
    pusher.set(0.75);
    recorder.update().unwrap();

    clock.advance(Duration::from_millis(500));
    left.set(0.0);
    right.set(0.0);
    pusher.set(0.0);
    recorder.update().unwrap();

    let table = recorder.finish();
    assert_eq!(table.row_count(), 4);

    let text = serialize(&table);
    assert_eq!(
        text,
        "[runtime(ms), left_drive, right_drive, pusher]\n\
         [300, 0.0, 0.0, 0.0]\n\
         [800, 1.0, 1.0, 0.0]\n\
         [200, 0.5, -0.5, 0.0]\n\
         [500, 0.5, -0.5, 0.75]\n"
    );

    let loaded = parse(&text).unwrap();
    assert_eq!(loaded, table);

    // Replay onto the same machine, now parked somewhere else
    left.set(-0.3);
    left.clear_writes();

    let ctx = ManualContext::new();
    let report = Player::new()
        .play(&loaded, &machine.directory, &ctx)
        .unwrap();

    assert_eq!(report.rows_applied, 4);
    assert_eq!(report.requested_hold, Duration::from_millis(1800));
    assert_eq!(
        ctx.holds(),
        [300, 800, 200, 500].map(Duration::from_millis).to_vec()
    );
    assert_eq!(left.writes(), vec![0.0, 1.0, 0.5, 0.5, 0.0]);
    assert_eq!(machine.values(), vec![0.0, 0.0, 0.0]);
}

#[test]
fn test_writes_and_holds_interleave() {
    let trace = Trace::new();
    let mut directory = ChannelDirectory::new();
    directory.register("a", trace.channel("a", 0.0)).unwrap();
    directory.register("b", trace.channel("b", 0.5)).unwrap();

    let table = TableBuilder::new(&["a", "b"])
        .row(100, &[1.0, 0.0])
        .row(200, &[-1.0, 1.0])
        .build();

    let mut player = Player::new();
    player.play(&table, &directory, &trace.context()).unwrap();

    assert_eq!(
        trace.events(),
        vec![
            write("a", 1.0),
            write("b", 0.0),
            hold(100),
            write("a", -1.0),
            write("b", 1.0),
            hold(200),
            write("a", 0.0),
            write("b", 0.5),
        ]
    );
    assert_eq!(player.state(), PlaybackState::Done);
}

#[test]
fn test_abort_mid_hold_skips_remaining_rows() {
    let trace = Trace::new();
    let mut directory = ChannelDirectory::new();
    directory.register("m", trace.channel("m", 0.0)).unwrap();

    let table = TableBuilder::new(&["m"])
        .row(100, &[1.0])
        .row(200, &[-1.0])
        .row(300, &[0.5])
        .build();

    let ctx = trace.context().cancel_during_hold(1);
    let mut player = Player::new();
    let err = player.play(&table, &directory, &ctx).unwrap_err();

    assert!(matches!(err, ReplayError::Aborted { rows_applied: 2 }));
    assert_eq!(player.state(), PlaybackState::Aborted);
    assert_eq!(
        trace.events(),
        vec![
            write("m", 1.0),
            hold(100),
            write("m", -1.0),
            hold(200),
            write("m", 0.0),
        ]
    );
}

#[test]
fn test_history_for_other_machine_is_rejected() {
    let trace = Trace::new();
    let mut directory = ChannelDirectory::new();
    directory.register("m", trace.channel("m", 0.25)).unwrap();

    let text = "[runtime(ms), m, arm]\n[100, 1.0, 0.5]\n";
    let table = parse(text).unwrap();

    let err = Player::new()
        .play(&table, &directory, &trace.context())
        .unwrap_err();

    assert!(matches!(err, ReplayError::UnknownChannel(name) if name == "arm"));
    // No row was half applied; only the baseline went out
    assert_eq!(trace.events(), vec![write("m", 0.25)]);
}

#[test]
fn test_baseline_is_registration_state_not_recording_start() {
    let machine = MachineBuilder::new().motor("m", 0.2).build();
    let motor = machine.channel("m");

    motor.set(0.9);
    let clock = ManualClock::new();
    let mut recorder =
        Recorder::start_with_clock(&machine.directory, Arc::new(clock.clone())).unwrap();
    clock.advance(Duration::from_millis(50));
    motor.set(0.4);
    recorder.update().unwrap();
    assert_eq!(recorder.initial_values().values(), vec![0.2]);

    let table = recorder.finish();
    assert_eq!(table.rows(), &[HistoryRow::new(50, vec![0.9])]);

    Player::new()
        .play(&table, &machine.directory, &ManualContext::new())
        .unwrap();
    assert_eq!(motor.value(), 0.2);
}

#[test]
fn test_trace_only_records_writes() {
    let trace = Trace::new();
    let channel = trace.channel("m", 0.0);
    channel.set(1.0);
    assert!(trace
        .events()
        .iter()
        .all(|e| !matches!(e, Event::Write(..))));
}
