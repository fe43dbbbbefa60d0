//! Integration tests for full sessions on a simulated clock.

use intervalrun_core::{
    Command, CueSettings, Event, Phase, PlanError, PlatformCall, PrepStep, RecordingPlatform,
    SegmentKind, SessionController, SessionInputs, SessionState, SoundAsset, Status,
    VibrationPattern,
};

fn controller() -> SessionController<RecordingPlatform> {
    SessionController::new(RecordingPlatform::new(), CueSettings::default())
}

fn minutes(total: f64, run: f64, walk: f64) -> SessionInputs {
    SessionInputs::new(total, run, walk)
}

fn seconds(total: u64, run: u64, walk: u64) -> SessionInputs {
    SessionInputs::new(total as f64 / 60.0, run as f64 / 60.0, walk as f64 / 60.0)
}

/// (segment_index, seconds_left, elapsed) for every counted tick.
fn ticks(events: &[Event]) -> Vec<(usize, u64, u64)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Ticked {
                segment_index,
                seconds_left,
                elapsed_total_secs,
                ..
            } => Some((*segment_index, *seconds_left, *elapsed_total_secs)),
            _ => None,
        })
        .collect()
}

fn count(events: &[Event], pred: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

#[test]
fn full_thirty_minute_session() {
    let mut c = controller();
    let mut events = c.start(minutes(30.0, 4.0, 1.0), 0).unwrap();
    assert_eq!(c.plan().map(|p| p.len()), Some(12));

    events.extend(c.advance_to(3_000 + 1_800 * 1_000));

    let warnings = count(&events, |e| matches!(e, Event::CountdownWarning { .. }));
    let transitions = count(&events, |e| matches!(e, Event::SegmentStarted { .. }));
    let begins = count(&events, |e| matches!(e, Event::SessionBegan { .. }));
    assert_eq!(warnings, 3 * 12);
    assert_eq!(transitions, 12 - 1);
    assert_eq!(begins, 1);
    assert_eq!(
        count(&events, |e| matches!(e, Event::SessionCompleted { .. })),
        1
    );

    let stats = c.dispatch_stats();
    // 3 prep countdown cues + 36 warnings, 11 transitions + 1 begin.
    assert_eq!(stats.warnings, 3 + 36);
    assert_eq!(stats.transitions, 12);
    assert_eq!(stats.failures, 0);

    let state = c.state();
    assert_eq!(state.status, Status::Done);
    assert_eq!(state.phase, Phase::Done);
    assert_eq!(state.segment_index, 11);
    assert_eq!(state.seconds_left_in_phase, 0);
    assert_eq!(state.elapsed_total_secs, 1_799);
    assert_eq!(c.pending_triggers(), 0);
    assert_eq!(c.progress_pct(), 100.0);

    let platform = c.platform();
    assert!(!platform.keep_awake());
    assert_eq!(platform.max_live_cues(), 1);
    assert_eq!(platform.played_assets().len(), 3 + 1 + 36 + 11);
    assert_eq!(
        platform
            .vibrations()
            .iter()
            .filter(|v| **v == VibrationPattern::DoubleBuzz)
            .count(),
        6
    );

    // Nothing fires after Done.
    assert!(c.advance_to(10_000_000).is_empty());
}

#[test]
fn prep_runs_three_steps_then_hands_off() {
    let mut c = controller();
    let events = c.start(minutes(30.0, 4.0, 1.0), 10_000).unwrap();
    assert!(matches!(events[0], Event::SessionStarted { segments: 12, total_secs: 1800, .. }));
    assert!(matches!(
        events[1],
        Event::PrepStep { step: PrepStep::Ready, seconds_left: 3, .. }
    ));
    assert_eq!(c.state().status, Status::Prepping);
    assert_eq!(c.prep_completes_at(), Some(13_000));
    assert!(c.platform().keep_awake());

    assert!(c.advance_to(10_999).is_empty());
    let set = c.advance_to(11_000);
    assert!(matches!(set[..], [Event::PrepStep { step: PrepStep::Set, seconds_left: 2, .. }]));
    let go = c.advance_to(12_000);
    assert!(matches!(go[..], [Event::PrepStep { step: PrepStep::Go, seconds_left: 1, .. }]));
    assert_eq!(c.state().elapsed_total_secs, 0);

    let began = c.advance_to(13_000);
    assert!(matches!(
        began[..],
        [Event::SessionBegan { kind: SegmentKind::Run, duration_secs: 240, .. }]
    ));
    assert_eq!(c.state().status, Status::Running);
    assert_eq!(c.state().phase, Phase::Run);
    assert_eq!(c.state().seconds_left_in_phase, 240);
    assert_eq!(c.prep_completes_at(), None);

    assert!(c.advance_to(13_999).is_empty());
    assert_eq!(ticks(&c.advance_to(14_000)), vec![(0, 239, 1)]);

    let platform = c.platform();
    assert_eq!(
        platform.played_assets(),
        vec![
            SoundAsset::OtherCountdown,
            SoundAsset::OtherCountdown,
            SoundAsset::OtherCountdown,
            SoundAsset::SwitchToRun,
        ]
    );
    assert_eq!(platform.vibrations(), vec![VibrationPattern::LongBuzz]);
    assert!(platform.calls().iter().any(|call| matches!(
        call,
        PlatformCall::Play { asset: SoundAsset::Silence, looping: true, .. }
    )));
}

#[test]
fn stop_during_prep_cancels_everything() {
    let mut c = controller();
    c.start(minutes(30.0, 4.0, 1.0), 0).unwrap();
    c.advance_to(1_500);
    assert_eq!(c.state().phase, Phase::Set);

    c.stop();
    assert_eq!(c.pending_triggers(), 0);
    assert_eq!(*c.state(), SessionState::default());
    c.platform_mut().clear();

    assert!(c.advance_to(1_000_000).is_empty());
    assert!(c.platform().calls().is_empty());
    assert!(c.platform().live_sounds().is_empty());
}

#[test]
fn stop_is_idempotent_from_every_status() {
    let mut c = controller();
    c.stop();
    assert_eq!(*c.state(), SessionState::default());
    // Nothing was acquired, so nothing is released.
    assert_eq!(c.platform().calls(), &[PlatformCall::KeepAwake(false)]);

    for until in [500, 4_500, 20_000] {
        c.start(seconds(10, 5, 5), 0).unwrap();
        c.advance_to(until);
        c.stop();
        let first = *c.state();
        c.stop();
        assert_eq!(first, SessionState::default());
        assert_eq!(*c.state(), SessionState::default());
        assert!(c.platform().live_sounds().is_empty());
        assert!(!c.platform().keep_awake());
    }

    c.start(seconds(10, 5, 5), 0).unwrap();
    c.advance_to(5_000);
    c.pause();
    c.reset();
    assert_eq!(*c.state(), SessionState::default());
}

#[test]
fn pause_resume_reproduces_countdown() {
    let inputs = seconds(20, 6, 4);

    let mut plain = controller();
    plain.start(inputs, 0).unwrap();
    let plain_events = plain.advance_to(3_000 + 20_000);

    let mut paused = controller();
    paused.start(inputs, 0).unwrap();
    let mut events = paused.advance_to(3_000 + 5_000);
    assert!(paused.pause().is_some());
    let frozen = *paused.state();
    // Ticks while paused change nothing and fire no cues.
    let cues_before = paused.dispatch_stats();
    assert!(paused.advance_to(3_000 + 12_000).is_empty());
    assert_eq!(*paused.state(), frozen);
    assert_eq!(paused.dispatch_stats(), cues_before);
    assert!(paused.resume().is_some());
    events.extend(paused.advance_to(3_000 + 27_000));

    assert_eq!(ticks(&events), ticks(&plain_events));
    assert_eq!(paused.state().status, Status::Done);
    assert_eq!(
        paused.state().elapsed_total_secs,
        plain.state().elapsed_total_secs
    );
}

#[test]
fn pause_has_no_effect_outside_running() {
    let mut c = controller();
    assert!(c.pause().is_none());
    assert!(c.resume().is_none());

    c.start(seconds(10, 5, 5), 0).unwrap();
    assert!(c.pause().is_none());
    assert!(c.toggle_pause().is_none());
    assert_eq!(c.state().status, Status::Prepping);

    c.advance_to(3_000);
    assert!(c.resume().is_none());
    assert!(matches!(c.toggle_pause(), Some(Event::SessionPaused { .. })));
    assert!(matches!(c.toggle_pause(), Some(Event::SessionResumed { .. })));

    c.advance_to(20_000);
    assert_eq!(c.state().status, Status::Done);
    assert!(c.pause().is_none());
}

#[test]
fn lock_gates_pause_and_stop_but_not_ticks() {
    let mut c = controller();
    c.handle(Command::Start(seconds(10, 5, 5)), 0).unwrap();
    c.advance_to(4_000);
    c.handle(Command::ToggleLock, 4_000).unwrap();
    assert!(c.state().locked);

    for command in [Command::Pause, Command::TogglePause, Command::Stop] {
        let events = c.handle(command, 4_000).unwrap();
        assert!(matches!(events[..], [Event::CommandRejected { .. }]));
    }
    assert_eq!(c.state().status, Status::Running);

    let events = c.advance_to(8_000);
    assert_eq!(ticks(&events).len(), 4);

    c.handle(Command::ToggleLock, 8_000).unwrap();
    let events = c.handle(Command::Pause, 8_000).unwrap();
    assert!(matches!(events[..], [Event::SessionPaused { .. }]));
    let events = c.handle(Command::Stop, 8_000).unwrap();
    assert!(matches!(events[..], [Event::SessionReset { .. }]));
    assert_eq!(*c.state(), SessionState::default());
}

#[test]
fn invalid_inputs_are_rejected_and_controller_stays_idle() {
    let mut c = controller();
    for inputs in [
        minutes(30.0, 0.0, 1.0),
        minutes(30.0, 4.0, -1.0),
        minutes(0.0, 4.0, 1.0),
    ] {
        let err = c.handle(Command::Start(inputs), 0).unwrap_err();
        assert!(matches!(err, PlanError::InvalidDuration { .. }));
        assert_eq!(*c.state(), SessionState::default());
        assert_eq!(c.pending_triggers(), 0);
        assert!(c.plan().is_none());
    }
    assert!(c.platform().calls().is_empty());
}

#[test]
fn start_is_ignored_while_in_progress() {
    let mut c = controller();
    c.start(seconds(10, 5, 5), 0).unwrap();
    assert!(c.start(seconds(60, 5, 5), 500).unwrap().is_empty());
    c.advance_to(3_500);
    assert!(c.start(seconds(60, 5, 5), 3_500).unwrap().is_empty());
    c.pause();
    assert!(c.start(seconds(60, 5, 5), 3_500).unwrap().is_empty());
    assert_eq!(c.plan().map(|p| p.total_secs()), Some(10));
}

#[test]
fn restart_after_done() {
    let mut c = controller();
    c.start(seconds(10, 5, 5), 0).unwrap();
    c.advance_to(13_000);
    assert_eq!(c.state().status, Status::Done);

    let events = c.start(seconds(8, 4, 4), 20_000).unwrap();
    assert!(!events.is_empty());
    assert_eq!(c.state().status, Status::Prepping);
    assert_eq!(c.state().elapsed_total_secs, 0);
    assert_eq!(c.dispatch_stats().requested, 1);

    c.advance_to(23_000 + 8_000);
    assert_eq!(c.state().status, Status::Done);
    assert_eq!(c.state().elapsed_total_secs, 7);
}

#[test]
fn late_polling_catches_up_every_tick() {
    let mut c = controller();
    c.start(minutes(30.0, 4.0, 1.0), 0).unwrap();
    let events = c.advance_to(3_000 + 10_500);
    let ticks = ticks(&events);
    assert_eq!(ticks.len(), 10);
    assert_eq!(ticks.last(), Some(&(0, 230, 10)));
    assert_eq!(c.next_deadline(), Some(14_000));
}

#[test]
fn backend_failures_do_not_change_the_timeline() {
    let mut healthy = controller();
    healthy.start(seconds(30, 8, 4), 0).unwrap();
    let healthy_events = healthy.advance_to(40_000);

    let mut platform = RecordingPlatform::new();
    platform.fail_play = true;
    platform.fail_vibrate = true;
    let mut broken = SessionController::new(platform, CueSettings::default());
    broken.start(seconds(30, 8, 4), 0).unwrap();
    let broken_events = broken.advance_to(40_000);

    assert_eq!(ticks(&broken_events), ticks(&healthy_events));
    assert_eq!(broken.state(), healthy.state());
    assert!(broken.dispatch_stats().failures > 0);
    assert_eq!(
        broken.dispatch_stats().requested,
        healthy.dispatch_stats().requested
    );
}

#[test]
fn short_final_segment_gets_fewer_warnings() {
    // 240 s run followed by a 2 s leftover walk.
    let mut c = controller();
    c.start(seconds(242, 240, 60), 0).unwrap();
    let events = c.advance_to(3_000 + 242_000);
    let walk_warnings = count(&events, |e| {
        matches!(e, Event::CountdownWarning { phase: Phase::Walk, .. })
    });
    assert_eq!(walk_warnings, 1);
    assert_eq!(c.state().status, Status::Done);
}

#[test]
fn single_truncated_run_session() {
    let mut c = controller();
    c.start(seconds(5, 240, 60), 0).unwrap();
    let events = c.advance_to(3_000 + 5_000);
    assert_eq!(count(&events, |e| matches!(e, Event::SegmentStarted { .. })), 0);
    assert_eq!(
        count(&events, |e| matches!(e, Event::CountdownWarning { .. })),
        3
    );
    assert_eq!(c.state().status, Status::Done);
    assert_eq!(c.state().segment_index, 0);
}

#[test]
fn muted_sound_still_vibrates() {
    let mut c = SessionController::new(
        RecordingPlatform::new(),
        CueSettings {
            sound: false,
            vibration: true,
        },
    );
    c.start(seconds(10, 5, 5), 0).unwrap();
    c.advance_to(13_000);
    assert!(c.platform().played_assets().is_empty());
    assert_eq!(
        c.platform().vibrations(),
        vec![VibrationPattern::LongBuzz, VibrationPattern::DoubleBuzz]
    );
}

#[test]
fn snapshot_reflects_state() {
    let mut c = controller();
    c.start(seconds(10, 5, 5), 0).unwrap();
    c.advance_to(5_000);
    match c.snapshot() {
        Event::StateSnapshot {
            state,
            progress_pct,
            ..
        } => {
            assert_eq!(state.status, Status::Running);
            assert_eq!(state.seconds_left_in_phase, 3);
            assert_eq!(progress_pct, 20.0);
        }
        other => panic!("Expected StateSnapshot, got {other:?}"),
    }
    let json = serde_json::to_value(c.snapshot()).unwrap();
    assert_eq!(json["type"], "StateSnapshot");
    assert_eq!(json["state"]["status"], "running");
    assert_eq!(json["state"]["phase"], "run");
}
