//! Tick engine implementation.
//!
//! The tick engine is a one-second state machine over a fixed [`Plan`]. It
//! does not use internal threads or read a clock - the controller calls
//! `tick()` once per scheduled second.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Prepping -> Running <-> Paused
//!                        |
//!                        v
//!                      Done
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let engine = TickEngine::new(plan);
//! engine.enter_first(&mut state);
//! // Once per second:
//! let outcome = engine.tick(&mut state);
//! ```

use serde::{Deserialize, Serialize};

use super::plan::{Plan, Segment, SegmentKind};
use crate::cue::CueKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Idle,
    Prepping,
    Running,
    Paused,
    Done,
}

impl Status {
    /// Prepping, running or paused.
    pub fn is_active(&self) -> bool {
        matches!(self, Status::Prepping | Status::Running | Status::Paused)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Ready,
    Set,
    Go,
    Run,
    Walk,
    Done,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Ready => "Ready",
            Phase::Set => "Set",
            Phase::Go => "Go",
            Phase::Run => "Run",
            Phase::Walk => "Walk",
            Phase::Done => "Done",
        }
    }
}

impl From<SegmentKind> for Phase {
    fn from(kind: SegmentKind) -> Self {
        match kind {
            SegmentKind::Run => Phase::Run,
            SegmentKind::Walk => Phase::Walk,
        }
    }
}

/// Everything the UI layer renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub status: Status,
    pub phase: Phase,
    pub segment_index: usize,
    pub seconds_left_in_phase: u64,
    pub elapsed_total_secs: u64,
    pub locked: bool,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running (idle, prepping or done); nothing changed.
    Inactive,
    /// Paused; nothing changed and no cue is evaluated.
    Frozen,
    Counted,
    Warning {
        seconds_left: u64,
        cue: CueKind,
    },
    Advanced {
        segment_index: usize,
        segment: Segment,
        cue: CueKind,
    },
    /// The last segment ran out.
    Finished,
}

impl TickOutcome {
    pub fn cue(&self) -> Option<CueKind> {
        match self {
            TickOutcome::Warning { cue, .. } | TickOutcome::Advanced { cue, .. } => Some(*cue),
            _ => None,
        }
    }

    /// True if the tick consumed a second of the plan.
    pub fn counted(&self) -> bool {
        !matches!(self, TickOutcome::Inactive | TickOutcome::Frozen)
    }
}

/// Countdown warnings fire with this many seconds (or fewer) left.
const WARNING_SECONDS: u64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickEngine {
    plan: Plan,
}

impl TickEngine {
    pub fn new(plan: Plan) -> Self {
        Self { plan }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn current_segment(&self, state: &SessionState) -> Option<&Segment> {
        match state.status {
            Status::Running | Status::Paused => self.plan.get(state.segment_index),
            _ => None,
        }
    }

    /// 0.0 .. 100.0 progress across the entire plan.
    pub fn progress_pct(&self, state: &SessionState) -> f64 {
        let total = self.plan.total_secs();
        if total == 0 {
            return 0.0;
        }
        if state.status == Status::Done {
            return 100.0;
        }
        let Some(segment) = self.current_segment(state) else {
            return 0.0;
        };
        let done = self.plan.cumulative_secs(state.segment_index)
            + segment.duration_secs.saturating_sub(state.seconds_left_in_phase);
        (done as f64 / total as f64 * 100.0).min(100.0)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Enter the first segment. Returns the cue announcing it, or `None`
    /// (and status Done) for an empty plan.
    pub fn enter_first(&self, state: &mut SessionState) -> Option<CueKind> {
        state.segment_index = 0;
        match self.plan.get(0) {
            Some(first) => {
                state.status = Status::Running;
                state.phase = first.kind.into();
                state.seconds_left_in_phase = first.duration_secs;
                Some(CueKind::transition_to(first.kind))
            }
            None => {
                finish(state);
                None
            }
        }
    }

    /// Advance the session by one second.
    pub fn tick(&self, state: &mut SessionState) -> TickOutcome {
        match state.status {
            Status::Running => {}
            Status::Paused => return TickOutcome::Frozen,
            _ => return TickOutcome::Inactive,
        }

        state.seconds_left_in_phase = state.seconds_left_in_phase.saturating_sub(1);

        let outcome = if state.seconds_left_in_phase == 0 {
            let next = state.segment_index + 1;
            match self.plan.get(next) {
                Some(segment) => {
                    state.segment_index = next;
                    state.phase = segment.kind.into();
                    state.seconds_left_in_phase = segment.duration_secs;
                    TickOutcome::Advanced {
                        segment_index: next,
                        segment: *segment,
                        cue: CueKind::transition_to(segment.kind),
                    }
                }
                None => {
                    finish(state);
                    TickOutcome::Finished
                }
            }
        } else if state.seconds_left_in_phase <= WARNING_SECONDS {
            TickOutcome::Warning {
                seconds_left: state.seconds_left_in_phase,
                cue: CueKind::warning_during(state.phase),
            }
        } else {
            TickOutcome::Counted
        };

        if state.status == Status::Running {
            state.elapsed_total_secs += 1;
        }
        outcome
    }
}

fn finish(state: &mut SessionState) {
    state.status = Status::Done;
    state.phase = Phase::Done;
    state.seconds_left_in_phase = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::plan::SessionInputs;

    fn engine(total: f64, run: f64, walk: f64) -> TickEngine {
        TickEngine::new(Plan::build(&SessionInputs::new(total, run, walk)).unwrap())
    }

    fn running(engine: &TickEngine) -> SessionState {
        let mut state = SessionState::default();
        engine.enter_first(&mut state);
        state
    }

    #[test]
    fn enter_first_starts_with_run() {
        let e = engine(1.0, 0.5, 0.25);
        let mut state = SessionState::default();
        assert_eq!(e.enter_first(&mut state), Some(CueKind::TransitionToRun));
        assert_eq!(state.status, Status::Running);
        assert_eq!(state.phase, Phase::Run);
        assert_eq!(state.seconds_left_in_phase, 30);
    }

    #[test]
    fn warnings_then_transition() {
        // 5 s run, 5 s walk.
        let e = engine(10.0 / 60.0, 5.0 / 60.0, 5.0 / 60.0);
        let mut state = running(&e);

        assert_eq!(e.tick(&mut state), TickOutcome::Counted);
        for left in [3, 2, 1] {
            assert_eq!(
                e.tick(&mut state),
                TickOutcome::Warning {
                    seconds_left: left,
                    cue: CueKind::WarningDuringRun
                }
            );
        }
        match e.tick(&mut state) {
            TickOutcome::Advanced {
                segment_index, cue, ..
            } => {
                assert_eq!(segment_index, 1);
                assert_eq!(cue, CueKind::TransitionToWalk);
            }
            other => panic!("expected advance, got {other:?}"),
        }
        assert_eq!(state.phase, Phase::Walk);
        assert_eq!(state.seconds_left_in_phase, 5);
        assert_eq!(state.elapsed_total_secs, 5);

        e.tick(&mut state);
        assert_eq!(
            e.tick(&mut state).cue(),
            Some(CueKind::WarningDuringOther)
        );
    }

    #[test]
    fn last_segment_finishes_and_freezes() {
        let e = engine(2.0 / 60.0, 2.0 / 60.0, 1.0 / 60.0);
        let mut state = running(&e);
        assert_eq!(e.plan().len(), 1);

        assert!(matches!(e.tick(&mut state), TickOutcome::Warning { seconds_left: 1, .. }));
        assert_eq!(e.tick(&mut state), TickOutcome::Finished);
        assert_eq!(state.status, Status::Done);
        assert_eq!(state.phase, Phase::Done);
        // The finishing tick is not counted as elapsed.
        assert_eq!(state.elapsed_total_secs, 1);

        let frozen = state;
        assert_eq!(e.tick(&mut state), TickOutcome::Inactive);
        assert_eq!(state, frozen);
    }

    #[test]
    fn paused_tick_is_a_no_op() {
        let e = engine(1.0, 0.5, 0.5);
        let mut state = running(&e);
        e.tick(&mut state);
        state.status = Status::Paused;
        let before = state;
        assert_eq!(e.tick(&mut state), TickOutcome::Frozen);
        assert_eq!(state, before);
    }

    #[test]
    fn idle_tick_is_inactive() {
        let e = engine(1.0, 0.5, 0.5);
        let mut state = SessionState::default();
        assert_eq!(e.tick(&mut state), TickOutcome::Inactive);
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn progress_tracks_plan() {
        let e = engine(10.0 / 60.0, 5.0 / 60.0, 5.0 / 60.0);
        let mut state = running(&e);
        assert_eq!(e.progress_pct(&state), 0.0);
        for _ in 0..5 {
            e.tick(&mut state);
        }
        assert_eq!(e.progress_pct(&state), 50.0);
        for _ in 0..5 {
            e.tick(&mut state);
        }
        assert_eq!(e.progress_pct(&state), 100.0);
    }

    #[test]
    fn seconds_left_stays_within_segment() {
        let e = engine(7.0, 4.0, 1.0);
        let mut state = running(&e);
        while state.status == Status::Running {
            let seg = e.plan().get(state.segment_index).copied().unwrap();
            assert!(state.seconds_left_in_phase <= seg.duration_secs);
            assert!(state.seconds_left_in_phase > 0);
            e.tick(&mut state);
        }
        assert_eq!(state.segment_index, 2);
        assert_eq!(state.elapsed_total_secs, 419);
    }
}
