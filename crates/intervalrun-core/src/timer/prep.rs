//! Ready / Set / Go lead-in.
//!
//! The first step is applied the moment a session starts; the remaining two
//! steps and the hand-off to the tick engine are one-shot triggers that the
//! controller schedules and can cancel.

use serde::{Deserialize, Serialize};

use super::engine::{Phase, SessionState, Status};
use crate::cue::CueKind;

/// Spacing between prep steps.
pub const PREP_STEP_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrepStep {
    Ready,
    Set,
    Go,
}

impl PrepStep {
    pub const ALL: [PrepStep; 3] = [PrepStep::Ready, PrepStep::Set, PrepStep::Go];

    pub fn phase(&self) -> Phase {
        match self {
            PrepStep::Ready => Phase::Ready,
            PrepStep::Set => Phase::Set,
            PrepStep::Go => Phase::Go,
        }
    }

    /// Seconds shown while this step is active.
    pub fn seconds_left(&self) -> u64 {
        match self {
            PrepStep::Ready => 3,
            PrepStep::Set => 2,
            PrepStep::Go => 1,
        }
    }

    /// Offset from the start of prep.
    pub fn offset_ms(&self) -> u64 {
        (3 - self.seconds_left()) * PREP_STEP_MS
    }
}

/// A pending prep trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepTrigger {
    Step(PrepStep),
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepCountdown {
    started_at_ms: u64,
}

impl PrepCountdown {
    /// Enter prep: status Prepping, phase Ready.
    pub fn begin(state: &mut SessionState, now_ms: u64) -> (Self, CueKind) {
        state.status = Status::Prepping;
        let cue = Self::apply(PrepStep::Ready, state);
        (
            Self {
                started_at_ms: now_ms,
            },
            cue,
        )
    }

    /// Show `step` and return the countdown cue to play.
    pub fn apply(step: PrepStep, state: &mut SessionState) -> CueKind {
        state.phase = step.phase();
        state.seconds_left_in_phase = step.seconds_left();
        CueKind::warning_during(state.phase)
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    pub fn completes_at_ms(&self) -> u64 {
        self.started_at_ms + PrepStep::ALL.len() as u64 * PREP_STEP_MS
    }

    /// The one-shots still to schedule after `begin`, with absolute deadlines.
    pub fn pending_triggers(&self) -> [(u64, PrepTrigger); 3] {
        [
            (
                self.started_at_ms + PrepStep::Set.offset_ms(),
                PrepTrigger::Step(PrepStep::Set),
            ),
            (
                self.started_at_ms + PrepStep::Go.offset_ms(),
                PrepTrigger::Step(PrepStep::Go),
            ),
            (self.completes_at_ms(), PrepTrigger::Complete),
        ]
    }
}
