use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cue::CueKind;
use crate::timer::{Phase, PrepStep, SegmentKind, SessionState};

/// Every state change in a session produces an Event.
/// The UI layer renders from these and from [`SessionState`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        segments: usize,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    PrepStep {
        step: PrepStep,
        seconds_left: u64,
        at: DateTime<Utc>,
    },
    /// Prep finished and the first segment began.
    SessionBegan {
        kind: SegmentKind,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// One second of the plan was consumed.
    Ticked {
        segment_index: usize,
        seconds_left: u64,
        elapsed_total_secs: u64,
        at: DateTime<Utc>,
    },
    SegmentStarted {
        segment_index: usize,
        kind: SegmentKind,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    CountdownWarning {
        segment_index: usize,
        phase: Phase,
        seconds_left: u64,
        cue: CueKind,
        at: DateTime<Utc>,
    },
    SessionPaused {
        seconds_left: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        seconds_left: u64,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        segments: usize,
        elapsed_total_secs: u64,
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
    LockToggled {
        locked: bool,
        at: DateTime<Utc>,
    },
    /// A UI command was refused by the lock gate.
    CommandRejected {
        command: String,
        reason: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SessionState,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}
