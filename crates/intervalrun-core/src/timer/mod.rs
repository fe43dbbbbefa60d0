mod controller;
mod engine;
mod plan;
mod prep;
mod scheduler;

pub use controller::{Command, SessionController};
pub use engine::{Phase, SessionState, Status, TickEngine, TickOutcome};
pub use plan::{Plan, Segment, SegmentKind, SessionInputs, MAX_SEGMENTS};
pub use prep::{PrepCountdown, PrepStep, PrepTrigger, PREP_STEP_MS};
pub use scheduler::{Scheduler, TimerHandle};
