//! Session controller.
//!
//! Owns the whole session timeline: the session state, the scheduler with
//! every outstanding trigger, the cue dispatcher and the platform. Callers
//! feed it a monotonic clock in milliseconds via [`SessionController::advance_to`]
//! and issue commands; it never reads a clock itself.
//!
//! ```ignore
//! let mut controller = SessionController::new(platform, CueSettings::default());
//! controller.start(SessionInputs::new(30.0, 4.0, 1.0), now_ms())?;
//! // In a loop:
//! for event in controller.advance_to(now_ms()) { render(&event) }
//! ```

use chrono::Utc;
use tracing::{debug, info};

use super::engine::{Phase, SessionState, Status, TickEngine, TickOutcome};
use super::plan::{Plan, SessionInputs};
use super::prep::{PrepCountdown, PrepStep, PrepTrigger};
use super::scheduler::{Scheduler, TimerHandle};
use crate::cue::{CueDispatcher, CueSettings, DispatchStats};
use crate::error::PlanError;
use crate::events::Event;
use crate::platform::Platform;

/// Tick period of the session timeline.
pub const TICK_MS: u64 = 1000;

/// Commands coming from the UI layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Start(SessionInputs),
    Pause,
    Resume,
    TogglePause,
    Stop,
    ToggleLock,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start(_) => "start",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::TogglePause => "toggle_pause",
            Command::Stop => "stop",
            Command::ToggleLock => "toggle_lock",
        }
    }

    /// Commands the lock gate refuses.
    fn is_gated(&self) -> bool {
        matches!(
            self,
            Command::Pause | Command::Resume | Command::TogglePause | Command::Stop
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerTask {
    Prep(PrepTrigger),
    Tick,
}

pub struct SessionController<P: Platform> {
    platform: P,
    state: SessionState,
    engine: Option<TickEngine>,
    prep: Option<PrepCountdown>,
    scheduler: Scheduler<TimerTask>,
    prep_handles: Vec<TimerHandle>,
    tick_handle: Option<TimerHandle>,
    cues: CueDispatcher,
}

impl<P: Platform> SessionController<P> {
    pub fn new(platform: P, settings: CueSettings) -> Self {
        Self {
            platform,
            state: SessionState::default(),
            engine: None,
            prep: None,
            scheduler: Scheduler::new(),
            prep_handles: Vec::new(),
            tick_handle: None,
            cues: CueDispatcher::new(settings),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.engine.as_ref().map(|e| e.plan())
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.cues.stats()
    }

    /// Earliest pending trigger, for drivers that sleep until the next deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    /// When the running prep countdown hands off to the first segment.
    pub fn prep_completes_at(&self) -> Option<u64> {
        self.prep.as_ref().map(|p| p.completes_at_ms())
    }

    /// Number of triggers still armed.
    pub fn pending_triggers(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn progress_pct(&self) -> f64 {
        self.engine
            .as_ref()
            .map(|e| e.progress_pct(&self.state))
            .unwrap_or(0.0)
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            progress_pct: self.progress_pct(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Entry point for the UI layer. Pause, resume and stop are refused
    /// while the session is locked.
    pub fn handle(&mut self, command: Command, now_ms: u64) -> Result<Vec<Event>, PlanError> {
        if self.state.locked && command.is_gated() {
            debug!(command = command.name(), "command rejected: locked");
            return Ok(vec![Event::CommandRejected {
                command: command.name().to_string(),
                reason: "session is locked".to_string(),
                at: Utc::now(),
            }]);
        }
        let events = match command {
            Command::Start(inputs) => return self.start(inputs, now_ms),
            Command::Pause => self.pause().into_iter().collect(),
            Command::Resume => self.resume().into_iter().collect(),
            Command::TogglePause => self.toggle_pause().into_iter().collect(),
            Command::Stop => vec![self.stop()],
            Command::ToggleLock => vec![self.toggle_lock()],
        };
        Ok(events)
    }

    /// Validate inputs, build the plan and begin the prep countdown.
    ///
    /// Does nothing while a session is in progress. On invalid input the
    /// controller is left untouched.
    pub fn start(&mut self, inputs: SessionInputs, now_ms: u64) -> Result<Vec<Event>, PlanError> {
        if self.state.status.is_active() {
            debug!(status = ?self.state.status, "start ignored: session in progress");
            return Ok(Vec::new());
        }
        let plan = Plan::build(&inputs)?;
        info!(
            segments = plan.len(),
            total_secs = plan.total_secs(),
            "session starting"
        );

        self.cancel_triggers();
        self.cues.reset_stats();
        let locked = self.state.locked;
        self.state = SessionState {
            locked,
            ..SessionState::default()
        };

        let mut events = vec![Event::SessionStarted {
            segments: plan.len(),
            total_secs: plan.total_secs(),
            at: Utc::now(),
        }];
        self.engine = Some(TickEngine::new(plan));
        self.platform.set_keep_awake(true);

        let (prep, cue) = PrepCountdown::begin(&mut self.state, now_ms);
        self.cues.dispatch(cue, &mut self.platform);
        events.push(self.prep_event());

        for (deadline, trigger) in prep.pending_triggers() {
            let handle = self.scheduler.schedule_once(deadline, TimerTask::Prep(trigger));
            self.prep_handles.push(handle);
        }
        self.prep = Some(prep);
        Ok(events)
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state.status != Status::Running {
            return None;
        }
        self.state.status = Status::Paused;
        info!(seconds_left = self.state.seconds_left_in_phase, "session paused");
        Some(Event::SessionPaused {
            seconds_left: self.state.seconds_left_in_phase,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state.status != Status::Paused {
            return None;
        }
        self.state.status = Status::Running;
        info!(seconds_left = self.state.seconds_left_in_phase, "session resumed");
        Some(Event::SessionResumed {
            seconds_left: self.state.seconds_left_in_phase,
            at: Utc::now(),
        })
    }

    pub fn toggle_pause(&mut self) -> Option<Event> {
        match self.state.status {
            Status::Running => self.pause(),
            Status::Paused => self.resume(),
            _ => None,
        }
    }

    /// Cancel every trigger, release all audio and return to Idle.
    /// Callable from any status.
    pub fn stop(&mut self) -> Event {
        self.cancel_triggers();
        self.cues.release_all(&mut self.platform);
        self.platform.set_keep_awake(false);
        self.engine = None;
        self.prep = None;
        if self.state.status != Status::Idle {
            info!(status = ?self.state.status, "session stopped");
        }
        self.state = SessionState::default();
        Event::SessionReset { at: Utc::now() }
    }

    pub fn reset(&mut self) -> Event {
        self.stop()
    }

    pub fn toggle_lock(&mut self) -> Event {
        self.state.locked = !self.state.locked;
        Event::LockToggled {
            locked: self.state.locked,
            at: Utc::now(),
        }
    }

    /// Fire every trigger due at or before `now_ms`, in deadline order.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some((deadline, handle, task)) = self.scheduler.pop_due(now_ms) {
            match task {
                TimerTask::Prep(trigger) => {
                    self.prep_handles.retain(|h| *h != handle);
                    self.on_prep(trigger, deadline, &mut events);
                }
                TimerTask::Tick => self.on_tick(&mut events),
            }
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn on_prep(&mut self, trigger: PrepTrigger, deadline: u64, events: &mut Vec<Event>) {
        match trigger {
            PrepTrigger::Step(step) => {
                let cue = PrepCountdown::apply(step, &mut self.state);
                self.cues.dispatch(cue, &mut self.platform);
                events.push(self.prep_event());
            }
            PrepTrigger::Complete => self.on_prep_complete(deadline, events),
        }
    }

    fn on_prep_complete(&mut self, deadline: u64, events: &mut Vec<Event>) {
        self.prep = None;
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let first = engine.plan().get(0).copied();
        self.cues.start_keep_alive(&mut self.platform);
        if let Some(cue) = engine.enter_first(&mut self.state) {
            self.cues.dispatch(cue, &mut self.platform);
        }
        let Some(first) = first else {
            self.finish(events);
            return;
        };
        info!("prep complete, first segment running");
        events.push(Event::SessionBegan {
            kind: first.kind,
            duration_secs: first.duration_secs,
            at: Utc::now(),
        });
        // Anchored to the prep deadline, not to when we got here.
        self.tick_handle = Some(self.scheduler.schedule_repeating(
            deadline + TICK_MS,
            TICK_MS,
            TimerTask::Tick,
        ));
    }

    fn on_tick(&mut self, events: &mut Vec<Event>) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let outcome = engine.tick(&mut self.state);
        if !outcome.counted() {
            return;
        }
        events.push(Event::Ticked {
            segment_index: self.state.segment_index,
            seconds_left: self.state.seconds_left_in_phase,
            elapsed_total_secs: self.state.elapsed_total_secs,
            at: Utc::now(),
        });
        if let Some(cue) = outcome.cue() {
            self.cues.dispatch(cue, &mut self.platform);
        }
        match outcome {
            TickOutcome::Advanced {
                segment_index,
                segment,
                ..
            } => {
                debug!(segment_index, kind = ?segment.kind, "segment started");
                events.push(Event::SegmentStarted {
                    segment_index,
                    kind: segment.kind,
                    duration_secs: segment.duration_secs,
                    at: Utc::now(),
                });
            }
            TickOutcome::Warning { seconds_left, cue } => {
                events.push(Event::CountdownWarning {
                    segment_index: self.state.segment_index,
                    phase: self.state.phase,
                    seconds_left,
                    cue,
                    at: Utc::now(),
                });
            }
            TickOutcome::Finished => self.finish(events),
            _ => {}
        }
    }

    fn finish(&mut self, events: &mut Vec<Event>) {
        if let Some(handle) = self.tick_handle.take() {
            self.scheduler.cancel(handle);
        }
        self.cues.stop_keep_alive(&mut self.platform);
        self.platform.set_keep_awake(false);
        let segments = self.plan().map(|p| p.len()).unwrap_or(0);
        info!(
            segments,
            elapsed_total_secs = self.state.elapsed_total_secs,
            "session complete"
        );
        events.push(Event::SessionCompleted {
            segments,
            elapsed_total_secs: self.state.elapsed_total_secs,
            at: Utc::now(),
        });
    }

    fn prep_event(&self) -> Event {
        let step = match self.state.phase {
            Phase::Set => PrepStep::Set,
            Phase::Go => PrepStep::Go,
            _ => PrepStep::Ready,
        };
        Event::PrepStep {
            step,
            seconds_left: self.state.seconds_left_in_phase,
            at: Utc::now(),
        }
    }

    fn cancel_triggers(&mut self) {
        for handle in self.prep_handles.drain(..) {
            self.scheduler.cancel(handle);
        }
        if let Some(handle) = self.tick_handle.take() {
            self.scheduler.cancel(handle);
        }
        self.scheduler.cancel_all();
    }
}
