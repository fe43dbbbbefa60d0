//! # Intervalrun Core Library
//!
//! This library provides the core logic for the Intervalrun run/walk
//! interval timer. The CLI binary is a thin layer over the same core.
//!
//! ## Architecture
//!
//! - **Segment planner**: turns total/run/walk minutes into an ordered plan
//! - **Session engine**: a caller-clocked state machine (prep countdown,
//!   one-second ticks, pause/resume) driven through cancelable triggers
//! - **Cues**: fixed sound/vibration palette with a single exclusive
//!   playback slot
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SessionController`]: Owns a session's timeline and state
//! - [`Plan`]: Segment planner output
//! - [`CueDispatcher`]: Cue lookup and playback-slot discipline
//! - [`Platform`]: Traits for audio, vibration and keep-awake backends
//! - [`Config`]: Application configuration management

pub mod cue;
pub mod error;
pub mod events;
pub mod platform;
pub mod storage;
pub mod timer;

pub use cue::{Cue, CueDispatcher, CueKind, CueSettings, DispatchStats, SoundAsset, VibrationPattern};
pub use error::{ConfigError, CoreError, CueError, DurationField, PlanError};
pub use events::Event;
pub use platform::{AudioBackend, Haptics, KeepAwake, Platform, PlatformCall, RecordingPlatform, SoundId};
pub use storage::Config;
pub use timer::{
    Command, Phase, Plan, PrepStep, Segment, SegmentKind, SessionController, SessionInputs,
    SessionState, Status,
};
