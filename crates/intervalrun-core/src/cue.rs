//! Audio and vibration cues.
//!
//! [`CueKind`] maps every boundary event to a fixed sound and optional
//! vibration pattern. [`CueDispatcher`] owns the single playback slot and
//! the keep-alive slot: a held sound is always released before the next one
//! is requested, and the newest request wins.
//!
//! Backend failures stop here. They are logged and counted, never returned,
//! so the session timeline keeps running without audio.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::platform::{AudioBackend, Haptics, SoundId};
use crate::timer::{Phase, SegmentKind};

/// The fixed four-slot palette, plus the silent keep-alive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundAsset {
    SwitchToRun,
    OtherCountdown,
    SwitchToWalk,
    RunCountdown,
    Silence,
}

impl SoundAsset {
    pub fn file_name(&self) -> &'static str {
        match self {
            SoundAsset::SwitchToRun => "beep1.mp3",
            SoundAsset::OtherCountdown => "beep2.mp3",
            SoundAsset::SwitchToWalk => "beep3.mp3",
            SoundAsset::RunCountdown => "beep4.mp3",
            SoundAsset::Silence => "silence.mp3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VibrationPattern {
    /// Single long buzz, entering a run.
    LongBuzz,
    /// Two short buzzes, entering a walk.
    DoubleBuzz,
}

impl VibrationPattern {
    /// Alternating wait/vibrate durations in milliseconds.
    pub fn timings_ms(&self) -> &'static [u64] {
        match self {
            VibrationPattern::LongBuzz => &[0, 500, 0, 500],
            VibrationPattern::DoubleBuzz => &[0, 300, 100, 300],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    TransitionToRun,
    TransitionToWalk,
    WarningDuringRun,
    WarningDuringOther,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cue {
    pub sound: SoundAsset,
    pub vibration: Option<VibrationPattern>,
}

impl CueKind {
    pub fn cue(&self) -> Cue {
        match self {
            CueKind::TransitionToRun => Cue {
                sound: SoundAsset::SwitchToRun,
                vibration: Some(VibrationPattern::LongBuzz),
            },
            CueKind::TransitionToWalk => Cue {
                sound: SoundAsset::SwitchToWalk,
                vibration: Some(VibrationPattern::DoubleBuzz),
            },
            CueKind::WarningDuringRun => Cue {
                sound: SoundAsset::RunCountdown,
                vibration: None,
            },
            CueKind::WarningDuringOther => Cue {
                sound: SoundAsset::OtherCountdown,
                vibration: None,
            },
        }
    }

    /// Cue for entering a segment of `kind`.
    pub fn transition_to(kind: SegmentKind) -> Self {
        match kind {
            SegmentKind::Run => CueKind::TransitionToRun,
            SegmentKind::Walk => CueKind::TransitionToWalk,
        }
    }

    /// Countdown cue while `phase` is active.
    pub fn warning_during(phase: Phase) -> Self {
        match phase {
            Phase::Run => CueKind::WarningDuringRun,
            _ => CueKind::WarningDuringOther,
        }
    }

    pub fn is_transition(&self) -> bool {
        matches!(self, CueKind::TransitionToRun | CueKind::TransitionToWalk)
    }
}

/// Which cue channels are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueSettings {
    pub sound: bool,
    pub vibration: bool,
}

impl Default for CueSettings {
    fn default() -> Self {
        Self {
            sound: true,
            vibration: true,
        }
    }
}

/// Counters kept across a dispatcher's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    pub requested: u64,
    pub transitions: u64,
    pub warnings: u64,
    pub failures: u64,
}

#[derive(Debug, Default)]
pub struct CueDispatcher {
    settings: CueSettings,
    slot: Option<SoundId>,
    keep_alive: Option<SoundId>,
    stats: DispatchStats,
}

impl CueDispatcher {
    pub fn new(settings: CueSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DispatchStats::default();
    }

    /// The sound currently holding the playback slot.
    pub fn current_sound(&self) -> Option<SoundId> {
        self.slot
    }

    pub fn keep_alive_sound(&self) -> Option<SoundId> {
        self.keep_alive
    }

    /// Release whatever holds the playback slot, then play `kind`.
    pub fn dispatch<B>(&mut self, kind: CueKind, backend: &mut B)
    where
        B: AudioBackend + Haptics + ?Sized,
    {
        self.stats.requested += 1;
        if kind.is_transition() {
            self.stats.transitions += 1;
        } else {
            self.stats.warnings += 1;
        }

        let cue = kind.cue();
        debug!(?kind, sound = cue.sound.file_name(), "dispatching cue");

        if self.settings.sound {
            self.release_slot(backend);
            match backend.play(cue.sound, false) {
                Ok(id) => self.slot = Some(id),
                Err(e) => {
                    self.stats.failures += 1;
                    warn!(?kind, error = %e, "cue playback failed");
                }
            }
        }

        if let (true, Some(pattern)) = (self.settings.vibration, cue.vibration) {
            if let Err(e) = backend.vibrate(pattern) {
                self.stats.failures += 1;
                warn!(?pattern, error = %e, "vibration failed");
            }
        }
    }

    /// Start the looping silent track that keeps audio alive in the background.
    pub fn start_keep_alive<B>(&mut self, backend: &mut B)
    where
        B: AudioBackend + ?Sized,
    {
        if let Some(id) = self.keep_alive.take() {
            release_logged(backend, id, "keep-alive");
        }
        match backend.play(SoundAsset::Silence, true) {
            Ok(id) => self.keep_alive = Some(id),
            Err(e) => {
                self.stats.failures += 1;
                warn!(error = %e, "keep-alive audio failed to start");
            }
        }
    }

    pub fn stop_keep_alive<B>(&mut self, backend: &mut B)
    where
        B: AudioBackend + ?Sized,
    {
        if let Some(id) = self.keep_alive.take() {
            release_logged(backend, id, "keep-alive");
        }
    }

    /// Release both slots. Safe when nothing was ever acquired.
    pub fn release_all<B>(&mut self, backend: &mut B)
    where
        B: AudioBackend + ?Sized,
    {
        self.release_slot(backend);
        self.stop_keep_alive(backend);
    }

    fn release_slot<B>(&mut self, backend: &mut B)
    where
        B: AudioBackend + ?Sized,
    {
        if let Some(id) = self.slot.take() {
            release_logged(backend, id, "cue");
        }
    }
}

fn release_logged<B>(backend: &mut B, id: SoundId, what: &str)
where
    B: AudioBackend + ?Sized,
{
    if let Err(e) = backend.release(id) {
        warn!(sound = id.0, error = %e, "failed to release {what} sound");
    }
}
