//! Platform seams the session core calls into.
//!
//! Audio, vibration and keep-awake live outside the core. Every method is
//! expected to return immediately: implementations that talk to slow
//! hardware should hand the request off (a channel, a spawned task) rather
//! than block the timeline.

use serde::{Deserialize, Serialize};

use crate::cue::{SoundAsset, VibrationPattern};
use crate::error::CueError;

/// Backend-assigned identifier for a loaded sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SoundId(pub u64);

pub trait AudioBackend {
    /// Load and start playing `asset`. Looping sounds play until released.
    fn play(&mut self, asset: SoundAsset, looping: bool) -> Result<SoundId, CueError>;

    /// Stop and unload a sound previously returned by `play`.
    fn release(&mut self, id: SoundId) -> Result<(), CueError>;
}

pub trait Haptics {
    fn vibrate(&mut self, pattern: VibrationPattern) -> Result<(), CueError>;
}

pub trait KeepAwake {
    fn set_keep_awake(&mut self, on: bool);
}

/// Everything a session needs from the host platform.
pub trait Platform: AudioBackend + Haptics + KeepAwake {}

impl<T: AudioBackend + Haptics + KeepAwake> Platform for T {}

/// A single call observed by [`RecordingPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    Play {
        id: SoundId,
        asset: SoundAsset,
        looping: bool,
    },
    Release(SoundId),
    Vibrate(VibrationPattern),
    KeepAwake(bool),
}

/// In-memory platform that records every request.
///
/// Used by tests and by the CLI's silent mode. Failures can be injected to
/// exercise the dispatch boundary.
#[derive(Debug, Default)]
pub struct RecordingPlatform {
    calls: Vec<PlatformCall>,
    live: Vec<SoundId>,
    next_id: u64,
    keep_awake: bool,
    max_live_cues: usize,
    pub fail_play: bool,
    pub fail_release: bool,
    pub fail_vibrate: bool,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[PlatformCall] {
        &self.calls
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Sounds started and not yet released.
    pub fn live_sounds(&self) -> &[SoundId] {
        &self.live
    }

    /// Highest number of simultaneously live non-looping sounds seen.
    pub fn max_live_cues(&self) -> usize {
        self.max_live_cues
    }

    pub fn keep_awake(&self) -> bool {
        self.keep_awake
    }

    /// Assets played so far, in order, excluding looping keep-alive audio.
    pub fn played_assets(&self) -> Vec<SoundAsset> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PlatformCall::Play {
                    asset,
                    looping: false,
                    ..
                } => Some(*asset),
                _ => None,
            })
            .collect()
    }

    pub fn vibrations(&self) -> Vec<VibrationPattern> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PlatformCall::Vibrate(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    fn live_cues(&self) -> usize {
        self.live
            .iter()
            .filter(|id| {
                self.calls.iter().any(|c| {
                    matches!(c, PlatformCall::Play { id: pid, looping: false, .. } if pid == *id)
                })
            })
            .count()
    }
}

impl AudioBackend for RecordingPlatform {
    fn play(&mut self, asset: SoundAsset, looping: bool) -> Result<SoundId, CueError> {
        if self.fail_play {
            return Err(CueError::AssetLoad(asset.file_name().to_string()));
        }
        let id = SoundId(self.next_id);
        self.next_id += 1;
        self.calls.push(PlatformCall::Play { id, asset, looping });
        self.live.push(id);
        self.max_live_cues = self.max_live_cues.max(self.live_cues());
        Ok(id)
    }

    fn release(&mut self, id: SoundId) -> Result<(), CueError> {
        self.calls.push(PlatformCall::Release(id));
        // The sound is gone either way; the error only reports it.
        let known = self.live.contains(&id);
        self.live.retain(|l| *l != id);
        if self.fail_release {
            return Err(CueError::Unavailable("release failed".into()));
        }
        if !known {
            return Err(CueError::UnknownSound(id.0));
        }
        Ok(())
    }
}

impl Haptics for RecordingPlatform {
    fn vibrate(&mut self, pattern: VibrationPattern) -> Result<(), CueError> {
        if self.fail_vibrate {
            return Err(CueError::Unavailable("no vibration motor".into()));
        }
        self.calls.push(PlatformCall::Vibrate(pattern));
        Ok(())
    }
}

impl KeepAwake for RecordingPlatform {
    fn set_keep_awake(&mut self, on: bool) {
        self.keep_awake = on;
        self.calls.push(PlatformCall::KeepAwake(on));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_unknown_sound_is_an_error() {
        let mut p = RecordingPlatform::new();
        assert_eq!(p.release(SoundId(9)), Err(CueError::UnknownSound(9)));
    }

    #[test]
    fn tracks_live_cues() {
        let mut p = RecordingPlatform::new();
        let keep_alive = p.play(SoundAsset::Silence, true).unwrap();
        let a = p.play(SoundAsset::SwitchToRun, false).unwrap();
        let b = p.play(SoundAsset::RunCountdown, false).unwrap();
        assert_eq!(p.max_live_cues(), 2);
        p.release(a).unwrap();
        p.release(b).unwrap();
        assert_eq!(p.live_sounds(), &[keep_alive]);
        assert_eq!(
            p.played_assets(),
            vec![SoundAsset::SwitchToRun, SoundAsset::RunCountdown]
        );
    }
}
