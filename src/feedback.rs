//! Sound and haptic feedback channels.
//!
//! The engine never sees a feedback failure: `Feedback` wraps the host's
//! player and emitter, logs anything that goes wrong and carries on.

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Loops while the user is holding.
    Hold,
    /// Played once per completed charge.
    Success,
    /// Played on a full reset.
    Reset,
}

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("sound cue {0:?} is not loaded")]
    CueUnavailable(SoundCue),
    #[error("playback of {cue:?} failed: {reason}")]
    Playback { cue: SoundCue, reason: String },
    #[error("haptics unavailable: {0}")]
    HapticsUnavailable(String),
}

pub trait SoundPlayer {
    fn play(&mut self, cue: SoundCue) -> Result<(), FeedbackError>;
    fn pause(&mut self, cue: SoundCue) -> Result<(), FeedbackError>;
    fn seek_to_start(&mut self, cue: SoundCue) -> Result<(), FeedbackError>;
}

pub trait Haptics {
    /// Fire-and-forget vibration pattern, durations in milliseconds.
    fn pulse(&mut self, pattern_ms: &[u32]) -> Result<(), FeedbackError>;
}

/// No-op player and emitter for hosts without audio or a vibration motor.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl SoundPlayer for Silent {
    fn play(&mut self, _cue: SoundCue) -> Result<(), FeedbackError> {
        Ok(())
    }
    fn pause(&mut self, _cue: SoundCue) -> Result<(), FeedbackError> {
        Ok(())
    }
    fn seek_to_start(&mut self, _cue: SoundCue) -> Result<(), FeedbackError> {
        Ok(())
    }
}

impl Haptics for Silent {
    fn pulse(&mut self, _pattern_ms: &[u32]) -> Result<(), FeedbackError> {
        Ok(())
    }
}

pub struct Feedback {
    sound: Box<dyn SoundPlayer>,
    haptics: Box<dyn Haptics>,
}

impl Default for Feedback {
    fn default() -> Self {
        Self::silent()
    }
}

impl Feedback {
    pub fn new(sound: Box<dyn SoundPlayer>, haptics: Box<dyn Haptics>) -> Self {
        Self { sound, haptics }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(Silent), Box::new(Silent))
    }

    pub fn play(&mut self, cue: SoundCue) {
        if let Err(e) = self.sound.play(cue) {
            log::warn!("[feedback] failed to play {:?} cue: {}", cue, e);
        }
    }

    /// Rewind then play, so a cue that already ran starts from the top.
    pub fn replay(&mut self, cue: SoundCue) {
        if let Err(e) = self.sound.seek_to_start(cue) {
            log::warn!("[feedback] failed to rewind {:?} cue: {}", cue, e);
        }
        self.play(cue);
    }

    pub fn pause(&mut self, cue: SoundCue) {
        if let Err(e) = self.sound.pause(cue) {
            log::warn!("[feedback] failed to pause {:?} cue: {}", cue, e);
        }
    }

    pub fn pulse(&mut self, pattern_ms: &[u32]) {
        if let Err(e) = self.haptics.pulse(pattern_ms) {
            log::warn!("[feedback] haptic pulse {:?} dropped: {}", pattern_ms, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Broken(Rc<RefCell<u32>>);

    impl SoundPlayer for Broken {
        fn play(&mut self, cue: SoundCue) -> Result<(), FeedbackError> {
            *self.0.borrow_mut() += 1;
            Err(FeedbackError::CueUnavailable(cue))
        }
        fn pause(&mut self, cue: SoundCue) -> Result<(), FeedbackError> {
            Err(FeedbackError::Playback {
                cue,
                reason: "device gone".into(),
            })
        }
        fn seek_to_start(&mut self, cue: SoundCue) -> Result<(), FeedbackError> {
            Err(FeedbackError::CueUnavailable(cue))
        }
    }

    impl Haptics for Broken {
        fn pulse(&mut self, _pattern_ms: &[u32]) -> Result<(), FeedbackError> {
            Err(FeedbackError::HapticsUnavailable("no motor".into()))
        }
    }

    #[test]
    fn failures_are_absorbed() {
        let calls = Rc::new(RefCell::new(0));
        let mut fb = Feedback::new(
            Box::new(Broken(calls.clone())),
            Box::new(Broken(calls.clone())),
        );
        fb.play(SoundCue::Hold);
        fb.replay(SoundCue::Reset);
        fb.pause(SoundCue::Hold);
        fb.pulse(&[50, 50, 50]);
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn error_messages_name_the_cue() {
        let e = FeedbackError::CueUnavailable(SoundCue::Success);
        assert_eq!(e.to_string(), "sound cue Success is not loaded");
    }
}
