//! Traits for the services the affect layer talks to
//!
//! Implement these to plug in an NLU backend, a speech synthesizer or a
//! store of pre-recorded audio. Implementations live in `emotive-providers`.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::Result;
use crate::presentation::VoiceParameters;

/// Dialogue-intent lookup: user text in, raw reply text (possibly with
/// conditional blocks) out
#[async_trait]
pub trait IntentDetector: Send + Sync {
    /// Detect the intent of `text` and return the reply text
    ///
    /// `context` is the leading personality trait; backends use it to pick
    /// a persona-specific set of replies.
    async fn detect_intent(&self, text: &str, language: &str, context: &str) -> Result<String>;

    /// Backend name (for logging)
    fn name(&self) -> &'static str;
}

/// Text-to-speech
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Render `text` with the given voice; returns encoded audio (MP3)
    async fn synthesize(&self, text: &str, voice: &VoiceParameters) -> Result<Vec<u8>>;

    /// Backend name (for logging)
    fn name(&self) -> &'static str;
}

/// Pre-recorded audio keyed by file name (e.g. `goaway.mp3`)
#[async_trait]
pub trait AudioAssets: Send + Sync {
    /// Audio bytes for `key`, `None` when no such asset exists
    async fn lookup(&self, key: &str) -> Option<Vec<u8>>;
}

/// Assets source that never has anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAudioAssets;

#[async_trait]
impl AudioAssets for NoAudioAssets {
    async fn lookup(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }
}

/// Process-wide "should synthesize audio" flag
#[derive(Debug)]
pub struct AudioSwitch {
    enabled: AtomicBool,
}

impl AudioSwitch {
    /// Create with an initial state
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    /// Whether audio should be produced
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Force a state
    pub fn set(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Invert the flag; returns the new state
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::AcqRel)
    }
}

impl Default for AudioSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}
