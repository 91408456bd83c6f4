//! Prelude: Re-exports common types for convenience
//!
//! # Usage
//! ```
//! use emotive_core::prelude::*;
//! ```

pub use crate::error::{Error, Result};

// Affect
pub use crate::affect::{
    AffectKind, AffectState, Conversation, FastRandom, RandomSource, ScriptedRandom,
    SessionRegistry, DEFAULT_SESSION, DEFAULT_TRAIT, PATIENCE,
};

// Rules and shaping
pub use crate::debug::{DebugConfig, DebugInterpreter, DebugState};
pub use crate::extreme::{ExtremeConfig, ExtremeReply, ExtremeSelector};
pub use crate::format::TaggedTextFormatter;
pub use crate::modifiers::{ModifierConfig, ModifierEngine, ModifierRule, RuleSet};
pub use crate::presentation::{
    LeadingKeyMode, PresentationConfig, Presenter, Rgb, VoiceGender, VoiceParameters,
    VoiceProfile,
};

// Wiring
pub use crate::collab::{AudioAssets, AudioSwitch, IntentDetector, NoAudioAssets, SpeechSynthesizer};
pub use crate::config::AffectConfig;
pub use crate::message::{Message, Presentation};
pub use crate::pipeline::{ChatPipeline, ChatPipelineBuilder};
