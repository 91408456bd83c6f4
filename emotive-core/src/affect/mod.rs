//! Affect state model: values, per-conversation sessions and randomness

pub mod random;
pub mod session;
pub mod state;

pub use random::{choose, FastRandom, RandomSource, ScriptedRandom};
pub use session::{Conversation, SessionRegistry, DEFAULT_SESSION};
pub use state::{AffectKind, AffectState, DEFAULT_TRAIT, PATIENCE};
