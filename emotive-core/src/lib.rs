//! # Emotive Core - affect layer for a conversational agent
//!
//! Keeps a mutable emotional/personality state per conversation, mutates it
//! from user text and shapes the bot's replies around it.
//!
//! This crate provides:
//! - Affect state and sessions (`affect`) - emotions, traits, per-conversation context
//! - Modifier rules (`modifiers`) - trigger words that shift emotions
//! - Presentation (`presentation`) - leading trait/emotion, color and voice hints
//! - Extreme responses (`extreme`) - canned outbursts when patience runs out
//! - Conditional text (`format`) - `[Emotion;expr;text]` blocks in replies
//! - Debug mode (`debug`) - inspect and edit values from the chat box
//! - Orchestration (`pipeline`) - one user message in, one reply out
//! - Collaborators (`collab`) - NLU, speech and audio asset traits

#![warn(missing_docs)]

pub mod affect;
pub mod collab;
pub mod config;
pub mod debug;
pub mod error;
pub mod extreme;
pub mod format;
pub mod logging;
pub mod message;
pub mod modifiers;
pub mod pipeline;
pub mod prelude;
pub mod presentation;

pub use error::{Error, Result};
