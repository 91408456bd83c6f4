//! Extreme responses: canned outbursts that bypass the NLU backend when
//! patience runs low
//!
//! Below `max_patience` every message rolls against a chance that grows as
//! patience falls, up to `max_extreme_chance` at Patience = -1. Each outburst
//! restores a little patience so they don't come back to back.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::affect::{choose, AffectKind, AffectState, RandomSource, PATIENCE};
use crate::error::{Error, Result};
use crate::message::Presentation;
use crate::modifiers::ModifierEngine;

/// Thresholds, presentation overrides and canned lines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtremeConfig {
    /// Chance ceiling reached at Patience = -1
    pub max_extreme_chance: f32,
    /// Patience must be at or below this for an outburst to be possible
    pub max_patience: f32,
    /// At or below this the outburst is shouted in capitals
    pub max_patience_capslock: f32,
    /// Patience restored after each outburst
    pub recovery: f32,
    /// Font override
    pub font: String,
    /// Font size override (em)
    pub font_size: u32,
    /// Color override
    pub color: String,
    /// Canned replies
    pub responses: Vec<String>,
    /// Extension of pre-recorded audio files
    pub audio_extension: String,
}

impl Default for ExtremeConfig {
    fn default() -> Self {
        Self {
            max_extreme_chance: 0.5,
            max_patience: -0.3,
            max_patience_capslock: -0.9,
            recovery: 0.2,
            font: "Comic Sans MS".to_string(),
            font_size: 3,
            color: "#ff0000".to_string(),
            responses: [
                "Fuck you!",
                "Fuck off!",
                "Piss off!",
                "Not now!",
                "Go away!",
                "Shut up!",
                "Stop it!",
                "I'm done!",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            audio_extension: "mp3".to_string(),
        }
    }
}

impl ExtremeConfig {
    /// Reject thresholds that make the gate meaningless
    pub fn validate(&self) -> Result<()> {
        if !(self.max_patience > -1.0 && self.max_patience <= 1.0) {
            return Err(Error::config(format!(
                "extreme.max_patience must be in (-1, 1], got {}",
                self.max_patience
            )));
        }
        if !(0.0..=1.0).contains(&self.max_extreme_chance) {
            return Err(Error::config(format!(
                "extreme.max_extreme_chance must be in [0, 1], got {}",
                self.max_extreme_chance
            )));
        }
        if self.responses.is_empty() {
            return Err(Error::config("extreme.responses must not be empty"));
        }
        Ok(())
    }
}

/// A canned reply and how to present it
#[derive(Debug, Clone, PartialEq)]
pub struct ExtremeReply {
    /// Reply text, upper-cased when patience is very low
    pub content: String,
    /// Font, size and color overrides
    pub presentation: Presentation,
    /// File name of the matching pre-recorded audio
    pub audio_key: String,
}

/// File name of the pre-recorded audio for `text`: lower-cased, stripped of
/// everything but letters and digits, plus the extension
pub fn audio_key(text: &str, extension: &str) -> String {
    let stem: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    format!("{}.{}", stem, extension)
}

/// Decides on and produces extreme responses
#[derive(Debug, Clone)]
pub struct ExtremeSelector {
    config: ExtremeConfig,
}

impl ExtremeSelector {
    /// Create a selector
    pub fn new(config: ExtremeConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ExtremeConfig {
        &self.config
    }

    /// Roll for an outburst
    ///
    /// Returns false while Patience is above `max_patience`. Below it,
    /// patience is rescaled to `[0, 1]` over `[-1, max_patience]` and a draw
    /// in `(0, max_extreme_chance]` must exceed it.
    pub fn should_respond_extreme(
        &self,
        state: &AffectState,
        rng: &mut dyn RandomSource,
    ) -> Result<bool> {
        let patience = state.emotion(PATIENCE)?;
        if patience > self.config.max_patience {
            return Ok(false);
        }

        let (min, _) = AffectKind::Emotion.range();
        let normalized = (patience - min) / (self.config.max_patience - min);
        let roll = rng.unit() * self.config.max_extreme_chance;

        debug!(patience, normalized, roll, "Extreme response roll");
        Ok(roll > normalized)
    }

    /// Produce an outburst for `input`
    ///
    /// Trigger words in `input` still count, so modifiers are applied first.
    /// Patience recovers by `recovery` afterwards.
    pub fn produce_extreme(
        &self,
        state: &mut AffectState,
        modifiers: &ModifierEngine,
        input: &str,
        rng: &mut dyn RandomSource,
    ) -> Result<ExtremeReply> {
        modifiers.apply(state, input);

        let mut content = choose(rng, &self.config.responses)
            .cloned()
            .ok_or_else(|| Error::config("extreme.responses must not be empty"))?;
        if state.emotion(PATIENCE)? <= self.config.max_patience_capslock {
            content = content.to_uppercase();
        }

        let reply = ExtremeReply {
            audio_key: audio_key(&content, &self.config.audio_extension),
            presentation: Presentation {
                color: self.config.color.clone(),
                font: self.config.font.clone(),
                font_size: self.config.font_size,
            },
            content,
        };

        let patience = state.increment(AffectKind::Emotion, PATIENCE, self.config.recovery)?;
        info!(reply = %reply.content, patience, "Extreme response");
        Ok(reply)
    }
}

impl Default for ExtremeSelector {
    fn default() -> Self {
        Self::new(ExtremeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affect::ScriptedRandom;
    use crate::modifiers::{ModifierRule, RuleSet};

    fn state(patience: f32) -> AffectState {
        let mut state = AffectState::default();
        state.set(AffectKind::Emotion, PATIENCE, patience).unwrap();
        state
    }

    #[test]
    fn test_never_above_threshold() {
        let selector = ExtremeSelector::default();
        let mut rng = ScriptedRandom::new().with_units([1.0]);
        for p in [-0.29, 0.0, 1.0] {
            assert!(!selector.should_respond_extreme(&state(p), &mut rng).unwrap());
        }
    }

    #[test]
    fn test_always_at_rock_bottom() {
        let selector = ExtremeSelector::default();
        let mut rng = ScriptedRandom::new().with_units([1e-6, 0.5, 1.0]);
        for _ in 0..3 {
            assert!(selector.should_respond_extreme(&state(-1.0), &mut rng).unwrap());
        }
    }

    #[test]
    fn test_roll_must_exceed_normalized_patience() {
        let selector = ExtremeSelector::default();
        // p = -0.65 → normalized = 0.35 / 0.7 = 0.5
        let mut rng = ScriptedRandom::new().with_units([0.9]);
        assert!(!selector.should_respond_extreme(&state(-0.65), &mut rng).unwrap());

        // p = -0.93 → normalized = 0.1
        let mut rng = ScriptedRandom::new().with_units([0.1, 0.5]);
        assert!(!selector.should_respond_extreme(&state(-0.93), &mut rng).unwrap());
        assert!(selector.should_respond_extreme(&state(-0.93), &mut rng).unwrap());
    }

    #[test]
    fn test_produce_extreme_recovers_patience() {
        let selector = ExtremeSelector::default();
        let engine = ModifierEngine::new(RuleSet::default());
        let mut state = state(-0.5);
        let mut rng = ScriptedRandom::new().with_indices([4]);

        let reply = selector.produce_extreme(&mut state, &engine, "whatever", &mut rng).unwrap();

        assert_eq!(reply.content, "Go away!");
        assert_eq!(reply.audio_key, "goaway.mp3");
        assert_eq!(reply.presentation.color, "#ff0000");
        assert_eq!(reply.presentation.font, "Comic Sans MS");
        assert_eq!(reply.presentation.font_size, 3);
        assert!((state.emotion(PATIENCE).unwrap() - (-0.3)).abs() < 1e-6);
    }

    #[test]
    fn test_produce_extreme_applies_modifiers_then_shouts() {
        let selector = ExtremeSelector::default();
        let engine = ModifierEngine::new(RuleSet::new(vec![ModifierRule::new("Patience", "idiot", -0.1)]));
        let mut state = state(-0.75);
        let mut rng = ScriptedRandom::new().with_indices([7]);

        let reply = selector.produce_extreme(&mut state, &engine, "you idiot", &mut rng).unwrap();

        // -0.75 - 0.2 = -0.95 is below the capslock threshold
        assert_eq!(reply.content, "I'M DONE!");
        assert_eq!(reply.audio_key, "imdone.mp3");
        assert!((state.emotion(PATIENCE).unwrap() - (-0.75)).abs() < 1e-6);
    }

    #[test]
    fn test_audio_key() {
        assert_eq!(audio_key("Shut up!", "mp3"), "shutup.mp3");
        assert_eq!(audio_key("NOT NOW!", "ogg"), "notnow.ogg");
    }

    #[test]
    fn test_config_validation() {
        assert!(ExtremeConfig::default().validate().is_ok());
        let bad = ExtremeConfig {
            max_patience: -1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let empty = ExtremeConfig {
            responses: vec![],
            ..Default::default()
        };
        assert!(empty.validate().is_err());
    }
}
