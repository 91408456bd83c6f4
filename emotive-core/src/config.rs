//! Startup configuration of the affect layer
//!
//! Every section has defaults, so a YAML file only needs what it changes:
//!
//! ```yaml
//! state:
//!   emotions: { Patience: 0.5 }
//! modifiers:
//!   multiplier: 1.5
//!   rules_path: config/modifiers.json
//! extreme:
//!   max_patience: -0.4
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::affect::{AffectState, DEFAULT_TRAIT, PATIENCE};
use crate::debug::DebugConfig;
use crate::error::{Error, Result};
use crate::extreme::ExtremeConfig;
use crate::modifiers::ModifierConfig;
use crate::presentation::{high_key, low_key, PresentationConfig, Rgb};

/// Initial emotion and trait values of every new conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Emotion → initial value in `[-1, 1]`
    pub emotions: IndexMap<String, f32>,
    /// Trait → initial value in `[0, 1]`
    pub traits: IndexMap<String, f32>,
}

impl Default for StateConfig {
    fn default() -> Self {
        let state = AffectState::default();
        Self {
            emotions: state.emotions().clone(),
            traits: state.traits().clone(),
        }
    }
}

impl StateConfig {
    /// Build the initial affect state
    pub fn to_state(&self) -> AffectState {
        AffectState::new(self.emotions.clone(), self.traits.clone())
    }
}

/// Full configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AffectConfig {
    /// Initial values
    pub state: StateConfig,
    /// Modifier rules
    pub modifiers: ModifierConfig,
    /// Colors and voices
    pub presentation: PresentationConfig,
    /// Extreme responses
    pub extreme: ExtremeConfig,
    /// Debug grammar
    pub debug: DebugConfig,
    /// Language hint passed to the NLU backend
    pub language: String,
}

impl Default for AffectConfig {
    fn default() -> Self {
        Self {
            state: StateConfig::default(),
            modifiers: ModifierConfig::default(),
            presentation: PresentationConfig::default(),
            extreme: ExtremeConfig::default(),
            debug: DebugConfig::default(),
            language: "en-US".to_string(),
        }
    }
}

impl AffectConfig {
    /// Parse YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Read and parse a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Check that every emotion that can lead has a color pair, every trait
    /// that can lead has a voice profile, and thresholds are usable
    pub fn validate(&self) -> Result<()> {
        if !self.state.emotions.contains_key(PATIENCE) {
            return Err(Error::config(format!("state.emotions must define {}", PATIENCE)));
        }
        if !self.state.traits.contains_key(DEFAULT_TRAIT) {
            return Err(Error::config(format!("state.traits must define {}", DEFAULT_TRAIT)));
        }

        for emotion in self.state.emotions.keys() {
            for key in [low_key(emotion), high_key(emotion)] {
                let hex = self
                    .presentation
                    .colors
                    .get(&key)
                    .ok_or_else(|| Error::MissingColorEndpoint(key.clone()))?;
                Rgb::from_hex(hex)?;
            }
        }

        for trait_name in self.state.traits.keys() {
            if !self.presentation.voices.contains_key(trait_name) {
                return Err(Error::MissingVoiceProfile(trait_name.clone()));
            }
        }

        if !self.modifiers.multiplier.is_finite() {
            return Err(Error::config("modifiers.multiplier must be finite"));
        }

        self.extreme.validate()?;

        if self.debug.intro_messages.is_empty() || self.debug.outro_messages.is_empty() {
            return Err(Error::config("debug intro and outro messages must not be empty"));
        }
        Rgb::from_hex(&self.debug.color)?;

        if self.language.trim().is_empty() {
            return Err(Error::config("language must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::LeadingKeyMode;

    #[test]
    fn test_default_config_is_valid() {
        let config = AffectConfig::default();
        assert_eq!(config.language, "en-US");
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AffectConfig::from_yaml(
            r#"
state:
  emotions:
    Patience: 0.5
modifiers:
  multiplier: 1.5
presentation:
  leading_mode: magnitude
extreme:
  max_patience: -0.4
"#,
        )
        .unwrap();

        assert_eq!(config.state.emotions["Patience"], 0.5);
        assert_eq!(config.state.traits["Default"], 0.2);
        assert_eq!(config.modifiers.multiplier, 1.5);
        assert_eq!(config.presentation.leading_mode, LeadingKeyMode::Magnitude);
        assert_eq!(config.extreme.max_patience, -0.4);
        assert_eq!(config.extreme.recovery, 0.2);
        assert_eq!(config.language, "en-US");
        config.validate().unwrap();
    }

    #[test]
    fn test_missing_color_endpoint_fails_validation() {
        let mut config = AffectConfig::default();
        config.state.emotions.insert("Joy".to_string(), 0.0);
        config
            .presentation
            .colors
            .insert("Joy_LOW".to_string(), "#000000".to_string());

        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::MissingColorEndpoint(ref k) if k == "Joy_HIGH"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_voice_profile_fails_validation() {
        let mut config = AffectConfig::default();
        config.state.traits.insert("Wit".to_string(), 0.0);
        assert!(matches!(
            config.validate(),
            Err(Error::MissingVoiceProfile(ref t)) if t == "Wit"
        ));
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("affect.yaml");
        std::fs::write(&path, "language: nl-NL\n").unwrap();

        let config = AffectConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.language, "nl-NL");
        assert!(AffectConfig::from_yaml_file(dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_state_config_clamps() {
        let mut config = StateConfig::default();
        config.emotions.insert("Patience".to_string(), -7.0);
        assert_eq!(config.to_state().emotion("Patience").unwrap(), -1.0);
    }
}
