//! Emotion modifier rules and the engine that applies them to user text
//!
//! A rule ties a trigger word to an emotion delta, e.g. "please" raising
//! Patience a little. Rules are loaded once at startup from a flat JSON list:
//!
//! ```json
//! [{ "relevantEmotion": "Patience", "relevantWord": "please", "modification": 0.1 }]
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::affect::{AffectKind, AffectState};
use crate::error::{Error, Result};

/// One trigger word → emotion delta association
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierRule {
    /// Emotion to change
    #[serde(rename = "relevantEmotion")]
    pub emotion: String,
    /// Whole token that triggers the rule
    #[serde(rename = "relevantWord")]
    pub trigger_word: String,
    /// Amount added per occurrence, before the global multiplier
    #[serde(rename = "modification")]
    pub delta: f32,
}

impl ModifierRule {
    /// Create a rule
    pub fn new(emotion: impl Into<String>, trigger_word: impl Into<String>, delta: f32) -> Self {
        Self {
            emotion: emotion.into(),
            trigger_word: trigger_word.into(),
            delta,
        }
    }
}

/// Immutable list of modifier rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<ModifierRule>,
}

impl RuleSet {
    /// Wrap a list of rules
    pub fn new(rules: Vec<ModifierRule>) -> Self {
        Self { rules }
    }

    /// Parse the JSON list format
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read rules from a file, propagating any failure
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Read rules from a file; any failure yields an empty set so modifiers
    /// simply never fire
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(rules) => {
                info!(path = %path.display(), count = rules.len(), "Loaded emotion modifiers");
                rules
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not load emotion modifiers, continuing without");
                Self::default()
            }
        }
    }

    /// Write the rules back as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Rules in file order
    pub fn rules(&self) -> &[ModifierRule] {
        &self.rules
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Where the modifier rules come from and how hard they hit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierConfig {
    /// Global scale on every rule delta; higher means bigger mood swings
    pub multiplier: f32,
    /// JSON rule file, `None` for no rules
    pub rules_path: Option<PathBuf>,
}

impl Default for ModifierConfig {
    fn default() -> Self {
        Self {
            multiplier: 2.0,
            rules_path: Some(PathBuf::from("modifiers.json")),
        }
    }
}

/// Scans text for trigger words and applies matching rules
#[derive(Debug, Clone)]
pub struct ModifierEngine {
    rules: Arc<RuleSet>,
    /// Lower-cased trigger words, parallel to `rules`
    triggers: Vec<String>,
    multiplier: f32,
}

impl ModifierEngine {
    /// Engine over `rules` with the default multiplier of 2.0
    pub fn new(rules: RuleSet) -> Self {
        Self::with_multiplier(rules, ModifierConfig::default().multiplier)
    }

    /// Engine with an explicit multiplier
    pub fn with_multiplier(rules: RuleSet, multiplier: f32) -> Self {
        let triggers = rules
            .rules()
            .iter()
            .map(|r| r.trigger_word.to_lowercase())
            .collect();
        Self {
            rules: Arc::new(rules),
            triggers,
            multiplier,
        }
    }

    /// Build from configuration, loading the rule file if one is named
    pub fn from_config(config: &ModifierConfig) -> Self {
        let rules = config
            .rules_path
            .as_ref()
            .map(RuleSet::load)
            .unwrap_or_default();
        Self::with_multiplier(rules, config.multiplier)
    }

    /// Loaded rules
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Current global multiplier
    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Change the global multiplier
    pub fn set_multiplier(&mut self, multiplier: f32) -> Result<()> {
        if !multiplier.is_finite() {
            return Err(Error::config(format!("multiplier must be finite, got {}", multiplier)));
        }
        self.multiplier = multiplier;
        Ok(())
    }

    /// Apply every rule whose trigger word equals a whitespace token of
    /// `text` (case-insensitive). Returns how many rule hits were applied.
    pub fn apply(&self, state: &mut AffectState, text: &str) -> usize {
        let mut fired = 0;

        for token in text.split_whitespace() {
            let token = token.to_lowercase();
            for (rule, trigger) in self.rules.rules().iter().zip(&self.triggers) {
                if token != *trigger {
                    continue;
                }
                let before = state.emotion(&rule.emotion);
                match state.increment(AffectKind::Emotion, &rule.emotion, rule.delta * self.multiplier) {
                    Ok(after) => {
                        fired += 1;
                        debug!(
                            word = %rule.trigger_word,
                            emotion = %rule.emotion,
                            before = before.unwrap_or_default(),
                            after,
                            "Emotion modified"
                        );
                    }
                    Err(e) => warn!(word = %rule.trigger_word, error = %e, "Skipping modifier rule"),
                }
            }
        }

        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affect::PATIENCE;

    fn engine(rules: Vec<ModifierRule>) -> ModifierEngine {
        ModifierEngine::new(RuleSet::new(rules))
    }

    #[test]
    fn test_please_adds_scaled_delta() {
        let engine = engine(vec![ModifierRule::new("Patience", "please", 0.1)]);
        let mut state = AffectState::default();

        let fired = engine.apply(&mut state, "please help");

        assert_eq!(fired, 1);
        assert!((state.emotion(PATIENCE).unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_matching_is_case_insensitive_whole_token() {
        let engine = engine(vec![ModifierRule::new("Patience", "Idiot", -0.2)]);
        let mut state = AffectState::default();

        assert_eq!(engine.apply(&mut state, "you IDIOT"), 1);
        assert_eq!(engine.apply(&mut state, "idiotic idiots"), 0);
        assert!((state.emotion(PATIENCE).unwrap() - (-0.4)).abs() < 1e-6);
    }

    #[test]
    fn test_every_match_fires() {
        let engine = engine(vec![
            ModifierRule::new("Patience", "stupid", -0.1),
            ModifierRule::new("Patience", "stupid", -0.1),
            ModifierRule::new("Patience", "thanks", 0.05),
        ]);
        let mut state = AffectState::default();

        let fired = engine.apply(&mut state, "stupid stupid thanks");

        assert_eq!(fired, 5);
        assert!((state.emotion(PATIENCE).unwrap() - (-0.7)).abs() < 1e-6);
    }

    #[test]
    fn test_result_is_clamped() {
        let engine = engine(vec![ModifierRule::new("Patience", "ugh", -0.4)]);
        let mut state = AffectState::default();
        engine.apply(&mut state, "ugh ugh ugh ugh");
        assert_eq!(state.emotion(PATIENCE).unwrap(), -1.0);
    }

    #[test]
    fn test_unknown_emotion_is_skipped() {
        let engine = engine(vec![
            ModifierRule::new("Joy", "yay", 0.5),
            ModifierRule::new("Patience", "yay", 0.1),
        ]);
        let mut state = AffectState::default();
        assert_eq!(engine.apply(&mut state, "yay"), 1);
    }

    #[test]
    fn test_json_field_names() {
        let rules = RuleSet::from_json(
            r#"[{"relevantEmotion":"Patience","relevantWord":"please","modification":0.1}]"#,
        )
        .unwrap();
        assert_eq!(rules.rules()[0], ModifierRule::new("Patience", "please", 0.1));
    }

    #[test]
    fn test_load_failure_yields_empty_set() {
        let rules = RuleSet::load("/definitely/not/here/modifiers.json");
        assert!(rules.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modifiers.json");
        let rules = RuleSet::new(vec![
            ModifierRule::new("Patience", "please", 0.1),
            ModifierRule::new("Patience", "shut", -0.15),
        ]);

        rules.save(&path).unwrap();

        assert_eq!(RuleSet::load(&path), rules);
    }

    #[test]
    fn test_set_multiplier() {
        let mut engine = engine(vec![ModifierRule::new("Patience", "please", 0.1)]);
        engine.set_multiplier(5.0).unwrap();
        assert!(engine.set_multiplier(f32::NAN).is_err());

        let mut state = AffectState::default();
        engine.apply(&mut state, "please");
        assert!((state.emotion(PATIENCE).unwrap() - 0.5).abs() < 1e-6);
    }
}
