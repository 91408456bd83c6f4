//! Debug/analysis mode: inspect and edit affect values from the chat box
//!
//! While a conversation is in debug mode its messages never reach the NLU
//! backend. Commands are recognized by their first word:
//!
//! - `what is patience`, `get desire` → read a value
//! - `set patience -0.5`, `change curiosity to 1` → write a value
//! - `mute`, `unmute`, `play`, `toggle` → flip audio output

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::affect::{choose, AffectKind, AffectState, RandomSource};
use crate::collab::AudioSwitch;
use crate::format::find_numeral;

/// Reply when the first word matches no command
pub const UNKNOWN_COMMAND: &str = "(DEBUG): Warning! No known command recognized.";

/// Debug-mode flag of one conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugState {
    /// Whether messages are routed to the interpreter
    pub active: bool,
}

/// Command family selected by the first word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    /// Read a trait or emotion
    CheckValue,
    /// Write a trait or emotion
    SetValue,
    /// Toggle audio output
    ToggleAudio,
    /// Anything else
    Unknown,
}

/// Phrase and keyword sets of the debug grammar
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Whole-message phrases that enter debug mode
    pub enter_phrases: Vec<String>,
    /// Whole-message phrases that leave debug mode
    pub exit_phrases: Vec<String>,
    /// Replies on entering
    pub intro_messages: Vec<String>,
    /// Replies on leaving
    pub outro_messages: Vec<String>,
    /// First words of a read command
    pub check_keywords: Vec<String>,
    /// First words of a write command
    pub set_keywords: Vec<String>,
    /// First words of an audio toggle
    pub audio_keywords: Vec<String>,
    /// Background color of debug replies
    pub color: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enter_phrases: strings(&[
                "analysis",
                "enter analysis",
                "analysis mode",
                "enter analysis mode",
                "debug",
                "enter debug",
                "debug mode",
                "enter debug mode",
            ]),
            exit_phrases: strings(&[
                "exit",
                "exit analysis",
                "exit analysis mode",
                "exit debug",
                "exit debug mode",
                "normal mode",
                "resume",
                "back to normal",
                "go back to normal",
            ]),
            intro_messages: strings(&[
                "(DEBUG): Entering debug mode.",
                "(DEBUG): Entering analysis mode.",
                "(DEBUG): Beep boop. Analysis mode now enabled.",
                "(DEBUG): Analysis mode enabled.",
                "(DEBUG): Switched to debug mode.",
                "(DEBUG): Switched to analysis mode.",
            ]),
            outro_messages: strings(&[
                "Right! Where were we?",
                "Huh? What just happened?",
                "That was weird.",
                "Get out of my head, you weirdo.",
                "Huh? I feel different somehow.",
                "Back to normal, then.",
                "Alright then.",
            ]),
            check_keywords: strings(&["how", "what", "what's", "get"]),
            set_keywords: strings(&["set", "change"]),
            audio_keywords: strings(&["mute", "unmute", "play", "toggle"]),
            color: "#DFDFDF".to_string(),
        }
    }
}

/// Interprets debug-mode messages
#[derive(Debug, Clone)]
pub struct DebugInterpreter {
    config: DebugConfig,
    audio: Arc<AudioSwitch>,
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// `patience?` → `Patience`
///
/// Surrounding punctuation is stripped, so `what is patience?` resolves
/// instead of being reported as naming no trait or emotion.
fn as_key(word: &str) -> String {
    let word = word.trim_matches(|c: char| !c.is_alphanumeric());
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// First word naming a trait (checked first) or an emotion
fn resolve_key<'w>(
    state: &AffectState,
    words: impl IntoIterator<Item = &'w str>,
) -> Option<(AffectKind, String)> {
    words.into_iter().map(as_key).find_map(|key| {
        if state.contains(AffectKind::Trait, &key) {
            Some((AffectKind::Trait, key))
        } else if state.contains(AffectKind::Emotion, &key) {
            Some((AffectKind::Emotion, key))
        } else {
            None
        }
    })
}

impl DebugInterpreter {
    /// Create an interpreter that toggles `audio`
    pub fn new(config: DebugConfig, audio: Arc<AudioSwitch>) -> Self {
        Self { config, audio }
    }

    /// Active configuration
    pub fn config(&self) -> &DebugConfig {
        &self.config
    }

    /// Background color for debug replies
    pub fn color(&self) -> &str {
        &self.config.color
    }

    /// Whether `text` is exactly an enter phrase (trimmed, case-insensitive)
    pub fn wants_to_enter(&self, text: &str) -> bool {
        self.config.enter_phrases.contains(&normalize(text))
    }

    /// Whether `text` is exactly an exit phrase (trimmed, case-insensitive)
    pub fn wants_to_exit(&self, text: &str) -> bool {
        self.config.exit_phrases.contains(&normalize(text))
    }

    /// Switch debug mode on and return an intro line
    pub fn enter(&self, debug: &mut DebugState, rng: &mut dyn RandomSource) -> String {
        debug.active = true;
        info!("Entering debug mode");
        choose(rng, &self.config.intro_messages).cloned().unwrap_or_default()
    }

    /// Switch debug mode off and return an outro line
    pub fn exit(&self, debug: &mut DebugState, rng: &mut dyn RandomSource) -> String {
        debug.active = false;
        info!("Leaving debug mode");
        choose(rng, &self.config.outro_messages).cloned().unwrap_or_default()
    }

    /// Which command family `text` belongs to
    pub fn classify(&self, text: &str) -> DebugCommand {
        let normalized = normalize(text);
        let Some(first) = normalized.split_whitespace().next() else {
            return DebugCommand::Unknown;
        };
        let has = |set: &[String]| set.iter().any(|k| k == first);

        if has(&self.config.check_keywords) {
            DebugCommand::CheckValue
        } else if has(&self.config.set_keywords) {
            DebugCommand::SetValue
        } else if has(&self.config.audio_keywords) {
            DebugCommand::ToggleAudio
        } else {
            DebugCommand::Unknown
        }
    }

    /// Execute a debug command (not an enter/exit phrase) and return the reply
    pub fn parse_command(&self, state: &mut AffectState, text: &str) -> String {
        let normalized = normalize(text);
        let rest = normalized
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest)
            .unwrap_or("");

        match self.classify(&normalized) {
            DebugCommand::CheckValue => self.check_value(state, rest),
            DebugCommand::SetValue => self.set_value(state, rest),
            DebugCommand::ToggleAudio => self.toggle_audio(),
            DebugCommand::Unknown => UNKNOWN_COMMAND.to_string(),
        }
    }

    fn check_value(&self, state: &AffectState, rest: &str) -> String {
        let Some((kind, key)) = resolve_key(state, rest.split_whitespace()) else {
            return "(DEBUG): WARNING! Attempted to parse command as \"checkValue()\", but no matching trait or emotion was found.".to_string();
        };
        let value = state.get(kind, &key).unwrap_or_default();
        match kind {
            AffectKind::Trait => format!(
                "(DEBUG): Personality trait \"{}\" is currently set to: {:?}.",
                key, value
            ),
            AffectKind::Emotion => {
                format!("(DEBUG): Emotion \"{}\" is currently set to: {:?}.", key, value)
            }
        }
    }

    fn set_value(&self, state: &mut AffectState, rest: &str) -> String {
        let Some((kind, key)) = resolve_key(state, rest.split_whitespace()) else {
            return "(DEBUG): WARNING! Attempted to parse command as \"setValue()\" but no matching trait or emotion was found.".to_string();
        };
        let Some((_, requested)) = find_numeral(rest) else {
            return format!(
                "(DEBUG): WARNING! Attempted to parse command as \"setValue()\". Emotion/trait \"{}\" was found but no valid float value could be detected in your command.",
                key
            );
        };

        match state.set(kind, &key, requested) {
            Ok(stored) => {
                info!(kind = %kind, key = %key, requested, stored, "Debug set value");
                match kind {
                    AffectKind::Trait => format!(
                        "(DEBUG): Personality trait altered: {} has been set to {:?}.",
                        key, stored
                    ),
                    AffectKind::Emotion => {
                        format!("(DEBUG): Emotion altered: {} has been set to {:?}.", key, stored)
                    }
                }
            }
            Err(e) => format!("(DEBUG): WARNING! Could not set {}: {}.", key, e),
        }
    }

    fn toggle_audio(&self) -> String {
        if self.audio.toggle() {
            "(DEBUG): Audio output has been enabled.".to_string()
        } else {
            "(DEBUG): Audio output has been disabled.".to_string()
        }
    }
}

impl Default for DebugInterpreter {
    fn default() -> Self {
        Self::new(DebugConfig::default(), Arc::new(AudioSwitch::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affect::{ScriptedRandom, PATIENCE};

    #[test]
    fn test_enter_and_exit_phrases() {
        let interp = DebugInterpreter::default();
        assert!(interp.wants_to_enter("  Debug "));
        assert!(interp.wants_to_enter("ENTER ANALYSIS MODE"));
        assert!(!interp.wants_to_enter("debug please"));
        assert!(interp.wants_to_exit("Back to normal"));
        assert!(!interp.wants_to_exit("debug"));
    }

    #[test]
    fn test_enter_exit_flip_state() {
        let interp = DebugInterpreter::default();
        let mut debug = DebugState::default();
        let mut rng = ScriptedRandom::new().with_indices([2, 6]);

        let intro = interp.enter(&mut debug, &mut rng);
        assert!(debug.active);
        assert_eq!(intro, "(DEBUG): Beep boop. Analysis mode now enabled.");

        let outro = interp.exit(&mut debug, &mut rng);
        assert!(!debug.active);
        assert_eq!(outro, "Alright then.");
    }

    #[test]
    fn test_classify() {
        let interp = DebugInterpreter::default();
        assert_eq!(interp.classify("What's patience"), DebugCommand::CheckValue);
        assert_eq!(interp.classify("change desire 1"), DebugCommand::SetValue);
        assert_eq!(interp.classify("mute"), DebugCommand::ToggleAudio);
        assert_eq!(interp.classify("banana"), DebugCommand::Unknown);
        assert_eq!(interp.classify("   "), DebugCommand::Unknown);
    }

    #[test]
    fn test_check_value() {
        let interp = DebugInterpreter::default();
        let mut state = AffectState::default();

        assert_eq!(
            interp.parse_command(&mut state, "what is patience?"),
            "(DEBUG): Emotion \"Patience\" is currently set to: 0.0."
        );
        assert_eq!(
            interp.parse_command(&mut state, "get default"),
            "(DEBUG): Personality trait \"Default\" is currently set to: 0.2."
        );
        assert!(interp
            .parse_command(&mut state, "how are you")
            .contains("no matching trait or emotion"));
    }

    #[test]
    fn test_set_value() {
        let interp = DebugInterpreter::default();
        let mut state = AffectState::default();

        assert_eq!(
            interp.parse_command(&mut state, "set patience to -0.5"),
            "(DEBUG): Emotion altered: Patience has been set to -0.5."
        );
        assert_eq!(state.emotion(PATIENCE).unwrap(), -0.5);

        assert_eq!(
            interp.parse_command(&mut state, "change Desire 4"),
            "(DEBUG): Personality trait altered: Desire has been set to 1.0."
        );
        assert_eq!(state.trait_value("Desire").unwrap(), 1.0);
    }

    #[test]
    fn test_set_value_failures_do_not_mutate() {
        let interp = DebugInterpreter::default();
        let mut state = AffectState::default();
        let before = state.clone();

        assert!(interp
            .parse_command(&mut state, "set happiness 0.4")
            .contains("no matching trait or emotion"));
        assert!(interp
            .parse_command(&mut state, "set patience high")
            .contains("no valid float value"));
        assert_eq!(state, before);
    }

    #[test]
    fn test_unknown_command() {
        let interp = DebugInterpreter::default();
        let mut state = AffectState::default();
        let before = state.clone();
        assert_eq!(interp.parse_command(&mut state, "banana"), UNKNOWN_COMMAND);
        assert_eq!(state, before);
    }

    #[test]
    fn test_toggle_audio() {
        let audio = Arc::new(AudioSwitch::new(true));
        let interp = DebugInterpreter::new(DebugConfig::default(), audio.clone());
        let mut state = AffectState::default();

        assert_eq!(
            interp.parse_command(&mut state, "mute"),
            "(DEBUG): Audio output has been disabled."
        );
        assert!(!audio.is_enabled());
        assert_eq!(
            interp.parse_command(&mut state, "unmute audio"),
            "(DEBUG): Audio output has been enabled."
        );
    }
}
