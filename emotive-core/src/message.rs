//! Chat message exchanged with the front-end

use base64::Engine;
use chrono::Local;
use serde::{Deserialize, Serialize};

/// Default font of normal replies
pub const DEFAULT_FONT: &str = "Helvetica";

/// How a reply is drawn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    /// Background color, `#rrggbb`
    pub color: String,
    /// Font family
    pub font: String,
    /// Font size in em
    pub font_size: u32,
}

/// A chat message from the user or the bot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Text
    pub content: String,
    /// Local wall-clock time, `HH:MM`
    pub time: String,
    /// Whether the bot wrote it
    pub from_bot: bool,
    /// Suggested background color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_color: Option<String>,
    /// Font family
    pub font: String,
    /// Font size in em
    pub font_size: u32,
    /// Base64 encoded audio, empty when there is none
    #[serde(default, rename = "audioFile")]
    pub audio: String,
}

fn current_time() -> String {
    Local::now().format("%H:%M").to_string()
}

impl Message {
    fn new(content: impl Into<String>, from_bot: bool) -> Self {
        Self {
            content: content.into(),
            time: current_time(),
            from_bot,
            suggested_color: None,
            font: DEFAULT_FONT.to_string(),
            font_size: 1,
            audio: String::new(),
        }
    }

    /// Message typed by the user
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, false)
    }

    /// Reply from the bot
    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(content, true)
    }

    /// Attach a suggested color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.suggested_color = Some(color.into());
        self
    }

    /// Apply color, font and size overrides
    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.suggested_color = Some(presentation.color);
        self.font = presentation.font;
        self.font_size = presentation.font_size;
        self
    }

    /// Attach raw audio bytes (stored base64 encoded)
    pub fn with_audio(mut self, bytes: &[u8]) -> Self {
        self.audio = base64::engine::general_purpose::STANDARD.encode(bytes);
        self
    }

    /// Whether audio is attached
    pub fn has_audio(&self) -> bool {
        !self.audio.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let msg = Message::bot("Hi");
        assert!(msg.from_bot);
        assert_eq!(msg.font, "Helvetica");
        assert_eq!(msg.font_size, 1);
        assert_eq!(msg.time.len(), 5);
        assert!(!msg.has_audio());
        assert!(!Message::user("Hey").from_bot);
    }

    #[test]
    fn test_presentation_and_audio() {
        let msg = Message::bot("Go away!")
            .with_presentation(Presentation {
                color: "#ff0000".into(),
                font: "Comic Sans MS".into(),
                font_size: 3,
            })
            .with_audio(b"ID3");
        assert_eq!(msg.suggested_color.as_deref(), Some("#ff0000"));
        assert_eq!(msg.font_size, 3);
        assert_eq!(msg.audio, "SUQz");
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(Message::bot("x").with_color("#b0e0e6")).unwrap();
        assert_eq!(json["suggestedColor"], "#b0e0e6");
        assert_eq!(json["fromBot"], true);
        assert_eq!(json["fontSize"], 1);
        assert_eq!(json["audioFile"], "");
    }
}
