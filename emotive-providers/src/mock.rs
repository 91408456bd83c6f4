//! Mock collaborators for tests and demos

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{IntentDetector, Result, SpeechSynthesizer, VoiceParameters};

/// One recorded `detect_intent` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentCall {
    /// User text
    pub text: String,
    /// Language hint
    pub language: String,
    /// Leading-trait context hint
    pub context: String,
}

/// NLU backend that answers from a script
///
/// Replies are handed out in order; the last one repeats. With no replies
/// the user text is echoed back.
#[derive(Debug, Default)]
pub struct MockIntentDetector {
    replies: Vec<String>,
    calls: Mutex<Vec<IntentCall>>,
}

impl MockIntentDetector {
    /// Always answer `reply`
    pub fn new(reply: impl Into<String>) -> Self {
        Self::scripted([reply])
    }

    /// Answer with `replies` in order
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Echo the user text
    pub fn echo() -> Self {
        Self::default()
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<IntentCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl IntentDetector for MockIntentDetector {
    async fn detect_intent(&self, text: &str, language: &str, context: &str) -> Result<String> {
        let mut calls = self.calls.lock();
        let turn = calls.len();
        calls.push(IntentCall {
            text: text.to_string(),
            language: language.to_string(),
            context: context.to_string(),
        });

        Ok(match self.replies.get(turn).or(self.replies.last()) {
            Some(reply) => reply.clone(),
            None => text.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Speech backend that returns fixed bytes and records the voices it got
#[derive(Debug)]
pub struct MockSynthesizer {
    audio: Vec<u8>,
    voices: Mutex<Vec<VoiceParameters>>,
}

impl MockSynthesizer {
    /// Answer every request with `audio`
    pub fn new(audio: impl Into<Vec<u8>>) -> Self {
        Self {
            audio: audio.into(),
            voices: Mutex::new(Vec::new()),
        }
    }

    /// Voice parameters of every request so far
    pub fn voices(&self) -> Vec<VoiceParameters> {
        self.voices.lock().clone()
    }
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self::new(b"ID3".to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, _text: &str, voice: &VoiceParameters) -> Result<Vec<u8>> {
        self.voices.lock().push(voice.clone());
        Ok(self.audio.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VoiceGender;

    #[tokio::test]
    async fn test_scripted_replies_then_repeat() {
        let nlu = MockIntentDetector::scripted(["one", "two"]);
        assert_eq!(nlu.detect_intent("a", "en-US", "Default").await.unwrap(), "one");
        assert_eq!(nlu.detect_intent("b", "en-US", "Desire").await.unwrap(), "two");
        assert_eq!(nlu.detect_intent("c", "en-US", "Desire").await.unwrap(), "two");

        let calls = nlu.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].context, "Desire");
    }

    #[tokio::test]
    async fn test_echo() {
        let nlu = MockIntentDetector::echo();
        assert_eq!(nlu.detect_intent("hi there", "en-US", "Default").await.unwrap(), "hi there");
    }

    #[tokio::test]
    async fn test_synthesizer_records_voice() {
        let tts = MockSynthesizer::default();
        let voice = VoiceParameters {
            pitch: 2.5,
            speaking_rate: 1.05,
            volume_gain_db: 0.0,
            gender: VoiceGender::Male,
        };
        assert_eq!(tts.synthesize("hello", &voice).await.unwrap(), b"ID3");
        assert_eq!(tts.voices(), vec![voice]);
    }
}
