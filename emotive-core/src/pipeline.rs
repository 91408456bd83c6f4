//! Request orchestration
//!
//! One call to [`ChatPipeline::chat`] handles one user message:
//!
//! 1. Debug mode active → the message is a debug command (or an exit phrase)
//! 2. Enter phrase → switch to debug mode
//! 3. Extreme roll succeeds → canned outburst, optional pre-recorded audio
//! 4. Otherwise → modifiers, NLU lookup with the leading trait as context,
//!    conditional formatting, color and voice, optional speech
//!
//! Affect guards are only held inside the synchronous steps; none is held
//! while waiting on a collaborator.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::affect::{Conversation, FastRandom, RandomSource, SessionRegistry};
use crate::collab::{AudioAssets, AudioSwitch, IntentDetector, NoAudioAssets, SpeechSynthesizer};
use crate::config::AffectConfig;
use crate::debug::DebugInterpreter;
use crate::error::{Error, Result};
use crate::extreme::{ExtremeReply, ExtremeSelector};
use crate::format::TaggedTextFormatter;
use crate::message::Message;
use crate::modifiers::{ModifierEngine, RuleSet};
use crate::presentation::{Presenter, VoiceParameters};

/// What the debug step decided, computed under the session guards
enum DebugOutcome {
    Reply { content: String, color: String },
    NotHandled,
}

/// What the affect step decided, computed under the affect guard
enum AffectOutcome {
    Extreme(ExtremeReply),
    Normal { leading_trait: String },
}

/// The affect layer wired to its collaborators
pub struct ChatPipeline {
    sessions: SessionRegistry,
    modifiers: ModifierEngine,
    formatter: TaggedTextFormatter,
    presenter: Presenter,
    extreme: ExtremeSelector,
    debug: DebugInterpreter,
    intents: Arc<dyn IntentDetector>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    assets: Arc<dyn AudioAssets>,
    audio: Arc<AudioSwitch>,
    rng: Mutex<Box<dyn RandomSource>>,
    language: String,
}

impl std::fmt::Debug for ChatPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatPipeline")
            .field("sessions", &self.sessions.len())
            .field("rules", &self.modifiers.rules().len())
            .field("intents", &self.intents.name())
            .field("speech", &self.speech.as_ref().map(|s| s.name()))
            .field("audio", &self.audio.is_enabled())
            .field("language", &self.language)
            .finish()
    }
}

impl ChatPipeline {
    /// Start building a pipeline around an NLU backend
    pub fn builder(intents: Arc<dyn IntentDetector>) -> ChatPipelineBuilder {
        ChatPipelineBuilder::new(intents)
    }

    /// Live conversations
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Modifier engine in use
    pub fn modifiers(&self) -> &ModifierEngine {
        &self.modifiers
    }

    /// Presentation mapper in use
    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    /// Shared audio flag
    pub fn audio(&self) -> &Arc<AudioSwitch> {
        &self.audio
    }

    /// Suggested color for a session's current state
    ///
    /// Fails with [`Error::UnknownSession`] for ids that never chatted.
    pub fn suggested_color(&self, session_id: &str) -> Result<String> {
        let conversation = self.existing(session_id)?;
        conversation.with_affect(|state| self.presenter.suggested_color(state))
    }

    /// Voice parameters for a session's current state
    pub fn voice_parameters(&self, session_id: &str) -> Result<VoiceParameters> {
        let conversation = self.existing(session_id)?;
        conversation.with_affect(|state| self.presenter.voice_parameters(state))
    }

    fn existing(&self, session_id: &str) -> Result<Arc<Conversation>> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| Error::UnknownSession(session_id.to_string()))
    }

    /// Handle one user message and produce the bot reply
    ///
    /// NLU failures are returned to the caller. Speech failures only cost the
    /// reply its audio.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub async fn chat(&self, session_id: &str, text: &str) -> Result<Message> {
        let conversation = self.sessions.get_or_create(session_id);

        match self.handle_debug(&conversation, text)? {
            DebugOutcome::Reply { content, color } => {
                return Ok(Message::bot(content).with_color(color));
            }
            DebugOutcome::NotHandled => {}
        }

        let outcome = conversation.with_affect(|state| -> Result<AffectOutcome> {
            let mut rng = self.rng.lock();
            if self.extreme.should_respond_extreme(state, &mut **rng)? {
                let reply = self
                    .extreme
                    .produce_extreme(state, &self.modifiers, text, &mut **rng)?;
                return Ok(AffectOutcome::Extreme(reply));
            }
            drop(rng);

            let fired = self.modifiers.apply(state, text);
            debug!(fired, "Modifiers applied");
            Ok(AffectOutcome::Normal {
                leading_trait: self.presenter.leading_trait(state)?,
            })
        })?;

        match outcome {
            AffectOutcome::Extreme(reply) => Ok(self.extreme_message(reply).await),
            AffectOutcome::Normal { leading_trait } => {
                let raw = self
                    .intents
                    .detect_intent(text, &self.language, &leading_trait)
                    .await?;
                debug!(backend = self.intents.name(), raw = %raw, "Intent detected");

                let (content, color, voice) = conversation.with_affect(|state| {
                    let content = self.formatter.format(state, &raw);
                    let color = self.presenter.suggested_color(state)?;
                    let voice = self.presenter.voice_parameters(state)?;
                    Ok::<_, Error>((content, color, voice))
                })?;

                let mut message = Message::bot(content).with_color(color);
                if let Some(audio) = self.speak(&message.content, &voice).await {
                    message = message.with_audio(&audio);
                }
                Ok(message)
            }
        }
    }

    fn handle_debug(
        &self,
        conversation: &Conversation,
        text: &str,
    ) -> Result<DebugOutcome> {
        conversation.with_debug(|debug_state, state| -> Result<DebugOutcome> {
            if debug_state.active {
                if self.debug.wants_to_exit(text) {
                    let content = self.debug.exit(debug_state, &mut **self.rng.lock());
                    let color = self.presenter.suggested_color(state)?;
                    return Ok(DebugOutcome::Reply { content, color });
                }
                let content = self.debug.parse_command(state, text);
                return Ok(DebugOutcome::Reply {
                    content,
                    color: self.debug.color().to_string(),
                });
            }

            if self.debug.wants_to_enter(text) {
                let content = self.debug.enter(debug_state, &mut **self.rng.lock());
                return Ok(DebugOutcome::Reply {
                    content,
                    color: self.debug.color().to_string(),
                });
            }

            Ok(DebugOutcome::NotHandled)
        })
    }

    async fn extreme_message(&self, reply: ExtremeReply) -> Message {
        let mut message = Message::bot(reply.content).with_presentation(reply.presentation);
        if self.audio.is_enabled() {
            match self.assets.lookup(&reply.audio_key).await {
                Some(bytes) => message = message.with_audio(&bytes),
                None => debug!(key = %reply.audio_key, "No pre-recorded audio"),
            }
        }
        message
    }

    async fn speak(&self, text: &str, voice: &VoiceParameters) -> Option<Vec<u8>> {
        if !self.audio.is_enabled() {
            return None;
        }
        let speech = self.speech.as_ref()?;
        match speech.synthesize(text, voice).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(backend = speech.name(), error = %e, "Speech synthesis failed");
                None
            }
        }
    }
}

/// Builder for [`ChatPipeline`]
pub struct ChatPipelineBuilder {
    intents: Arc<dyn IntentDetector>,
    config: AffectConfig,
    rules: Option<RuleSet>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    assets: Arc<dyn AudioAssets>,
    audio: Arc<AudioSwitch>,
    rng: Box<dyn RandomSource>,
}

impl ChatPipelineBuilder {
    /// Builder with default configuration, no speech and no audio assets
    pub fn new(intents: Arc<dyn IntentDetector>) -> Self {
        Self {
            intents,
            config: AffectConfig::default(),
            rules: None,
            speech: None,
            assets: Arc::new(NoAudioAssets),
            audio: Arc::new(AudioSwitch::default()),
            rng: Box::new(FastRandom::new()),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: AffectConfig) -> Self {
        self.config = config;
        self
    }

    /// Use these rules instead of loading `modifiers.rules_path`
    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Set the speech backend
    pub fn speech(mut self, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Set the pre-recorded audio source
    pub fn assets(mut self, assets: Arc<dyn AudioAssets>) -> Self {
        self.assets = assets;
        self
    }

    /// Share an audio flag with other components
    pub fn audio_switch(mut self, audio: Arc<AudioSwitch>) -> Self {
        self.audio = audio;
        self
    }

    /// Set the random source
    pub fn random(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Validate configuration and build
    pub fn build(self) -> Result<ChatPipeline> {
        self.config.validate()?;

        let modifiers = match self.rules {
            Some(rules) => ModifierEngine::with_multiplier(rules, self.config.modifiers.multiplier),
            None => ModifierEngine::from_config(&self.config.modifiers),
        };

        info!(
            rules = modifiers.rules().len(),
            intents = self.intents.name(),
            speech = self.speech.as_ref().map(|s| s.name()).unwrap_or("none"),
            "Chat pipeline ready"
        );

        Ok(ChatPipeline {
            sessions: SessionRegistry::new(self.config.state.to_state()),
            modifiers,
            formatter: TaggedTextFormatter::new(),
            presenter: Presenter::new(self.config.presentation),
            extreme: ExtremeSelector::new(self.config.extreme),
            debug: DebugInterpreter::new(self.config.debug, self.audio.clone()),
            intents: self.intents,
            speech: self.speech,
            assets: self.assets,
            audio: self.audio,
            rng: Mutex::new(self.rng),
            language: self.config.language,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affect::{AffectKind, ScriptedRandom, PATIENCE};
    use crate::modifiers::ModifierRule;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl IntentDetector for Echo {
        async fn detect_intent(&self, text: &str, _language: &str, context: &str) -> Result<String> {
            Ok(format!("{} ({})", text, context))
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    struct Broken;

    #[async_trait]
    impl IntentDetector for Broken {
        async fn detect_intent(&self, _: &str, _: &str, _: &str) -> Result<String> {
            Err(Error::ProviderAuth("token expired".into()))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn config() -> AffectConfig {
        let mut config = AffectConfig::from_yaml("{}").unwrap();
        config.modifiers.rules_path = None;
        config
    }

    fn pipeline() -> ChatPipeline {
        ChatPipeline::builder(Arc::new(Echo))
            .config(config())
            .rules(RuleSet::new(vec![ModifierRule::new("Patience", "idiot", -0.3)]))
            .random(ScriptedRandom::new())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_normal_reply_uses_leading_trait_and_color() {
        let pipeline = pipeline();
        let reply = pipeline.chat("s1", "hello").await.unwrap();
        assert_eq!(reply.content, "hello (Default)");
        assert_eq!(reply.suggested_color.as_deref(), Some("#d0b0b3"));
        assert!(reply.from_bot);
        assert!(!reply.has_audio());
    }

    #[tokio::test]
    async fn test_modifiers_apply_before_reply() {
        let pipeline = pipeline();
        pipeline.chat("s1", "you idiot").await.unwrap();
        let patience = pipeline
            .sessions()
            .get("s1")
            .unwrap()
            .snapshot()
            .emotion(PATIENCE)
            .unwrap();
        assert!((patience - (-0.6)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_extreme_path_skips_nlu() {
        let pipeline = ChatPipeline::builder(Arc::new(Broken))
            .config(config())
            .random(ScriptedRandom::new().with_units([1.0]).with_indices([1]))
            .build()
            .unwrap();
        pipeline
            .sessions()
            .get_or_create("s1")
            .with_affect(|s| s.set(AffectKind::Emotion, PATIENCE, -1.0))
            .unwrap();

        let reply = pipeline.chat("s1", "hi").await.unwrap();
        assert_eq!(reply.content, "FUCK OFF!");
        assert_eq!(reply.font, "Comic Sans MS");
        assert_eq!(reply.suggested_color.as_deref(), Some("#ff0000"));
    }

    #[tokio::test]
    async fn test_nlu_error_propagates() {
        let pipeline = ChatPipeline::builder(Arc::new(Broken))
            .config(config())
            .build()
            .unwrap();
        assert!(matches!(
            pipeline.chat("s1", "hello").await,
            Err(Error::ProviderAuth(_))
        ));
    }

    #[tokio::test]
    async fn test_debug_mode_bypasses_nlu() {
        let pipeline = ChatPipeline::builder(Arc::new(Broken))
            .config(config())
            .random(ScriptedRandom::new())
            .build()
            .unwrap();

        let intro = pipeline.chat("s1", "debug").await.unwrap();
        assert_eq!(intro.content, "(DEBUG): Entering debug mode.");
        assert_eq!(intro.suggested_color.as_deref(), Some("#DFDFDF"));

        let set = pipeline.chat("s1", "set patience 1").await.unwrap();
        assert_eq!(set.content, "(DEBUG): Emotion altered: Patience has been set to 1.0.");

        let outro = pipeline.chat("s1", "exit").await.unwrap();
        assert_eq!(outro.content, "Right! Where were we?");
        assert_eq!(outro.suggested_color.as_deref(), Some("#b0e0e6"));
        assert!(!pipeline.sessions().get("s1").unwrap().in_debug());
    }

    #[tokio::test]
    async fn test_presentation_lookups_do_not_create_sessions() {
        let pipeline = pipeline();
        for i in 0..100 {
            let id = format!("ghost-{}", i);
            assert!(matches!(
                pipeline.suggested_color(&id),
                Err(Error::UnknownSession(ref s)) if *s == id
            ));
            assert!(pipeline.voice_parameters(&id).is_err());
        }
        assert!(pipeline.sessions().is_empty());

        pipeline.chat("s1", "hello").await.unwrap();
        assert_eq!(pipeline.suggested_color("s1").unwrap(), "#d0b0b3");
        assert_eq!(pipeline.sessions().len(), 1);
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = config();
        config.extreme.responses.clear();
        assert!(ChatPipeline::builder(Arc::new(Echo)).config(config).build().is_err());
    }
}
