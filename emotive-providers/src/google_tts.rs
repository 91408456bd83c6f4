//! Google Cloud Text-to-Speech backend (MP3 output)

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    status_error, transport_error, Error, HttpConfig, Result, SpeechSynthesizer, VoiceParameters,
};

const TTS_API_BASE: &str = "https://texttospeech.googleapis.com/v1";
const SERVICE: &str = "Text-to-Speech";

/// Text-to-Speech API client
pub struct GoogleTtsClient {
    client: reqwest::Client,
    access_token: String,
    language_code: String,
    base_url: String,
}

impl GoogleTtsClient {
    /// Create with an OAuth access token
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(access_token, TTS_API_BASE)
    }

    /// Create from `GOOGLE_ACCESS_TOKEN`
    pub fn from_env() -> Result<Self> {
        let access_token = std::env::var("GOOGLE_ACCESS_TOKEN")
            .map_err(|_| Error::ProviderAuth("GOOGLE_ACCESS_TOKEN not set".to_string()))?;
        Self::new(access_token)
    }

    /// Create against a custom endpoint
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = HttpConfig::default().build_client()?;
        Ok(Self {
            client,
            access_token: access_token.into(),
            language_code: "en-US".to_string(),
            base_url: base_url.into(),
        })
    }

    /// Voice language (default `en-US`)
    pub fn with_language(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = language_code.into();
        self
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.access_token))
                .map_err(|_| Error::ProviderAuth("access token is not a valid header value".to_string()))?,
        );
        Ok(headers)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    ssml_gender: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    pitch: f64,
    speaking_rate: f64,
    volume_gain_db: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

#[async_trait]
impl SpeechSynthesizer for GoogleTtsClient {
    async fn synthesize(&self, text: &str, voice: &VoiceParameters) -> Result<Vec<u8>> {
        let request = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &self.language_code,
                ssml_gender: voice.gender.as_str(),
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                pitch: voice.pitch,
                speaking_rate: voice.speaking_rate,
                volume_gain_db: voice.volume_gain_db,
            },
        };

        debug!(?voice, "Synthesizing speech");
        let response = self
            .client
            .post(format!("{}/text:synthesize", self.base_url))
            .headers(self.build_headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response).await);
        }

        let body: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Failed to parse synthesize response: {}", e)))?;

        base64::engine::general_purpose::STANDARD
            .decode(body.audio_content.as_bytes())
            .map_err(|e| Error::Provider(format!("Invalid audio payload: {}", e)))
    }

    fn name(&self) -> &'static str {
        "google-tts"
    }
}
