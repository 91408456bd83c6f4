//! # Emotive Providers
//!
//! Collaborator implementations for the emotive affect layer: the NLU
//! backend, speech synthesis and pre-recorded audio.

#![warn(missing_docs)]

// Re-export core types for convenience
pub use emotive_core::collab::{AudioAssets, IntentDetector, SpeechSynthesizer};
pub use emotive_core::error::{Error, Result};
pub use emotive_core::presentation::{VoiceGender, VoiceParameters};

pub mod assets;
pub mod mock;

#[cfg(feature = "dialogflow")]
pub mod dialogflow;

#[cfg(feature = "google-tts")]
pub mod google_tts;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connection pool idle timeout
    pub pool_idle_timeout_secs: u64,
    /// Max idle connections per host
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 8,
        }
    }
}

impl HttpConfig {
    /// Build a reqwest client
    pub fn build_client(&self) -> Result<reqwest::Client> {
        use std::time::Duration;

        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(self.pool_idle_timeout_secs))
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .build()
            .map_err(|e| Error::Internal(e.to_string()))
    }
}

/// Wrap a transport failure
#[cfg(any(feature = "dialogflow", feature = "google-tts"))]
pub(crate) fn transport_error(service: &str, e: reqwest::Error) -> Error {
    Error::Provider(format!("{} request failed: {}", service, e))
}

/// Turn a non-success response into an error, keeping auth failures apart
#[cfg(any(feature = "dialogflow", feature = "google-tts"))]
pub(crate) async fn status_error(service: &str, response: reqwest::Response) -> Error {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        Error::ProviderAuth(format!("{} rejected credentials ({}): {}", service, status, text))
    } else {
        Error::Provider(format!("{} API error {}: {}", service, status, text))
    }
}
