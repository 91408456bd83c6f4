//! Error types for the emotive affect layer

use thiserror::Error;

use crate::affect::AffectKind;

/// Result type alias using emotive's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the emotive affect layer
#[derive(Debug, Error)]
pub enum Error {
    // ============ Affect Store Errors ============
    /// Lookup of an emotion or trait that the store does not know
    #[error("Unknown {kind}: {name}")]
    UnknownKey {
        /// Which mapping was consulted
        kind: AffectKind,
        /// Name that was looked up
        name: String,
    },

    // ============ Session Errors ============
    /// No conversation is registered under this session id
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    // ============ Presentation Errors ============
    /// No LOW/HIGH color pair configured for a leading emotion
    #[error("Missing color endpoint: {0}")]
    MissingColorEndpoint(String),

    /// No voice profile configured for a leading trait
    #[error("Missing voice profile for trait: {0}")]
    MissingVoiceProfile(String),

    /// A configured color is not a `#rrggbb` value
    #[error("Invalid color value: {0}")]
    InvalidColor(String),

    // ============ Parse Errors ============
    /// Malformed conditional expression, numeral or command
    #[error("Parse error: {0}")]
    Parse(String),

    // ============ Configuration Errors ============
    /// Configuration is incomplete or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML configuration could not be read
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ============ Collaborator Errors ============
    /// NLU or speech service returned an error
    #[error("Provider error: {0}")]
    Provider(String),

    /// NLU or speech service rejected our credentials
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    // ============ System Errors ============
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a new unknown key error
    pub fn unknown_key(kind: AffectKind, name: impl Into<String>) -> Self {
        Self::UnknownKey {
            kind,
            name: name.into(),
        }
    }

    /// Create a new parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error stems from incomplete configuration and should
    /// be reported at startup rather than per request
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingColorEndpoint(_)
                | Self::MissingVoiceProfile(_)
                | Self::InvalidColor(_)
                | Self::Config(_)
                | Self::Yaml(_)
        )
    }
}
