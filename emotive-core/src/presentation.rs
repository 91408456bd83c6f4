//! Leading trait/emotion resolution and the presentation hints derived from it
//!
//! The leading key of a mapping picks the voice profile (traits) and the
//! color pair (emotions) used to present a reply.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::affect::{AffectKind, AffectState, DEFAULT_TRAIT, PATIENCE};
use crate::error::{Error, Result};

/// Engineering range of the synthesizer's speaking rate
pub const SPEAKING_RATE_RANGE: (f64, f64) = (0.0, 999.0);

/// Engineering range of the synthesizer's volume gain in dB
pub const VOLUME_GAIN_RANGE: (f64, f64) = (0.0, 16.0);

/// How the leading key of a mapping is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadingKeyMode {
    /// A candidate wins when its raw value exceeds the absolute value of the
    /// running best. Strongly negative values never lead.
    #[default]
    Literal,
    /// A candidate wins when its absolute value exceeds the running best's.
    Magnitude,
}

/// Key with the greatest value, first one wins on ties
///
/// The running best starts at `0.0` on the first entry, so when no value
/// beats zero the first key is returned. `None` only for an empty map.
pub fn leading_key(values: &IndexMap<String, f32>, mode: LeadingKeyMode) -> Option<&str> {
    let mut best_value = 0.0_f32;
    let mut best_index = 0;

    for (i, value) in values.values().enumerate() {
        let beats = match mode {
            LeadingKeyMode::Literal => *value > best_value.abs(),
            LeadingKeyMode::Magnitude => value.abs() > best_value.abs(),
        };
        if beats {
            best_value = *value;
            best_index = i;
        }
    }

    values.get_index(best_index).map(|(key, _)| key.as_str())
}

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Parse `#rrggbb` (the `#` is optional, case-insensitive)
    pub fn from_hex(value: &str) -> Result<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(Error::InvalidColor(value.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| Error::InvalidColor(value.to_string()))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Lowercase `#rrggbb`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `self` weighted by `alpha`, `other` by `1 - alpha`; channels truncate
    pub fn lerp(self, other: Rgb, alpha: f32) -> Rgb {
        let inverse = 1.0 - alpha;
        let mix = |a: u8, b: u8| (a as f32 * alpha + b as f32 * inverse) as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

/// Voice gender hint passed to the speech synthesizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoiceGender {
    /// No preference
    #[default]
    Neutral,
    /// Male voice
    Male,
    /// Female voice
    Female,
}

impl VoiceGender {
    /// Wire name used by speech services
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "NEUTRAL",
            Self::Male => "MALE",
            Self::Female => "FEMALE",
        }
    }
}

/// Base voice of one personality trait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Base pitch in semitones
    pub pitch: f64,
    /// Base speaking rate (1.0 = normal)
    pub speaking_rate: f64,
    /// Gender hint
    pub gender: VoiceGender,
}

impl VoiceProfile {
    /// Create a profile
    pub fn new(pitch: f64, speaking_rate: f64, gender: VoiceGender) -> Self {
        Self {
            pitch,
            speaking_rate,
            gender,
        }
    }
}

/// Final synthesizer parameters for one reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceParameters {
    /// Pitch in semitones, unclamped
    pub pitch: f64,
    /// Speaking rate within [`SPEAKING_RATE_RANGE`]
    pub speaking_rate: f64,
    /// Volume gain in dB within [`VOLUME_GAIN_RANGE`]
    pub volume_gain_db: f64,
    /// Gender hint
    pub gender: VoiceGender,
}

/// Color endpoints, voice profiles and the patience-driven voice deltas
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// `<Emotion>_LOW` / `<Emotion>_HIGH` → `#rrggbb`
    pub colors: IndexMap<String, String>,
    /// Leading trait → base voice
    pub voices: IndexMap<String, VoiceProfile>,
    /// Pitch added at Patience = -1
    pub max_additional_pitch: f64,
    /// Speaking rate added at Patience = -1
    pub max_additional_rate: f64,
    /// Volume gain added at Patience = -1
    pub max_additional_volume: f64,
    /// Leading-key comparison rule
    pub leading_mode: LeadingKeyMode,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        let mut colors = IndexMap::new();
        colors.insert(low_key(PATIENCE), "#f08080".to_string());
        colors.insert(high_key(PATIENCE), "#b0e0e6".to_string());

        let mut voices = IndexMap::new();
        voices.insert(
            DEFAULT_TRAIT.to_string(),
            VoiceProfile::new(0.0, 1.0, VoiceGender::Neutral),
        );
        voices.insert(
            "Desire".to_string(),
            VoiceProfile::new(0.0, 0.7, VoiceGender::Female),
        );
        voices.insert(
            "Curiosity".to_string(),
            VoiceProfile::new(2.5, 1.05, VoiceGender::Male),
        );

        Self {
            colors,
            voices,
            max_additional_pitch: 3.0,
            max_additional_rate: 0.3,
            max_additional_volume: 16.0,
            leading_mode: LeadingKeyMode::Literal,
        }
    }
}

/// Color key of an emotion's low endpoint
pub fn low_key(emotion: &str) -> String {
    format!("{}_LOW", emotion)
}

/// Color key of an emotion's high endpoint
pub fn high_key(emotion: &str) -> String {
    format!("{}_HIGH", emotion)
}

/// Derives presentation hints from an affect state
#[derive(Debug, Clone)]
pub struct Presenter {
    config: PresentationConfig,
}

impl Presenter {
    /// Create a presenter
    pub fn new(config: PresentationConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &PresentationConfig {
        &self.config
    }

    fn leading(&self, state: &AffectState, kind: AffectKind) -> Result<String> {
        leading_key(state.values(kind), self.config.leading_mode)
            .map(str::to_string)
            .ok_or_else(|| Error::config(format!("no {} values to lead", kind)))
    }

    /// Strongest personality trait
    pub fn leading_trait(&self, state: &AffectState) -> Result<String> {
        self.leading(state, AffectKind::Trait)
    }

    /// Strongest emotion
    pub fn leading_emotion(&self, state: &AffectState) -> Result<String> {
        self.leading(state, AffectKind::Emotion)
    }

    /// `#rrggbb` between the leading emotion's LOW and HIGH endpoints
    pub fn suggested_color(&self, state: &AffectState) -> Result<String> {
        let emotion = self.leading_emotion(state)?;
        let value = state.emotion(&emotion)?;

        let endpoint = |key: String| -> Result<Rgb> {
            let hex = self
                .config
                .colors
                .get(&key)
                .ok_or(Error::MissingColorEndpoint(key))?;
            Rgb::from_hex(hex)
        };
        let low = endpoint(low_key(&emotion))?;
        let high = endpoint(high_key(&emotion))?;

        let (min, max) = AffectKind::Emotion.range();
        let alpha = (value - min) / (max - min);
        let color = high.lerp(low, alpha).to_hex();

        debug!(emotion = %emotion, value, color = %color, "Suggested color");
        Ok(color)
    }

    /// Voice of the leading trait, pushed higher, faster and louder as
    /// patience drops
    pub fn voice_parameters(&self, state: &AffectState) -> Result<VoiceParameters> {
        let leading = self.leading_trait(state)?;
        let profile = self
            .config
            .voices
            .get(&leading)
            .ok_or_else(|| Error::MissingVoiceProfile(leading.clone()))?;

        let urgency = -(state.emotion(PATIENCE)? as f64);

        let params = VoiceParameters {
            pitch: profile.pitch + urgency * self.config.max_additional_pitch,
            speaking_rate: (profile.speaking_rate + urgency * self.config.max_additional_rate)
                .clamp(SPEAKING_RATE_RANGE.0, SPEAKING_RATE_RANGE.1),
            volume_gain_db: (urgency * self.config.max_additional_volume)
                .clamp(VOLUME_GAIN_RANGE.0, VOLUME_GAIN_RANGE.1),
            gender: profile.gender,
        };

        debug!(trait_name = %leading, ?params, "Voice parameters");
        Ok(params)
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new(PresentationConfig::default())
    }
}
