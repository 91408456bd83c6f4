//! The affect store: bounded emotion and personality-trait values

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the emotion most of the layer reacts to
pub const PATIENCE: &str = "Patience";

/// Sentinel trait used as a fallback threshold, not a modeled trait
pub const DEFAULT_TRAIT: &str = "Default";

/// Which of the two mappings a value lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffectKind {
    /// Transient affect in `[-1.0, 1.0]`
    Emotion,
    /// Slow-moving personality dimension in `[0.0, 1.0]`
    Trait,
}

impl AffectKind {
    /// Legal value range for this kind
    pub fn range(self) -> (f32, f32) {
        match self {
            Self::Emotion => (-1.0, 1.0),
            Self::Trait => (0.0, 1.0),
        }
    }

    /// Clamp a value into this kind's range
    pub fn clamp(self, value: f32) -> f32 {
        let (min, max) = self.range();
        value.clamp(min, max)
    }
}

impl fmt::Display for AffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emotion => f.write_str("emotion"),
            Self::Trait => f.write_str("trait"),
        }
    }
}

/// Mutable emotion and trait values of one conversation
///
/// Both maps keep insertion order, which is what breaks ties when the
/// leading key is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectState {
    emotions: IndexMap<String, f32>,
    traits: IndexMap<String, f32>,
}

impl Default for AffectState {
    fn default() -> Self {
        Self::new(
            [(PATIENCE.to_string(), 0.0)],
            [
                ("Desire".to_string(), 0.0),
                ("Curiosity".to_string(), 0.0),
                (DEFAULT_TRAIT.to_string(), 0.2),
            ],
        )
    }
}

impl AffectState {
    /// Build a state from initial values; every value is clamped on the way in
    pub fn new(
        emotions: impl IntoIterator<Item = (String, f32)>,
        traits: impl IntoIterator<Item = (String, f32)>,
    ) -> Self {
        let clamp_all = |kind: AffectKind, values: &mut IndexMap<String, f32>| {
            values.values_mut().for_each(|v| {
                *v = if v.is_nan() { 0.0 } else { kind.clamp(*v) };
            });
        };

        let mut emotions: IndexMap<String, f32> = emotions.into_iter().collect();
        let mut traits: IndexMap<String, f32> = traits.into_iter().collect();
        clamp_all(AffectKind::Emotion, &mut emotions);
        clamp_all(AffectKind::Trait, &mut traits);

        Self { emotions, traits }
    }

    /// All emotions in insertion order
    pub fn emotions(&self) -> &IndexMap<String, f32> {
        &self.emotions
    }

    /// All traits in insertion order (including the `Default` sentinel)
    pub fn traits(&self) -> &IndexMap<String, f32> {
        &self.traits
    }

    /// The mapping for one kind
    pub fn values(&self, kind: AffectKind) -> &IndexMap<String, f32> {
        match kind {
            AffectKind::Emotion => &self.emotions,
            AffectKind::Trait => &self.traits,
        }
    }

    fn values_mut(&mut self, kind: AffectKind) -> &mut IndexMap<String, f32> {
        match kind {
            AffectKind::Emotion => &mut self.emotions,
            AffectKind::Trait => &mut self.traits,
        }
    }

    /// Whether `name` exists in the given mapping
    pub fn contains(&self, kind: AffectKind, name: &str) -> bool {
        self.values(kind).contains_key(name)
    }

    /// Read a value
    pub fn get(&self, kind: AffectKind, name: &str) -> Result<f32> {
        self.values(kind)
            .get(name)
            .copied()
            .ok_or_else(|| Error::unknown_key(kind, name))
    }

    /// Overwrite a value, clamped into the kind's range. Returns the stored value.
    pub fn set(&mut self, kind: AffectKind, name: &str, value: f32) -> Result<f32> {
        if value.is_nan() {
            return Err(Error::parse(format!("refusing NaN for {} {}", kind, name)));
        }
        let slot = self
            .values_mut(kind)
            .get_mut(name)
            .ok_or_else(|| Error::unknown_key(kind, name))?;
        *slot = kind.clamp(value);
        Ok(*slot)
    }

    /// Add `delta` to a value (may be negative), clamped. Returns the stored value.
    pub fn increment(&mut self, kind: AffectKind, name: &str, delta: f32) -> Result<f32> {
        let current = self.get(kind, name)?;
        self.set(kind, name, current + delta)
    }

    /// Shorthand for reading an emotion
    pub fn emotion(&self, name: &str) -> Result<f32> {
        self.get(AffectKind::Emotion, name)
    }

    /// Shorthand for reading a trait
    pub fn trait_value(&self, name: &str) -> Result<f32> {
        self.get(AffectKind::Trait, name)
    }
}
