use std::error::Error;
use std::fmt::{self, Display};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

const MAX_OUTPUT_TOKENS: RangeInclusive<u32> = 1..=4096;
const TEMPERATURE: RangeInclusive<f32> = 0.0..=2.0;
const TOP_P: RangeInclusive<f32> = 0.0..=1.0;
const TOP_K: RangeInclusive<u32> = 0..=50;

/// Returned when a generation control is set outside of its range.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeError {
    field: &'static str,
    bounds: String,
}

impl RangeError {
    fn new<T: Display>(field: &'static str, range: &RangeInclusive<T>) -> Self {
        Self {
            field,
            bounds: format!("{}..={}", range.start(), range.end()),
        }
    }

    /// Name of the rejected field.
    #[inline]
    pub fn field(&self) -> &str {
        self.field
    }
}

impl Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` must be within {}", self.field, self.bounds)
    }
}

impl Error for RangeError {}

/// Sampling controls sent with every request.
///
/// Fields are private so that values always stay in range; use the
/// setters to change them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

impl Default for GenerationConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_output_tokens: 3000,
            temperature: 0.1,
            top_p: 0.7,
            top_k: 20,
        }
    }
}

impl GenerationConfig {
    /// Maximum number of tokens in the reply.
    #[inline]
    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    /// Sampling temperature.
    #[inline]
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Nucleus sampling mass.
    #[inline]
    pub fn top_p(&self) -> f32 {
        self.top_p
    }

    /// Number of candidate tokens considered at each step.
    #[inline]
    pub fn top_k(&self) -> u32 {
        self.top_k
    }

    /// Sets the token limit, `1..=4096`.
    pub fn set_max_output_tokens(
        &mut self,
        value: u32,
    ) -> Result<(), RangeError> {
        if !MAX_OUTPUT_TOKENS.contains(&value) {
            return Err(RangeError::new(
                "max_output_tokens",
                &MAX_OUTPUT_TOKENS,
            ));
        }
        self.max_output_tokens = value;
        Ok(())
    }

    /// Sets the temperature, `0.0..=2.0`.
    pub fn set_temperature(&mut self, value: f32) -> Result<(), RangeError> {
        if !TEMPERATURE.contains(&value) {
            return Err(RangeError::new("temperature", &TEMPERATURE));
        }
        self.temperature = value;
        Ok(())
    }

    /// Sets top-p, `0.0..=1.0`.
    pub fn set_top_p(&mut self, value: f32) -> Result<(), RangeError> {
        if !TOP_P.contains(&value) {
            return Err(RangeError::new("top_p", &TOP_P));
        }
        self.top_p = value;
        Ok(())
    }

    /// Sets top-k, `0..=50`.
    pub fn set_top_k(&mut self, value: u32) -> Result<(), RangeError> {
        if !TOP_K.contains(&value) {
            return Err(RangeError::new("top_k", &TOP_K));
        }
        self.top_k = value;
        Ok(())
    }
}

/// Categories of harmful content the provider can filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarmCategory {
    /// Dangerous content.
    DangerousContent,
    /// Harassment.
    Harassment,
    /// Hate speech.
    HateSpeech,
    /// Sexually explicit content.
    SexuallyExplicit,
}

impl HarmCategory {
    /// All categories, in display order.
    pub const ALL: [HarmCategory; 4] = [
        HarmCategory::DangerousContent,
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
    ];

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            HarmCategory::DangerousContent => "Dangerous Content",
            HarmCategory::Harassment => "Harassment",
            HarmCategory::HateSpeech => "Hate Speech",
            HarmCategory::SexuallyExplicit => "Sexually Explicit",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

impl Display for HarmCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How aggressively a category is blocked.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum HarmBlockThreshold {
    /// Never block.
    #[default]
    BlockNone,
    /// Block when the probability of harm is low or higher.
    BlockLowAndAbove,
    /// Block when the probability of harm is medium or higher.
    BlockMediumAndAbove,
    /// Block only when the probability of harm is high.
    BlockOnlyHigh,
}

impl HarmBlockThreshold {
    /// All levels, in display order.
    pub const ALL: [HarmBlockThreshold; 4] = [
        HarmBlockThreshold::BlockNone,
        HarmBlockThreshold::BlockLowAndAbove,
        HarmBlockThreshold::BlockMediumAndAbove,
        HarmBlockThreshold::BlockOnlyHigh,
    ];

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            HarmBlockThreshold::BlockNone => "Allow All",
            HarmBlockThreshold::BlockLowAndAbove => "Block Low and Above",
            HarmBlockThreshold::BlockMediumAndAbove => "Block Medium and Above",
            HarmBlockThreshold::BlockOnlyHigh => "Block High",
        }
    }
}

impl Display for HarmBlockThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A block threshold for every [`HarmCategory`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SafetySettings {
    thresholds: [HarmBlockThreshold; 4],
}

impl SafetySettings {
    /// Returns the threshold of `category`.
    #[inline]
    pub fn get(&self, category: HarmCategory) -> HarmBlockThreshold {
        self.thresholds[category.index()]
    }

    /// Sets the threshold of `category`.
    #[inline]
    pub fn set(
        &mut self,
        category: HarmCategory,
        threshold: HarmBlockThreshold,
    ) {
        self.thresholds[category.index()] = threshold;
    }

    /// Iterates over all categories with their thresholds.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (HarmCategory, HarmBlockThreshold)> + '_ {
        HarmCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.max_output_tokens(), 3000);
        assert_eq!(config.temperature(), 0.1);
        assert_eq!(config.top_p(), 0.7);
        assert_eq!(config.top_k(), 20);
    }

    #[test]
    fn test_generation_ranges() {
        let mut config = GenerationConfig::default();
        assert!(config.set_temperature(2.0).is_ok());
        assert!(config.set_max_output_tokens(4096).is_ok());
        assert!(config.set_top_k(0).is_ok());

        let err = config.set_temperature(2.01).unwrap_err();
        assert_eq!(err.field(), "temperature");
        assert_eq!(err.to_string(), "`temperature` must be within 0..=2");
        assert!(config.set_max_output_tokens(0).is_err());
        assert!(config.set_top_p(1.5).is_err());
        assert!(config.set_top_k(51).is_err());

        // Rejected values leave the previous ones untouched.
        assert_eq!(config.temperature(), 2.0);
        assert_eq!(config.top_k(), 0);
    }

    #[test]
    fn test_safety_settings() {
        let mut settings = SafetySettings::default();
        assert!(
            settings
                .iter()
                .all(|(_, t)| t == HarmBlockThreshold::BlockNone)
        );

        settings.set(
            HarmCategory::HateSpeech,
            HarmBlockThreshold::BlockLowAndAbove,
        );
        assert_eq!(
            settings.get(HarmCategory::HateSpeech),
            HarmBlockThreshold::BlockLowAndAbove
        );
        let categories: Vec<_> = settings.iter().map(|(c, _)| c).collect();
        assert_eq!(categories, HarmCategory::ALL);
    }
}
