//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::pdf::{TableProfile, default_profiles};

use super::statement::PLACEHOLDER_DESCRIPTION;
use crate::error::StatexError;

/// Main configuration for statex.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatexConfig {
    /// Statement extraction configuration.
    pub extraction: ExtractionConfig,

    /// Category classifier configuration.
    pub classifier: ClassifierConfig,

    /// Description translation configuration.
    pub translation: TranslationConfig,
}

/// Statement extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Currency used when the text carries no currency signal.
    pub default_currency: String,

    /// Confidence reported with the default currency.
    pub default_currency_confidence: f32,

    /// Column positions used when a table has no usable header.
    pub layout: LegacyColumnLayout,

    /// Description used when a row resolves no text.
    pub placeholder_description: String,

    /// Ordered table detection profiles.
    pub profiles: Vec<TableProfile>,

    /// Produce and reconcile the text-derived candidate set.
    pub text_fallback: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_currency: "GEL".to_string(),
            default_currency_confidence: 0.4,
            layout: LegacyColumnLayout::default(),
            placeholder_description: PLACEHOLDER_DESCRIPTION.to_string(),
            profiles: default_profiles(),
            text_fallback: true,
        }
    }
}

/// Legacy layout fallback: column positions of the most common bank export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyColumnLayout {
    pub date: usize,
    pub debit: usize,
    pub credit: usize,
    pub description: usize,
}

impl Default for LegacyColumnLayout {
    fn default() -> Self {
        Self {
            date: 0,
            debit: 2,
            credit: 3,
            description: 5,
        }
    }
}

/// Category classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Optional JSON merchant model.
    pub model_path: Option<PathBuf>,

    /// Minimum keyword score for a category to be assigned.
    pub min_score: f64,

    /// Confidence reported when no category is assigned.
    pub uncategorized_confidence: f64,

    /// Upper bound on keyword confidence.
    pub max_confidence: f64,

    /// Confidence reported for single-label model predictions.
    pub label_confidence: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            min_score: 1.0,
            uncategorized_confidence: 0.35,
            max_confidence: 0.95,
            label_confidence: 0.6,
        }
    }
}

/// Translation cache configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Maximum cached translations; `None` keeps every entry for the run.
    pub cache_capacity: Option<usize>,
}

impl StatexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Check value ranges that deserialization alone does not enforce.
    pub fn validate(&self) -> crate::Result<()> {
        let extraction = &self.extraction;
        let code = &extraction.default_currency;
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(StatexError::Config(format!(
                "default_currency must be a three-letter ISO code, got {:?}",
                code
            )));
        }
        if extraction.profiles.is_empty() && !extraction.text_fallback {
            return Err(StatexError::Config(
                "no table profiles configured and text fallback disabled".to_string(),
            ));
        }

        let classifier = &self.classifier;
        let confidences = [
            ("extraction.default_currency_confidence", f64::from(extraction.default_currency_confidence)),
            ("classifier.uncategorized_confidence", classifier.uncategorized_confidence),
            ("classifier.max_confidence", classifier.max_confidence),
            ("classifier.label_confidence", classifier.label_confidence),
        ];
        for (key, value) in confidences {
            if !(0.0..=1.0).contains(&value) {
                return Err(StatexError::Config(format!("{} must be within 0..=1, got {}", key, value)));
            }
        }

        Ok(())
    }
}
