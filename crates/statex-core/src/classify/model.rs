//! External category model interface and the JSON merchant model.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use super::keywords::normalize_text;
use crate::error::ModelError;

lazy_static! {
    static ref BUSINESS_SUFFIX: Regex =
        Regex::new(r"\b(?:llc|inc|corp|ltd|limited|co|company)\b").unwrap();
}

/// A model that returns a probability per known class.
pub trait ProbabilisticClassifier: Send + Sync {
    /// Class labels, aligned with each probability row.
    fn classes(&self) -> &[String];

    /// One probability row per input text.
    fn predict_proba(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>, ModelError>;
}

/// A model that returns a single label per input text.
pub trait LabelClassifier: Send + Sync {
    fn predict(&self, texts: &[&str]) -> Result<Vec<String>, ModelError>;
}

/// An externally supplied model, by declared capability.
pub enum CategoryModel {
    Probabilistic(Box<dyn ProbabilisticClassifier>),
    Label(Box<dyn LabelClassifier>),
}

/// A category predicted by a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrediction {
    pub category: String,
    /// Class probability, or `None` for label-only models.
    pub probability: Option<f64>,
}

impl CategoryModel {
    /// Predict the category of one text.
    ///
    /// Output that does not fit the model's declared shape is an error.
    pub fn predict_one(&self, text: &str) -> Result<ModelPrediction, ModelError> {
        match self {
            Self::Probabilistic(model) => {
                let rows = model.predict_proba(&[text])?;
                let row = rows
                    .first()
                    .ok_or_else(|| ModelError::Malformed("no probability row".to_string()))?;
                let classes = model.classes();
                if row.is_empty() || row.len() != classes.len() {
                    return Err(ModelError::Malformed(format!(
                        "{} probabilities for {} classes",
                        row.len(),
                        classes.len()
                    )));
                }

                // ties resolve to the first class
                let mut best = 0;
                for (i, p) in row.iter().enumerate() {
                    if !p.is_finite() {
                        return Err(ModelError::Malformed(format!("probability {}", p)));
                    }
                    if *p > row[best] {
                        best = i;
                    }
                }

                Ok(ModelPrediction {
                    category: classes[best].clone(),
                    probability: Some(row[best]),
                })
            }
            Self::Label(model) => {
                let labels = model.predict(&[text])?;
                let label = labels
                    .into_iter()
                    .next()
                    .ok_or_else(|| ModelError::Malformed("no label".to_string()))?;
                if label.trim().is_empty() {
                    return Err(ModelError::Malformed("empty label".to_string()));
                }
                Ok(ModelPrediction {
                    category: label,
                    probability: None,
                })
            }
        }
    }
}

impl std::fmt::Debug for CategoryModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Probabilistic(m) => write!(f, "CategoryModel::Probabilistic({} classes)", m.classes().len()),
            Self::Label(_) => write!(f, "CategoryModel::Label"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MerchantFile {
    merchants: BTreeMap<String, String>,
}

/// Merchant-name lookup model loaded from JSON.
///
/// ```json
/// { "merchants": { "Wolt": "Food", "Zoommer": "Technology" } }
/// ```
#[derive(Debug, Clone)]
pub struct MerchantModel {
    // (normalized name, matcher, category), longest names first
    merchants: Vec<(String, Regex, String)>,
}

/// Normalize a merchant name for matching.
pub fn normalize_merchant(name: &str) -> String {
    let lowered = name.to_lowercase().replace("h&m", "hm");
    let normalized = normalize_text(&lowered);
    BUSINESS_SUFFIX
        .replace_all(&normalized, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl MerchantModel {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let file: MerchantFile =
            serde_json::from_str(json).map_err(|e| ModelError::Load(e.to_string()))?;
        Self::from_pairs(file.merchants)
    }

    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Load(format!("{}: {}", path.display(), e)))?;
        let model = Self::from_json(&json)?;
        debug!("Loaded {} merchants from {}", model.len(), path.display());
        Ok(model)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut merchants = Vec::new();
        for (name, category) in pairs {
            let normalized = normalize_merchant(name.as_ref());
            if normalized.is_empty() {
                continue;
            }
            let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&normalized)))
                .map_err(|e| ModelError::Load(e.to_string()))?;
            merchants.push((normalized, pattern, category.into()));
        }
        merchants.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Ok(Self { merchants })
    }

    pub fn len(&self) -> usize {
        self.merchants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merchants.is_empty()
    }

    fn lookup(&self, text: &str) -> Option<&str> {
        let normalized = normalize_merchant(text);
        self.merchants
            .iter()
            .find(|(_, pattern, _)| pattern.is_match(&normalized))
            .map(|(_, _, category)| category.as_str())
    }
}

impl LabelClassifier for MerchantModel {
    fn predict(&self, texts: &[&str]) -> Result<Vec<String>, ModelError> {
        texts
            .iter()
            .map(|t| self.lookup(t).map(str::to_string).ok_or(ModelError::NoPrediction))
            .collect()
    }
}
