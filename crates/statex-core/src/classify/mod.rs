//! Category classification and transaction enrichment.

pub mod keywords;
pub mod model;
pub mod translate;

pub use keywords::{KeywordClassifier, KeywordScore};
pub use model::{CategoryModel, LabelClassifier, MerchantModel, ModelPrediction, ProbabilisticClassifier};
pub use translate::{IdentityTranslator, TranslationCache, Translator};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::models::{
    CategorizedTransaction, ClassifierConfig, RawTransaction, StatementMetadata, StatementPayload,
    TranslationConfig,
};

lazy_static! {
    static ref WITHDRAWAL: Regex = Regex::new(
        r"(?i)\batm\b|cash\s+withdrawal|money\s+withdrawal|withdrawal.*\baccount\b|\baccount\b.*withdrawal"
    ).unwrap();
}

/// A category decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: Option<String>,
    pub confidence: f64,
}

impl Classification {
    fn uncategorized(confidence: f64) -> Self {
        Self {
            category: None,
            confidence,
        }
    }
}

/// Translates and classifies finalized transactions for one run.
pub struct Categorizer {
    keywords: KeywordClassifier,
    model: Option<CategoryModel>,
    cache: TranslationCache,
    config: ClassifierConfig,
}

impl Categorizer {
    pub fn new(config: ClassifierConfig, cache: TranslationCache) -> Self {
        Self {
            keywords: KeywordClassifier::new(),
            model: None,
            cache,
            config,
        }
    }

    /// Build from configuration, loading the merchant model when one is set.
    ///
    /// A model that fails to load is logged and left out.
    pub fn from_config(config: &ClassifierConfig, translation: &TranslationConfig) -> Self {
        let mut categorizer = Self::new(config.clone(), TranslationCache::identity(translation.cache_capacity));
        if let Some(path) = &config.model_path {
            match MerchantModel::from_file(path) {
                Ok(model) => categorizer.model = Some(CategoryModel::Label(Box::new(model))),
                Err(e) => warn!("Ignoring category model {}: {}", path.display(), e),
            }
        }
        categorizer
    }

    pub fn with_model(mut self, model: CategoryModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_translator(mut self, translator: Box<dyn Translator>) -> Self {
        self.cache = TranslationCache::new(translator, self.cache.capacity());
        self
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Classify a translated description.
    ///
    /// Withdrawal vocabulary always yields no category. A model answer is
    /// used when the model produces one; otherwise the keyword scorer decides.
    pub fn classify(&self, text: &str) -> Classification {
        if WITHDRAWAL.is_match(text) {
            return Classification::uncategorized(self.config.uncategorized_confidence);
        }

        if let Some(model) = &self.model {
            match model.predict_one(text) {
                Ok(prediction) => {
                    return Classification {
                        category: Some(prediction.category),
                        confidence: prediction.probability.unwrap_or(self.config.label_confidence),
                    };
                }
                Err(e) => debug!("Model gave no category for {:?}: {}", text, e),
            }
        }

        match self.keywords.best(text) {
            Some(best) if best.score >= self.config.min_score => Classification {
                category: Some(best.category),
                confidence: (0.35 + best.score * 0.15).min(self.config.max_confidence),
            },
            _ => Classification::uncategorized(self.config.uncategorized_confidence),
        }
    }

    /// Translate and classify one transaction.
    pub fn enrich(&mut self, raw: &RawTransaction) -> CategorizedTransaction {
        let translated = self.cache.translate(&raw.description);
        let classification = self.classify(&translated);
        CategorizedTransaction::new(raw, translated, classification.category, classification.confidence)
    }

    /// Enrich a whole statement into its output payload.
    pub fn enrich_all(&mut self, transactions: &[RawTransaction], metadata: StatementMetadata) -> StatementPayload {
        let transactions = transactions.iter().map(|tx| self.enrich(tx)).collect();
        StatementPayload {
            transactions,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    struct AlwaysLabel(&'static str);

    impl LabelClassifier for AlwaysLabel {
        fn predict(&self, texts: &[&str]) -> Result<Vec<String>, ModelError> {
            Ok(texts.iter().map(|_| self.0.to_string()).collect())
        }
    }

    struct Broken;

    impl LabelClassifier for Broken {
        fn predict(&self, _texts: &[&str]) -> Result<Vec<String>, ModelError> {
            Ok(Vec::new())
        }
    }

    fn categorizer() -> Categorizer {
        Categorizer::new(ClassifierConfig::default(), TranslationCache::identity(None))
    }

    #[test]
    fn test_withdrawal_overrides_model() {
        let c = categorizer().with_model(CategoryModel::Label(Box::new(AlwaysLabel("Groceries"))));
        assert_eq!(c.classify("ATM cash withdrawal"), Classification::uncategorized(0.35));
        assert_eq!(c.classify("Withdrawal from account"), Classification::uncategorized(0.35));
        assert_eq!(c.classify("Treatment"), Classification { category: Some("Groceries".into()), confidence: 0.6 });
    }

    #[test]
    fn test_keyword_confidence() {
        let c = categorizer();
        let result = c.classify("Rent payment to landlord");
        assert_eq!(result.category.as_deref(), Some("Rent"));
        let expected: f64 = 0.35 + (1.0 + 0.9) * 1.1 * 0.15;
        assert!((result.confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn test_low_score_is_uncategorized() {
        // a single 0.6 keyword stays below the minimum score
        assert_eq!(categorizer().classify("Gas"), Classification::uncategorized(0.35));
    }

    #[test]
    fn test_broken_model_falls_back() {
        let c = categorizer().with_model(CategoryModel::Label(Box::new(Broken)));
        assert_eq!(c.classify("Bolt ride").category.as_deref(), Some("Transportation"));
    }

    #[test]
    fn test_enrich_rounds_output() {
        let mut c = categorizer();
        let raw = RawTransaction::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "Netflix",
            Decimal::new(-15999, 3),
        );
        let payload = c.enrich_all(&[raw], StatementMetadata::default());
        let tx = &payload.transactions[0];
        assert_eq!(tx.amount, Decimal::new(-1600, 2));
        assert_eq!(tx.translated_description, "Netflix");
        assert_eq!(tx.category.as_deref(), Some("Entertainment"));
        assert_eq!(tx.confidence, 0.5);
    }
}
