//! Data models for statements and configuration.

pub mod config;
pub mod statement;

pub use crate::normalize::currency::CurrencyDetection;
pub use config::{ClassifierConfig, ExtractionConfig, LegacyColumnLayout, StatexConfig, TranslationConfig};
pub use statement::{CategorizedTransaction, RawTransaction, StatementMetadata, StatementPayload};
