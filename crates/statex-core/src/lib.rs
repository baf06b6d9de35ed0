//! Core library for bank statement transaction extraction.
//!
//! This crate provides:
//! - PDF statement reading (page text and table detection)
//! - Date, amount and currency normalization for mixed conventions
//! - Table-based and free-text transaction extraction with reconciliation
//! - Keyword and model based category classification

pub mod classify;
pub mod error;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod pdf;

pub use classify::{Categorizer, Classification, CategoryModel, MerchantModel, TranslationCache, Translator};
pub use error::{Result, StatexError};
pub use extract::{CandidateSource, DropCounts, ExtractionReport, StatementExtraction, StatementExtractor};
pub use models::{
    CategorizedTransaction, CurrencyDetection, RawTransaction, StatementMetadata, StatementPayload,
    StatexConfig,
};
pub use pdf::{PdfStatement, StatementDocument, StatementPage, Table, TableProfile, TableSettings};
