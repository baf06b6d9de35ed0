//! Description translation with a per-run memo cache.

use std::collections::{HashMap, VecDeque};
use tracing::debug;

use crate::error::TranslateError;

/// Translates text into the reference language.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str) -> Result<String, TranslateError>;
}

/// Returns text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        Ok(text.to_string())
    }
}

/// Memoizing wrapper around a translator.
///
/// With a capacity the oldest entry is evicted first; without one every entry
/// is kept for the lifetime of the cache. A failed translation caches the
/// original text.
pub struct TranslationCache {
    translator: Box<dyn Translator>,
    capacity: Option<usize>,
    entries: HashMap<String, String>,
    order: VecDeque<String>,
    hits: usize,
    misses: usize,
}

impl TranslationCache {
    pub fn new(translator: Box<dyn Translator>, capacity: Option<usize>) -> Self {
        Self {
            translator,
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Cache with no translator: every text maps to itself.
    pub fn identity(capacity: Option<usize>) -> Self {
        Self::new(Box::new(IdentityTranslator), capacity)
    }

    pub fn translate(&mut self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        if let Some(cached) = self.entries.get(text) {
            self.hits += 1;
            return cached.clone();
        }
        self.misses += 1;

        let translated = match self.translator.translate(text) {
            Ok(t) => t,
            Err(e) => {
                debug!("Translation failed, keeping original: {}", e);
                text.to_string()
            }
        };
        self.insert(text, &translated);
        translated
    }

    fn insert(&mut self, text: &str, translated: &str) {
        if self.capacity == Some(0) {
            return;
        }
        if let Some(cap) = self.capacity {
            while self.order.len() >= cap {
                match self.order.pop_front() {
                    Some(oldest) => {
                        self.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
        self.entries.insert(text.to_string(), translated.to_string());
        self.order.push_back(text.to_string());
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}
