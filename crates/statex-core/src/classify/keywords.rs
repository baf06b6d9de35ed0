//! Weighted keyword category scorer.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s]").unwrap();
}

/// Category → (keyword, weight), in tie-break order.
pub const CATEGORY_KEYWORDS: &[(&str, &[(&str, f64)])] = &[
    (
        "Groceries",
        &[
            ("grocery", 1.0),
            ("supermarket", 1.0),
            ("market", 0.9),
            ("carrefour", 1.0),
            ("food", 0.6),
            ("mart", 0.6),
            ("store", 0.7),
            ("shop", 0.7),
            ("walmart", 1.0),
            ("target", 1.0),
            ("costco", 1.0),
        ],
    ),
    (
        "Restaurants",
        &[
            ("restaurant", 1.0),
            ("cafe", 0.9),
            ("bar", 0.7),
            ("coffee", 0.6),
            ("burger", 0.6),
            ("pizza", 0.9),
            ("mcdonald", 1.0),
            ("starbucks", 1.0),
            ("kfc", 1.0),
            ("dining", 0.9),
            ("bistro", 0.8),
        ],
    ),
    (
        "Transportation",
        &[
            ("taxi", 1.0),
            ("uber", 1.0),
            ("bolt", 1.0),
            ("bus", 0.6),
            ("fuel", 0.6),
            ("gas", 0.6),
            ("metro", 0.6),
            ("transport", 1.0),
            ("tram", 0.7),
            ("subway", 0.7),
            ("train", 0.7),
            ("parking", 0.8),
            ("toll", 0.8),
        ],
    ),
    (
        "Rent",
        &[
            ("rent", 1.0),
            ("housing", 0.9),
            ("apartment", 0.8),
            ("lease", 0.8),
            ("landlord", 0.9),
        ],
    ),
    (
        "Entertainment",
        &[
            ("entertainment", 1.0),
            ("movie", 0.9),
            ("cinema", 1.0),
            ("cavea", 1.0),
            ("theater", 0.9),
            ("netflix", 1.0),
            ("spotify", 1.0),
            ("streaming", 0.9),
            ("game", 0.8),
            ("gaming", 0.8),
            ("concert", 0.9),
        ],
    ),
    (
        "Fitness",
        &[
            ("gym", 1.0),
            ("fitness", 1.0),
            ("workout", 0.9),
            ("exercise", 0.8),
            ("sport", 0.8),
            ("yoga", 0.9),
            ("pilates", 0.9),
        ],
    ),
    (
        "Clothes",
        &[
            ("clothes", 1.0),
            ("clothing", 1.0),
            ("shirt", 0.9),
            ("pants", 0.8),
            ("shoes", 0.9),
            ("h&m", 1.0),
            ("zara", 1.0),
            ("nike", 1.0),
            ("adidas", 1.0),
            ("fashion", 0.8),
        ],
    ),
    (
        "Food",
        &[
            ("food", 0.9),
            ("meal", 0.8),
            ("lunch", 0.7),
            ("dinner", 0.7),
            ("breakfast", 0.7),
        ],
    ),
    (
        "Technology",
        &[
            ("technology", 1.0),
            ("tech", 1.0),
            ("computer", 0.9),
            ("laptop", 0.9),
            ("phone", 0.8),
            ("software", 0.9),
            ("app", 0.7),
            ("apple", 0.8),
            ("samsung", 0.8),
        ],
    ),
    (
        "Furniture",
        &[
            ("furniture", 1.0),
            ("ikea", 1.0),
            ("sofa", 0.9),
            ("chair", 0.8),
            ("table", 0.8),
            ("bed", 0.8),
        ],
    ),
    (
        "Gifts",
        &[("gift", 1.0), ("present", 0.9), ("donation", 0.7)],
    ),
    (
        "Fees",
        &[
            ("fee", 1.0),
            ("commission", 1.0),
            ("charge", 0.6),
            ("service fee", 1.0),
            ("transaction fee", 1.0),
        ],
    ),
    (
        "Cash Withdrawal",
        &[
            ("cash withdrawal", 1.0),
            ("withdrawal", 0.9),
            ("atm", 1.0),
            ("cash-out", 0.9),
            ("cash in", 0.6),
        ],
    ),
    (
        "Deposit",
        &[
            ("deposit", 1.0),
            ("top up", 0.9),
            ("cash-in", 0.9),
            ("credit", 0.6),
            ("salary", 0.8),
            ("income", 0.7),
        ],
    ),
];

const SUBSTRING_FACTOR: f64 = 0.8;
const MULTI_MATCH_BONUS: f64 = 1.1;

/// Lowercase, replace punctuation with spaces and collapse whitespace.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_WORD
        .replace_all(&lowered, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

struct Keyword {
    term: String,
    pattern: Regex,
    weight: f64,
}

/// A scored category guess.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordScore {
    pub category: String,
    pub score: f64,
    pub matched: Vec<String>,
}

/// Keyword scorer over a category table.
pub struct KeywordClassifier {
    categories: Vec<(String, Vec<Keyword>)>,
}

impl KeywordClassifier {
    /// Scorer over the built-in category table.
    pub fn new() -> Self {
        Self::from_table(CATEGORY_KEYWORDS)
    }

    pub fn from_table(table: &[(&str, &[(&str, f64)])]) -> Self {
        let categories = table
            .iter()
            .map(|(category, keywords)| {
                let keywords = keywords
                    .iter()
                    .filter_map(|(keyword, weight)| {
                        // keywords go through the same normalization as the text ("h&m" -> "h m")
                        let term = normalize_text(keyword);
                        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&term))).ok()?;
                        Some(Keyword {
                            term,
                            pattern,
                            weight: *weight,
                        })
                    })
                    .collect();
                (category.to_string(), keywords)
            })
            .collect();
        Self { categories }
    }

    /// Score every category and return the best one with a positive score.
    ///
    /// Whole-word matches count full weight, substring matches 0.8x; more
    /// than one matched keyword earns a 1.1x bonus. Earlier categories win ties.
    pub fn best(&self, text: &str) -> Option<KeywordScore> {
        let normalized = normalize_text(text);
        let mut best: Option<KeywordScore> = None;

        for (category, keywords) in &self.categories {
            let mut score = 0.0;
            let mut matched = Vec::new();

            for keyword in keywords {
                if keyword.pattern.is_match(&normalized) {
                    score += keyword.weight;
                    matched.push(keyword.term.clone());
                } else if normalized.contains(&keyword.term) {
                    score += keyword.weight * SUBSTRING_FACTOR;
                    matched.push(keyword.term.clone());
                }
            }

            if matched.len() > 1 {
                score *= MULTI_MATCH_BONUS;
            }

            if score > best.as_ref().map_or(0.0, |b| b.score) {
                best = Some(KeywordScore {
                    category: category.clone(),
                    score,
                    matched,
                });
            }
        }

        best
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  H&M  Tbilisi-Mall! "), "h m tbilisi mall");
    }

    #[test]
    fn test_whole_word_and_bonus() {
        let scorer = KeywordClassifier::new();
        let best = scorer.best("Coffee at Starbucks").unwrap();
        assert_eq!(best.category, "Restaurants");
        assert!((best.score - (0.6 + 1.0) * 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_substring_weight() {
        let scorer = KeywordClassifier::new();
        let best = scorer.best("Netflixcom subscription").unwrap();
        assert_eq!(best.category, "Entertainment");
        assert!((best.score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_normalized_keyword() {
        let best = KeywordClassifier::new().best("H&M Galleria").unwrap();
        assert_eq!(best.category, "Clothes");
    }

    #[test]
    fn test_no_match() {
        assert!(KeywordClassifier::new().best("Lorem ipsum").is_none());
    }
}
