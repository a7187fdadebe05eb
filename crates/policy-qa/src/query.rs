use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z]{3,}\b").expect("keyword regex is valid"));
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+(?:[.,]\d+)?\b").expect("number regex is valid"));
static MONEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[₹$€£]\s*\d+(?:[.,]\d+)?(?:\s*(?:lakh|crore|thousand|million|billion))?")
        .expect("money regex is valid")
});

pub static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "been", "be",
        "have", "has", "had", "do", "does", "did", "will", "would", "could", "should", "may",
        "might", "must", "can", "to", "of", "in", "for", "with", "by", "from", "and", "or", "but",
        "not", "no", "so", "if", "then", "than", "this", "that", "these", "those", "i", "you",
        "he", "she", "it", "we", "they", "me", "him", "her", "us", "them",
    ]
    .into_iter()
    .collect()
});

/// Derives an "enhanced" lexical form of a question: salient keywords,
/// numeric tokens, and currency amounts, stop words removed. Pure function,
/// no I/O.
pub struct QueryNormalizer;

impl QueryNormalizer {
    /// Never returns an empty string for non-empty input: when nothing
    /// survives filtering, the original question is returned unchanged.
    pub fn normalize(question: &str) -> String {
        let lowered = question.to_lowercase();

        let keywords = KEYWORD_RE
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|word| !STOP_WORDS.contains(word));

        let numbers = NUMBER_RE.find_iter(question).map(|m| m.as_str());
        let amounts = MONEY_RE.find_iter(question).map(|m| m.as_str());

        let terms: Vec<&str> = keywords.chain(numbers).chain(amounts).collect();
        if terms.is_empty() {
            question.to_string()
        } else {
            terms.join(" ")
        }
    }
}
