use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::SegmentationConfig;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));
static NUMBERED_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d+\.\s+").expect("numbered item regex is valid"));

/// How candidate clauses are carved out of the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStrategy {
    /// Sentence split only.
    Sentences,
    /// Sentence split plus a second pass that captures numbered list items
    /// (`1. ...`, `2. ...`) as whole clauses.
    SentencesAndNumberedItems,
}

/// Splits extracted text into a bounded, deduplicated set of candidate
/// clauses. Deterministic for identical input.
pub struct ClauseSegmenter {
    config: SegmentationConfig,
}

impl ClauseSegmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    /// Zero clauses is a valid result; the caller decides whether that is a
    /// domain error.
    pub fn segment(&self, text: &str) -> Vec<String> {
        let text = truncate_at_char_boundary(text, self.config.max_text_len);

        let mut seen: HashSet<String> = HashSet::new();
        let mut clauses: Vec<String> = Vec::new();
        let mut push_candidate = |candidate: &str| {
            let candidate = candidate.trim();
            if candidate.len() < self.config.min_clause_len
                || candidate.len() > self.config.max_clause_len
            {
                return;
            }
            if seen.insert(candidate.to_string()) {
                clauses.push(candidate.to_string());
            }
        };

        let normalized = WHITESPACE_RE.replace_all(text, " ");
        for sentence in normalized.trim().split('.') {
            push_candidate(sentence);
        }

        if self.config.strategy == SegmentStrategy::SentencesAndNumberedItems {
            // Scan the raw (pre-collapse) text so line starts are still visible.
            for item in numbered_items(text) {
                let collapsed = WHITESPACE_RE.replace_all(&item, " ");
                push_candidate(&collapsed);
            }
        }

        clauses.truncate(self.config.max_clauses);

        tracing::debug!(
            clauses = clauses.len(),
            strategy = ?self.config.strategy,
            "segmented document text"
        );
        clauses
    }
}

/// Capture the body of each numbered list item: from the end of its `N.`
/// marker to the start of the next item, a blank line, or end of text.
fn numbered_items(text: &str) -> Vec<String> {
    let markers: Vec<(usize, usize)> = NUMBERED_ITEM_RE
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();

    let mut items = Vec::with_capacity(markers.len());
    for (i, &(_, body_start)) in markers.iter().enumerate() {
        let body_end = markers
            .get(i + 1)
            .map(|&(next_start, _)| next_start)
            .unwrap_or(text.len());

        let body = &text[body_start..body_end];
        let body = match body.find("\n\n") {
            Some(blank) => &body[..blank],
            None => body,
        };
        items.push(body.trim().to_string());
    }
    items
}

fn truncate_at_char_boundary(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
