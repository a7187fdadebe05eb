use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::RankingConfig;
use crate::query::STOP_WORDS;
use crate::types::ScoredClause;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token regex is valid"));

/// Scores candidate clauses against a query in a TF-IDF vector space built
/// fresh for every call — no state is shared across requests.
pub struct RelevanceRanker {
    config: RankingConfig,
}

impl RelevanceRanker {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    /// Returns up to `top_k` clauses scoring strictly above the configured
    /// threshold, descending by score, ties in original clause order. An
    /// empty result is a valid outcome, not an error.
    pub fn rank(&self, query: &str, clauses: &[String], top_k: usize) -> Vec<ScoredClause> {
        if clauses.is_empty() {
            return Vec::new();
        }

        let clauses = &clauses[..clauses.len().min(self.config.max_candidates)];

        match self.cosine_scores(query, clauses) {
            Some(scores) => {
                let mut scored: Vec<ScoredClause> = clauses
                    .iter()
                    .zip(scores)
                    .filter(|(_, score)| *score > self.config.min_score_threshold)
                    .map(|(text, score)| ScoredClause {
                        text: text.clone(),
                        score,
                    })
                    .collect();
                sort_descending(&mut scored);
                scored.truncate(top_k);
                scored
            }
            None => {
                // Vector space degenerated (no query terms survived); fall
                // back to plain token overlap.
                tracing::debug!("TF-IDF degenerate for query, using token-overlap fallback");
                self.overlap_scores(query, clauses, top_k)
            }
        }
    }

    /// Cosine similarity between the query and each clause in a TF-IDF
    /// space over `{query} ∪ clauses`. `None` when the query contributes no
    /// terms to the vocabulary.
    fn cosine_scores(&self, query: &str, clauses: &[String]) -> Option<Vec<f32>> {
        let query_terms = terms(query);
        let clause_terms: Vec<Vec<String>> = clauses.iter().map(|c| terms(c)).collect();

        let vocabulary = build_vocabulary(
            std::iter::once(&query_terms).chain(clause_terms.iter()),
            self.config.max_features,
        );
        if vocabulary.is_empty() {
            return None;
        }

        let n_docs = clause_terms.len() + 1;
        let mut df = vec![0usize; vocabulary.len()];
        let all_docs = std::iter::once(&query_terms).chain(clause_terms.iter());
        for doc in all_docs {
            let mut seen = HashSet::new();
            for term in doc {
                if let Some(&idx) = vocabulary.get(term.as_str()) {
                    if seen.insert(idx) {
                        df[idx] += 1;
                    }
                }
            }
        }

        // Smoothed idf, as if every term appeared in one extra document.
        let idf: Vec<f32> = df
            .iter()
            .map(|&d| ((1 + n_docs) as f32 / (1 + d) as f32).ln() + 1.0)
            .collect();

        let query_vec = tfidf_vector(&query_terms, &vocabulary, &idf)?;

        let scores = clause_terms
            .iter()
            .map(|doc| match tfidf_vector(doc, &vocabulary, &idf) {
                Some(clause_vec) => dot_sparse(&query_vec, &clause_vec),
                None => 0.0,
            })
            .collect();
        Some(scores)
    }

    /// Count of shared lowercase word tokens, normalized by query token
    /// count so scores stay in [0, 1].
    fn overlap_scores(&self, query: &str, clauses: &[String], top_k: usize) -> Vec<ScoredClause> {
        let query_words: HashSet<String> =
            query.to_lowercase().split_whitespace().map(String::from).collect();
        if query_words.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<ScoredClause> = clauses
            .iter()
            .filter_map(|clause| {
                let clause_words: HashSet<String> = clause
                    .to_lowercase()
                    .split_whitespace()
                    .map(String::from)
                    .collect();
                let shared = query_words.intersection(&clause_words).count();
                if shared == 0 {
                    return None;
                }
                Some(ScoredClause {
                    text: clause.clone(),
                    score: shared as f32 / query_words.len() as f32,
                })
            })
            .collect();
        sort_descending(&mut scored);
        scored.truncate(top_k);
        scored
    }
}

/// Unigrams and bigrams over lowercase word tokens, stop words excluded.
fn terms(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !STOP_WORDS.contains(t))
        .collect();

    let mut terms: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    for pair in tokens.windows(2) {
        terms.push(format!("{} {}", pair[0], pair[1]));
    }
    terms
}

/// Map the most frequent `max_features` terms to dense indices. Ties break
/// lexically so the space is deterministic.
fn build_vocabulary<'a, I>(docs: I, max_features: usize) -> HashMap<String, usize>
where
    I: Iterator<Item = &'a Vec<String>>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for doc in docs {
        for term in doc {
            *counts.entry(term.as_str()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(max_features);
    // Re-sort lexically so index assignment does not depend on counts.
    ranked.sort_by(|a, b| a.0.cmp(b.0));

    ranked
        .into_iter()
        .enumerate()
        .map(|(idx, (term, _))| (term.to_string(), idx))
        .collect()
}

/// Sparse L2-normalized tf-idf vector; `None` when the document contributes
/// no in-vocabulary terms.
fn tfidf_vector(
    doc: &[String],
    vocabulary: &HashMap<String, usize>,
    idf: &[f32],
) -> Option<HashMap<usize, f32>> {
    let mut tf: HashMap<usize, f32> = HashMap::new();
    for term in doc {
        if let Some(&idx) = vocabulary.get(term.as_str()) {
            *tf.entry(idx).or_insert(0.0) += 1.0;
        }
    }
    if tf.is_empty() {
        return None;
    }

    for (idx, weight) in tf.iter_mut() {
        *weight *= idf[*idx];
    }
    let norm: f32 = tf.values().map(|w| w * w).sum::<f32>().sqrt();
    if norm == 0.0 {
        return None;
    }
    for weight in tf.values_mut() {
        *weight /= norm;
    }
    Some(tf)
}

fn dot_sparse(a: &HashMap<usize, f32>, b: &HashMap<usize, f32>) -> f32 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(idx, wa)| large.get(idx).map(|wb| wa * wb))
        .sum()
}

fn sort_descending(scored: &mut [ScoredClause]) {
    // Stable sort keeps original clause order for equal scores.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}
