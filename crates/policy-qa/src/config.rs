use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::processing::segmenter::SegmentStrategy;
use crate::synthesis::AnswerMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub segmentation: SegmentationConfig,
    pub ranking: RankingConfig,
    pub synthesis: SynthesisConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Input text beyond this many characters is never considered.
    pub max_text_len: usize,
    pub min_clause_len: usize,
    pub max_clause_len: usize,
    /// Hard cap on candidate clauses to bound ranking and generation cost.
    pub max_clauses: usize,
    pub strategy: SegmentStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Only the first `max_candidates` clauses are vectorized.
    pub max_candidates: usize,
    /// Vocabulary cap for the TF-IDF space.
    pub max_features: usize,
    /// Clauses must score strictly above this to be returned.
    pub min_score_threshold: f32,
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    pub mode: AnswerMode,
    /// Concatenated clause context is truncated to this many characters.
    pub max_context_chars: usize,
    pub temperature: f32,
    pub max_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub timeout_secs: u64,
}

impl PipelineConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.segmentation.min_clause_len >= self.segmentation.max_clause_len {
            return Err("segmentation.min_clause_len must be < max_clause_len".into());
        }
        if self.segmentation.max_clauses == 0 {
            return Err("segmentation.max_clauses must be > 0".into());
        }
        if self.ranking.top_k == 0 {
            return Err("ranking.top_k must be > 0".into());
        }
        if self.ranking.max_candidates == 0 {
            return Err("ranking.max_candidates must be > 0".into());
        }
        if self.ranking.max_features == 0 {
            return Err("ranking.max_features must be > 0".into());
        }
        if !(0.0..=1.0).contains(&self.ranking.min_score_threshold) {
            return Err("ranking.min_score_threshold must be in [0.0, 1.0]".into());
        }
        if self.synthesis.max_context_chars == 0 {
            return Err("synthesis.max_context_chars must be > 0".into());
        }
        if self.fetch.timeout_secs == 0 {
            return Err("fetch.timeout_secs must be > 0".into());
        }
        Ok(())
    }

    /// Load config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segmentation: SegmentationConfig {
                max_text_len: 50_000,
                min_clause_len: 30,
                max_clause_len: 1000,
                max_clauses: 100,
                strategy: SegmentStrategy::SentencesAndNumberedItems,
            },
            ranking: RankingConfig {
                max_candidates: 50,
                max_features: 500,
                min_score_threshold: 0.05,
                top_k: 5,
            },
            synthesis: SynthesisConfig {
                mode: AnswerMode::Classification,
                max_context_chars: 1500,
                temperature: 0.1,
                max_tokens: 200,
            },
            fetch: FetchConfig { timeout_secs: 30 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_length_bounds() {
        let mut config = PipelineConfig::default();
        config.segmentation.min_clause_len = 2000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut config = PipelineConfig::default();
        config.ranking.min_score_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_file() {
        let path = std::env::temp_dir().join("policy-qa-config-test.json");
        let json = serde_json::to_string_pretty(&PipelineConfig::default()).unwrap();
        std::fs::write(&path, json).unwrap();

        let loaded = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ranking.top_k, 5);
        assert_eq!(loaded.segmentation.max_clauses, 100);

        std::fs::remove_file(&path).ok();
    }
}
