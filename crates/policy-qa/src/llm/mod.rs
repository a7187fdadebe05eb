pub mod provider;

pub use provider::ChatCompletionProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Sampling parameters for a single generation call. Low temperature by
/// default to bias toward deterministic, factual completions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 200,
            temperature: 0.1,
            top_p: 0.9,
        }
    }
}

/// The external text-generation service, treated as an untrusted, fallible
/// oracle: one prompt in, one completion out, typed errors for every way it
/// can fail.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, GenerationError>;
}
