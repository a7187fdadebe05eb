//! Clause retrieval and answer synthesis for insurance policy documents.
//!
//! Given a document (PDF, DOCX, or plain text) and a batch of questions,
//! the pipeline segments the document into candidate clauses, ranks them
//! against each question with a per-call TF-IDF model, and synthesizes an
//! answer through one external text-generation call per question, with
//! typed fallbacks at every stage.

pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod llm;
pub mod processing;
pub mod query;
pub mod ranking;
pub mod synthesis;
pub mod templates;
pub mod types;

// Re-export primary types for convenience
pub use config::PipelineConfig;
pub use engine::ClaimPipeline;
pub use error::{GenerationError, PipelineError};
pub use llm::{ChatCompletionProvider, GenerationConfig, TextGenerator};
pub use processing::{ClauseSegmenter, SegmentStrategy, TextExtractor};
pub use query::QueryNormalizer;
pub use ranking::RelevanceRanker;
pub use synthesis::{AnswerMode, AnswerSynthesizer};
pub use types::{Answer, ClaimDecision, DocumentFormat, DocumentSource, ScoredClause};
