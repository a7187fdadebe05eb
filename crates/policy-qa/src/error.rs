use thiserror::Error;

/// Errors that abort an entire request. Everything else in the pipeline
/// degrades to a placeholder answer instead of propagating.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to fetch document: {0}")]
    Fetch(String),

    #[error("failed to extract text from document: {0}")]
    Extraction(String),

    #[error("document contains no extractable text")]
    NoDocumentText,

    #[error("no valid clauses found in document")]
    NoClausesFound,
}

/// Errors from a single call to the external text-generation service.
/// The synthesizer absorbs these into fallback answers; they never cross
/// the orchestrator boundary.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("failed to connect to {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    #[error("generation API error ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("malformed response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    #[error("generation service returned no completion")]
    EmptyCompletion,
}
