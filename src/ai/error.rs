use thiserror::Error;

/// Why a batch could not be classified. Every variant fails open upstream.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("no Gemini API key configured")]
    MissingApiKey,
    #[error("request to AI provider failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("AI provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed AI provider response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("AI provider response contained no text")]
    EmptyResponse,
    #[error("background rejected the batch: {0}")]
    Rejected(String),
    #[error("classification task aborted")]
    Aborted,
}
