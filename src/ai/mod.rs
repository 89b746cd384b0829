pub mod client;
pub mod error;
pub mod inference;

use async_trait::async_trait;

use crate::domain::ClassificationMap;

pub use client::GeminiClient;
pub use error::ClassifyError;

/// One batch of distinct titles plus the criteria they are judged against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub titles: Vec<String>,
    pub criteria: String,
    pub api_key: Option<String>,
}

/// Boundary to whatever decides "hide" for a batch of titles.
#[async_trait]
pub trait BatchClassifier: Send + Sync {
    async fn classify_batch(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationMap, ClassifyError>;
}
