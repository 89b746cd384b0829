use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    ai::{BatchClassifier, ClassificationRequest, ClassifyError, GeminiClient},
    domain::ClassificationMap,
    protocol::{Ack, BatchAnalysisResponse, Request, Response},
    storage::{self, SettingsStore},
};

/// Background side of the extension: owns the AI provider call and answers
/// protocol messages.
pub struct BackgroundService {
    store: Arc<dyn SettingsStore>,
    gemini: GeminiClient,
}

impl BackgroundService {
    pub fn new(store: Arc<dyn SettingsStore>, gemini: GeminiClient) -> Self {
        Self { store, gemini }
    }

    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::AnalyzeTitlesBatch { titles } => {
                Response::BatchAnalysis(self.analyze(titles).await)
            }
            Request::TestBackground => Response::Ack(Ack {
                success: true,
                message: Some("background service is running".into()),
            }),
            other => {
                tracing::debug!(target: "background", request = ?other, "message not handled here");
                Response::empty()
            }
        }
    }

    async fn analyze(&self, titles: Vec<String>) -> BatchAnalysisResponse {
        let settings = storage::load_or_default(self.store.as_ref()).await;
        if !settings.ai_active() {
            tracing::debug!(target: "background", "AI filtering disabled or no criteria set");
            return BatchAnalysisResponse::default();
        }

        tracing::info!(
            target: "background",
            titles = titles.len(),
            criteria = %settings.ai_filter,
            "analyzing batch"
        );

        match self
            .gemini
            .classify(&titles, &settings.ai_filter, settings.api_key.as_deref())
            .await
        {
            Ok(results) => BatchAnalysisResponse {
                results,
                ai_enabled: true,
                ai_filter: Some(settings.ai_filter),
                error: None,
            },
            Err(err) => {
                tracing::warn!(target: "background", error = %err, "batch analysis failed");
                BatchAnalysisResponse {
                    results: ClassificationMap::new(),
                    ai_enabled: true,
                    ai_filter: Some(settings.ai_filter),
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

/// Content-side classifier that goes through the background message
/// protocol. The background reads the criteria from the settings store.
#[derive(Clone)]
pub struct BackgroundBridge {
    service: Arc<BackgroundService>,
}

impl BackgroundBridge {
    pub fn new(service: Arc<BackgroundService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl BatchClassifier for BackgroundBridge {
    async fn classify_batch(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationMap, ClassifyError> {
        let message = Request::AnalyzeTitlesBatch {
            titles: request.titles.clone(),
        };
        match self.service.handle(message).await {
            Response::BatchAnalysis(BatchAnalysisResponse {
                error: Some(error), ..
            }) => Err(ClassifyError::Rejected(error)),
            Response::BatchAnalysis(analysis) => Ok(analysis.results),
            other => Err(ClassifyError::Rejected(format!(
                "unexpected response to batch request: {other:?}"
            ))),
        }
    }
}
