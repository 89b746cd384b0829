use async_trait::async_trait;
use reqwest::Client;

use crate::{config::GeminiConfig, domain::ClassificationMap};

use super::{
    inference::{
        build_prompt, build_request, parse_decisions, response_text, GenerateContentResponse,
    },
    BatchClassifier, ClassificationRequest, ClassifyError,
};

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(http: Client, config: GeminiConfig) -> Self {
        Self { http, config }
    }

    /// Classifies `titles` against `criteria`. A user key takes precedence
    /// over the configured default key.
    pub async fn classify(
        &self,
        titles: &[String],
        criteria: &str,
        api_key: Option<&str>,
    ) -> Result<ClassificationMap, ClassifyError> {
        if titles.is_empty() {
            return Ok(ClassificationMap::new());
        }
        let key = api_key
            .filter(|k| !k.is_empty())
            .or(self.config.api_key.as_deref())
            .ok_or(ClassifyError::MissingApiKey)?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let request = build_request(build_prompt(titles, criteria));

        tracing::debug!(
            target: "ai",
            titles = titles.len(),
            model = %self.config.model,
            user_key = api_key.is_some_and(|k| !k.is_empty()),
            "sending classification request"
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", key)])
            .timeout(self.config.request_timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        let text = response_text(parsed)?;
        let decisions = parse_decisions(&text, titles);

        tracing::debug!(
            target: "ai",
            hidden = decisions.values().filter(|hide| **hide).count(),
            total = decisions.len(),
            "classification parsed"
        );
        Ok(decisions)
    }
}

#[async_trait]
impl BatchClassifier for GeminiClient {
    async fn classify_batch(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationMap, ClassifyError> {
        self.classify(&request.titles, &request.criteria, request.api_key.as_deref())
            .await
    }
}
