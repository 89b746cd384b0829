use serde::{Deserialize, Serialize};

use crate::domain::{ClassificationMap, HiddenVideosSnapshot};

/// Messages exchanged between the content pipeline, the popup and the
/// background service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    AnalyzeTitlesBatch {
        #[serde(default)]
        titles: Vec<String>,
    },
    UpdateFilters,
    GetHiddenVideos,
    TestBackground,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    BatchAnalysis(BatchAnalysisResponse),
    HiddenVideos(HiddenVideosSnapshot),
    Ack(Ack),
    Empty(Empty),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAnalysisResponse {
    pub results: ClassificationMap,
    pub ai_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

impl Response {
    pub fn empty() -> Self {
        Response::Empty(Empty {})
    }
}
