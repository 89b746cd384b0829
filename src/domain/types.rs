use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

/// Title -> "hide" decision, as returned by the AI classifier.
pub type ClassificationMap = HashMap<String, bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HiddenReason {
    Keyword,
    Ai,
}

impl HiddenReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            HiddenReason::Keyword => "keyword",
            HiddenReason::Ai => "ai",
        }
    }
}

impl fmt::Display for HiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenRecord {
    pub title: String,
    pub reason: HiddenReason,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub url: Option<String>,
}

/// Payload answered to `GET_HIDDEN_VIDEOS`, most recent record first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiddenVideosSnapshot {
    pub hidden_videos: Vec<HiddenRecord>,
    pub total_count: usize,
    pub keyword_count: usize,
    pub ai_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub pending_titles: usize,
    pub pending_elements: usize,
}
