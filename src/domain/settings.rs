use serde::{Deserialize, Serialize};

pub const AI_FILTER_MAX_CHARS: usize = 200;

/// Immutable snapshot of the user's filter settings. Replaced wholesale on reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredSettings", into = "StoredSettings")]
pub struct Settings {
    pub keywords: Vec<String>,
    pub ai_enabled: bool,
    /// Free-text criteria; only meaningful while `ai_enabled` is set.
    pub ai_filter: String,
    pub api_key: Option<String>,
}

impl Settings {
    /// AI classification runs only with the flag on and non-empty criteria.
    pub fn ai_active(&self) -> bool {
        self.ai_enabled && !self.ai_filter.trim().is_empty()
    }

    pub fn normalized(self) -> Self {
        let keywords = self
            .keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        let ai_filter = self
            .ai_filter
            .trim()
            .chars()
            .take(AI_FILTER_MAX_CHARS)
            .collect();
        let api_key = self
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        Self {
            keywords,
            ai_enabled: self.ai_enabled,
            ai_filter,
            api_key,
        }
    }
}

/// Persisted shape shared with the popup. Every field may be missing or null.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
    #[serde(default)]
    keywords: Option<Vec<String>>,
    #[serde(default)]
    ai_enabled: Option<bool>,
    #[serde(default)]
    ai_filter: Option<String>,
    #[serde(default)]
    gemini_api_key: Option<String>,
}

impl From<StoredSettings> for Settings {
    fn from(stored: StoredSettings) -> Self {
        Settings {
            keywords: stored.keywords.unwrap_or_default(),
            ai_enabled: stored.ai_enabled.unwrap_or(false),
            ai_filter: stored.ai_filter.unwrap_or_default(),
            api_key: stored.gemini_api_key,
        }
        .normalized()
    }
}

impl From<Settings> for StoredSettings {
    fn from(settings: Settings) -> Self {
        StoredSettings {
            keywords: Some(settings.keywords),
            ai_enabled: Some(settings.ai_enabled),
            ai_filter: Some(settings.ai_filter),
            gemini_api_key: Some(settings.api_key.unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_and_null_fields_fall_back_to_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"keywords": null, "aiFilter": "  gaming  "}"#).unwrap();
        assert!(settings.keywords.is_empty());
        assert!(!settings.ai_enabled);
        assert_eq!(settings.ai_filter, "gaming");
        assert!(!settings.ai_active());
        assert_eq!(settings.api_key, None);
    }

    #[test]
    fn normalizes_keywords_filter_and_key() {
        let long = "x".repeat(AI_FILTER_MAX_CHARS + 40);
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "keywords": [" clickbait ", "", "   "],
            "aiEnabled": true,
            "aiFilter": long,
            "geminiApiKey": ""
        }))
        .unwrap();
        assert_eq!(settings.keywords, vec!["clickbait".to_string()]);
        assert_eq!(settings.ai_filter.chars().count(), AI_FILTER_MAX_CHARS);
        assert!(settings.ai_active());
        assert_eq!(settings.api_key, None);
    }

    #[test]
    fn serializes_with_persisted_field_names() {
        let settings = Settings {
            keywords: vec!["a".into()],
            ai_enabled: true,
            ai_filter: "f".into(),
            api_key: Some("k".into()),
        };
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["geminiApiKey"], "k");
        assert_eq!(value["aiEnabled"], true);
        let back: Settings = serde_json::from_value(value).unwrap();
        assert_eq!(back, settings);
    }
}
