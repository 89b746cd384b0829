use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::ClassificationMap;

use super::ClassifyError;

const HIDE: &str = "HIDE";

static NUMBERING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+\s*[.):\-]?\s*").expect("valid numbering regex"));

pub fn build_prompt(titles: &[String], criteria: &str) -> String {
    let listing = titles
        .iter()
        .enumerate()
        .map(|(i, title)| format!("{}. {}", i + 1, title))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You filter YouTube video listings for a user.\n\n\
         The user wants to hide videos matching: \"{criteria}\"\n\n\
         Decide for every title below whether it should be HIDDEN under that criteria.\n\n\
         Titles:\n{listing}\n\n\
         Rules:\n\
         - Answer with exactly one line per title, containing only HIDE or SHOW\n\
         - Keep the same order as the numbered titles\n\
         - Hide only titles that clearly match the criteria\n\
         - When unsure, answer SHOW\n\n\
         Answer (one decision per line):"
    )
}

pub fn build_request(prompt: String) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part { text: Some(prompt) }],
        }],
        generation_config: GenerationConfig {
            temperature: 0.1,
            max_output_tokens: 1000,
        },
    }
}

/// Text of the first part of the first candidate.
pub fn response_text(response: GenerateContentResponse) -> Result<String, ClassifyError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or(ClassifyError::EmptyResponse)
}

/// Maps the i-th non-blank answer line onto the i-th title. Titles without an
/// answer line are shown.
pub fn parse_decisions(text: &str, titles: &[String]) -> ClassificationMap {
    let mut answers = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(normalize_answer);

    titles
        .iter()
        .map(|title| {
            let hide = answers.next().is_some_and(|answer| answer == HIDE);
            (title.clone(), hide)
        })
        .collect()
}

fn normalize_answer(line: &str) -> String {
    NUMBERING
        .replace(line, "")
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_uppercase()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}
