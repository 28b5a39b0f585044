//! AI-assisted submission autofill
//!
//! Asks an external text-generation service for a structured
//! {description, tags, thumbnail keyword, safety rating} given a title and
//! category. Failure is always recoverable: the caller keeps the form
//! untouched and the submitter fills the fields manually.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::models::{Category, SafetyRating};

/// Request timeout in seconds
const REQUEST_TIMEOUT: u64 = 10;

/// Base endpoint of the hosted generation API
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Structured suggestion returned by the generation service
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AutofillSuggestion {
    /// Generated description, kept under 300 characters by the prompt
    pub description: String,
    /// Suggested tags
    pub tags: Vec<String>,
    /// A keyword for a relevant image search
    pub suggested_thumbnail: String,
    /// Suggested safety label
    pub safety_rating: SafetyRating,
}

/// Errors from the autofill boundary
#[derive(Error, Debug)]
pub enum AutofillError {
    /// No API key is configured
    #[error("autofill is not configured (set ai_api_key in the config)")]
    NotConfigured,

    /// The HTTP request failed or timed out
    #[error("autofill request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("autofill service replied with status {status}: {body}")]
    Service { status: u16, body: String },

    /// The reply could not be turned into a suggestion
    #[error("autofill returned an unusable reply: {0}")]
    Malformed(String),
}

/// Boundary for structured content generation
#[async_trait]
pub trait ContentAutofill: Send + Sync {
    /// Generate a suggestion for the given title and category
    async fn generate(
        &self,
        title: &str,
        category: Category,
    ) -> Result<AutofillSuggestion, AutofillError>;
}

/// Client for the hosted Gemini generateContent endpoint
pub struct GeminiAutofill {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiAutofill {
    /// Build a client from configuration
    ///
    /// Fails before any network call when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Self, AutofillError> {
        let api_key = config
            .ai_api_key
            .clone()
            .ok_or(AutofillError::NotConfigured)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT))
            .build()?;

        Ok(Self {
            http,
            api_key,
            model: config.ai_model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", API_BASE, self.model)
    }
}

#[async_trait]
impl ContentAutofill for GeminiAutofill {
    async fn generate(
        &self,
        title: &str,
        category: Category,
    ) -> Result<AutofillSuggestion, AutofillError> {
        debug!(title, category = %category, model = %self.model, "Requesting autofill");

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(title, category))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AutofillError::Service {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        parse_reply(&body)
    }
}

/// Prompt sent to the generation service
fn build_prompt(title: &str, category: Category) -> String {
    format!(
        "Generate a detailed description, relevant tags, and a community safety rating \
         for this {}: \"{}\". The safety rating should be 'Safe', 'Caution', or 'Unknown' \
         based on typical content of this title. Keep the description under 300 characters.",
        category, title
    )
}

/// Request body with the structured-output schema
///
/// The schema forces the reply into the exact suggestion shape, so parsing
/// only has to unwrap the envelope and decode one JSON object.
fn request_body(title: &str, category: Category) -> serde_json::Value {
    json!({
        "contents": [{ "parts": [{ "text": build_prompt(title, category) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "description": { "type": "STRING" },
                    "tags": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "suggestedThumbnail": {
                        "type": "STRING",
                        "description": "A keyword for a relevant image search"
                    },
                    "safetyRating": {
                        "type": "STRING",
                        "enum": ["Safe", "Caution", "Unknown"]
                    }
                },
                "required": ["description", "tags", "suggestedThumbnail", "safetyRating"]
            }
        }
    })
}

#[derive(Debug, Default, Deserialize)]
struct GenerateReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// Decode a generateContent reply into a suggestion
fn parse_reply(body: &str) -> Result<AutofillSuggestion, AutofillError> {
    let reply: GenerateReply = serde_json::from_str(body)
        .map_err(|e| AutofillError::Malformed(format!("invalid response envelope: {}", e)))?;

    let text = reply
        .candidates
        .first()
        .and_then(|candidate| candidate.content.parts.first())
        .map(|part| part.text.as_str())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| AutofillError::Malformed("response carried no text part".to_string()))?;

    serde_json::from_str(text).map_err(|e| {
        AutofillError::Malformed(format!("suggestion is not the expected JSON shape: {}", e))
    })
}
