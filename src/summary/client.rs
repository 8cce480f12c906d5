use axum::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GenAiConfig;

/// Produces a prose summary from a JSON-serialized report set. Behind a
/// trait object so tests can substitute a canned implementation.
#[async_trait]
pub trait SummaryClient: Send + Sync {
    async fn summarize(&self, recent_data: &str) -> anyhow::Result<String>;
}

/// Fixed instruction sent to the model with the report JSON interpolated.
pub fn build_prompt(recent_data: &str) -> String {
    format!(
        "You are an AI assistant tasked with generating a concise daily summary report of \
recent outbreak data for Woreda Health Officers in Ethiopia. The report should be formatted \
for easy readability on a small screen. Use a deep teal color (#008080) for a sense of trust \
and health, light green (#90EE90) for well-being, and muted red (#CD5C5C) to highlight \
critical alerts and warnings. The recent outbreak data is provided in JSON format:

  {recent_data}

  Focus on key trends, affected regions, disease types, and any urgent alerts. Provide \
actionable insights in a brief and easily understandable manner. The summary must be brief, \
due to screen size constraints.
  DO NOT include the raw JSON data in the summary.
  Format the output as a short paragraph with a maximum of 5 sentences.
"
    )
}

/// Client for the Google Generative Language REST API
/// (`models/{model}:generateContent`). No caching, retries, or rate limiting.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &GenAiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl SummaryClient for GeminiClient {
    async fn summarize(&self, recent_data: &str) -> anyhow::Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("GOOGLE_API_KEY is not configured"))?;

        let prompt = build_prompt(recent_data);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&GenerateRequest {
                contents: vec![Content {
                    parts: vec![Part { text: &prompt }],
                }],
            })
            .send()
            .await?
            .error_for_status()?;

        let body: GenerateResponse = response.json().await?;
        let summary = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("model returned no candidates"))?;

        debug!(chars = summary.len(), "summary generated");
        Ok(summary)
    }
}
