//! AI-assisted practice idea generator.
//!
//! Calls an OpenAI-compatible chat-completions endpoint and parses a
//! JSON array of template ideas out of the raw model text. Kept fully
//! isolated from the scheduler: a slow or failing model call only ever
//! affects this handler.

use anyhow::{Context, anyhow};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use ritual_types::api::{Claims, GeneratePracticesRequest};
use ritual_types::models::PracticeTemplate;

use crate::auth::AppState;
use crate::convert::practice_to_api;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct PracticeIdea {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_duration")]
    pub default_duration_sec: u32,
}

fn default_title() -> String {
    "Untitled".to_string()
}

fn default_duration() -> u32 {
    60
}

#[derive(Clone)]
pub struct GeneratorClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl GeneratorClient {
    /// Build from `GENAI_*` env vars; None when no API key is set.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GENAI_API_KEY").ok()?;
        let api_url = std::env::var("GENAI_API_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta/openai".into());
        let model = std::env::var("GENAI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".into());
        Some(Self {
            http: reqwest::Client::new(),
            api_url,
            api_key,
            model,
        })
    }

    pub async fn generate(&self, user_message: &str) -> anyhow::Result<Vec<PracticeIdea>> {
        let prompt = build_prompt(user_message);

        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0.7,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("generator request failed")?
            .error_for_status()
            .context("generator returned an error status")?;

        let completion: ChatCompletion = resp.json().await.context("malformed generator response")?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("generator returned no choices"))?;

        parse_ideas(&text)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

fn build_prompt(user_message: &str) -> String {
    format!(
        r#"The user wants to build a habit: "{user_message}".
Generate a list of helpful habits in JSON format.
Example:
[
  {{
    "title": "Wake up early",
    "description": "Wake up at 7:00 without using your phone.",
    "default_duration_sec": 120
  }},
  {{
    "title": "Morning reading",
    "description": "Read at least 30 minutes after breakfast.",
    "default_duration_sec": 60
  }}
]
Respond with the JSON array only."#
    )
}

/// Pull the JSON array out of raw model text: models wrap output in
/// ```json fences and occasionally leak markup tags around it.
fn parse_ideas(raw: &str) -> anyhow::Result<Vec<PracticeIdea>> {
    let json_text = strip_tags(extract_fenced(raw));
    let json_text = json_text.trim();
    if json_text.is_empty() {
        return Err(anyhow!("generator response contained no JSON"));
    }
    serde_json::from_str(json_text).context("generator response was not a JSON array of practices")
}

/// The body of the first ``` fence, or the whole text when unfenced.
fn extract_fenced(text: &str) -> &str {
    let text = text.trim();
    if let Some(open) = text.find("```") {
        let body = &text[open + 3..];
        let body = body.strip_prefix("json").unwrap_or(body);
        if let Some(close) = body.rfind("```") {
            return &body[..close];
        }
    }
    text
}

/// Drop `<...>` spans the model sometimes emits around its answer. An
/// unmatched `<` is ordinary text and stays put.
fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// `POST /practices/generate` — propose and persist new templates from
/// a free-text prompt.
pub async fn generate_practices(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<GeneratePracticesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::validation("message field is required"));
    }

    let generator = state
        .generator
        .as_ref()
        .ok_or_else(|| anyhow!("practice generator is not configured (set GENAI_API_KEY)"))?;

    let ideas = generator.generate(&req.message).await.map_err(|e| {
        error!("practice generation failed: {:#}", e);
        ApiError::Internal(e)
    })?;

    let mut created: Vec<PracticeTemplate> = Vec::with_capacity(ideas.len());
    for idea in ideas {
        let row = state.db.create_practice(
            &Uuid::new_v4().to_string(),
            &idea.title,
            &idea.description,
            idea.default_duration_sec,
        )?;
        created.push(practice_to_api(&row));
    }

    info!("Generator created {} practice templates", created.len());
    Ok((StatusCode::CREATED, Json(created)))
}
