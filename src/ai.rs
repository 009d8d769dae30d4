//! Optional AI metadata collaborator: one request, one strictly validated
//! response. Everything here degrades to `None`; manual entry stays fully
//! functional when the collaborator is unconfigured or unreachable.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::models::{Language, MetadataGuess};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl AiConfig {
    /// Reads `CINELAUNCH_API_KEY` (plus optional `CINELAUNCH_AI_BASE_URL`
    /// and `CINELAUNCH_AI_MODEL`). No key means no collaborator.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("CINELAUNCH_API_KEY").ok().filter(|k| !k.is_empty())?;
        Some(AiConfig {
            base_url: std::env::var("CINELAUNCH_AI_BASE_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("CINELAUNCH_AI_MODEL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
        })
    }
}

pub struct MetadataClient {
    client: Client,
    config: AiConfig,
}

impl MetadataClient {
    pub fn new(config: AiConfig) -> Self {
        let client = Client::builder()
            .user_agent("CineLaunch/1.0")
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());
        MetadataClient { client, config }
    }

    /// Best-effort guess of `{title, description, language, genre}` from a
    /// link or a title. Transport errors, bad status, and shape mismatches
    /// all collapse to `None`; there are no retries.
    pub async fn suggest(&self, input: &str, known_genres: &[String]) -> Option<MetadataGuess> {
        let base = self.config.base_url.trim_end_matches('/');
        let url = format!("{}/chat/completions", base);
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt(input, known_genres) }],
            "temperature": 0.2,
        });

        let resp = match self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "AI request failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            warn!(status = %resp.status(), "AI request rejected");
            return None;
        }
        let value: Value = resp.json().await.ok()?;
        let content = value["choices"][0]["message"]["content"].as_str()?;
        parse_guess(content)
    }
}

fn prompt(input: &str, known_genres: &[String]) -> String {
    format!(
        "Extract video details from this input: \"{}\". \
         If it is a video URL, try to identify what the video is about. \
         If it is just a title, provide a short professional description. \
         Identify the root language as exactly one of: {}. \
         Suggest a genre; pick from these existing ones if they fit: {}, \
         otherwise suggest a new single-word genre in English. \
         Reply with nothing but a JSON object of the shape \
         {{\"title\": string, \"description\": string, \"language\": string, \"genre\": string}}.",
        input,
        Language::ALL.map(|l| l.as_str()).join(", "),
        known_genres.join(", "),
    )
}

/// Strict parse of the model's reply. Anything that is not the expected
/// JSON object, fenced or bare, reads as unavailable.
fn parse_guess(content: &str) -> Option<MetadataGuess> {
    let trimmed = strip_fence(content.trim());
    match serde_json::from_str::<MetadataGuess>(trimmed) {
        Ok(guess) if !guess.title.trim().is_empty() => Some(guess),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "AI reply is not a usable metadata object");
            None
        }
    }
}

fn strip_fence(s: &str) -> &str {
    let s = s
        .strip_prefix("```json")
        .or_else(|| s.strip_prefix("```"))
        .unwrap_or(s);
    s.strip_suffix("```").unwrap_or(s).trim()
}
