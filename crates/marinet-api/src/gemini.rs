use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tutor::{ResponseGenerator, TutorError};

/// Placeholder shipped in sample configs; treated as "no key".
const PLACEHOLDER_KEY: &str = "ADD_YOUR_GEMINI_KEY";

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: &str, timeout: Duration) -> Result<Self, TutorError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && self.api_key != PLACEHOLDER_KEY
    }

    async fn generate_content(&self, prompt: &str) -> Result<String, TutorError> {
        if !self.is_configured() {
            return Err(TutorError::NotConfigured);
        }

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TutorError::Status { status, body });
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text = extract_text(parsed).ok_or(TutorError::EmptyResponse)?;
        debug!("Gemini replied with {} chars", text.len());
        Ok(text)
    }
}

/// First part of the first candidate, if it has any text.
fn extract_text(resp: GenerateResponse) -> Option<String> {
    resp.candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()
        .map(|p| p.text)
        .filter(|t| !t.is_empty())
}

impl ResponseGenerator for GeminiClient {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, TutorError>> {
        self.generate_content(prompt).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn request_carries_only_the_prompt() {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: "What is osmosis?" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "contents": [{ "parts": [{ "text": "What is osmosis?" }] }] })
        );
    }

    #[test]
    fn text_comes_from_first_candidate_part() {
        let resp = parse(r#"{"candidates":[{"content":{"parts":[{"text":"Water moves."},{"text":"ignored"}]}}]}"#);
        assert_eq!(extract_text(resp).as_deref(), Some("Water moves."));
    }

    #[test]
    fn missing_or_blank_text_is_none() {
        assert!(extract_text(parse(r#"{}"#)).is_none());
        assert!(extract_text(parse(r#"{"candidates":[{}]}"#)).is_none());
        assert!(extract_text(parse(r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#)).is_none());
    }

    #[tokio::test]
    async fn placeholder_key_is_not_configured() {
        let client = GeminiClient::new("http://localhost:1", "m", PLACEHOLDER_KEY, Duration::from_secs(1)).unwrap();
        assert!(!client.is_configured());
        assert!(matches!(client.generate("hi").await, Err(TutorError::NotConfigured)));
    }
}
