// src/services/genai.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("upstream call timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl GenerationError {
    /// Whether one more attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Timeout(_) => true,
            GenerationError::Transport(e) => e.is_connect() || e.is_timeout(),
            GenerationError::Status { status, .. } => *status == 429 || *status >= 500,
            GenerationError::Io(_) | GenerationError::Malformed(_) => false,
        }
    }
}

/// A text-completion backend. `contents` are sent as one user turn, in order.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, model: &str, contents: &[String]) -> Result<String, GenerationError>;
}

/// Performs `request` and returns the response body. Each attempt, body read
/// included, is bounded by `timeout`; a transient failure is retried once.
pub(crate) async fn fetch_with_retry(
    request: RequestBuilder,
    timeout: Duration,
) -> Result<Vec<u8>, GenerationError> {
    let retry = request.try_clone();
    match fetch_once(request, timeout).await {
        Err(err) if err.is_transient() => match retry {
            Some(again) => {
                warn!(error = %err, "transient upstream failure, retrying once");
                fetch_once(again, timeout).await
            }
            None => Err(err),
        },
        other => other,
    }
}

async fn fetch_once(
    request: RequestBuilder,
    timeout: Duration,
) -> Result<Vec<u8>, GenerationError> {
    tokio::time::timeout(timeout, exchange(request))
        .await
        .map_err(|_| GenerationError::Timeout(timeout))?
}

async fn exchange(request: RequestBuilder) -> Result<Vec<u8>, GenerationError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
        return Err(GenerationError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.bytes().await?.to_vec())
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate; empty when the model said nothing.
    pub(crate) fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Client for the Generative Language `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        contents: &[String],
    ) -> Result<String, GenerationError> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: contents.iter().map(|text| RequestPart { text }).collect(),
            }],
        };

        let request = self
            .http
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let body = fetch_with_retry(request, self.timeout).await?;
        if body.is_empty() {
            return Ok(String::new());
        }
        let parsed: GenerateContentResponse = serde_json::from_slice(&body)
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;

        let text = parsed.text();
        debug!(model, chars = text.len(), "model replied");
        Ok(text)
    }
}
