//! Gemini `generateContent` rewrite backend.

use super::{build_prompt, with_deadline, RewriteOutcome, RewriteRequest, RewriteService};
use super::{UnavailableReason, DEFAULT_REWRITE_TIMEOUT};
use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const PLACEHOLDER_API_KEY: &str = "YOUR_GEMINI_API_KEY_HERE";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Connection settings for the Gemini backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key; missing, blank or placeholder keys disable the backend.
    /// Accepted on input, never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Deadline for one rewrite, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout_ms: DEFAULT_REWRITE_TIMEOUT.as_millis() as u64,
        }
    }
}

impl GeminiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The configured key, unless it is blank or the placeholder.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_API_KEY)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, trimmed.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// Rewrites text through the Gemini REST API.
pub struct GeminiRewriter {
    client: Client,
    config: GeminiConfig,
}

impl GeminiRewriter {
    /// Creates the backend. No request is sent until `rewrite` is called.
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        info!(
            "event=rewrite_init module=rewrite backend=gemini model={} timeout_ms={} has_key={}",
            config.model,
            config.timeout_ms,
            config.usable_api_key().is_some()
        );
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn call(&self, api_key: &str, prompt: &str) -> RewriteOutcome {
        let body = GenerateContentRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = match self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return RewriteOutcome::Unavailable(transport(err)),
        };

        let status = response.status();
        if !status.is_success() {
            return RewriteOutcome::Unavailable(UnavailableReason::Remote {
                status: status.as_u16(),
            });
        }

        match response.json::<GenerateContentResponse>().await {
            Ok(parsed) => parsed.into_text().map_or(
                RewriteOutcome::Unavailable(UnavailableReason::EmptyResponse),
                RewriteOutcome::Rewritten,
            ),
            Err(err) => RewriteOutcome::Unavailable(transport(err)),
        }
    }
}

#[async_trait]
impl RewriteService for GeminiRewriter {
    async fn rewrite(&self, request: &RewriteRequest) -> RewriteOutcome {
        let Some(api_key) = self.config.usable_api_key() else {
            warn!("event=rewrite module=rewrite status=unavailable reason=missing_credentials");
            return RewriteOutcome::Unavailable(UnavailableReason::MissingCredentials);
        };

        let started_at = Instant::now();
        let prompt = build_prompt(request);
        let outcome = with_deadline(self.config.timeout(), self.call(api_key, &prompt)).await;

        match &outcome {
            RewriteOutcome::Rewritten(text) => info!(
                "event=rewrite module=rewrite status=ok style={} language={} input_len={} output_len={} duration_ms={}",
                request.style,
                request.language,
                request.text.len(),
                text.len(),
                started_at.elapsed().as_millis()
            ),
            RewriteOutcome::Unavailable(reason) => warn!(
                "event=rewrite module=rewrite status=unavailable style={} language={} duration_ms={} reason={}",
                request.style,
                request.language,
                started_at.elapsed().as_millis(),
                reason
            ),
        }
        outcome
    }
}

fn transport(err: reqwest::Error) -> UnavailableReason {
    UnavailableReason::Transport(err.without_url().to_string())
}
