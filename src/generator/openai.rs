use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Generation, GenerationError, GenerationRequest, Generator, TokenUsage};
use crate::consts::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// A generator backed by an OpenAI-compatible chat completions API.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: Option<String>, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn build_body<'a>(&'a self, request: &'a GenerationRequest) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    /// Prefer the service's own `error.message`; fall back to the raw body.
    fn api_error(status: u16, body: &str) -> GenerationError {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        GenerationError::Api { status, message }
    }

    fn parse_response(resp: ApiResponse) -> Result<Generation> {
        let text = resp
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }

        Ok(Generation {
            text,
            usage: resp.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;

        let url = format!("{}/chat/completions", self.base_url);
        debug!(%url, model = %self.model, "calling chat completions");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.build_body(request))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::api_error(status, &body).into());
        }

        let generation = Self::parse_response(resp.json().await?)?;
        if let Some(usage) = generation.usage {
            info!(
                input = usage.input_tokens,
                output = usage.output_tokens,
                "token usage"
            );
        }
        Ok(generation)
    }
}

// --- API types ---

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}
