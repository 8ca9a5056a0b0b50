pub mod mock;
pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

/// One stateless call to a text-generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Token usage from a single call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Accumulate another usage into this one.
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    /// Total tokens (input + output).
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Generated text plus optional token usage.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Failures the pipeline knows how to explain to a user.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("no API key configured for the text-generation service")]
    MissingApiKey,
    #[error("text-generation service returned an empty response")]
    EmptyResponse,
}

/// Anything that turns a prompt into text: a hosted model or a test script.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_accumulates() {
        let mut usage = TokenUsage::default();
        usage.add(TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
        });
        usage.add(TokenUsage {
            input_tokens: 1,
            output_tokens: 2,
        });
        assert_eq!(usage.input_tokens, 11);
        assert_eq!(usage.output_tokens, 7);
        assert_eq!(usage.total(), 18);
    }

    #[test]
    fn api_error_display_includes_status() {
        let err = GenerationError::Api {
            status: 500,
            message: "upstream exploded".to_string(),
        };
        assert_eq!(err.to_string(), "API error (500): upstream exploded");
    }
}
