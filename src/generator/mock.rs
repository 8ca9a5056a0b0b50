use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use super::{Generation, GenerationError, GenerationRequest, Generator, TokenUsage};

/// A scripted generator for tests. Returns pre-defined replies in order and
/// records every request it receives.
pub struct MockGenerator {
    replies: Vec<Result<Generation, GenerationError>>,
    index: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new(replies: Vec<Result<Generation, GenerationError>>) -> Self {
        Self {
            replies,
            index: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Plain text replies with no token usage.
    pub fn replying(texts: &[&str]) -> Self {
        Self::new(
            texts
                .iter()
                .map(|t| {
                    Ok(Generation {
                        text: t.to_string(),
                        usage: None,
                    })
                })
                .collect(),
        )
    }

    /// A single reply with token usage attached.
    pub fn with_usage(text: &str, input_tokens: u64, output_tokens: u64) -> Self {
        Self::new(vec![Ok(Generation {
            text: text.to_string(),
            usage: Some(TokenUsage {
                input_tokens,
                output_tokens,
            }),
        })])
    }

    pub fn failing(error: GenerationError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn calls(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.get(i).ok_or_else(|| {
            anyhow::anyhow!("MockGenerator: no more replies (called {} times)", i + 1)
        })?;
        Ok(reply.clone()?)
    }
}
