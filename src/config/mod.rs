//! Runtime settings. Every option is a CLI flag with an environment
//! variable fallback, so the same binary runs locally and in a container.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::consts::{DEFAULT_BASE_URL, DEFAULT_MODEL, default_blob_dir};
use crate::generator::Generator;
use crate::generator::openai::OpenAiGenerator;

/// Settings for the text-generation service.
#[derive(Debug, Clone, Args)]
pub struct GenerationArgs {
    /// API key for stage 1 (and stage 2 unless a separate key is set)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Separate API key for stage 2
    #[arg(long, env = "OPENAI_API_KEY_AGENT_TWO", hide_env_values = true)]
    pub api_key_agent_two: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Model used by both stages
    #[arg(long, env = "QUILL_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,
}

impl GenerationArgs {
    fn planner_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Stage 2 uses its own key when given, otherwise the stage 1 key.
    pub fn writer_key(&self) -> Option<&str> {
        self.api_key_agent_two
            .as_deref()
            .filter(|k| !k.is_empty())
            .or_else(|| self.planner_key())
    }

    pub fn planner(&self) -> Arc<dyn Generator> {
        self.generator(self.planner_key())
    }

    pub fn writer(&self) -> Arc<dyn Generator> {
        self.generator(self.writer_key())
    }

    fn generator(&self, key: Option<&str>) -> Arc<dyn Generator> {
        Arc::new(
            OpenAiGenerator::new(key.map(str::to_string), Some(self.model.clone()))
                .with_base_url(&self.base_url),
        )
    }

    /// Short description for the startup banner.
    pub fn auth_status(&self) -> &'static str {
        match (self.planner_key(), self.api_key_agent_two.as_deref().filter(|k| !k.is_empty())) {
            (Some(_), Some(_)) => "API keys ✓ (separate stage 2 key)",
            (Some(_), None) => "API key ✓",
            (None, Some(_)) => "stage 2 key only (stage 1 will fail)",
            (None, None) => "not configured",
        }
    }
}

/// Settings for `quill serve`.
#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "QUILL_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Base URL clients use to reach this server (defaults to http://<bind>)
    #[arg(long, env = "QUILL_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Directory for uploaded files (defaults to ~/.quill/blobs)
    #[arg(long, env = "QUILL_BLOB_DIR")]
    pub blob_dir: Option<PathBuf>,

    /// Secret used to sign upload URLs; uploads are refused without it
    #[arg(long, env = "BLOB_READ_WRITE_TOKEN", hide_env_values = true)]
    pub blob_token: Option<String>,
}

impl ServerArgs {
    pub fn public_url(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("http://{}", self.bind))
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.blob_dir.clone().unwrap_or_else(default_blob_dir)
    }
}
