pub mod assessment;

use rand::RngExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::generator::GenerationError;

pub use assessment::{AssessmentEngine, EngineConfig, StageConfig};

pub const TASK_SHEET_MISSING: &str =
    "Task sheet is mandatory but was not provided or processed correctly.";
pub const PLAN_MISSING: &str =
    "Critical error: AI Agent 1's output was not received for Step 2.";

const RATE_LIMITED: &str = "OpenAI API rate limit exceeded. Please try again later.";
const BAD_API_KEY: &str =
    "OpenAI API key is invalid or missing. Please check your environment variables.";

/// What a caller holds between the two stages. Each stage takes the
/// previous state and returns the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_assessment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_agent2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// A short, non-reversible id for correlating the two stages in logs.
pub fn session_id(user_agent: &str) -> String {
    let mut rng = rand::rng();
    let nonce: u64 = rng.random();
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(user_agent.as_bytes());
    hasher.update(now.to_string().as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hasher
        .finalize()
        .iter()
        .take(8)
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Turn a generation failure into the message shown to the user.
/// Rate limits and bad keys get friendlier wording; everything else passes
/// through.
pub fn classify_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<GenerationError>() {
        Some(GenerationError::Api { status: 429, .. }) => RATE_LIMITED.to_string(),
        Some(GenerationError::Api { status: 401, .. } | GenerationError::MissingApiKey) => {
            BAD_API_KEY.to_string()
        }
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_16_hex_chars() {
        let id = session_id("Mozilla/5.0");
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn session_ids_differ() {
        assert_ne!(session_id("same agent"), session_id("same agent"));
    }

    #[test]
    fn classify_rate_limit() {
        let err = anyhow::Error::from(GenerationError::Api {
            status: 429,
            message: "Rate limit reached".to_string(),
        });
        assert_eq!(classify_error(&err), RATE_LIMITED);
    }

    #[test]
    fn classify_auth_failures() {
        let unauthorized = anyhow::Error::from(GenerationError::Api {
            status: 401,
            message: "Incorrect API key".to_string(),
        });
        assert_eq!(classify_error(&unauthorized), BAD_API_KEY);
        assert_eq!(
            classify_error(&anyhow::Error::from(GenerationError::MissingApiKey)),
            BAD_API_KEY
        );
    }

    #[test]
    fn classify_passes_other_errors_through() {
        let err = anyhow::Error::from(GenerationError::Api {
            status: 500,
            message: "boom".to_string(),
        });
        assert_eq!(classify_error(&err), "API error (500): boom");
        assert_eq!(classify_error(&anyhow::anyhow!("network down")), "network down");
    }

    #[test]
    fn state_serializes_camel_case_and_skips_empty() {
        let state = AssessmentState {
            final_assessment: Some("essay".to_string()),
            error_agent2: Some("oops".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["finalAssessment"], "essay");
        assert_eq!(json["errorAgent2"], "oops");
        assert!(json.get("plan").is_none());
        assert!(json.get("sessionId").is_none());
    }
}
