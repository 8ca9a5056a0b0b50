use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Result;
use tracing::{error, info, warn};

use super::{AssessmentState, PLAN_MISSING, TASK_SHEET_MISSING, classify_error, session_id};
use crate::consts::{PLANNER_MAX_TOKENS, PLANNER_TEMPERATURE, WRITER_MAX_TOKENS, WRITER_TEMPERATURE};
use crate::events::{Event, EventBus, Stage};
use crate::generator::{GenerationRequest, Generator, TokenUsage};
use crate::ingest::{FieldInput, FieldKind, resolve_all};
use crate::prompts::{planner, writer};
use crate::storage::BlobSource;

#[derive(Debug, Clone, Copy)]
pub struct StageConfig {
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub planner: StageConfig,
    pub writer: StageConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            planner: StageConfig {
                max_tokens: PLANNER_MAX_TOKENS,
                temperature: PLANNER_TEMPERATURE,
            },
            writer: StageConfig {
                max_tokens: WRITER_MAX_TOKENS,
                temperature: WRITER_TEMPERATURE,
            },
        }
    }
}

/// The two-stage pipeline. Wires together field ingestion, a planner
/// generator, and a writer generator. Holds no per-request state.
pub struct AssessmentEngine {
    planner: Arc<dyn Generator>,
    writer: Arc<dyn Generator>,
    blobs: Arc<dyn BlobSource>,
    events: Arc<EventBus>,
    config: EngineConfig,
    usage: Mutex<TokenUsage>,
}

impl AssessmentEngine {
    pub fn new(
        planner: Arc<dyn Generator>,
        writer: Arc<dyn Generator>,
        blobs: Arc<dyn BlobSource>,
        config: EngineConfig,
    ) -> Self {
        Self {
            planner,
            writer,
            blobs,
            events: Arc::new(EventBus::default()),
            config,
            usage: Mutex::new(TokenUsage::default()),
        }
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Tokens used by every call this engine has made.
    pub fn session_usage(&self) -> TokenUsage {
        self.usage.lock().map(|u| *u).unwrap_or_default()
    }

    /// Stage 1: resolve every field, then ask the planner for a plan.
    pub async fn generate_plan(
        &self,
        prev: &AssessmentState,
        inputs: &[FieldInput],
        user_agent: &str,
    ) -> AssessmentState {
        let started = Instant::now();
        let session = session_id(user_agent);
        info!(session = %session, "plan requested");

        let fields = resolve_all(inputs, self.blobs.as_ref()).await;
        for field in &fields {
            self.events.emit(Event::FieldResolved {
                field: field.kind,
                provided: field.provided,
                failed: field.processing_error.is_some(),
            });
        }
        info!(session = %session, "all inputs processed");

        let task_sheet_provided = fields
            .iter()
            .any(|f| f.kind == FieldKind::TaskSheet && f.provided);
        if !task_sheet_provided {
            warn!(session = %session, "task sheet missing");
            return AssessmentState {
                error: Some(TASK_SHEET_MISSING.to_string()),
                session_id: Some(session),
                ..Default::default()
            };
        }

        let request = GenerationRequest {
            system: planner::build_system_prompt(),
            user: planner::build_user_content(&fields),
            max_tokens: self.config.planner.max_tokens,
            temperature: self.config.planner.temperature,
        };

        match self.call(Stage::Plan, self.planner.as_ref(), &request).await {
            Ok(plan) => {
                info!(
                    session = %session,
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "plan generated"
                );
                AssessmentState {
                    plan: Some(plan),
                    session_id: Some(session),
                    final_assessment: prev.final_assessment.clone(),
                    error_agent2: prev.error_agent2.clone(),
                    error: None,
                }
            }
            Err(e) => {
                error!(
                    session = %session,
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    error = %e,
                    "plan generation failed"
                );
                AssessmentState {
                    error: Some(format!("Server error: {}", classify_error(&e))),
                    session_id: prev.session_id.clone(),
                    ..Default::default()
                }
            }
        }
    }

    /// Stage 2: turn a plan into the finished assessment.
    pub async fn generate_final(
        &self,
        prev: &AssessmentState,
        plan: Option<&str>,
        user_agent: &str,
    ) -> AssessmentState {
        let Some(plan) = plan.filter(|p| !p.trim().is_empty()) else {
            error!("stage 2 requested without a plan");
            return AssessmentState {
                error_agent2: Some(PLAN_MISSING.to_string()),
                ..prev.clone()
            };
        };

        let session = prev
            .session_id
            .clone()
            .unwrap_or_else(|| session_id(user_agent));
        info!(session = %session, "final assessment requested");

        let request = GenerationRequest {
            system: writer::build_system_prompt(),
            user: writer::build_user_content(plan),
            max_tokens: self.config.writer.max_tokens,
            temperature: self.config.writer.temperature,
        };

        match self.call(Stage::Final, self.writer.as_ref(), &request).await {
            Ok(text) => AssessmentState {
                final_assessment: Some(text),
                session_id: Some(session),
                error_agent2: None,
                ..prev.clone()
            },
            Err(e) => {
                error!(session = %session, error = %e, "final assessment failed");
                AssessmentState {
                    error_agent2: Some(format!("Server error: {}", classify_error(&e))),
                    ..prev.clone()
                }
            }
        }
    }

    async fn call(
        &self,
        stage: Stage,
        generator: &dyn Generator,
        request: &GenerationRequest,
    ) -> Result<String> {
        self.events.emit(Event::StageStarted { stage });
        info!(%stage, prompt_chars = request.user.chars().count(), "calling generator");

        let result = generator.generate(request).await;
        self.events.emit(Event::StageFinished {
            stage,
            ok: result.is_ok(),
        });

        let generation = result?;
        if let Some(usage) = generation.usage
            && let Ok(mut total) = self.usage.lock()
        {
            total.add(usage);
        }
        Ok(generation.text)
    }
}
