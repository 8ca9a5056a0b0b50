use std::collections::HashMap;

use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::{HeaderMap, StatusCode};
use axum::http::header::USER_AGENT;
use serde_json::{Value, json};
use tracing::warn;

use super::{ApiError, AppState};
use crate::engine::AssessmentState;
use crate::ingest::inputs_from_form;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /api/plan`: stage 1.
pub async fn plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Json<AssessmentState>, ApiError> {
    let Form(form) = form.map_err(bad_form)?;
    let prev = previous_state(&form);
    let inputs = inputs_from_form(&form);
    let next = state
        .engine
        .generate_plan(&prev, &inputs, user_agent(&headers))
        .await;
    Ok(Json(next))
}

/// `POST /api/final`: stage 2, driven by the plan the client got back
/// from stage 1.
pub async fn final_assessment(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Json<AssessmentState>, ApiError> {
    let Form(form) = form.map_err(bad_form)?;
    let prev = previous_state(&form);
    let plan = field(&form, "agent1Output");
    let next = state
        .engine
        .generate_final(&prev, plan.as_deref(), user_agent(&headers))
        .await;
    Ok(Json(next))
}

/// Any unreadable form is a 400 with a JSON error body.
fn bad_form(rejection: FormRejection) -> ApiError {
    warn!(status = %rejection.status(), error = %rejection.body_text(), "rejected form submission");
    ApiError::new(
        StatusCode::BAD_REQUEST,
        format!("Invalid form submission: {}", rejection.body_text()),
    )
}

fn previous_state(form: &HashMap<String, String>) -> AssessmentState {
    AssessmentState {
        plan: field(form, "plan").or_else(|| field(form, "agent1Output")),
        error: None,
        final_assessment: field(form, "finalAssessment"),
        error_agent2: field(form, "errorAgent2"),
        session_id: field(form, "sessionId"),
    }
}

fn field(form: &HashMap<String, String>, key: &str) -> Option<String> {
    form.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn user_agent(headers: &HeaderMap) -> &str {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
