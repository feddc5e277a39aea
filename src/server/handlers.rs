//! HTTP request handlers.
//!
//! Each request gets its own [`DialogState`]; nothing is kept between calls.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::AppState;
use super::types::{DialogQuery, ErrorResponse, ScriptListResponse};
use crate::dialog::{AnswerPost, DialogError, ErrorKind};
use crate::script::DialogScript;

/// Create the dialog router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/dialogs", get(list_scripts))
        .route("/dialogs/:script", get(first_question))
        .route(
            "/dialogs/:script/questions/:id",
            get(get_question).post(answer_question),
        )
        .route("/dialogs/:script/answers/:id", get(get_answer_text))
        .with_state(state)
}

async fn list_scripts(State(state): State<AppState>) -> Json<ScriptListResponse> {
    Json(ScriptListResponse {
        scripts: state.scripts.names(),
    })
}

async fn first_question(
    State(state): State<AppState>,
    Path(script): Path<String>,
    Query(query): Query<DialogQuery>,
) -> Result<Response, AppError> {
    let script = find_script(&state, &script)?;
    info!(
        script = %script.name,
        medium = ?query.preferred_medium,
        responder = ?query.responder,
        "dialog started"
    );

    let mut dialog = state.dialog(&script.name);
    let payload = script.start(&mut dialog)?;
    Ok(rendered(payload))
}

async fn get_question(
    State(state): State<AppState>,
    Path((script, id)): Path<(String, String)>,
    Query(query): Query<DialogQuery>,
) -> Result<Response, AppError> {
    let script = find_script(&state, &script)?;
    debug!(script = %script.name, step = %id, medium = ?query.preferred_medium, "question requested");

    let mut dialog = state.dialog(&script.name);
    let payload = script.run(&id, &mut dialog)?;
    Ok(rendered(payload))
}

async fn answer_question(
    State(state): State<AppState>,
    Path((script, id)): Path<(String, String)>,
    Query(query): Query<DialogQuery>,
    body: String,
) -> Result<Response, AppError> {
    let script = find_script(&state, &script)?;
    let post = parse_answer_post(&body);
    info!(
        script = %script.name,
        step = %id,
        responder = ?query.responder.as_ref().or(post.responder.as_ref()),
        answer_id = ?post.answer_id,
        answer_text = ?post.answer_text,
        "answer received"
    );

    let mut dialog = state.dialog(&script.name);
    let payload = script.answer(&id, &post, &mut dialog)?;
    info!(script = %script.name, step = %id, payload = %payload, "ending dialog");
    Ok(rendered(payload))
}

async fn get_answer_text(
    State(state): State<AppState>,
    Path((script, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let script = find_script(&state, &script)?;
    let mut dialog = state.dialog(&script.name);
    let text = script.answer_text(&id, &mut dialog)?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response())
}

fn find_script(state: &AppState, name: &str) -> Result<Arc<DialogScript>, AppError> {
    state
        .scripts
        .get(name)
        .ok_or_else(|| AppError::NotFound(format!("unknown dialog script: {name}")))
}

/// The platform's answer body. An empty or unreadable body counts as no answer.
fn parse_answer_post(body: &str) -> AnswerPost {
    if body.trim().is_empty() {
        return AnswerPost::default();
    }
    AnswerPost::from_json(body).unwrap_or_else(|e| {
        warn!(error = %e, "ignoring unparsable answer body");
        AnswerPost::default()
    })
}

fn rendered(payload: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], payload).into_response()
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    NotFound(String),
    NotAcceptable(String),
    Internal(String),
}

impl From<DialogError> for AppError {
    fn from(e: DialogError) -> Self {
        match e.kind() {
            ErrorKind::NotAcceptable => {
                warn!(error = %e, "dialog request not acceptable");
                AppError::NotAcceptable(e.to_string())
            }
            ErrorKind::Internal => {
                error!(error = %e, "failed to render dialog");
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::NotAcceptable(msg) => (StatusCode::NOT_ACCEPTABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
