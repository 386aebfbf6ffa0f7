//! HTTP endpoint handlers. These are thin wrappers that forward to the
//! session, masking and validation code. Each handler is instrumented and
//! logs parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::domain::Level;
use crate::error::{DataLoadError, SessionError};
use crate::masking::{mask, BlankWidth};
use crate::protocol::*;
use crate::session::SessionConfig;
use crate::state::AppState;
use crate::validate::validate_level;

/// Error body with a status code.
pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.0, Json(ErrorOut { error: self.1 })).into_response()
  }
}

impl From<SessionError> for ApiError {
  fn from(e: SessionError) -> Self {
    let status = match &e {
      SessionError::Load(DataLoadError::NotFound { .. }) => StatusCode::NOT_FOUND,
      SessionError::Load(_) => StatusCode::INTERNAL_SERVER_ERROR,
      SessionError::NoQuestions | SessionError::UnknownMode(_) | SessionError::AnswerOutOfRange { .. } => {
        StatusCode::UNPROCESSABLE_ENTITY
      }
      SessionError::Finished | SessionError::NotFinished => StatusCode::CONFLICT,
    };
    ApiError(status, e.to_string())
  }
}

fn unknown_session(id: &str) -> ApiError {
  ApiError(StatusCode::NOT_FOUND, format!("unknown session '{id}'"))
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, levels: state.store.available_levels() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_start_quiz(
  State(state): State<Arc<AppState>>,
  Json(cfg): Json<SessionConfig>,
) -> Result<Json<StartQuizOut>, ApiError> {
  let out = state.start_quiz(cfg).await?;
  info!(target: "quiz", session = %out.session_id, total = out.progress.total_questions, "HTTP quiz started");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_question(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<QuestionOut>, ApiError> {
  let q = state.current_question(&id).await.ok_or_else(|| unknown_session(&id))??;
  Ok(Json(q))
}

#[instrument(level = "info", skip(state, body), fields(answer = body.answer))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<AnswerOut>, ApiError> {
  let out = state.answer(&id, body.answer).await.ok_or_else(|| unknown_session(&id))??;
  info!(target: "quiz", session = %id, answered = out.progress.answered_questions, finished = out.finished, "HTTP answer recorded");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_results(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let summary = state.results(&id).await.ok_or_else(|| unknown_session(&id))??;
  Ok(Json(summary))
}

#[instrument(level = "info", skip(body), fields(text_len = body.text.chars().count(), pattern = %body.pattern))]
pub async fn http_post_mask(Json(body): Json<MaskIn>) -> impl IntoResponse {
  let width = if body.span_width { BlankWidth::Span } else { BlankWidth::Fixed };
  Json(mask(&body.text, &body.pattern, width))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_validate(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ValidateQuery>,
) -> Result<impl IntoResponse, ApiError> {
  let level = match q.level.as_deref() {
    Some(s) => s.parse::<Level>().map_err(|e| ApiError(StatusCode::BAD_REQUEST, e))?,
    None => state.config.default_level,
  };
  // Re-read the files so edits show up without a restart.
  state.store.clear();
  match validate_level(&state.store, level) {
    Ok(report) => Ok(Json(report)),
    Err(e) => {
      warn!(target: "catalog", %level, error = %e, "HTTP validation failed to load catalogs");
      let status = match e {
        DataLoadError::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
      };
      Err(ApiError(status, e.to_string()))
    }
  }
}
