use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::constants::{DEFAULT_REVIEW_LIMIT, DEFAULT_REVIEW_QUALITY, MAX_REVIEW_LIMIT};
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::srs::scheduler::Quality;
use crate::state::AppState;
use crate::store::operations::progress::VocabularyProgress;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/review/due", get(due_list))
        .route("/stats/overview", get(stats_overview))
        .route("/:word_id", get(get_progress))
        .route("/:word_id/encounter", post(mark_encountered))
        .route("/:word_id/correct", post(mark_correct))
        .route("/:word_id/incorrect", post(mark_incorrect))
        .route("/:word_id/known", post(mark_known))
        .route("/:word_id/reset", post(reset_progress))
}

/// 所有进度接口都要求单词存在，避免为悬空 ID 建立进度记录
fn require_word(state: &AppState, word_id: &str) -> Result<(), AppError> {
    state
        .store()
        .get_word(word_id)?
        .ok_or_else(|| AppError::not_found("Word not found"))?;
    Ok(())
}

async fn get_progress(
    auth: AuthUser,
    Path(word_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    require_word(&state, &word_id)?;

    let progress = state.tracker().get_progress(&auth.user_id, &word_id)?;
    match progress {
        Some(p) => Ok(ok(p)),
        None => Ok(ok(VocabularyProgress::fresh(
            &auth.user_id,
            &word_id,
            state.tracker().config().default_ease_factor,
            Utc::now(),
        ))),
    }
}

async fn mark_encountered(
    auth: AuthUser,
    Path(word_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    require_word(&state, &word_id)?;

    let progress = state
        .tracker()
        .mark_encountered(&auth.user_id, &word_id, Utc::now())?;
    Ok(ok(progress))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CorrectRequest {
    quality: Option<i64>,
}

async fn mark_correct(
    auth: AuthUser,
    Path(word_id): Path<String>,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CorrectRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    require_word(&state, &word_id)?;

    let quality = Quality::new(req.quality.unwrap_or(DEFAULT_REVIEW_QUALITY))
        .map_err(|msg| AppError::bad_request("INVALID_QUALITY", msg))?;

    let progress = state
        .tracker()
        .mark_correct(&auth.user_id, &word_id, quality, Utc::now())?;
    Ok(ok(progress))
}

async fn mark_incorrect(
    auth: AuthUser,
    Path(word_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    require_word(&state, &word_id)?;

    let progress = state
        .tracker()
        .mark_incorrect(&auth.user_id, &word_id, Utc::now())?;
    Ok(ok(progress))
}

async fn mark_known(
    auth: AuthUser,
    Path(word_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    require_word(&state, &word_id)?;

    let progress = state
        .tracker()
        .mark_known(&auth.user_id, &word_id, Utc::now())?;
    Ok(ok(progress))
}

async fn reset_progress(
    auth: AuthUser,
    Path(word_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    require_word(&state, &word_id)?;

    let progress = state
        .tracker()
        .reset(&auth.user_id, &word_id, Utc::now())?;
    Ok(ok(progress))
}

#[derive(Debug, Deserialize)]
struct DueListQuery {
    limit: Option<usize>,
}

async fn due_list(
    auth: AuthUser,
    Query(q): Query<DueListQuery>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let limit = q
        .limit
        .unwrap_or(DEFAULT_REVIEW_LIMIT)
        .clamp(1, MAX_REVIEW_LIMIT);
    let due = state
        .tracker()
        .due_for_review(&auth.user_id, Utc::now(), limit)?;
    Ok(ok(due))
}

async fn stats_overview(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let stats = state.tracker().stats(&auth.user_id, Utc::now())?;
    Ok(ok(stats))
}
