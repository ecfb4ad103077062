use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::extractors::JsonBody;
use crate::response::{created, ok, paginated, AppError};
use crate::state::AppState;
use crate::store::operations::words::{CefrLevel, Word, WordType};
use crate::store::StoreError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_words).post(create_word))
        .route("/count", get(count_words))
        .route("/:id", get(get_word))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListWordsQuery {
    page: Option<u64>,
    per_page: Option<u64>,
}

impl ListWordsQuery {
    fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    fn per_page(&self) -> u64 {
        self.per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

async fn list_words(
    _user: AuthUser,
    Query(query): Query<ListWordsQuery>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let page = query.page();
    let per_page = query.per_page();
    let offset = ((page - 1) * per_page) as usize;
    let limit = per_page as usize;

    let total = state.store().count_words()?;
    let items = state.store().list_words(limit, offset)?;
    Ok(paginated(items, total, page, per_page))
}

async fn count_words(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let total = state.store().count_words()?;
    Ok(ok(serde_json::json!({"total": total})))
}

async fn get_word(
    _user: AuthUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let word = state
        .store()
        .get_word(&id)?
        .ok_or_else(|| AppError::not_found("Word not found"))?;
    Ok(ok(word))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateWordRequest {
    text: String,
    translation: String,
    definition: String,
    example_sentence: Option<String>,
    word_type: Option<WordType>,
    level: Option<CefrLevel>,
}

async fn create_word(
    _user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateWordRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let text = req.text.trim();
    if text.is_empty() || text.len() > 255 {
        return Err(AppError::bad_request(
            "WORD_INVALID_TEXT",
            "Word text must be between 1 and 255 characters",
        ));
    }
    if req.translation.trim().is_empty() {
        return Err(AppError::bad_request(
            "WORD_INVALID_TRANSLATION",
            "Translation must not be empty",
        ));
    }

    let word = Word {
        id: uuid::Uuid::new_v4().to_string(),
        text: text.to_string(),
        translation: req.translation.trim().to_string(),
        definition: req.definition.trim().to_string(),
        example_sentence: req
            .example_sentence
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        word_type: req.word_type.unwrap_or(WordType::Noun),
        level: req.level.unwrap_or(CefrLevel::A1),
        created_at: Utc::now(),
    };

    match state.store().create_word(&word) {
        Ok(()) => Ok(created(word)),
        Err(StoreError::Conflict { .. }) => Err(AppError::conflict(
            "WORD_TEXT_EXISTS",
            "A word with this text already exists",
        )),
        Err(e) => Err(e.into()),
    }
}
