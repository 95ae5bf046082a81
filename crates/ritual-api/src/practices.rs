use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use ritual_types::api::{Claims, CreatePracticeRequest};
use ritual_types::models::PracticeTemplate;

use crate::auth::AppState;
use crate::convert::{practice_to_api, selected_practice_to_api};
use crate::error::ApiError;

pub async fn create_practice(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<CreatePracticeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title is required"));
    }

    let row = state.db.create_practice(
        &Uuid::new_v4().to_string(),
        req.title.trim(),
        &req.description,
        req.default_duration_sec,
    )?;

    Ok((StatusCode::CREATED, Json(practice_to_api(&row))))
}

pub async fn list_practices(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<Vec<PracticeTemplate>>, ApiError> {
    let rows = state.db.list_practices()?;
    Ok(Json(rows.iter().map(practice_to_api).collect()))
}

pub async fn get_practice(
    State(state): State<AppState>,
    Path(practice_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<PracticeTemplate>, ApiError> {
    let row = state
        .db
        .get_practice(&practice_id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(practice_to_api(&row)))
}

/// Mark a catalog template as selected for the caller. Idempotent.
pub async fn select_practice(
    State(state): State<AppState>,
    Path(practice_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    set_selected(&state, practice_id, &claims, true).await?;
    Ok(Json(serde_json::json!({ "selected": true })))
}

pub async fn unselect_practice(
    State(state): State<AppState>,
    Path(practice_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    set_selected(&state, practice_id, &claims, false).await?;
    Ok(Json(serde_json::json!({ "selected": false })))
}

pub async fn list_selected(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<PracticeTemplate>>, ApiError> {
    let selected = state.db.list_selected_practices(&claims.sub.to_string())?;
    Ok(Json(selected.iter().map(selected_practice_to_api).collect()))
}

async fn set_selected(
    state: &AppState,
    practice_id: Uuid,
    claims: &Claims,
    active: bool,
) -> Result<(), ApiError> {
    // 404 before touching user_practices so a bogus template id cannot
    // create a dangling selection
    state
        .db
        .get_practice(&practice_id.to_string())?
        .ok_or(ApiError::NotFound)?;

    state.db.set_practice_selected(
        &Uuid::new_v4().to_string(),
        &claims.sub.to_string(),
        &practice_id.to_string(),
        active,
    )?;
    Ok(())
}
