use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use ritual_db::models::RatingOutcome;
use ritual_types::api::{Claims, CreateRatingRequest};
use ritual_types::models::Rating;

use crate::auth::AppState;
use crate::convert::rating_to_api;
use crate::error::ApiError;

/// Attach the one allowed post-completion rating to a finished slot.
/// `rated_at_utc` is always server-assigned. The store decides
/// ownership, the DONE-only precondition, and the one-rating constraint
/// in a single operation; a second attempt conflicts and leaves the
/// original untouched.
pub async fn create_rating(
    State(state): State<AppState>,
    Path(slot_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateRatingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.db.attach_rating(
        &Uuid::new_v4().to_string(),
        &slot_id.to_string(),
        &claims.sub.to_string(),
        (req.mood, req.ease, req.satisfaction, req.nervousness),
        &chrono::Utc::now().to_rfc3339(),
    )?;

    match outcome {
        RatingOutcome::Created(row) => Ok((StatusCode::CREATED, Json(rating_to_api(&row)))),
        RatingOutcome::SlotNotFound => Err(ApiError::NotFound),
        RatingOutcome::NotFinished => Err(ApiError::validation("slot is not finished")),
        RatingOutcome::AlreadyRated => Err(ApiError::conflict("slot already has a rating")),
    }
}

pub async fn list_ratings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Rating>>, ApiError> {
    let rows = state.db.list_ratings(&claims.sub.to_string())?;
    Ok(Json(rows.iter().map(rating_to_api).collect()))
}
