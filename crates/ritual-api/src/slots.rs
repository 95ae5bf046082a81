use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use ritual_db::models::NewSlot;
use ritual_types::api::Claims;
use ritual_types::models::{Slot, Variant};

use crate::auth::AppState;
use crate::convert::slot_to_api;
use crate::error::ApiError;
use crate::schedule::build_slot_batch;

/// Generate a slot batch for a day plan from the caller's currently
/// selected practices.
///
/// The plan must belong to the caller (a foreign plan 404s) and at least
/// one practice must be selected (hard failure, nothing written). Each
/// call produces a fresh independent batch; there is no guard against
/// generating twice for one plan.
pub async fn generate_slots(
    State(state): State<AppState>,
    Path(plan_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();

    let plan = state
        .db
        .get_day_plan_owned(&plan_id.to_string(), &user_id)?
        .ok_or(ApiError::NotFound)?;

    let selected = state.db.list_selected_practices(&user_id)?;
    if selected.is_empty() {
        return Err(ApiError::validation("no selected practices to schedule"));
    }

    let now = chrono::Utc::now();
    let planned = build_slot_batch(&mut rand::rng(), &selected, now);

    let batch: Vec<NewSlot> = planned
        .into_iter()
        .map(|slot| NewSlot {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.clone(),
            day_plan_id: plan.id.clone(),
            user_practice_id: Some(slot.user_practice_id),
            variant: Variant::Do.as_str().to_string(),
            time_of_day: slot.time_of_day.as_str().to_string(),
            scheduled_at_utc: slot.scheduled_at_utc.to_rfc3339(),
            duration_sec_snapshot: Some(slot.duration_sec_snapshot),
        })
        .collect();

    // Run the blocking batch insert off the async runtime
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.insert_slots(&batch))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::anyhow!("slot insert task failed")
        })??;

    info!("Generated {} slots for plan {}", rows.len(), plan.id);

    let slots: Vec<Slot> = rows.iter().map(slot_to_api).collect();
    Ok((StatusCode::CREATED, Json(slots)))
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub plan: Option<Uuid>,
}

pub async fn list_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Slot>>, ApiError> {
    let plan = query.plan.map(|p| p.to_string());
    let rows = state
        .db
        .list_slots(&claims.sub.to_string(), plan.as_deref())?;
    Ok(Json(rows.iter().map(slot_to_api).collect()))
}

/// PLANNED → IN_PROGRESS, stamping started_at_utc with the current UTC
/// time. No prior-status guard: re-starting an already started or
/// finished slot overwrites the stamp.
pub async fn start_slot(
    State(state): State<AppState>,
    Path(slot_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Slot>, ApiError> {
    let now = chrono::Utc::now().to_rfc3339();
    let row = state
        .db
        .start_slot(&slot_id.to_string(), &claims.sub.to_string(), &now)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(slot_to_api(&row)))
}

/// → DONE, stamping ended_at_utc.
pub async fn finish_slot(
    State(state): State<AppState>,
    Path(slot_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Slot>, ApiError> {
    let now = chrono::Utc::now().to_rfc3339();
    let row = state
        .db
        .finish_slot(&slot_id.to_string(), &claims.sub.to_string(), &now)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(slot_to_api(&row)))
}
