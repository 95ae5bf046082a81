use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use ritual_types::api::{Claims, DayPlanResponse, GetOrCreatePlanRequest};
use ritual_types::models::DayPlan;

use crate::auth::AppState;
use crate::convert::plan_to_api;
use crate::error::ApiError;

/// Idempotent create-or-fetch for the caller's plan on one date.
/// 201 when this call created the plan, 200 when it already existed.
pub async fn get_or_create_plan(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<GetOrCreatePlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let date = req
        .date
        .ok_or_else(|| ApiError::validation("date is required"))?;
    let timezone = req
        .timezone
        .filter(|tz| !tz.is_empty())
        .ok_or_else(|| ApiError::validation("timezone is required"))?;

    let (row, created) = state.db.get_or_create_day_plan(
        &Uuid::new_v4().to_string(),
        &claims.sub.to_string(),
        &date.to_string(),
        &timezone,
    )?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        status,
        Json(DayPlanResponse {
            plan: plan_to_api(&row),
            created,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    pub date: Option<NaiveDate>,
}

pub async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<PlanQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<DayPlan>>, ApiError> {
    let date = query.date.map(|d| d.to_string());
    let rows = state
        .db
        .list_day_plans(&claims.sub.to_string(), date.as_deref())?;
    Ok(Json(rows.iter().map(plan_to_api).collect()))
}
