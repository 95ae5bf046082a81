use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::DayPlan;

// -- JWT Claims --

/// JWT claims shared between token issuance (auth handlers) and the
/// request middleware. Canonical definition lives here in ritual-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Practice catalog --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePracticeRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_duration_sec")]
    pub default_duration_sec: u32,
}

fn default_duration_sec() -> u32 {
    600
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratePracticesRequest {
    pub message: String,
}

// -- Day plans --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetOrCreatePlanRequest {
    pub date: Option<NaiveDate>,
    pub timezone: Option<String>,
}

/// The plan plus whether this call created it, so the handler can pick
/// 201 vs 200.
#[derive(Debug, Serialize)]
pub struct DayPlanResponse {
    #[serde(flatten)]
    pub plan: DayPlan,
    pub created: bool,
}

// -- Slots / ratings --

/// Unknown fields (a client-supplied `rated_at_utc`, say) are ignored,
/// never honored.
#[derive(Debug, Deserialize)]
pub struct CreateRatingRequest {
    #[serde(default)]
    pub mood: u8,
    #[serde(default)]
    pub ease: u8,
    #[serde(default)]
    pub satisfaction: u8,
    #[serde(default)]
    pub nervousness: u8,
}
