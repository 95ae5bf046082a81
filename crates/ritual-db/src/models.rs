/// Database row types — these map directly to SQLite rows.
/// Distinct from the ritual-types API models to keep the DB layer
/// independent; timestamps stay as stored text here.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct PracticeTemplateRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub default_duration_sec: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// A selected practice joined with its template, as the slot scheduler
/// consumes it.
pub struct SelectedPracticeRow {
    pub user_practice_id: String,
    pub template_id: String,
    pub title: String,
    pub description: String,
    pub default_duration_sec: u32,
    pub created_at: String,
    pub updated_at: String,
}

pub struct DayPlanRow {
    pub id: String,
    pub user_id: String,
    pub local_date: String,
    pub timezone: String,
    pub created_at: String,
}

pub struct SlotRow {
    pub id: String,
    pub user_id: String,
    pub day_plan_id: String,
    pub user_practice_id: Option<String>,
    pub variant: String,
    pub status: String,
    pub time_of_day: String,
    pub scheduled_at_utc: String,
    pub started_at_utc: Option<String>,
    pub ended_at_utc: Option<String>,
    pub duration_sec_snapshot: Option<u32>,
    pub display_payload: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A slot as the scheduler creates it, before insertion.
pub struct NewSlot {
    pub id: String,
    pub user_id: String,
    pub day_plan_id: String,
    pub user_practice_id: Option<String>,
    pub variant: String,
    pub time_of_day: String,
    pub scheduled_at_utc: String,
    pub duration_sec_snapshot: Option<u32>,
}

/// Outcome of a rating attach, decided inside one store operation so
/// the DONE-only and one-rating invariants cannot race lifecycle
/// transitions.
pub enum RatingOutcome {
    Created(RatingRow),
    SlotNotFound,
    NotFinished,
    AlreadyRated,
}

pub struct RatingRow {
    pub id: String,
    pub slot_id: String,
    pub mood: u8,
    pub ease: u8,
    pub satisfaction: u8,
    pub nervousness: u8,
    pub rated_at_utc: String,
}
