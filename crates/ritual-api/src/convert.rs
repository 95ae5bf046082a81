//! Row-to-API conversions. SQLite hands timestamps back as text, either
//! RFC 3339 (values we wrote ourselves) or "YYYY-MM-DD HH:MM:SS" (column
//! defaults), so parsing is lenient and logs rather than fails on corrupt
//! stored data.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;
use uuid::Uuid;

use ritual_db::models::{
    DayPlanRow, PracticeTemplateRow, RatingRow, SelectedPracticeRow, SlotRow, UserRow,
};
use ritual_types::models::{
    DayPlan, PracticeTemplate, Rating, Slot, SlotStatus, TimeOfDay, User, Variant,
};

pub fn parse_utc(text: &str, context: &str) -> DateTime<Utc> {
    text.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", text, context, e);
            DateTime::default()
        })
}

fn parse_utc_opt(text: Option<&str>, context: &str) -> Option<DateTime<Utc>> {
    text.map(|t| parse_utc(t, context))
}

pub fn parse_uuid(text: &str, context: &str) -> Uuid {
    text.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}' on {}: {}", text, context, e);
        Uuid::default()
    })
}

fn parse_date(text: &str, context: &str) -> NaiveDate {
    text.parse().unwrap_or_else(|e| {
        warn!("Corrupt date '{}' on {}: {}", text, context, e);
        NaiveDate::default()
    })
}

pub fn user_to_api(row: &UserRow) -> User {
    User {
        id: parse_uuid(&row.id, "user"),
        username: row.username.clone(),
        email: row.email.clone(),
        created_at: parse_utc(&row.created_at, "user"),
    }
}

pub fn practice_to_api(row: &PracticeTemplateRow) -> PracticeTemplate {
    PracticeTemplate {
        id: parse_uuid(&row.id, "practice"),
        title: row.title.clone(),
        description: row.description.clone(),
        default_duration_sec: row.default_duration_sec,
        created_at: parse_utc(&row.created_at, "practice"),
        updated_at: parse_utc(&row.updated_at, "practice"),
    }
}

/// A selected practice carries its full template via the join, so the
/// catalog view of it needs no second lookup.
pub fn selected_practice_to_api(row: &SelectedPracticeRow) -> PracticeTemplate {
    PracticeTemplate {
        id: parse_uuid(&row.template_id, "practice"),
        title: row.title.clone(),
        description: row.description.clone(),
        default_duration_sec: row.default_duration_sec,
        created_at: parse_utc(&row.created_at, "practice"),
        updated_at: parse_utc(&row.updated_at, "practice"),
    }
}

pub fn plan_to_api(row: &DayPlanRow) -> DayPlan {
    DayPlan {
        id: parse_uuid(&row.id, "day plan"),
        user_id: parse_uuid(&row.user_id, "day plan"),
        local_date: parse_date(&row.local_date, "day plan"),
        timezone: row.timezone.clone(),
        created_at: parse_utc(&row.created_at, "day plan"),
    }
}

pub fn slot_to_api(row: &SlotRow) -> Slot {
    Slot {
        id: parse_uuid(&row.id, "slot"),
        user_id: parse_uuid(&row.user_id, "slot"),
        day_plan_id: parse_uuid(&row.day_plan_id, "slot"),
        user_practice_id: row
            .user_practice_id
            .as_deref()
            .map(|id| parse_uuid(id, "slot practice ref")),
        variant: row.variant.parse().unwrap_or_else(|e| {
            warn!("Corrupt variant on slot '{}': {}", row.id, e);
            Variant::Do
        }),
        status: row.status.parse().unwrap_or_else(|e| {
            warn!("Corrupt status on slot '{}': {}", row.id, e);
            SlotStatus::Planned
        }),
        time_of_day: row.time_of_day.parse().unwrap_or_else(|e| {
            warn!("Corrupt time_of_day on slot '{}': {}", row.id, e);
            TimeOfDay::Morning
        }),
        scheduled_at_utc: parse_utc(&row.scheduled_at_utc, "slot"),
        started_at_utc: parse_utc_opt(row.started_at_utc.as_deref(), "slot"),
        ended_at_utc: parse_utc_opt(row.ended_at_utc.as_deref(), "slot"),
        duration_sec_snapshot: row.duration_sec_snapshot,
        display_payload: serde_json::from_str(&row.display_payload).unwrap_or_else(|e| {
            warn!("Corrupt display_payload on slot '{}': {}", row.id, e);
            serde_json::json!({})
        }),
        created_at: parse_utc(&row.created_at, "slot"),
        updated_at: parse_utc(&row.updated_at, "slot"),
    }
}

pub fn rating_to_api(row: &RatingRow) -> Rating {
    Rating {
        id: parse_uuid(&row.id, "rating"),
        slot_id: parse_uuid(&row.slot_id, "rating"),
        mood: row.mood,
        ease: row.ease,
        satisfaction: row.satisfaction,
        nervousness: row.nervousness,
        rated_at_utc: parse_utc(&row.rated_at_utc, "rating"),
    }
}
