use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Experiment-group tag on a slot. CONTROL is reserved for future
/// A/B-style practice studies; the scheduler only emits DO today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Variant {
    Do,
    Control,
}

/// Execution lifecycle of a slot. PLANNED is the initial state;
/// DONE, MISSED and CANCELLED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Planned,
    InProgress,
    Done,
    Missed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 3] = [TimeOfDay::Morning, TimeOfDay::Afternoon, TimeOfDay::Evening];
}

macro_rules! str_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(format!(concat!("unknown ", stringify!($ty), ": {}"), other)),
                }
            }
        }
    };
}

str_enum!(Variant {
    Do => "DO",
    Control => "CONTROL",
});

str_enum!(SlotStatus {
    Planned => "PLANNED",
    InProgress => "IN_PROGRESS",
    Done => "DONE",
    Missed => "MISSED",
    Cancelled => "CANCELLED",
});

str_enum!(TimeOfDay {
    Morning => "MORNING",
    Afternoon => "AFTERNOON",
    Evening => "EVENING",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeTemplate {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub default_duration_sec: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's selection of a catalog template. `is_active` is the
/// "currently selected" flag the slot scheduler reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPractice {
    pub id: Uuid,
    pub user_id: Uuid,
    pub template_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Schedule container for one calendar date. Exactly one per
/// (user, local_date) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub local_date: NaiveDate,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

/// One scheduled occurrence of a practice within a day plan.
///
/// Mutated only through the lifecycle transitions; `user_practice_id`
/// is informational and survives template removal as NULL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub day_plan_id: Uuid,
    pub user_practice_id: Option<Uuid>,
    pub variant: Variant,
    pub status: SlotStatus,
    pub time_of_day: TimeOfDay,
    pub scheduled_at_utc: DateTime<Utc>,
    pub started_at_utc: Option<DateTime<Utc>>,
    pub ended_at_utc: Option<DateTime<Utc>>,
    pub duration_sec_snapshot: Option<u32>,
    pub display_payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One-shot post-completion scores for a finished slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub mood: u8,
    pub ease: u8,
    pub satisfaction: u8,
    pub nervousness: u8,
    pub rated_at_utc: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_wire_form() {
        for s in [
            SlotStatus::Planned,
            SlotStatus::InProgress,
            SlotStatus::Done,
            SlotStatus::Missed,
            SlotStatus::Cancelled,
        ] {
            assert_eq!(s.as_str().parse::<SlotStatus>().unwrap(), s);
        }
        assert!("RUNNING".parse::<SlotStatus>().is_err());
    }

    #[test]
    fn enums_serialize_screaming_snake() {
        assert_eq!(serde_json::to_string(&SlotStatus::InProgress).unwrap(), "\"IN_PROGRESS\"");
        assert_eq!(serde_json::to_string(&TimeOfDay::Afternoon).unwrap(), "\"AFTERNOON\"");
        assert_eq!(serde_json::to_string(&Variant::Do).unwrap(), "\"DO\"");
    }
}
