use crate::Database;
use crate::models::{
    DayPlanRow, NewSlot, PracticeTemplateRow, RatingOutcome, RatingRow, SelectedPracticeRow,
    SlotRow, UserRow,
};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password) VALUES (?1, ?2, ?3, ?4)",
                (id, username, email, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, email, password, created_at FROM users ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map([], map_user_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Practice templates --

    pub fn create_practice(
        &self,
        id: &str,
        title: &str,
        description: &str,
        default_duration_sec: u32,
    ) -> Result<PracticeTemplateRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO practice_templates (id, title, description, default_duration_sec)
                 VALUES (?1, ?2, ?3, ?4)",
                (id, title, description, default_duration_sec),
            )?;
            query_practice(conn, id)?.ok_or_else(|| anyhow::anyhow!("practice vanished after insert"))
        })
    }

    pub fn get_practice(&self, id: &str) -> Result<Option<PracticeTemplateRow>> {
        self.with_conn(|conn| query_practice(conn, id))
    }

    pub fn list_practices(&self) -> Result<Vec<PracticeTemplateRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, default_duration_sec, created_at, updated_at
                 FROM practice_templates ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map([], map_practice_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Practice selection --

    /// Set the selection flag for (user, template). Creates the
    /// user_practices row on first selection, flips `is_active` after.
    pub fn set_practice_selected(
        &self,
        id: &str,
        user_id: &str,
        template_id: &str,
        active: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO user_practices (id, user_id, template_id, is_active)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id, template_id) DO UPDATE SET is_active = excluded.is_active",
                (id, user_id, template_id, active),
            )?;
            Ok(())
        })
    }

    /// The scheduler's input: every practice the user currently has
    /// selected, joined with its template.
    pub fn list_selected_practices(&self, user_id: &str) -> Result<Vec<SelectedPracticeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT up.id, t.id, t.title, t.description, t.default_duration_sec,
                        t.created_at, t.updated_at
                 FROM user_practices up
                 JOIN practice_templates t ON up.template_id = t.id
                 WHERE up.user_id = ?1 AND up.is_active = 1
                 ORDER BY up.created_at",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(SelectedPracticeRow {
                        user_practice_id: row.get(0)?,
                        template_id: row.get(1)?,
                        title: row.get(2)?,
                        description: row.get(3)?,
                        default_duration_sec: row.get(4)?,
                        created_at: row.get(5)?,
                        updated_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Day plans --

    /// Idempotent get-or-create for (user, local_date). Returns the plan
    /// and whether this call created it. An existing plan keeps its id
    /// and date; a differing timezone is updated in place.
    pub fn get_or_create_day_plan(
        &self,
        id: &str,
        user_id: &str,
        local_date: &str,
        timezone: &str,
    ) -> Result<(DayPlanRow, bool)> {
        self.with_conn(|conn| {
            if let Some(existing) = query_day_plan_by_date(conn, user_id, local_date)? {
                if existing.timezone != timezone {
                    conn.execute(
                        "UPDATE day_plans SET timezone = ?1 WHERE id = ?2",
                        (timezone, &existing.id),
                    )?;
                    return Ok((
                        DayPlanRow {
                            timezone: timezone.to_string(),
                            ..existing
                        },
                        false,
                    ));
                }
                return Ok((existing, false));
            }

            // Unique(user_id, local_date) is the authority under races; the
            // mutex already serializes callers, so a plain insert suffices.
            conn.execute(
                "INSERT INTO day_plans (id, user_id, local_date, timezone) VALUES (?1, ?2, ?3, ?4)",
                (id, user_id, local_date, timezone),
            )?;
            let row = query_day_plan_by_date(conn, user_id, local_date)?
                .ok_or_else(|| anyhow::anyhow!("day plan vanished after insert"))?;
            Ok((row, true))
        })
    }

    pub fn get_day_plan_owned(&self, plan_id: &str, user_id: &str) -> Result<Option<DayPlanRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, user_id, local_date, timezone, created_at
                 FROM day_plans WHERE id = ?1 AND user_id = ?2",
                (plan_id, user_id),
                map_day_plan_row,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    /// A user's plans, newest date first, optionally narrowed to one date.
    pub fn list_day_plans(&self, user_id: &str, date: Option<&str>) -> Result<Vec<DayPlanRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, local_date, timezone, created_at
                 FROM day_plans
                 WHERE user_id = ?1 AND (?2 IS NULL OR local_date = ?2)
                 ORDER BY local_date DESC",
            )?;
            let rows = stmt
                .query_map((user_id, date), map_day_plan_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Slots --

    /// Insert a scheduler batch atomically and return the stored rows in
    /// creation order. Either every slot lands or none do.
    pub fn insert_slots(&self, batch: &[NewSlot]) -> Result<Vec<SlotRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for slot in batch {
                tx.execute(
                    "INSERT INTO slots (id, user_id, day_plan_id, user_practice_id, variant,
                                        time_of_day, scheduled_at_utc, duration_sec_snapshot)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    (
                        &slot.id,
                        &slot.user_id,
                        &slot.day_plan_id,
                        &slot.user_practice_id,
                        &slot.variant,
                        &slot.time_of_day,
                        &slot.scheduled_at_utc,
                        &slot.duration_sec_snapshot,
                    ),
                )?;
            }
            tx.commit()?;

            batch
                .iter()
                .map(|slot| {
                    query_slot(conn, &slot.id)?
                        .ok_or_else(|| anyhow::anyhow!("slot vanished after insert: {}", slot.id))
                })
                .collect()
        })
    }

    /// Ownership-filtered lookup: a foreign slot reads as absent.
    pub fn get_slot_owned(&self, slot_id: &str, user_id: &str) -> Result<Option<SlotRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {SLOT_COLUMNS} FROM slots WHERE id = ?1 AND user_id = ?2"),
                (slot_id, user_id),
                map_slot_row,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    pub fn list_slots(&self, user_id: &str, day_plan_id: Option<&str>) -> Result<Vec<SlotRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SLOT_COLUMNS} FROM slots
                 WHERE user_id = ?1 AND (?2 IS NULL OR day_plan_id = ?2)
                 ORDER BY scheduled_at_utc",
            ))?;
            let rows = stmt
                .query_map((user_id, day_plan_id), map_slot_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Lifecycle transition: IN_PROGRESS, stamping started_at_utc.
    /// Returns the updated row, or None when the slot does not exist or
    /// belongs to someone else.
    pub fn start_slot(&self, slot_id: &str, user_id: &str, now_utc: &str) -> Result<Option<SlotRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE slots SET status = 'IN_PROGRESS', started_at_utc = ?1, updated_at = ?1
                 WHERE id = ?2 AND user_id = ?3",
                (now_utc, slot_id, user_id),
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_slot(conn, slot_id)
        })
    }

    /// Lifecycle transition: DONE, stamping ended_at_utc.
    pub fn finish_slot(&self, slot_id: &str, user_id: &str, now_utc: &str) -> Result<Option<SlotRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE slots SET status = 'DONE', ended_at_utc = ?1, updated_at = ?1
                 WHERE id = ?2 AND user_id = ?3",
                (now_utc, slot_id, user_id),
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_slot(conn, slot_id)
        })
    }

    /// Direct status set, for external administration of the MISSED and
    /// CANCELLED states (no HTTP trigger exists for these).
    pub fn set_slot_status(
        &self,
        slot_id: &str,
        user_id: &str,
        status: &str,
        now_utc: &str,
    ) -> Result<Option<SlotRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE slots SET status = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
                (status, now_utc, slot_id, user_id),
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_slot(conn, slot_id)
        })
    }

    // -- Ratings --

    /// Attach the one allowed rating to a slot. Ownership, the
    /// DONE-only precondition, and the one-rating constraint are all
    /// checked under the same connection lock as the insert, so a
    /// concurrent lifecycle transition cannot slip between check and
    /// write. A refused attach leaves any existing rating untouched.
    pub fn attach_rating(
        &self,
        id: &str,
        slot_id: &str,
        user_id: &str,
        scores: (u8, u8, u8, u8),
        rated_at_utc: &str,
    ) -> Result<RatingOutcome> {
        self.with_conn(|conn| {
            let status: Option<String> = conn
                .query_row(
                    "SELECT status FROM slots WHERE id = ?1 AND user_id = ?2",
                    (slot_id, user_id),
                    |row| row.get(0),
                )
                .optional()?;
            let Some(status) = status else {
                return Ok(RatingOutcome::SlotNotFound);
            };
            if status != "DONE" {
                return Ok(RatingOutcome::NotFinished);
            }

            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM ratings WHERE slot_id = ?1",
                    [slot_id],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Ok(RatingOutcome::AlreadyRated);
            }

            let (mood, ease, satisfaction, nervousness) = scores;
            conn.execute(
                "INSERT INTO ratings (id, slot_id, mood, ease, satisfaction, nervousness, rated_at_utc)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                (id, slot_id, mood, ease, satisfaction, nervousness, rated_at_utc),
            )?;
            Ok(RatingOutcome::Created(RatingRow {
                id: id.to_string(),
                slot_id: slot_id.to_string(),
                mood,
                ease,
                satisfaction,
                nervousness,
                rated_at_utc: rated_at_utc.to_string(),
            }))
        })
    }

    pub fn get_rating_for_slot(&self, slot_id: &str) -> Result<Option<RatingRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, slot_id, mood, ease, satisfaction, nervousness, rated_at_utc
                 FROM ratings WHERE slot_id = ?1",
                [slot_id],
                map_rating_row,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    /// Ratings visible to a user: only those on the user's own slots.
    pub fn list_ratings(&self, user_id: &str) -> Result<Vec<RatingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.slot_id, r.mood, r.ease, r.satisfaction, r.nervousness, r.rated_at_utc
                 FROM ratings r
                 JOIN slots s ON r.slot_id = s.id
                 WHERE s.user_id = ?1
                 ORDER BY r.rated_at_utc DESC",
            )?;
            let rows = stmt
                .query_map([user_id], map_rating_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

const SLOT_COLUMNS: &str = "id, user_id, day_plan_id, user_practice_id, variant, status, \
    time_of_day, scheduled_at_utc, started_at_utc, ended_at_utc, duration_sec_snapshot, \
    display_payload, created_at, updated_at";

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // column is one of the fixed literals below, never caller input
    debug_assert!(matches!(column, "id" | "username" | "email"));
    conn.query_row(
        &format!("SELECT id, username, email, password, created_at FROM users WHERE {column} = ?1"),
        [value],
        map_user_row,
    )
    .optional()
    .map_err(Into::into)
}

fn query_practice(conn: &Connection, id: &str) -> Result<Option<PracticeTemplateRow>> {
    conn.query_row(
        "SELECT id, title, description, default_duration_sec, created_at, updated_at
         FROM practice_templates WHERE id = ?1",
        [id],
        map_practice_row,
    )
    .optional()
    .map_err(Into::into)
}

fn query_day_plan_by_date(
    conn: &Connection,
    user_id: &str,
    local_date: &str,
) -> Result<Option<DayPlanRow>> {
    conn.query_row(
        "SELECT id, user_id, local_date, timezone, created_at
         FROM day_plans WHERE user_id = ?1 AND local_date = ?2",
        (user_id, local_date),
        map_day_plan_row,
    )
    .optional()
    .map_err(Into::into)
}

fn query_slot(conn: &Connection, id: &str) -> Result<Option<SlotRow>> {
    conn.query_row(
        &format!("SELECT {SLOT_COLUMNS} FROM slots WHERE id = ?1"),
        [id],
        map_slot_row,
    )
    .optional()
    .map_err(Into::into)
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_practice_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PracticeTemplateRow> {
    Ok(PracticeTemplateRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        default_duration_sec: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn map_day_plan_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DayPlanRow> {
    Ok(DayPlanRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        local_date: row.get(2)?,
        timezone: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_slot_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SlotRow> {
    Ok(SlotRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        day_plan_id: row.get(2)?,
        user_practice_id: row.get(3)?,
        variant: row.get(4)?,
        status: row.get(5)?,
        time_of_day: row.get(6)?,
        scheduled_at_utc: row.get(7)?,
        started_at_utc: row.get(8)?,
        ended_at_utc: row.get(9)?,
        duration_sec_snapshot: row.get(10)?,
        display_payload: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn map_rating_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RatingRow> {
    Ok(RatingRow {
        id: row.get(0)?,
        slot_id: row.get(1)?,
        mood: row.get(2)?,
        ease: row.get(3)?,
        satisfaction: row.get(4)?,
        nervousness: row.get(5)?,
        rated_at_utc: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_user(db: &Database, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, username, &format!("{username}@example.com"), "hash")
            .unwrap();
        id
    }

    fn seed_practice(db: &Database, title: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_practice(&id, title, "", 600).unwrap();
        id
    }

    fn seed_slot(db: &Database, user_id: &str, plan_id: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let batch = [NewSlot {
            id: id.clone(),
            user_id: user_id.to_string(),
            day_plan_id: plan_id.to_string(),
            user_practice_id: None,
            variant: "DO".to_string(),
            time_of_day: "MORNING".to_string(),
            scheduled_at_utc: "2024-05-01T09:00:00+00:00".to_string(),
            duration_sec_snapshot: Some(600),
        }];
        db.insert_slots(&batch).unwrap();
        id
    }

    #[test]
    fn day_plan_get_or_create_is_idempotent() {
        let db = test_db();
        let user = seed_user(&db, "ada");

        let (first, created) = db
            .get_or_create_day_plan(&Uuid::new_v4().to_string(), &user, "2024-05-01", "UTC")
            .unwrap();
        assert!(created);

        let (second, created) = db
            .get_or_create_day_plan(&Uuid::new_v4().to_string(), &user, "2024-05-01", "UTC")
            .unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn day_plan_timezone_updates_in_place() {
        let db = test_db();
        let user = seed_user(&db, "ada");

        let (first, _) = db
            .get_or_create_day_plan(&Uuid::new_v4().to_string(), &user, "2024-05-01", "UTC")
            .unwrap();
        let (second, created) = db
            .get_or_create_day_plan(&Uuid::new_v4().to_string(), &user, "2024-05-01", "Europe/Berlin")
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.local_date, "2024-05-01");
        assert_eq!(second.timezone, "Europe/Berlin");

        let plans = db.list_day_plans(&user, None).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].timezone, "Europe/Berlin");
    }

    #[test]
    fn day_plans_list_newest_first_with_date_filter() {
        let db = test_db();
        let user = seed_user(&db, "ada");
        for date in ["2024-05-01", "2024-05-03", "2024-05-02"] {
            db.get_or_create_day_plan(&Uuid::new_v4().to_string(), &user, date, "UTC")
                .unwrap();
        }

        let all = db.list_day_plans(&user, None).unwrap();
        let dates: Vec<&str> = all.iter().map(|p| p.local_date.as_str()).collect();
        assert_eq!(dates, ["2024-05-03", "2024-05-02", "2024-05-01"]);

        let filtered = db.list_day_plans(&user, Some("2024-05-02")).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].local_date, "2024-05-02");
    }

    #[test]
    fn duplicate_user_insert_is_a_unique_violation() {
        let db = test_db();
        seed_user(&db, "ada");

        let err = db
            .create_user(&Uuid::new_v4().to_string(), "ada", "fresh@example.com", "hash")
            .unwrap_err();
        assert!(crate::is_unique_violation(&err));

        let err = db
            .create_user(&Uuid::new_v4().to_string(), "fresh", "ada@example.com", "hash")
            .unwrap_err();
        assert!(crate::is_unique_violation(&err));
    }

    #[test]
    fn selection_upsert_is_idempotent() {
        let db = test_db();
        let user = seed_user(&db, "ada");
        let template = seed_practice(&db, "Morning stretch");

        for _ in 0..2 {
            db.set_practice_selected(&Uuid::new_v4().to_string(), &user, &template, true)
                .unwrap();
        }
        let selected = db.list_selected_practices(&user).unwrap();
        assert_eq!(selected.len(), 1);
        // the join carries the full template
        assert_eq!(selected[0].template_id, template);
        assert_eq!(selected[0].title, "Morning stretch");
        assert_eq!(selected[0].default_duration_sec, 600);
        assert!(!selected[0].created_at.is_empty());

        db.set_practice_selected(&Uuid::new_v4().to_string(), &user, &template, false)
            .unwrap();
        assert!(db.list_selected_practices(&user).unwrap().is_empty());
    }

    #[test]
    fn slot_batch_inserts_in_creation_order() {
        let db = test_db();
        let user = seed_user(&db, "ada");
        let (plan, _) = db
            .get_or_create_day_plan(&Uuid::new_v4().to_string(), &user, "2024-05-01", "UTC")
            .unwrap();

        let batch: Vec<NewSlot> = (0..3)
            .map(|i| NewSlot {
                id: Uuid::new_v4().to_string(),
                user_id: user.clone(),
                day_plan_id: plan.id.clone(),
                user_practice_id: None,
                variant: "DO".to_string(),
                time_of_day: "EVENING".to_string(),
                scheduled_at_utc: format!("2024-05-01T{:02}:00:00+00:00", 9 + i),
                duration_sec_snapshot: None,
            })
            .collect();

        let stored = db.insert_slots(&batch).unwrap();
        assert_eq!(stored.len(), 3);
        for (slot, stored) in batch.iter().zip(&stored) {
            assert_eq!(slot.id, stored.id);
            assert_eq!(stored.status, "PLANNED");
            assert_eq!(stored.display_payload, "{}");
        }
    }

    #[test]
    fn lifecycle_transitions_stamp_timestamps() {
        let db = test_db();
        let user = seed_user(&db, "ada");
        let (plan, _) = db
            .get_or_create_day_plan(&Uuid::new_v4().to_string(), &user, "2024-05-01", "UTC")
            .unwrap();
        let slot = seed_slot(&db, &user, &plan.id);

        let started = db
            .start_slot(&slot, &user, "2024-05-01T09:05:00+00:00")
            .unwrap()
            .unwrap();
        assert_eq!(started.status, "IN_PROGRESS");
        assert_eq!(started.started_at_utc.as_deref(), Some("2024-05-01T09:05:00+00:00"));
        assert!(started.ended_at_utc.is_none());

        let finished = db
            .finish_slot(&slot, &user, "2024-05-01T09:15:00+00:00")
            .unwrap()
            .unwrap();
        assert_eq!(finished.status, "DONE");
        assert_eq!(finished.ended_at_utc.as_deref(), Some("2024-05-01T09:15:00+00:00"));
    }

    #[test]
    fn foreign_slot_reads_as_absent() {
        let db = test_db();
        let owner = seed_user(&db, "ada");
        let intruder = seed_user(&db, "mallory");
        let (plan, _) = db
            .get_or_create_day_plan(&Uuid::new_v4().to_string(), &owner, "2024-05-01", "UTC")
            .unwrap();
        let slot = seed_slot(&db, &owner, &plan.id);

        assert!(db.get_slot_owned(&slot, &intruder).unwrap().is_none());
        assert!(db
            .start_slot(&slot, &intruder, "2024-05-01T09:05:00+00:00")
            .unwrap()
            .is_none());
        assert!(db
            .finish_slot(&slot, &intruder, "2024-05-01T09:05:00+00:00")
            .unwrap()
            .is_none());

        // owner is unaffected
        let row = db.get_slot_owned(&slot, &owner).unwrap().unwrap();
        assert_eq!(row.status, "PLANNED");
    }

    #[test]
    fn missed_and_cancelled_are_settable() {
        let db = test_db();
        let user = seed_user(&db, "ada");
        let (plan, _) = db
            .get_or_create_day_plan(&Uuid::new_v4().to_string(), &user, "2024-05-01", "UTC")
            .unwrap();
        let slot = seed_slot(&db, &user, &plan.id);

        let row = db
            .set_slot_status(&slot, &user, "MISSED", "2024-05-02T00:00:00+00:00")
            .unwrap()
            .unwrap();
        assert_eq!(row.status, "MISSED");
    }

    #[test]
    fn second_rating_is_rejected_and_first_survives() {
        let db = test_db();
        let user = seed_user(&db, "ada");
        let (plan, _) = db
            .get_or_create_day_plan(&Uuid::new_v4().to_string(), &user, "2024-05-01", "UTC")
            .unwrap();
        let slot = seed_slot(&db, &user, &plan.id);
        db.finish_slot(&slot, &user, "2024-05-01T09:15:00+00:00").unwrap();

        let first = db
            .attach_rating(
                &Uuid::new_v4().to_string(),
                &slot,
                &user,
                (7, 5, 8, 2),
                "2024-05-01T09:16:00+00:00",
            )
            .unwrap();
        assert!(matches!(first, RatingOutcome::Created(_)));

        let second = db
            .attach_rating(
                &Uuid::new_v4().to_string(),
                &slot,
                &user,
                (1, 1, 1, 1),
                "2024-05-01T09:17:00+00:00",
            )
            .unwrap();
        assert!(matches!(second, RatingOutcome::AlreadyRated));

        let stored = db.get_rating_for_slot(&slot).unwrap().unwrap();
        assert_eq!(stored.mood, 7);
        assert_eq!(stored.satisfaction, 8);
    }

    #[test]
    fn rating_an_unfinished_slot_is_refused() {
        let db = test_db();
        let user = seed_user(&db, "ada");
        let (plan, _) = db
            .get_or_create_day_plan(&Uuid::new_v4().to_string(), &user, "2024-05-01", "UTC")
            .unwrap();
        let slot = seed_slot(&db, &user, &plan.id);

        // PLANNED
        let outcome = db
            .attach_rating(
                &Uuid::new_v4().to_string(),
                &slot,
                &user,
                (5, 5, 5, 5),
                "2024-05-01T09:16:00+00:00",
            )
            .unwrap();
        assert!(matches!(outcome, RatingOutcome::NotFinished));

        // IN_PROGRESS
        db.start_slot(&slot, &user, "2024-05-01T09:05:00+00:00").unwrap();
        let outcome = db
            .attach_rating(
                &Uuid::new_v4().to_string(),
                &slot,
                &user,
                (5, 5, 5, 5),
                "2024-05-01T09:16:00+00:00",
            )
            .unwrap();
        assert!(matches!(outcome, RatingOutcome::NotFinished));
        assert!(db.get_rating_for_slot(&slot).unwrap().is_none());

        // DONE
        db.finish_slot(&slot, &user, "2024-05-01T09:15:00+00:00").unwrap();
        let outcome = db
            .attach_rating(
                &Uuid::new_v4().to_string(),
                &slot,
                &user,
                (5, 5, 5, 5),
                "2024-05-01T09:16:00+00:00",
            )
            .unwrap();
        assert!(matches!(outcome, RatingOutcome::Created(_)));
    }

    #[test]
    fn rating_a_foreign_slot_reads_as_absent() {
        let db = test_db();
        let owner = seed_user(&db, "ada");
        let intruder = seed_user(&db, "mallory");
        let (plan, _) = db
            .get_or_create_day_plan(&Uuid::new_v4().to_string(), &owner, "2024-05-01", "UTC")
            .unwrap();
        let slot = seed_slot(&db, &owner, &plan.id);
        db.finish_slot(&slot, &owner, "2024-05-01T09:15:00+00:00").unwrap();

        let outcome = db
            .attach_rating(
                &Uuid::new_v4().to_string(),
                &slot,
                &intruder,
                (5, 5, 5, 5),
                "2024-05-01T09:16:00+00:00",
            )
            .unwrap();
        assert!(matches!(outcome, RatingOutcome::SlotNotFound));
        assert!(db.get_rating_for_slot(&slot).unwrap().is_none());
    }

    #[test]
    fn ratings_list_is_ownership_filtered() {
        let db = test_db();
        let ada = seed_user(&db, "ada");
        let bob = seed_user(&db, "bob");
        let (plan, _) = db
            .get_or_create_day_plan(&Uuid::new_v4().to_string(), &ada, "2024-05-01", "UTC")
            .unwrap();
        let slot = seed_slot(&db, &ada, &plan.id);
        db.finish_slot(&slot, &ada, "2024-05-01T09:15:00+00:00").unwrap();
        db.attach_rating(
            &Uuid::new_v4().to_string(),
            &slot,
            &ada,
            (5, 5, 5, 5),
            "2024-05-01T09:16:00+00:00",
        )
        .unwrap();

        assert_eq!(db.list_ratings(&ada).unwrap().len(), 1);
        assert!(db.list_ratings(&bob).unwrap().is_empty());
    }
}
