use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS practice_templates (
            id                    TEXT PRIMARY KEY,
            title                 TEXT NOT NULL,
            description           TEXT NOT NULL DEFAULT '',
            default_duration_sec  INTEGER NOT NULL DEFAULT 600,
            created_at            TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at            TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS user_practices (
            id           TEXT PRIMARY KEY,
            user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            template_id  TEXT NOT NULL REFERENCES practice_templates(id) ON DELETE CASCADE,
            is_active    INTEGER NOT NULL DEFAULT 1,
            created_at   TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, template_id)
        );

        CREATE TABLE IF NOT EXISTS day_plans (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            local_date  TEXT NOT NULL,
            timezone    TEXT NOT NULL DEFAULT 'UTC',
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, local_date)
        );

        CREATE TABLE IF NOT EXISTS slots (
            id                    TEXT PRIMARY KEY,
            user_id               TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            day_plan_id           TEXT NOT NULL REFERENCES day_plans(id) ON DELETE CASCADE,
            user_practice_id      TEXT REFERENCES user_practices(id) ON DELETE SET NULL,
            variant               TEXT NOT NULL DEFAULT 'DO',
            status                TEXT NOT NULL DEFAULT 'PLANNED',
            time_of_day           TEXT NOT NULL,
            scheduled_at_utc      TEXT NOT NULL,
            started_at_utc        TEXT,
            ended_at_utc          TEXT,
            duration_sec_snapshot INTEGER,
            display_payload       TEXT NOT NULL DEFAULT '{}',
            created_at            TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at            TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_slots_user
            ON slots(user_id, scheduled_at_utc);

        CREATE INDEX IF NOT EXISTS idx_slots_plan
            ON slots(day_plan_id);

        CREATE TABLE IF NOT EXISTS ratings (
            id            TEXT PRIMARY KEY,
            slot_id       TEXT NOT NULL UNIQUE REFERENCES slots(id) ON DELETE CASCADE,
            mood          INTEGER NOT NULL DEFAULT 0,
            ease          INTEGER NOT NULL DEFAULT 0,
            satisfaction  INTEGER NOT NULL DEFAULT 0,
            nervousness   INTEGER NOT NULL DEFAULT 0,
            rated_at_utc  TEXT NOT NULL
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
