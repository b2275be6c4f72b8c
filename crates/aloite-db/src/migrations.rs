use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const LATEST_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, initiatives, signatures)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                first_name      TEXT,
                last_name       TEXT,
                is_admin        INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE initiatives (
                id              TEXT PRIMARY KEY,
                title           TEXT NOT NULL,
                description     TEXT NOT NULL DEFAULT '',
                creator_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                start_date      TEXT,
                end_date        TEXT,
                active          INTEGER NOT NULL DEFAULT 1,
                deleted         INTEGER NOT NULL DEFAULT 0,
                image           BLOB
            );

            CREATE INDEX idx_initiatives_listing
                ON initiatives(deleted, active, created_at);

            CREATE INDEX idx_initiatives_creator
                ON initiatives(creator_id);

            -- One engagement per (user, initiative)
            CREATE TABLE signatures (
                user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                initiative_id   TEXT NOT NULL REFERENCES initiatives(id) ON DELETE CASCADE,
                signed_at       TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (user_id, initiative_id)
            );

            CREATE INDEX idx_signatures_initiative
                ON signatures(initiative_id);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            "
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
