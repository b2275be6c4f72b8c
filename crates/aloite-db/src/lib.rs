pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::Result;
use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Private scratch database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        // Cascading deletes of signatures depend on this.
        conn.pragma_update(None, "foreign_keys", "ON")?;
        register_functions(&conn)?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Run `f` inside a transaction. Commits when `f` returns `Ok`; any error
    /// rolls the whole unit back when the transaction is dropped.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

/// SQLite's own `LIKE` and `lower()` fold ASCII only. `fold_case(x)` lowercases
/// with full Unicode rules so searches match "Ää" against "ää".
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reopening_keeps_data_and_skips_applied_migrations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aloite.db");

        {
            let db = Database::open(&path).unwrap();
            assert!(db.create_user("u1", "alice", "hash", None, None, false).unwrap());
        }

        let db = Database::open(&path).unwrap();
        let user = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(user.id, "u1");

        let version: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(version, migrations::LATEST_VERSION);
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let db = Database::open_in_memory().unwrap();

        let result: Result<()> = db.with_transaction(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password_hash) VALUES ('u1', 'alice', 'x')",
                [],
            )?;
            anyhow::bail!("abort");
        });
        assert!(result.is_err());
        assert!(db.get_user_by_id("u1").unwrap().is_none());
    }
}
