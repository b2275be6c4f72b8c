use crate::models::{InitiativeRow, NewInitiative, PurgeCounts, SignatureRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, Row, ToSql};

const USER_COLUMNS: &str =
    "id, username, password_hash, first_name, last_name, is_admin, created_at";

// The signature count is a correlated subquery so listings stay one statement.
const INITIATIVE_SELECT: &str = "
    SELECT i.id, i.title, i.description, i.creator_id, COALESCE(u.username, ''),
           i.created_at, i.start_date, i.end_date, i.active, i.deleted,
           i.image IS NOT NULL,
           (SELECT COUNT(*) FROM signatures s WHERE s.initiative_id = i.id)
    FROM initiatives i
    LEFT JOIN users u ON u.id = i.creator_id";

const NEWEST_FIRST: &str = "ORDER BY i.created_at DESC, i.rowid DESC";

impl Database {
    // -- Users --

    /// Insert a user. Returns `false` when the username is already taken; the
    /// UNIQUE constraint decides, so concurrent registrations cannot both win.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        is_admin: bool,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, password_hash, first_name, last_name, is_admin)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(username) DO NOTHING",
                rusqlite::params![id, username, password_hash, first_name, last_name, is_admin],
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY username"
            ))?;
            let rows = stmt
                .query_map([], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns whether a row was updated (i.e. the user exists).
    pub fn set_admin(&self, id: &str, is_admin: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET is_admin = ?2 WHERE id = ?1",
                rusqlite::params![id, is_admin],
            )?;
            Ok(n == 1)
        })
    }

    /// Remove a user together with everything hanging off it: their own
    /// signatures, the initiatives they created and the signatures on those.
    /// Runs as one transaction; `None` if the user does not exist.
    pub fn delete_user_cascade(&self, id: &str) -> Result<Option<PurgeCounts>> {
        self.with_transaction(|conn| {
            let exists = conn
                .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |_| Ok(()))
                .optional()?;
            if exists.is_none() {
                return Ok(None);
            }

            let own_signatures =
                conn.execute("DELETE FROM signatures WHERE user_id = ?1", [id])?;
            let received_signatures = conn.execute(
                "DELETE FROM signatures
                 WHERE initiative_id IN (SELECT id FROM initiatives WHERE creator_id = ?1)",
                [id],
            )?;
            let initiatives =
                conn.execute("DELETE FROM initiatives WHERE creator_id = ?1", [id])?;
            conn.execute("DELETE FROM users WHERE id = ?1", [id])?;

            Ok(Some(PurgeCounts {
                initiatives,
                signatures: own_signatures + received_signatures,
            }))
        })
    }

    // -- Initiatives --

    pub fn insert_initiative(&self, new: &NewInitiative<'_>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO initiatives (id, title, description, creator_id, start_date, end_date, active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    new.id,
                    new.title,
                    new.description,
                    new.creator_id,
                    new.start_date,
                    new.end_date,
                    new.active,
                ],
            )?;
            Ok(())
        })
    }

    /// Fetch an initiative regardless of its lifecycle flags.
    pub fn get_initiative(&self, id: &str) -> Result<Option<InitiativeRow>> {
        self.with_conn(|conn| {
            let rows = query_initiatives(conn, "WHERE i.id = ?1", &[&id])?;
            Ok(rows.into_iter().next())
        })
    }

    pub fn update_initiative(
        &self,
        id: &str,
        title: &str,
        description: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE initiatives
                 SET title = ?2, description = ?3, start_date = ?4, end_date = ?5
                 WHERE id = ?1",
                rusqlite::params![id, title, description, start_date, end_date],
            )?;
            Ok(n == 1)
        })
    }

    pub fn set_initiative_active(&self, id: &str, active: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE initiatives SET active = ?2 WHERE id = ?1",
                rusqlite::params![id, active],
            )?;
            Ok(n == 1)
        })
    }

    pub fn set_initiative_deleted(&self, id: &str, deleted: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE initiatives SET deleted = ?2 WHERE id = ?1",
                rusqlite::params![id, deleted],
            )?;
            Ok(n == 1)
        })
    }

    /// Store or clear (`None`) the uploaded image.
    pub fn set_initiative_image(&self, id: &str, image: Option<&[u8]>) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE initiatives SET image = ?2 WHERE id = ?1",
                rusqlite::params![id, image],
            )?;
            Ok(n == 1)
        })
    }

    /// The uploaded image, or `None` when the initiative has none (or does not exist).
    pub fn get_initiative_image(&self, id: &str) -> Result<Option<Vec<u8>>> {
        self.with_conn(|conn| {
            let image = conn
                .query_row("SELECT image FROM initiatives WHERE id = ?1", [id], |row| {
                    row.get::<_, Option<Vec<u8>>>(0)
                })
                .optional()?;
            Ok(image.flatten())
        })
    }

    /// Hard-delete an initiative and its signatures in one transaction.
    /// Returns the number of signatures removed, or `None` if it did not exist.
    pub fn purge_initiative(&self, id: &str) -> Result<Option<usize>> {
        self.with_transaction(|conn| {
            let signatures =
                conn.execute("DELETE FROM signatures WHERE initiative_id = ?1", [id])?;
            let removed = conn.execute("DELETE FROM initiatives WHERE id = ?1", [id])?;
            if removed == 0 {
                return Ok(None);
            }
            Ok(Some(signatures))
        })
    }

    /// Home listing: active, non-deleted, newest first.
    pub fn list_public_initiatives(&self) -> Result<Vec<InitiativeRow>> {
        self.with_conn(|conn| {
            query_initiatives(
                conn,
                &format!("WHERE i.active = 1 AND i.deleted = 0 {NEWEST_FIRST}"),
                &[],
            )
        })
    }

    /// Non-deleted initiatives created by `creator_id`; inactive ones only if asked.
    pub fn list_initiatives_by_creator(
        &self,
        creator_id: &str,
        include_inactive: bool,
    ) -> Result<Vec<InitiativeRow>> {
        self.with_conn(|conn| {
            query_initiatives(
                conn,
                &format!(
                    "WHERE i.creator_id = ?1 AND i.deleted = 0 AND (?2 OR i.active = 1) {NEWEST_FIRST}"
                ),
                &[&creator_id, &include_inactive],
            )
        })
    }

    /// Case-insensitive substring match over title, description and creator
    /// username, folded with Unicode rules. Soft-deleted initiatives never
    /// match. Inactive ones match only for their creator (`viewer_id`) or
    /// when `include_inactive` is set.
    pub fn search_initiatives(
        &self,
        needle: &str,
        viewer_id: Option<&str>,
        include_inactive: bool,
    ) -> Result<Vec<InitiativeRow>> {
        let pattern = like_pattern(&needle.to_lowercase());
        self.with_conn(|conn| {
            query_initiatives(
                conn,
                &format!(
                    "WHERE i.deleted = 0
                       AND (i.active = 1 OR ?2 OR i.creator_id = ?3)
                       AND (fold_case(i.title) LIKE ?1 ESCAPE '\\'
                            OR fold_case(i.description) LIKE ?1 ESCAPE '\\'
                            OR fold_case(u.username) LIKE ?1 ESCAPE '\\')
                     {NEWEST_FIRST}"
                ),
                &[&pattern as &dyn ToSql, &include_inactive, &viewer_id],
            )
        })
    }

    /// Every initiative, soft-deleted included. Admin view.
    pub fn list_all_initiatives(&self) -> Result<Vec<InitiativeRow>> {
        self.with_conn(|conn| query_initiatives(conn, NEWEST_FIRST, &[]))
    }

    pub fn list_deleted_initiatives(&self) -> Result<Vec<InitiativeRow>> {
        self.with_conn(|conn| {
            query_initiatives(conn, &format!("WHERE i.deleted = 1 {NEWEST_FIRST}"), &[])
        })
    }

    // -- Signatures --

    /// Idempotent insert: returns `false` when the user had already signed.
    /// The composite primary key settles duplicate submissions.
    pub fn insert_signature(&self, user_id: &str, initiative_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "INSERT INTO signatures (user_id, initiative_id) VALUES (?1, ?2)
                 ON CONFLICT(user_id, initiative_id) DO NOTHING",
                [user_id, initiative_id],
            )?;
            Ok(n == 1)
        })
    }

    /// Idempotent delete: returns `false` when there was nothing to remove.
    pub fn delete_signature(&self, user_id: &str, initiative_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM signatures WHERE user_id = ?1 AND initiative_id = ?2",
                [user_id, initiative_id],
            )?;
            Ok(n == 1)
        })
    }

    pub fn count_signatures(&self, initiative_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM signatures WHERE initiative_id = ?1",
                [initiative_id],
                |row| row.get(0),
            )?;
            Ok(n as u64)
        })
    }

    pub fn has_signature(&self, user_id: &str, initiative_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM signatures WHERE user_id = ?1 AND initiative_id = ?2",
                    [user_id, initiative_id],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn list_signatures(&self, initiative_id: &str) -> Result<Vec<SignatureRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.user_id, COALESCE(u.username, ''), s.initiative_id, s.signed_at
                 FROM signatures s
                 LEFT JOIN users u ON u.id = s.user_id
                 WHERE s.initiative_id = ?1
                 ORDER BY s.signed_at, s.rowid",
            )?;
            let rows = stmt
                .query_map([initiative_id], |row| {
                    Ok(SignatureRow {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        initiative_id: row.get(2)?,
                        signed_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"
    ))?;
    let row = stmt.query_row([value], map_user).optional()?;
    Ok(row)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        is_admin: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn query_initiatives(
    conn: &Connection,
    tail: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<InitiativeRow>> {
    let mut stmt = conn.prepare(&format!("{INITIATIVE_SELECT} {tail}"))?;
    let rows = stmt
        .query_map(params, |row| {
            Ok(InitiativeRow {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                creator_id: row.get(3)?,
                creator_username: row.get(4)?,
                created_at: row.get(5)?,
                start_date: row.get(6)?,
                end_date: row.get(7)?,
                active: row.get(8)?,
                deleted: row.get(9)?,
                has_image: row.get(10)?,
                signature_count: row.get(11)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// `%needle%` with LIKE wildcards in the needle escaped by `\`.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
