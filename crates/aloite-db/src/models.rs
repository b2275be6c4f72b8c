/// Database row types. These map directly to SQLite rows.
/// Distinct from aloite-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
}

/// An initiative joined with its creator's username and signature count.
pub struct InitiativeRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub creator_id: String,
    pub creator_username: String,
    pub created_at: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub active: bool,
    pub deleted: bool,
    pub has_image: bool,
    pub signature_count: i64,
}

pub struct NewInitiative<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub creator_id: &'a str,
    pub start_date: Option<&'a str>,
    pub end_date: Option<&'a str>,
    pub active: bool,
}

pub struct SignatureRow {
    pub user_id: String,
    pub username: String,
    pub initiative_id: String,
    pub signed_at: String,
}

/// Rows removed by a cascading delete.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeCounts {
    pub initiatives: usize,
    pub signatures: usize,
}
