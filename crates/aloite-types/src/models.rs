use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. Never carries the password credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// One row of a listing: the initiative plus its creator's name and how many
/// users have engaged with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiativeSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub creator_id: Uuid,
    pub creator_username: String,
    pub created_at: DateTime<Utc>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub deleted: bool,
    pub has_image: bool,
    pub engagement_count: u64,
}

/// Single-initiative view. `engaged_by_me` is only meaningful for an
/// authenticated viewer and is `false` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiativeDetail {
    #[serde(flatten)]
    pub summary: InitiativeSummary,
    pub engaged_by_me: bool,
}

/// A signature or vote as shown to the initiative's owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub user_id: Uuid,
    pub username: String,
    pub initiative_id: Uuid,
    pub signed_at: DateTime<Utc>,
}

/// What an engagement is called in this deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementLabel {
    #[default]
    Signature,
    Vote,
}

impl EngagementLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementLabel::Signature => "signature",
            EngagementLabel::Vote => "vote",
        }
    }
}

impl std::fmt::Display for EngagementLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EngagementLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signature" | "signatures" | "sign" => Ok(EngagementLabel::Signature),
            "vote" | "votes" => Ok(EngagementLabel::Vote),
            other => Err(format!("unknown engagement label: {other}")),
        }
    }
}
