use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{EngagementLabel, User};

// -- JWT Claims --

/// Bearer token claims. The admin flag is deliberately absent: it is re-read
/// from the users table on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

// -- Initiatives --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateInitiativeRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Honoured only under the `creator` activation policy.
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateInitiativeRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

/// Lifecycle state after a transition: `active`, `inactive`, `deleted` or `purged`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LifecycleResponse {
    pub id: Uuid,
    pub state: String,
}

// -- Admin --

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangedResponse {
    pub changed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserPurgeResponse {
    pub user_id: Uuid,
    pub initiatives_removed: usize,
    pub engagements_removed: usize,
}

// -- Engagements --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementResponse {
    pub label: EngagementLabel,
    /// Whether this call inserted or removed a record.
    pub changed: bool,
    pub count: u64,
}

// -- Notices and errors --

/// Returned with 200 when an action was refused as a no-op (e.g. an admin
/// trying to revoke their own role).
#[derive(Debug, Serialize, Deserialize)]
pub struct NoticeResponse {
    pub changed: bool,
    pub notice: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
