use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use aloite_core::ActorContext;
use aloite_types::api::{ChangedResponse, LifecycleResponse, UserPurgeResponse};

use crate::{ApiError, AppState, blocking};

pub async fn all_initiatives(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> Result<impl IntoResponse, ApiError> {
    let items = blocking(&state, move |p| p.admin_initiatives(&actor, false)).await?;
    Ok(Json(items))
}

pub async fn deleted_initiatives(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> Result<impl IntoResponse, ApiError> {
    let items = blocking(&state, move |p| p.admin_initiatives(&actor, true)).await?;
    Ok(Json(items))
}

pub async fn restore(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let next = blocking(&state, move |p| p.restore(&actor, id)).await?;
    Ok(Json(LifecycleResponse {
        id,
        state: next.to_string(),
    }))
}

/// Permanent removal of a soft-deleted initiative and its engagements.
pub async fn purge(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let next = blocking(&state, move |p| p.purge(&actor, id)).await?;
    Ok(Json(LifecycleResponse {
        id,
        state: next.to_string(),
    }))
}

pub async fn users(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> Result<impl IntoResponse, ApiError> {
    let users = blocking(&state, move |p| p.list_users(&actor)).await?;
    Ok(Json(users))
}

pub async fn grant(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let changed = blocking(&state, move |p| p.grant_admin(&actor, user_id)).await?;
    Ok(Json(ChangedResponse { changed }))
}

pub async fn revoke(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let changed = blocking(&state, move |p| p.revoke_admin(&actor, user_id)).await?;
    Ok(Json(ChangedResponse { changed }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let counts = blocking(&state, move |p| p.delete_user(&actor, user_id)).await?;
    Ok(Json(UserPurgeResponse {
        user_id,
        initiatives_removed: counts.initiatives,
        engagements_removed: counts.signatures,
    }))
}
