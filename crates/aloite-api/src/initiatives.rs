use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use aloite_core::{ActorContext, InitiativeDraft, InitiativeEdit};
use aloite_types::api::{
    CreateInitiativeRequest, CreatedResponse, LifecycleResponse, SearchQuery, SetActiveRequest,
    UpdateInitiativeRequest,
};

use crate::{ApiError, AppState, blocking};

pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> Result<impl IntoResponse, ApiError> {
    let items = blocking(&state, move |p| p.list_initiatives(&actor)).await?;
    Ok(Json(items))
}

pub async fn search(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let items = blocking(&state, move |p| p.search(&actor, &query.q)).await?;
    Ok(Json(items))
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = blocking(&state, move |p| p.initiative(&actor, id)).await?;
    Ok(Json(detail))
}

pub async fn by_creator(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let items = blocking(&state, move |p| p.initiatives_by_creator(&actor, user_id)).await?;
    Ok(Json(items))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Json(req): Json<CreateInitiativeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = blocking(&state, move |p| {
        p.create_initiative(
            &actor,
            &InitiativeDraft {
                title: &req.title,
                description: &req.description,
                active: req.active,
                start_date: req.start_date,
                end_date: req.end_date,
            },
        )
    })
    .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateInitiativeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = blocking(&state, move |p| {
        p.edit_initiative(
            &actor,
            id,
            &InitiativeEdit {
                title: &req.title,
                description: &req.description,
                start_date: req.start_date,
                end_date: req.end_date,
            },
        )
    })
    .await?;

    Ok(Json(summary))
}

pub async fn set_active(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetActiveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let next = blocking(&state, move |p| p.set_active(&actor, id, req.active)).await?;
    Ok(Json(LifecycleResponse {
        id,
        state: next.to_string(),
    }))
}

pub async fn soft_delete(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let next = blocking(&state, move |p| p.soft_delete(&actor, id)).await?;
    Ok(Json(LifecycleResponse {
        id,
        state: next.to_string(),
    }))
}
