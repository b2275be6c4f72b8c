use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use aloite_core::{ActorContext, EngagementOutcome};
use aloite_types::api::EngagementResponse;

use crate::{ApiError, AppState, blocking};

pub async fn sign(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = blocking(&state, move |p| p.sign(&actor, id)).await?;
    Ok(Json(response(&state, outcome)))
}

pub async fn unsign(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = blocking(&state, move |p| p.unsign(&actor, id)).await?;
    Ok(Json(response(&state, outcome)))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let engagements = blocking(&state, move |p| p.engagements(&actor, id)).await?;
    Ok(Json(engagements))
}

fn response(state: &AppState, outcome: EngagementOutcome) -> EngagementResponse {
    EngagementResponse {
        label: state.platform.config().engagement_label,
        changed: outcome.changed,
        count: outcome.count,
    }
}
