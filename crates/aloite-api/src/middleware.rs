use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode};

use aloite_core::{ActorContext, CoreError};
use aloite_types::api::Claims;

use crate::{ApiError, AppState, blocking};

/// Attach an [`ActorContext`] to the request: anonymous without a bearer
/// token, otherwise the token's user with their current admin flag.
/// A token that fails validation is rejected rather than downgraded.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let actor = resolve(&state, req.headers()).await?;
    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

/// Like [`optional_auth`], but anonymous callers get 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let actor = resolve(&state, req.headers()).await?;
    if !actor.is_authenticated() {
        return Err(ApiError(CoreError::NotAuthenticated));
    }
    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

async fn resolve(state: &AppState, headers: &HeaderMap) -> Result<ActorContext, ApiError> {
    let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() else {
        return Ok(ActorContext::anonymous());
    };

    let claims = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError(CoreError::NotAuthenticated))?
    .claims;

    // The admin flag comes from the users table, never from the token.
    blocking(state, move |p| p.resolve_actor(claims.sub)).await
}
