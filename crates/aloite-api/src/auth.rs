use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use aloite_core::{ActorContext, CoreError, Platform, Registration};
use aloite_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::{ApiError, blocking};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub platform: Platform,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |p| {
        p.register(&Registration {
            username: &req.username,
            password: &req.password,
            password_confirm: &req.password_confirm,
            first_name: req.first_name.as_deref(),
            last_name: req.last_name.as_deref(),
        })
    })
    .await?;

    let token = create_token(&state, user.id, &user.username)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |p| p.login(&req.username, &req.password)).await?;
    let token = create_token(&state, user.id, &user.username)?;

    Ok(Json(LoginResponse { user, token }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = actor.user_id().ok_or(CoreError::NotAuthenticated)?;
    let user = blocking(&state, move |p| p.user(user_id)).await?;
    Ok(Json(user))
}

fn create_token(state: &AppState, user_id: Uuid, username: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + state.token_ttl).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError(CoreError::Storage(anyhow::anyhow!("token encoding failed: {}", e))))
}
