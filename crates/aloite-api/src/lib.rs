pub mod admin;
pub mod auth;
pub mod engagements;
pub mod error;
pub mod images;
pub mod initiatives;
pub mod middleware;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use tracing::error;

use aloite_core::{CoreError, CoreResult, Platform};

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;

/// All routes. The server adds CORS and tracing layers on top.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(health));

    // Anonymous callers allowed; a valid token adds the viewer's context.
    let browse_routes = Router::new()
        .route("/initiatives", get(initiatives::list))
        .route("/initiatives/search", get(initiatives::search))
        .route("/initiatives/{id}", get(initiatives::get_one))
        .route("/initiatives/{id}/image", get(images::get_image))
        .route("/users/{id}/initiatives", get(initiatives::by_creator))
        .route_layer(from_fn_with_state(state.clone(), middleware::optional_auth));

    let protected_routes = Router::new()
        .route("/me", get(auth::me))
        .route("/initiatives", post(initiatives::create))
        .route("/initiatives/{id}", put(initiatives::update).delete(initiatives::soft_delete))
        .route("/initiatives/{id}/active", put(initiatives::set_active))
        .route("/initiatives/{id}/image", put(images::upload).delete(images::clear))
        .route(
            "/initiatives/{id}/engagements",
            get(engagements::list)
                .post(engagements::sign)
                .delete(engagements::unsign),
        )
        .route("/admin/initiatives", get(admin::all_initiatives))
        .route("/admin/initiatives/deleted", get(admin::deleted_initiatives))
        .route("/admin/initiatives/{id}/restore", post(admin::restore))
        .route("/admin/initiatives/{id}", delete(admin::purge))
        .route("/admin/users", get(admin::users))
        .route("/admin/users/{id}", delete(admin::delete_user))
        .route("/admin/users/{id}/admin", put(admin::grant).delete(admin::revoke))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(browse_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Run a core call off the async runtime; every core call touches SQLite.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Platform) -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.platform))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError(CoreError::Storage(anyhow::anyhow!("worker task failed")))
        })?
        .map_err(ApiError)
}
