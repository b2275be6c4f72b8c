use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use aloite_core::ActorContext;
use aloite_types::api::ChangedResponse;

use crate::{ApiError, AppState, blocking};

/// PUT /initiatives/{id}/image: raw image bytes as the body.
pub async fn upload(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |p| p.set_image(&actor, id, &bytes)).await?;
    Ok(Json(ChangedResponse { changed: true }))
}

pub async fn clear(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |p| p.clear_image(&actor, id)).await?;
    Ok(Json(ChangedResponse { changed: true }))
}

/// GET /initiatives/{id}/image: the uploaded image or the placeholder, with
/// a content hash ETag so browsers can revalidate cheaply.
pub async fn get_image(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let bytes = blocking(&state, move |p| p.image(&actor, id)).await?;
    let etag = etag(&bytes);

    let cached = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag || tag.trim() == "*"));

    let etag_value = HeaderValue::from_str(&etag)
        .map_err(|e| ApiError(aloite_core::CoreError::Storage(anyhow::anyhow!("bad etag: {}", e))))?;

    if cached {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag_value)]).into_response());
    }

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type(&bytes))),
            (header::ETAG, etag_value),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        bytes,
    )
        .into_response())
}

fn etag(bytes: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(bytes)))
}

/// Sniff the common web image formats from their magic bytes.
fn content_type(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}
