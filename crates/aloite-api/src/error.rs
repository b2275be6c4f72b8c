use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use aloite_core::CoreError;
use aloite_types::api::{ErrorResponse, NoticeResponse};

/// Handler error: a core failure rendered as JSON with the matching status.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CoreError::NotAuthenticated | CoreError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            CoreError::NotOwner | CoreError::NotAdmin => StatusCode::FORBIDDEN,
            CoreError::SelfProtect => StatusCode::OK,
            CoreError::InitiativeInactive
            | CoreError::DuplicateUsername(_)
            | CoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.0 {
            // Refused self-targeting admin actions are a no-op, not a failure.
            CoreError::SelfProtect => (
                status,
                Json(NoticeResponse {
                    changed: false,
                    notice: CoreError::SelfProtect.to_string(),
                }),
            )
                .into_response(),
            CoreError::Storage(e) => {
                error!("Storage error: {:#}", e);
                (
                    status,
                    Json(ErrorResponse {
                        error: "internal".into(),
                        message: "something went wrong, please try again".into(),
                    }),
                )
                    .into_response()
            }
            other => (
                status,
                Json(ErrorResponse {
                    error: other.kind().into(),
                    message: other.to_string(),
                }),
            )
                .into_response(),
        }
    }
}
