//! HTTP-facing error type and its JSON rendering.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::media::MediaError;
use crate::storage::DatabaseError;

pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Errors a handler can return. Each maps to one status code and a
/// `{"error":{"message":...}}` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    /// Unexpected failure; the message is logged, never sent to clients.
    #[error("{0}")]
    Internal(String),
}

/// Cause of a 500, carried as a response extension so an outer layer can
/// choose to expose it.
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Internal(detail) => {
                error!(error = %detail, "Request failed");
                let body = json!({ "error": { "message": INTERNAL_MESSAGE } });
                let mut response = (status, Json(body)).into_response();
                response.extensions_mut().insert(InternalDetail(detail));
                response
            }
            other => {
                warn!(status = status.as_u16(), error = %other, "Request rejected");
                let body = json!({ "error": { "message": other.to_string() } });
                (status, Json(body)).into_response()
            }
        }
    }
}

/// Re-render 500 responses with their cause in `error.detail`.
///
/// Only installed outside production mode.
pub async fn attach_error_detail(response: Response) -> Response {
    let Some(InternalDetail(detail)) = response.extensions().get::<InternalDetail>().cloned()
    else {
        return response;
    };
    let body = json!({ "error": { "message": INTERNAL_MESSAGE, "detail": detail } });
    (response.status(), Json(body)).into_response()
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            DatabaseError::Conflict(what) => Self::Conflict(what),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::InvalidInput(msg) => Self::InvalidInput(msg),
            e @ MediaError::NotFound(_) => Self::NotFound(e.to_string()),
            e @ MediaError::Storage(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken | AuthError::InvalidToken(_) => {
                Self::Unauthorized("Not authorized".to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use tower::ServiceExt;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn statuses_follow_taxonomy() {
        let cases = [
            (ApiError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn client_errors_carry_their_message() {
        let response = ApiError::Conflict("User already exists".into()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "User already exists");
    }

    #[tokio::test]
    async fn internal_errors_hide_cause() {
        let response = ApiError::Internal("disk on fire".into()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], INTERNAL_MESSAGE);
        assert!(body["error"].get("detail").is_none());
    }

    #[tokio::test]
    async fn detail_layer_exposes_cause() {
        let app = Router::new()
            .route(
                "/boom",
                get(|| async { ApiError::Internal("disk on fire".into()) }),
            )
            .route(
                "/missing",
                get(|| async { ApiError::NotFound("nope".into()) }),
            )
            .layer(axum::middleware::map_response(attach_error_detail));

        let boom = app
            .clone()
            .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(boom.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(boom).await;
        assert_eq!(body["error"]["message"], INTERNAL_MESSAGE);
        assert_eq!(body["error"]["detail"], "disk on fire");

        let missing = app
            .oneshot(Request::get("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(missing).await;
        assert!(body["error"].get("detail").is_none());
    }

    #[test]
    fn storage_errors_map_to_internal() {
        let err = ApiError::from(MediaError::Storage("eio".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err = ApiError::from(DatabaseError::Conflict("dup".into()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
