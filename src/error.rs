use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// ApiError
///
/// The error taxonomy for the mutation pipeline and everything it touches.
/// The first two variants are produced deliberately by the handlers and map to
/// stable client-visible statuses; the last two are operational failures that
/// surface to the client as a generic 500 while the detail goes to the logs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The authenticated user lacks the role required for the attempted action.
    /// Returned before any store access, so the response shape is identical
    /// whether or not the target resource exists.
    #[error("forbidden")]
    Forbidden,

    /// The referenced article does not exist.
    #[error("article not found")]
    NotFound,

    /// An article's owner reference points at a user that no longer exists.
    /// Enrichment refuses to fabricate a placeholder owner.
    #[error("article owner {0} does not exist")]
    DanglingOwner(Uuid),

    /// A database failure. Never exposed to the client beyond a generic body.
    #[error("store failure: {0}")]
    Store(#[from] sqlx::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // Same wire body the service has always sent for a role rejection.
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({ "message": "Forbidden" })),
            )
                .into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Not Found" })),
            )
                .into_response(),
            ApiError::DanglingOwner(owner_id) => {
                tracing::error!(%owner_id, "dangling owner reference");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal Server Error" })),
                )
                    .into_response()
            }
            ApiError::Store(err) => {
                tracing::error!(error = ?err, "store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}
