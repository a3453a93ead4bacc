use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has successfully passed the
/// authentication layer.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware
/// being present on the router layer above this module, guaranteeing a
/// validated `AuthUser` with the user's ID and role. Article ownership is
/// pinned to that ID inside the create handler.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /articles
        // Submits a new article owned by the authenticated user. Any owner
        // value in the request body is discarded during deserialization.
        .route("/articles", post(handlers::create_article))
}
