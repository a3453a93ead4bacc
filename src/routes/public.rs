use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client:
/// read-only article access, user registration, the health probe, and the
/// WebSocket endpoint where subscribers attach for change events.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /users
        // Creates a user record. The response carries the sanitized projection only;
        // the credential secret never leaves the store.
        .route("/users", post(handlers::register_user))
        // GET /articles
        // Lists all articles with their owners resolved.
        .route("/articles", get(handlers::get_articles))
        // GET /articles/{id}
        // Retrieves a single enriched article.
        .route("/articles/{id}", get(handlers::get_article_details))
        // GET /events
        // WebSocket upgrade for real-time change events. Subscribers receive
        // `article:create` and `article:delete` frames from the moment they
        // connect; there is no replay of earlier events.
        .route("/events", get(handlers::subscribe_changes))
}
