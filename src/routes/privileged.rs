use crate::{AppState, handlers};
use axum::{Router, routing::put};

/// Privileged Router Module
///
/// Defines the mutation routes restricted to the privileged role: updating and
/// deleting existing articles.
///
/// Access Control:
/// These routes sit behind the same authentication layer as the authenticated
/// module. The role requirement itself is enforced by the authorization gate
/// inside each handler, before any store access, so a standard user receives
/// an identical 403 whether or not the target article exists.
pub fn privileged_routes() -> Router<AppState> {
    Router::new()
        // PUT/DELETE /articles/{id}
        // Partial update of title/content (ownership is immutable), and
        // removal, which broadcasts `article:delete` with the id.
        .route(
            "/articles/{id}",
            put(handlers::update_article).delete(handlers::delete_article),
        )
}
