use crate::{
    AppState,
    auth::{ArticleAction, AuthUser, authorize},
    enrich,
    error::ApiError,
    models::{ArticleView, CreateArticleRequest, CreateUserRequest, OwnerView, UpdateArticleRequest},
    notifier::{ChangeEvent, ChangeNotifier},
};
use axum::{
    Json,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::Response,
};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

// --- Article Reads ---

/// get_articles
///
/// [Public Route] Lists all articles, newest first, each with its owner
/// resolved to the sanitized projection.
#[utoipa::path(
    get,
    path = "/articles",
    responses((status = 200, description = "All articles", body = [ArticleView]))
)]
pub async fn get_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<ArticleView>>, ApiError> {
    let articles = state.repo.get_articles().await?;

    let mut views = Vec::with_capacity(articles.len());
    for article in articles {
        views.push(enrich::attach_owner(state.repo.as_ref(), article).await?);
    }

    Ok(Json(views))
}

/// get_article_details
///
/// [Public Route] Retrieves a single enriched article by ID.
#[utoipa::path(
    get,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found", body = ArticleView),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_article_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ArticleView>, ApiError> {
    let article = state
        .repo
        .get_article(id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let view = enrich::attach_owner(state.repo.as_ref(), article).await?;
    Ok(Json(view))
}

// --- Article Mutations ---

/// create_article
///
/// [Authenticated Route] Submits a new article. Open to any authenticated
/// user; the owner is pinned to the authenticated identity, so nothing in the
/// request body can assign ownership elsewhere.
///
/// On success the enriched article is returned with 201 and the same payload
/// is broadcast to subscribers as `article:create`. The write, the owner
/// resolution, the broadcast, and the response happen strictly in that order.
#[utoipa::path(
    post,
    path = "/articles",
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "Created", body = ArticleView),
        (status = 401, description = "Not Authenticated"),
        (status = 500, description = "Store Failure")
    )
)]
pub async fn create_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<ArticleView>), ApiError> {
    authorize(&auth_user, ArticleAction::Create)?;

    let article = state.repo.create_article(payload, auth_user.id).await?;
    let view = enrich::attach_owner(state.repo.as_ref(), article).await?;

    state
        .notifier
        .publish(ChangeEvent::ArticleCreated(view.clone()));

    Ok((StatusCode::CREATED, Json(view)))
}

/// update_article
///
/// [Privileged Route] Applies a partial update to an existing article.
///
/// The role check runs before any store access: a standard user receives the
/// same 403 whether or not the article exists. For a privileged user an
/// unknown id is a plain 404. The owner is re-resolved on the updated row
/// before responding. No change event is published for updates; subscribers
/// are only told when articles appear or disappear.
#[utoipa::path(
    put,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Updated", body = ArticleView),
        (status = 403, description = "Insufficient Role"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateArticleRequest>,
) -> Result<Json<ArticleView>, ApiError> {
    authorize(&auth_user, ArticleAction::Update)?;

    let article = state
        .repo
        .update_article(id, payload)
        .await?
        .ok_or(ApiError::NotFound)?;

    let view = enrich::attach_owner(state.repo.as_ref(), article).await?;
    Ok(Json(view))
}

/// delete_article
///
/// [Privileged Route] Removes an article by ID.
///
/// Role check first, store access second, same 403 shape as update. Deleting
/// an id that does not exist (including an id deleted a moment ago) is a 404.
/// On success subscribers receive `article:delete` carrying only the id, and
/// the HTTP caller gets an empty 204.
#[utoipa::path(
    delete,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Insufficient Role"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&auth_user, ArticleAction::Delete)?;

    if !state.repo.delete_article(id).await? {
        return Err(ApiError::NotFound);
    }

    state.notifier.publish(ChangeEvent::ArticleDeleted { id });

    Ok(StatusCode::NO_CONTENT)
}

// --- Users ---

/// register_user
///
/// [Public Route] Creates a user record. The stored record carries the
/// credential secret; the response is the sanitized projection only.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses((status = 201, description = "Registered", body = OwnerView))
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<OwnerView>), ApiError> {
    let user = state.repo.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(OwnerView::from(user))))
}

// --- Change Event Subscribers ---

/// subscribe_changes
///
/// [Public Route] Upgrades the connection to a WebSocket and streams change
/// events to the client as JSON frames. Events published before the upgrade
/// completes are not replayed.
pub async fn subscribe_changes(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    let notifier = state.notifier.clone();
    ws.on_upgrade(move |socket| stream_changes(socket, notifier))
}

/// stream_changes
///
/// Per-subscriber forwarding loop. A subscriber that falls behind the
/// broadcast buffer skips the missed events and keeps receiving; a send
/// failure means the client went away and ends the task.
async fn stream_changes(mut socket: WebSocket, notifier: ChangeNotifier) {
    let mut rx = notifier.subscribe();

    loop {
        match rx.recv().await {
            Ok(event) => {
                let Ok(frame) = serde_json::to_string(&event) else {
                    continue;
                };
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "subscriber lagged behind the event buffer");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
