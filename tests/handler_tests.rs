use async_trait::async_trait;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use pressroom::{
    AppState,
    auth::AuthUser,
    config::AppConfig,
    error::ApiError,
    handlers,
    models::{
        Article, CreateArticleRequest, CreateUserRequest, Role, UpdateArticleRequest, User,
    },
    notifier::{ChangeEvent, ChangeNotifier},
    repository::Repository,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::test;
use uuid::Uuid;

// --- MOCK REPOSITORY IMPLEMENTATION ---

// Central control point for testing the mutation pipeline. Handlers rely on
// the Repository trait, so the mock controls exactly what the store returns
// and counts every mutating call, which lets tests prove that a denied
// request never reached the store.
pub struct MockRepoControl {
    pub article_to_return: Option<Article>,
    pub delete_result: bool,
    // When true, owner lookups come back empty (dangling reference).
    pub owner_missing: bool,
    // Role attached to every resolved user.
    pub user_role: Role,
    // Number of create/update/delete calls that reached the store.
    pub store_mutations: AtomicUsize,
}

impl Default for MockRepoControl {
    fn default() -> Self {
        MockRepoControl {
            article_to_return: Some(Article::default()),
            delete_result: true,
            owner_missing: false,
            user_role: Role::Standard,
            store_mutations: AtomicUsize::new(0),
        }
    }
}

const MOCK_ARTICLE_ID: Uuid = Uuid::from_u128(77);

#[async_trait]
impl Repository for MockRepoControl {
    async fn get_articles(&self) -> Result<Vec<Article>, ApiError> {
        Ok(self.article_to_return.clone().into_iter().collect())
    }

    async fn get_article(&self, _id: Uuid) -> Result<Option<Article>, ApiError> {
        Ok(self.article_to_return.clone())
    }

    async fn create_article(
        &self,
        req: CreateArticleRequest,
        user_id: Uuid,
    ) -> Result<Article, ApiError> {
        self.store_mutations.fetch_add(1, Ordering::SeqCst);
        Ok(Article {
            id: MOCK_ARTICLE_ID,
            title: req.title,
            content: req.content,
            user_id,
            ..Article::default()
        })
    }

    async fn update_article(
        &self,
        _id: Uuid,
        req: UpdateArticleRequest,
    ) -> Result<Option<Article>, ApiError> {
        self.store_mutations.fetch_add(1, Ordering::SeqCst);
        Ok(self.article_to_return.clone().map(|mut article| {
            if let Some(title) = req.title {
                article.title = title;
            }
            if let Some(content) = req.content {
                article.content = content;
            }
            article
        }))
    }

    async fn delete_article(&self, _id: Uuid) -> Result<bool, ApiError> {
        self.store_mutations.fetch_add(1, Ordering::SeqCst);
        Ok(self.delete_result)
    }

    // Echoes a user for whatever id is asked, so assertions can verify which
    // owner id the pipeline actually resolved.
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        if self.owner_missing {
            return Ok(None);
        }
        Ok(Some(User {
            id,
            name: "ana".to_string(),
            email: "ana@example.com".to_string(),
            password: "azertyuiop".to_string(),
            role: self.user_role,
        }))
    }

    async fn create_user(&self, req: CreateUserRequest) -> Result<User, ApiError> {
        Ok(User {
            id: Uuid::from_u128(99),
            name: req.name,
            email: req.email,
            password: req.password,
            role: req.role,
        })
    }
}

// --- TEST UTILITIES ---

const TEST_ID: Uuid = Uuid::from_u128(123);
const TEST_PRIVILEGED_ID: Uuid = Uuid::from_u128(456);

fn create_test_state(repo_control: MockRepoControl) -> AppState {
    AppState {
        repo: Arc::new(repo_control),
        notifier: ChangeNotifier::new(),
        config: AppConfig::default(),
    }
}

fn privileged_user() -> AuthUser {
    AuthUser {
        id: TEST_PRIVILEGED_ID,
        role: Role::Privileged,
    }
}

fn standard_user() -> AuthUser {
    AuthUser {
        id: TEST_ID,
        role: Role::Standard,
    }
}

fn create_payload() -> CreateArticleRequest {
    CreateArticleRequest {
        title: "Un super article".to_string(),
        content: "Le contenu de mon article.".to_string(),
    }
}

// --- CREATE ---

#[test]
async fn test_create_article_pins_owner_to_requester() {
    let state = create_test_state(MockRepoControl::default());

    let result =
        handlers::create_article(standard_user(), State(state), Json(create_payload())).await;

    assert!(result.is_ok());
    let (status, Json(view)) = result.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    // The owner is the authenticated user, not anything from the payload.
    assert_eq!(view.owner.id, TEST_ID);
    assert_eq!(view.title, "Un super article");
    assert_eq!(view.content, "Le contenu de mon article.");
}

#[test]
async fn test_create_article_response_is_sanitized() {
    let state = create_test_state(MockRepoControl::default());

    let (_, Json(view)) =
        handlers::create_article(standard_user(), State(state), Json(create_payload()))
            .await
            .unwrap();

    // The mock's user record carries a password; the projection must not.
    let owner_json = serde_json::to_value(&view.owner).unwrap();
    let keys: Vec<&str> = owner_json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
    assert!(!keys.contains(&"password"));
    assert!(!keys.contains(&"role"));
    assert_eq!(owner_json["name"], "ana");
    assert_eq!(owner_json["email"], "ana@example.com");
}

#[test]
async fn test_create_article_publishes_create_event_with_enriched_payload() {
    let state = create_test_state(MockRepoControl::default());
    let mut events = state.notifier.subscribe();

    let (_, Json(view)) =
        handlers::create_article(standard_user(), State(state), Json(create_payload()))
            .await
            .unwrap();

    // The event carries the same enriched payload the HTTP caller received.
    let event = events.try_recv().expect("expected a create event");
    assert_eq!(event, ChangeEvent::ArticleCreated(view));
}

#[test]
async fn test_create_article_dangling_owner_is_internal_error_without_event() {
    let state = create_test_state(MockRepoControl {
        owner_missing: true,
        ..MockRepoControl::default()
    });
    let _notifier_keepalive = state.notifier.clone();
    let mut events = state.notifier.subscribe();

    let result =
        handlers::create_article(standard_user(), State(state), Json(create_payload())).await;

    let err = result.unwrap_err();
    assert!(matches!(err, ApiError::DanglingOwner(id) if id == TEST_ID));
    assert_eq!(
        err.into_response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    // Notification happens after enrichment, so nothing was published.
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

// --- UPDATE ---

#[test]
async fn test_update_article_forbidden_for_standard_role_without_store_access() {
    let mock = Arc::new(MockRepoControl::default());
    let state = AppState {
        repo: mock.clone(),
        notifier: ChangeNotifier::new(),
        config: AppConfig::default(),
    };
    let _notifier_keepalive = state.notifier.clone();
    let mut events = state.notifier.subscribe();

    let result = handlers::update_article(
        standard_user(),
        State(state),
        Path(TEST_ID),
        Json(UpdateArticleRequest {
            content: Some("Contenu mis à jour".to_string()),
            ..UpdateArticleRequest::default()
        }),
    )
    .await;

    let err = result.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden));
    assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);

    // The gate fired before any persistence call and nothing was broadcast.
    assert_eq!(mock.store_mutations.load(Ordering::SeqCst), 0);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[test]
async fn test_update_article_forbidden_is_identical_for_missing_article() {
    // Same denied outcome whether the article exists or not.
    let existing = create_test_state(MockRepoControl::default());
    let missing = create_test_state(MockRepoControl {
        article_to_return: None,
        ..MockRepoControl::default()
    });

    for state in [existing, missing] {
        let err = handlers::update_article(
            standard_user(),
            State(state),
            Path(TEST_ID),
            Json(UpdateArticleRequest::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }
}

#[test]
async fn test_update_article_not_found_for_privileged_role() {
    let state = create_test_state(MockRepoControl {
        article_to_return: None,
        ..MockRepoControl::default()
    });

    let err = handlers::update_article(
        privileged_user(),
        State(state),
        Path(TEST_ID),
        Json(UpdateArticleRequest::default()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::NotFound));
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
}

#[test]
async fn test_update_article_success_merges_fields_and_emits_no_event() {
    let stored = Article {
        id: MOCK_ARTICLE_ID,
        title: "Un super article".to_string(),
        content: "Le contenu de mon article.".to_string(),
        user_id: TEST_ID,
        ..Article::default()
    };
    let state = create_test_state(MockRepoControl {
        article_to_return: Some(stored),
        ..MockRepoControl::default()
    });
    let _notifier_keepalive = state.notifier.clone();
    let mut events = state.notifier.subscribe();

    let result = handlers::update_article(
        privileged_user(),
        State(state),
        Path(MOCK_ARTICLE_ID),
        Json(UpdateArticleRequest {
            content: Some("Contenu mis à jour".to_string()),
            ..UpdateArticleRequest::default()
        }),
    )
    .await;

    let Json(view) = result.unwrap();
    // Only the provided field changed; the owner was re-resolved.
    assert_eq!(view.title, "Un super article");
    assert_eq!(view.content, "Contenu mis à jour");
    assert_eq!(view.owner.id, TEST_ID);

    // Updates deliberately publish nothing.
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

// --- DELETE ---

#[test]
async fn test_delete_article_forbidden_for_standard_role() {
    let mock = Arc::new(MockRepoControl::default());
    let state = AppState {
        repo: mock.clone(),
        notifier: ChangeNotifier::new(),
        config: AppConfig::default(),
    };
    let _notifier_keepalive = state.notifier.clone();
    let mut events = state.notifier.subscribe();

    let err = handlers::delete_article(standard_user(), State(state), Path(TEST_ID))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Forbidden));
    assert_eq!(mock.store_mutations.load(Ordering::SeqCst), 0);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[test]
async fn test_delete_article_not_found_for_privileged_role() {
    let state = create_test_state(MockRepoControl {
        delete_result: false,
        ..MockRepoControl::default()
    });
    let _notifier_keepalive = state.notifier.clone();
    let mut events = state.notifier.subscribe();

    let err = handlers::delete_article(privileged_user(), State(state), Path(TEST_ID))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound));
    // A failed delete publishes nothing.
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[test]
async fn test_delete_article_success_emits_id_only_event() {
    let state = create_test_state(MockRepoControl::default());
    let mut events = state.notifier.subscribe();

    let status = handlers::delete_article(privileged_user(), State(state), Path(TEST_ID))
        .await
        .unwrap();

    assert_eq!(status, StatusCode::NO_CONTENT);

    let event = events.try_recv().expect("expected a delete event");
    assert_eq!(event, ChangeEvent::ArticleDeleted { id: TEST_ID });
}

// --- READS ---

#[test]
async fn test_get_article_details_not_found() {
    let state = create_test_state(MockRepoControl {
        article_to_return: None,
        ..MockRepoControl::default()
    });

    let err = handlers::get_article_details(State(state), Path(TEST_ID))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound));
}

#[test]
async fn test_get_articles_returns_enriched_views() {
    let stored = Article {
        id: MOCK_ARTICLE_ID,
        title: "Un super article".to_string(),
        content: "Le contenu de mon article.".to_string(),
        user_id: TEST_ID,
        ..Article::default()
    };
    let state = create_test_state(MockRepoControl {
        article_to_return: Some(stored),
        ..MockRepoControl::default()
    });

    let Json(views) = handlers::get_articles(State(state)).await.unwrap();

    assert_eq!(views.len(), 1);
    assert_eq!(views[0].owner.id, TEST_ID);
    assert_eq!(views[0].owner.name, "ana");
}
