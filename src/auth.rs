use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::ApiError,
    models::Role,
    repository::RepositoryState,
};

/// Claims
///
/// Represents the payload structure expected inside a JSON Web Token (JWT).
/// These claims are signed by the server's secret and validated upon every
/// authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): The UUID of the user, used to fetch the user's record
    /// and role from the user store.
    pub sub: Uuid,
    /// Expiration Time (exp): Timestamp after which the JWT must not be accepted.
    pub exp: usize,
    /// Issued At (iat): Timestamp when the JWT was issued.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request: who is acting, and with
/// which role. Derived once per request by the extractor below and immutable
/// for the request's lifetime.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

/// ArticleAction
///
/// The closed set of mutations the pipeline can perform on an article. Every
/// handler names its action once and passes it through `authorize`, so the
/// access rules live in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleAction {
    Create,
    Update,
    Delete,
}

/// authorize
///
/// The single authorization decision point. Pure: no store access, no side
/// effects. Handlers must call it before touching the store, so a denied
/// request produces the same 403 whether or not the target article exists.
///
/// - `Create` is open to any authenticated user; ownership is pinned to the
///   actor by the create handler.
/// - `Update` and `Delete` require the privileged role.
pub fn authorize(user: &AuthUser, action: ArticleAction) -> Result<(), ApiError> {
    match action {
        ArticleAction::Create => Ok(()),
        ArticleAction::Update | ArticleAction::Delete => match user.role {
            Role::Privileged => Ok(()),
            Role::Standard => Err(ApiError::Forbidden),
        },
    }
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler and keeping authentication
/// separate from the business logic in the handlers.
///
/// The process:
/// 1. Dependency Resolution: Accessing Repository and AppConfig from the application state.
/// 2. Token Validation: Standard Bearer token extraction and JWT decoding.
/// 3. Store Lookup: Fetching the user's current role and existence.
///
/// The lookup runs on every request so a token issued before a user was
/// deleted stops working immediately. There is no environment-dependent
/// shortcut here; tests that need a fixed identity construct `AuthUser`
/// directly or mint a real token against a mock repository.
///
/// Rejection: Returns StatusCode::UNAUTHORIZED (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    // S must allow sending across threads and sharing.
    S: Send + Sync,
    // Allows the extractor to pull the Repository State from the app state.
    RepositoryState: FromRef<S>,
    // Allows the extractor to pull the AppConfig (for the JWT secret).
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Dependency Resolution
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // 2. Token Extraction
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        // 3. JWT Decoding Setup
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::default();
        // Ensure expiration time validation is always active.
        validation.validate_exp = true;

        // Expired signature, bad signature, malformed token: all collapse to 401.
        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        let user_id = token_data.claims.sub;

        // 4. Store Lookup (Final Verification)
        // A token is only as good as the user behind it: if the user record is
        // gone, the request is rejected even though the signature checked out.
        let user = repo
            .get_user(user_id)
            .await
            .map_err(|_| StatusCode::UNAUTHORIZED)?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}
