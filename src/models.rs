use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The closed set of roles a user can hold. Kept as an enum so that every
/// authorization decision goes through one typed comparison instead of ad-hoc
/// string checks scattered across handlers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    /// May create articles; mutations of existing articles are denied.
    #[default]
    Standard,
    /// May update and delete any article.
    Privileged,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Standard => "standard",
            Role::Privileged => "privileged",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UnknownRole
///
/// Raised when a stored role string does not match the closed set. A row in
/// this state is a data-integrity problem, not a valid third role.
#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Role::Standard),
            "privileged" => Ok(Role::Privileged),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// The roles column is plain TEXT; these impls let sqlx bind and decode the
// enum directly so no String-typed role ever reaches the rest of the code.

impl sqlx::Type<sqlx::Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Role {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let text = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(text.parse()?)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for Role {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// User
///
/// The full user record stored in the `users` table. It carries the credential
/// secret, so it is deliberately **not** serializable: the only shape in which
/// a user ever leaves the service is the sanitized `OwnerView` projection.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    // Credential secret. Must never appear in any response or event payload.
    pub password: String,
    // The RBAC field consulted by the authorization gate.
    pub role: Role,
}

/// OwnerView
///
/// Sanitized projection of a user, attached to articles in place of the raw
/// owner reference. Constructed exclusively through `From<User>`, which drops
/// the secret and the role by construction: there is no field to leak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct OwnerView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for OwnerView {
    fn from(user: User) -> Self {
        OwnerView {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Article
///
/// An article row from the `articles` table. `user_id` is a foreign reference
/// to the owning user, fixed at creation time from the authenticated user and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    // FK to users.id (Owner).
    pub user_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// ArticleView
///
/// The enriched representation returned to clients and carried in change
/// events: the stored article with its owner reference resolved into the
/// sanitized `OwnerView`. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ArticleView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub owner: OwnerView,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl ArticleView {
    /// Combines a stored article with its resolved owner. The same
    /// constructor serves freshly created articles and store round-trips, so
    /// both paths converge on an identical shape.
    pub fn assemble(article: Article, owner: OwnerView) -> Self {
        ArticleView {
            id: article.id,
            title: article.title,
            content: article.content,
            owner,
            created_at: article.created_at,
            updated_at: article.updated_at,
        }
    }
}

/// --- Request Payloads (Input Schemas) ---

/// CreateArticleRequest
///
/// Input payload for submitting a new article (POST /articles). The owner is
/// taken from the authenticated session; there is intentionally no owner field
/// here, so any such key in the request body is dropped during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateArticleRequest {
    pub title: String,
    pub content: String,
}

/// UpdateArticleRequest
///
/// Partial update payload for PUT /articles/{id}. Only `title` and `content`
/// are updatable; a field left out of the payload keeps its stored value.
/// Ownership is immutable post-creation, so no owner field exists here either.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateArticleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// CreateUserRequest
///
/// Input payload for the registration endpoint (POST /users). The password is
/// persisted on the user record and never echoed back; the response is the
/// sanitized `OwnerView`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}
