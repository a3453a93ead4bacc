use crate::error::ApiError;
use crate::models::{Article, ArticleView, OwnerView};
use crate::repository::Repository;

/// attach_owner
///
/// Resolves an article's owner reference against the user store and returns
/// the enriched view handed to clients and change events.
///
/// The lookup always hits the store, so the attached owner reflects the
/// current record rather than anything cached on an earlier read. If the
/// referenced user is gone the article is in an inconsistent state and the
/// call fails with `DanglingOwner`; a placeholder owner is never fabricated.
///
/// `OwnerView::from` drops the credential secret and the role regardless of
/// what the store returned, so the output is sanitized on every code path.
pub async fn attach_owner(
    repo: &dyn Repository,
    article: Article,
) -> Result<ArticleView, ApiError> {
    let owner = repo
        .get_user(article.user_id)
        .await?
        .ok_or(ApiError::DanglingOwner(article.user_id))?;

    Ok(ArticleView::assemble(article, OwnerView::from(owner)))
}
