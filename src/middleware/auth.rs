use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::session::{SESSION_COOKIE, SessionKeys, cookie_value},
    repository::Repository,
};

/// The logged-in user, taken from the session cookie.
///
/// The session must verify and name a user that still exists. Otherwise
/// extraction fails with [`AppError::Unauthenticated`] before the handler
/// body runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    SessionKeys: FromRef<S>,
    Arc<dyn Repository>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let token =
            cookie_value(&parts.headers, SESSION_COOKIE).ok_or(AppError::Unauthenticated)?;

        let claims = SessionKeys::from_ref(state)
            .verify_session(token)
            .ok_or(AppError::Unauthenticated)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthenticated)?;

        let repo: Arc<dyn Repository> = FromRef::from_ref(state);
        let Some(user) = repo.find_user(user_id).await? else {
            tracing::debug!(%user_id, "session names an unknown user");
            return Err(AppError::Unauthenticated);
        };

        Ok(AuthUser {
            user_id: user.id,
            username: user.username,
        })
    }
}
