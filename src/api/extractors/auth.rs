use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use crate::domain::models::user::User;
use crate::domain::services::auth::{hash_session_token, SESSION_COOKIE};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::Span;

/// Staff identity resolved from the opaque session cookie.
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts
            .extensions
            .get::<Cookies>()
            .ok_or(AppError::Internal)?;

        let token = cookies
            .get(SESSION_COOKIE)
            .ok_or(AppError::Unauthorized)?
            .value()
            .to_string();

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let session = app_state
            .session_repo
            .find_valid(&hash_session_token(&token))
            .await?
            .ok_or(AppError::Unauthorized)?;

        let user = app_state
            .user_repo
            .find_by_id(&session.user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Span::current().record("team_id", &user.team_id);
        Span::current().record("user_id", &user.id);

        Ok(AuthUser(user))
    }
}
