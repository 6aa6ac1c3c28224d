use argon2::{Argon2, PasswordHash, PasswordVerifier};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::domain::models::session::SessionRecord;
use crate::domain::models::user::User;
use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session_token";
pub const SESSION_TTL_HOURS: i64 = 12;

/// Opaque bearer token for the session cookie. Only its hash is stored.
pub fn generate_session_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

pub fn hash_session_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Verifies credentials and opens a session, returning the raw token the
/// cookie layer hands to the client. Bad email and bad password are
/// indistinguishable to the caller.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(User, String), AppError> {
    let user = state
        .user_repo
        .find_by_email(&email.to_lowercase())
        .await?
        .ok_or(AppError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|_| AppError::Internal)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized)?;

    let token = generate_session_token();
    let session = SessionRecord::new(
        hash_session_token(&token),
        user.id.clone(),
        user.team_id.clone(),
        SESSION_TTL_HOURS,
    );
    state.session_repo.create(&session).await?;

    info!("User logged in: {}", user.id);
    Ok((user, token))
}

pub async fn logout(state: &AppState, token: &str) -> Result<(), AppError> {
    state.session_repo.delete(&hash_session_token(token)).await
}
