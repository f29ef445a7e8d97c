use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;

use crate::{
    dto::auth::Credentials,
    error::{AppError, AppResult},
    models::{NewUser, User},
    repository::Repository,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(password_hash)
}

/// Creates a user with a hashed password.
pub async fn create_user(repo: &dyn Repository, username: &str, password: &str) -> AppResult<User> {
    let password_hash = hash_password(password)?;
    repo.insert_user(NewUser {
        username: username.to_string(),
        password_hash,
    })
    .await
}

/// Checks a username/password pair.
///
/// Returns `Ok(None)` for unknown users and wrong passwords alike.
pub async fn authenticate(
    repo: &dyn Repository,
    credentials: &Credentials,
) -> AppResult<Option<User>> {
    let user = match repo.find_user_by_username(&credentials.username).await? {
        Some(u) => u,
        None => return Ok(None),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(credentials.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Ok(None);
    }

    Ok(Some(user))
}
