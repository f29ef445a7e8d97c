use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Raw login form as submitted.
#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl TryFrom<LoginForm> for Credentials {
    type Error = AppError;

    fn try_from(form: LoginForm) -> AppResult<Self> {
        let username = form.username.trim();
        if username.is_empty() {
            return Err(AppError::BadRequest("username is required".into()));
        }
        if form.password.is_empty() {
            return Err(AppError::BadRequest("password is required".into()));
        }
        Ok(Self {
            username: username.to_string(),
            password: form.password,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginView {
    pub action: String,
    pub fields: Vec<String>,
}

/// Session token claims.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub exp: usize,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct NoticeClaims {
    pub notices: Vec<String>,
    pub exp: usize,
}
