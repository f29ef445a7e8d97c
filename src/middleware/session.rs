//! Cookie-backed sessions and flash notices.
//!
//! Both cookies carry HS256 tokens signed with the configured session secret.
//! The session token identifies the logged-in user; the notice token holds
//! messages queued for the next rendered view.

use std::{convert::Infallible, fmt, sync::Arc};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, HeaderValue, header::COOKIE, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    dto::auth::{Claims, NoticeClaims},
    error::{AppError, AppResult},
    models::User,
};

pub const SESSION_COOKIE: &str = "session";
pub const NOTICE_COOKIE: &str = "notice";

const NOTICE_TTL_MINUTES: i64 = 5;

#[derive(Clone)]
pub struct SessionKeys {
    inner: Arc<KeysInner>,
}

struct KeysInner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    secure: bool,
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("ttl", &self.inner.ttl)
            .field("secure", &self.inner.secure)
            .finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn new(secret: &str, ttl: Duration, secure: bool) -> Self {
        Self {
            inner: Arc::new(KeysInner {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                ttl,
                secure,
            }),
        }
    }

    /// Signs a session for `user` and returns the `Set-Cookie` value.
    pub fn session_cookie(&self, user: &User) -> AppResult<HeaderValue> {
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            exp: expires_at(self.inner.ttl)?,
        };
        let token = self.sign(&claims)?;
        self.cookie(SESSION_COOKIE, &token, self.inner.ttl)
    }

    /// Returns the claims of a valid, unexpired session token.
    pub fn verify_session(&self, token: &str) -> Option<Claims> {
        self.verify(token)
    }

    /// Appends `message` to the notices still pending for this client.
    pub fn queue_notice(
        &self,
        pending: Notices,
        message: impl Into<String>,
    ) -> AppResult<HeaderValue> {
        let mut messages = pending.into_messages();
        messages.push(message.into());
        self.notice_cookie(messages)
    }

    fn notice_cookie(&self, messages: Vec<String>) -> AppResult<HeaderValue> {
        let ttl = Duration::minutes(NOTICE_TTL_MINUTES);
        let claims = NoticeClaims {
            notices: messages,
            exp: expires_at(ttl)?,
        };
        let token = self.sign(&claims)?;
        self.cookie(NOTICE_COOKIE, &token, ttl)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> AppResult<String> {
        encode(&Header::default(), claims, &self.inner.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> Option<T> {
        match decode::<T>(token, &self.inner.decoding, &Validation::default()) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                tracing::debug!(error = %err, "rejected signed cookie");
                None
            }
        }
    }

    fn cookie(&self, name: &str, value: &str, ttl: Duration) -> AppResult<HeaderValue> {
        let secure = if self.inner.secure { "; Secure" } else { "" };
        let cookie = format!(
            "{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{secure}",
            ttl.num_seconds()
        );
        HeaderValue::from_str(&cookie)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }
}

fn expires_at(ttl: Duration) -> AppResult<usize> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;
    usize::try_from(expiration.timestamp())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

pub fn clear_notice_cookie() -> HeaderValue {
    HeaderValue::from_static("notice=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Finds the value of cookie `name` across all `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Notices pending for the current request.
#[derive(Debug, Default)]
pub struct Notices {
    messages: Vec<String>,
    cookie_present: bool,
}

impl Notices {
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Whether the request carried a notice cookie that should be cleared.
    pub fn cookie_present(&self) -> bool {
        self.cookie_present
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

impl<S> FromRequestParts<S> for Notices
where
    SessionKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = cookie_value(&parts.headers, NOTICE_COOKIE) else {
            return Ok(Self::default());
        };
        let keys = SessionKeys::from_ref(state);
        let messages = keys
            .verify::<NoticeClaims>(token)
            .map(|claims| claims.notices)
            .unwrap_or_default();
        Ok(Self {
            messages,
            cookie_present: true,
        })
    }
}
