use std::env;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres URL. Without it the server runs on the in-process store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let session_secret = env::var("SESSION_SECRET").context("SESSION_SECRET is not set")?;
        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);
        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Ok(Self {
            database_url,
            host,
            port,
            session_secret,
            session_ttl_hours,
            cookie_secure,
        })
    }
}
