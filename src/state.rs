use std::sync::Arc;

use axum::extract::FromRef;
use chrono::Duration;

use crate::{config::AppConfig, middleware::session::SessionKeys, repository::Repository};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub session: SessionKeys,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, config: &AppConfig) -> Self {
        Self {
            repo,
            session: SessionKeys::new(
                &config.session_secret,
                Duration::hours(config.session_ttl_hours),
                config.cookie_secure,
            ),
        }
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        state.session.clone()
    }
}

impl FromRef<AppState> for Arc<dyn Repository> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.repo)
    }
}
