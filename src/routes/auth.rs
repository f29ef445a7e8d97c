use axum::{
    Form, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::auth::{Credentials, LoginForm, LoginView},
    error::{AppResult, LOGIN_PATH},
    middleware::session::{Notices, clear_session_cookie},
    response::{ApiResponse, Meta, SeeOther, View},
    services::auth_service,
    state::AppState,
};

pub const INVALID_LOGIN: &str = "Invalid login.";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, get(login_form).post(login))
        .route("/logout", post(logout))
}

#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 200, description = "Login form", body = ApiResponse<LoginView>)
    ),
    tag = "Auth"
)]
pub async fn login_form(notices: Notices) -> View<LoginView> {
    let data = LoginView {
        action: LOGIN_PATH.to_string(),
        fields: vec!["username".to_string(), "password".to_string()],
    };
    View::new(
        ApiResponse::success("Login", data, Some(Meta::empty())),
        notices,
    )
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(
        content = LoginForm,
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (status = 303, description = "Redirect to the catalog with a session, or back to /login with a notice")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    notices: Notices,
    Form(form): Form<LoginForm>,
) -> AppResult<SeeOther> {
    let user = match Credentials::try_from(form) {
        Ok(credentials) => auth_service::authenticate(state.repo.as_ref(), &credentials).await?,
        Err(_) => None,
    };

    let Some(user) = user else {
        tracing::info!("login rejected");
        let notice = state.session.queue_notice(notices, INVALID_LOGIN)?;
        return Ok(SeeOther::to(LOGIN_PATH).with_cookie(notice));
    };

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(SeeOther::to("/").with_cookie(state.session.session_cookie(&user)?))
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 303, description = "Session cleared, redirect to /login")
    ),
    tag = "Auth"
)]
pub async fn logout() -> SeeOther {
    SeeOther::to(LOGIN_PATH).with_cookie(clear_session_cookie())
}
