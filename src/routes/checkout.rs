use axum::{Router, extract::State, routing::get};

use crate::{
    dto::cart::CartView,
    error::AppResult,
    middleware::{auth::AuthUser, session::Notices},
    response::{ApiResponse, Meta, SeeOther, View},
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/checkout", get(checkout_view).post(checkout))
}

#[utoipa::path(
    get,
    path = "/checkout",
    responses(
        (status = 200, description = "Current cart contents", body = ApiResponse<CartView>),
        (status = 303, description = "Not logged in, redirect to /login"),
    ),
    security(("session_cookie" = [])),
    tag = "Checkout"
)]
pub async fn checkout_view(
    State(state): State<AppState>,
    user: AuthUser,
    notices: Notices,
) -> AppResult<View<CartView>> {
    let data = cart_service::cart_view(state.repo.as_ref(), &user).await?;
    let meta = Meta::total(data.cart_items.len());
    Ok(View::new(ApiResponse::success("Cart", data, Some(meta)), notices))
}

#[utoipa::path(
    post,
    path = "/checkout",
    responses(
        (status = 303, description = "Cart converted into a transaction, redirect to the catalog"),
        (status = 409, description = "Cart changed during checkout"),
    ),
    security(("session_cookie" = [])),
    tag = "Checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    notices: Notices,
) -> AppResult<SeeOther> {
    cart_service::checkout(state.repo.as_ref(), &user).await?;
    let notice = state
        .session
        .queue_notice(notices, "Thank you for your purchase!")?;
    Ok(SeeOther::to("/").with_cookie(notice))
}
