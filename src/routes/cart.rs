use axum::{Form, Router, extract::State, routing::post};

use crate::{
    dto::cart::{AddToCart, AddToCartForm},
    error::AppResult,
    middleware::{auth::AuthUser, session::Notices},
    response::SeeOther,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/cart", post(add_to_cart))
}

#[utoipa::path(
    post,
    path = "/cart",
    request_body(
        content = AddToCartForm,
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (status = 303, description = "Item added, redirect to the catalog with a notice"),
        (status = 400, description = "Malformed product id or quantity"),
        (status = 404, description = "Product not found"),
    ),
    security(("session_cookie" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    notices: Notices,
    Form(form): Form<AddToCartForm>,
) -> AppResult<SeeOther> {
    let request = AddToCart::try_from(form)?;
    let added = cart_service::add_item(state.repo.as_ref(), &user, request).await?;

    let notice = format!(
        "Added {} of {} to your cart",
        added.item.quantity, added.product.name
    );
    Ok(SeeOther::to("/").with_cookie(state.session.queue_notice(notices, notice)?))
}
