use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::products::CatalogView,
    error::AppResult,
    middleware::{auth::AuthUser, session::Notices},
    models::Product,
    response::{ApiResponse, Meta, View},
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/products/{product_id}", get(product_detail))
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Product catalog", body = ApiResponse<CatalogView>),
        (status = 303, description = "Not logged in, redirect to /login"),
    ),
    security(("session_cookie" = [])),
    tag = "Products"
)]
pub async fn index(
    State(state): State<AppState>,
    user: AuthUser,
    notices: Notices,
) -> AppResult<View<CatalogView>> {
    let data = catalog_service::catalog(state.repo.as_ref(), &user).await?;
    let meta = Meta::total(data.products.len());
    Ok(View::new(
        ApiResponse::success("Products", data, Some(meta)),
        notices,
    ))
}

#[utoipa::path(
    get,
    path = "/products/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 303, description = "Not logged in, redirect to /login"),
        (status = 404, description = "Product not found"),
    ),
    security(("session_cookie" = [])),
    tag = "Products"
)]
pub async fn product_detail(
    State(state): State<AppState>,
    _user: AuthUser,
    notices: Notices,
    Path(product_id): Path<Uuid>,
) -> AppResult<View<Product>> {
    let product = catalog_service::get_product(state.repo.as_ref(), product_id).await?;
    Ok(View::new(
        ApiResponse::success("Product", product, Some(Meta::empty())),
        notices,
    ))
}
