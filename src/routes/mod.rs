use axum::{Router, routing::get};

use crate::state::AppState;

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod doc;
pub mod health;
pub mod products;
pub mod transactions;

/// Storefront routes without state; the caller provides it with `with_state`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(products::router())
        .merge(auth::router())
        .merge(cart::router())
        .merge(checkout::router())
        .merge(transactions::router())
}
