use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::transactions::{Receipt, TransactionHistory},
    error::AppResult,
    middleware::{auth::AuthUser, session::Notices},
    response::{ApiResponse, Meta, View},
    services::transaction_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions))
        .route("/transactions/{id}", get(get_transaction))
}

#[utoipa::path(
    get,
    path = "/transactions",
    responses(
        (status = 200, description = "Past transactions, newest first", body = ApiResponse<TransactionHistory>),
        (status = 303, description = "Not logged in, redirect to /login"),
    ),
    security(("session_cookie" = [])),
    tag = "Transactions"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    notices: Notices,
) -> AppResult<View<TransactionHistory>> {
    let data = transaction_service::history(state.repo.as_ref(), &user).await?;
    let meta = Meta::total(data.transactions.len());
    Ok(View::new(ApiResponse::success("Ok", data, Some(meta)), notices))
}

#[utoipa::path(
    get,
    path = "/transactions/{id}",
    params(
        ("id" = Uuid, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "One transaction with its line items", body = ApiResponse<Receipt>),
        (status = 404, description = "Transaction not found"),
    ),
    security(("session_cookie" = [])),
    tag = "Transactions"
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    notices: Notices,
    Path(id): Path<Uuid>,
) -> AppResult<View<Receipt>> {
    let data = transaction_service::get_transaction(state.repo.as_ref(), &user, id).await?;
    Ok(View::new(
        ApiResponse::success("OK", data, Some(Meta::empty())),
        notices,
    ))
}
