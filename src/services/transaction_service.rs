use uuid::Uuid;

use crate::{
    dto::transactions::{Receipt, TransactionHistory},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    repository::Repository,
};

/// The user's past transactions, newest first, each with its line items.
pub async fn history(repo: &dyn Repository, user: &AuthUser) -> AppResult<TransactionHistory> {
    let transactions = repo.list_transactions(user.user_id).await?;

    let mut receipts = Vec::with_capacity(transactions.len());
    for transaction in transactions {
        let items = repo.list_line_items(transaction.id).await?;
        receipts.push(Receipt { transaction, items });
    }

    Ok(TransactionHistory {
        username: user.username.clone(),
        transactions: receipts,
    })
}

/// One of the user's transactions. Other users' ids read as not found.
pub async fn get_transaction(
    repo: &dyn Repository,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<Receipt> {
    let transaction = repo
        .find_transaction(user.user_id, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let items = repo.list_line_items(transaction.id).await?;
    Ok(Receipt { transaction, items })
}
