use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{LineItem, Transaction};

/// A transaction together with its line items.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Receipt {
    pub transaction: Transaction,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionHistory {
    pub username: String,
    pub transactions: Vec<Receipt>,
}
