//! Storage seam.
//!
//! [`Repository`] exposes the typed reads and single-row writes the handlers
//! need. Multi-step writes go through a [`UnitOfWork`] obtained from
//! [`Repository::begin`]; nothing it writes is visible until
//! [`UnitOfWork::commit`].

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        CartItem, LineItem, NewCartItem, NewLineItem, NewProduct, NewTransaction, NewUser,
        Product, Transaction, User,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

#[automock]
#[async_trait]
pub trait Repository: Send + Sync {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn insert_user(&self, user: NewUser) -> AppResult<User>;

    /// All products, ordered by name.
    async fn list_products(&self) -> AppResult<Vec<Product>>;

    async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>>;

    async fn insert_product(&self, product: NewProduct) -> AppResult<Product>;

    async fn insert_cart_item(&self, item: NewCartItem) -> AppResult<CartItem>;

    /// The user's cart in insertion order.
    async fn list_cart_items(&self, user_id: Uuid) -> AppResult<Vec<CartItem>>;

    /// The user's transactions, newest first.
    async fn list_transactions(&self, user_id: Uuid) -> AppResult<Vec<Transaction>>;

    async fn find_transaction(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Transaction>>;

    async fn list_line_items(&self, transaction_id: Uuid) -> AppResult<Vec<LineItem>>;

    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}

/// An open store transaction.
///
/// Dropping it without calling [`UnitOfWork::commit`] discards its writes.
/// Once committed or rolled back it must not be used again.
#[automock]
#[async_trait]
pub trait UnitOfWork: Send {
    /// Reads the user's cart in insertion order and locks the rows until the
    /// unit of work ends.
    async fn lock_cart_items(&mut self, user_id: Uuid) -> AppResult<Vec<CartItem>>;

    async fn insert_transaction(&mut self, transaction: NewTransaction) -> AppResult<Transaction>;

    async fn insert_line_item(&mut self, item: NewLineItem) -> AppResult<LineItem>;

    /// Deletes one of the user's cart items; returns the number of rows removed.
    async fn delete_cart_item(&mut self, user_id: Uuid, id: Uuid) -> AppResult<u64>;

    async fn commit(&mut self) -> AppResult<()>;

    async fn rollback(&mut self) -> AppResult<()>;
}
