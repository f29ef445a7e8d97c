//! In-process store.
//!
//! All tables sit behind one async mutex. A unit of work holds the lock for
//! its whole lifetime and writes to a private copy of the tables, which
//! replaces the shared state on commit.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        CartItem, LineItem, NewCartItem, NewLineItem, NewProduct, NewTransaction, NewUser,
        Product, Transaction, User,
    },
    repository::{Repository, UnitOfWork},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: Vec<User>,
    products: Vec<Product>,
    cart_items: Vec<CartItem>,
    transactions: Vec<Transaction>,
    line_items: Vec<LineItem>,
}

impl Tables {
    fn has_user(&self, id: Uuid) -> bool {
        self.users.iter().any(|user| user.id == id)
    }

    fn cart_items_of(&self, user_id: Uuid) -> Vec<CartItem> {
        self.cart_items
            .iter()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!(
                "username {} is already taken",
                user.username
            )));
        }
        let user = User {
            id: Uuid::now_v7(),
            username: user.username,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn list_products(&self) -> AppResult<Vec<Product>> {
        let tables = self.tables.lock().await;
        let mut products = tables.products.clone();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let tables = self.tables.lock().await;
        Ok(tables.products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_product(&self, product: NewProduct) -> AppResult<Product> {
        let mut tables = self.tables.lock().await;
        if tables.products.iter().any(|p| p.name == product.name) {
            return Err(AppError::Conflict(format!(
                "product {} already exists",
                product.name
            )));
        }
        let product = Product {
            id: Uuid::now_v7(),
            name: product.name,
            description: product.description,
            price: product.price,
            created_at: Utc::now(),
        };
        tables.products.push(product.clone());
        Ok(product)
    }

    async fn insert_cart_item(&self, item: NewCartItem) -> AppResult<CartItem> {
        let mut tables = self.tables.lock().await;
        if !tables.has_user(item.user_id)
            || !tables.products.iter().any(|p| p.id == item.product_id)
        {
            return Err(AppError::NotFound);
        }
        let item = CartItem {
            id: Uuid::now_v7(),
            user_id: item.user_id,
            product_id: item.product_id,
            quantity: item.quantity,
            created_at: Utc::now(),
        };
        tables.cart_items.push(item.clone());
        Ok(item)
    }

    async fn list_cart_items(&self, user_id: Uuid) -> AppResult<Vec<CartItem>> {
        let tables = self.tables.lock().await;
        Ok(tables.cart_items_of(user_id))
    }

    async fn list_transactions(&self, user_id: Uuid) -> AppResult<Vec<Transaction>> {
        let tables = self.tables.lock().await;
        let mut transactions: Vec<Transaction> = tables
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(transactions)
    }

    async fn find_transaction(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Transaction>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .transactions
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
            .cloned())
    }

    async fn list_line_items(&self, transaction_id: Uuid) -> AppResult<Vec<LineItem>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .line_items
            .iter()
            .filter(|item| item.transaction_id == transaction_id)
            .cloned()
            .collect())
    }

    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard: Some(guard),
            working,
        }))
    }
}

#[derive(Debug)]
struct MemoryUnitOfWork {
    guard: Option<OwnedMutexGuard<Tables>>,
    working: Tables,
}

impl MemoryUnitOfWork {
    fn ensure_open(&self) -> AppResult<()> {
        if self.guard.is_none() {
            return Err(AppError::Internal(anyhow::anyhow!(
                "unit of work already finished"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_cart_items(&mut self, user_id: Uuid) -> AppResult<Vec<CartItem>> {
        self.ensure_open()?;
        Ok(self.working.cart_items_of(user_id))
    }

    async fn insert_transaction(&mut self, transaction: NewTransaction) -> AppResult<Transaction> {
        self.ensure_open()?;
        if !self.working.has_user(transaction.user_id) {
            return Err(AppError::NotFound);
        }
        let transaction = Transaction {
            id: Uuid::now_v7(),
            user_id: transaction.user_id,
            created_at: transaction.created_at,
        };
        self.working.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn insert_line_item(&mut self, item: NewLineItem) -> AppResult<LineItem> {
        self.ensure_open()?;
        if !self
            .working
            .transactions
            .iter()
            .any(|t| t.id == item.transaction_id)
        {
            return Err(AppError::NotFound);
        }
        let item = LineItem {
            id: Uuid::now_v7(),
            transaction_id: item.transaction_id,
            product_id: item.product_id,
            quantity: item.quantity,
        };
        self.working.line_items.push(item.clone());
        Ok(item)
    }

    async fn delete_cart_item(&mut self, user_id: Uuid, id: Uuid) -> AppResult<u64> {
        self.ensure_open()?;
        let before = self.working.cart_items.len();
        self.working
            .cart_items
            .retain(|item| !(item.id == id && item.user_id == user_id));
        Ok(u64::try_from(before - self.working.cart_items.len()).unwrap_or(u64::MAX))
    }

    async fn commit(&mut self) -> AppResult<()> {
        self.ensure_open()?;
        if let Some(mut guard) = self.guard.take() {
            *guard = std::mem::take(&mut self.working);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> AppResult<()> {
        self.ensure_open()?;
        self.guard = None;
        self.working = Tables::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> anyhow::Result<(MemoryRepository, User, Product)> {
        let repo = MemoryRepository::new();
        let user = repo
            .insert_user(NewUser {
                username: "ada".into(),
                password_hash: "x".into(),
            })
            .await?;
        let product = repo
            .insert_product(NewProduct {
                name: "Espresso".into(),
                description: None,
                price: 250,
            })
            .await?;
        Ok((repo, user, product))
    }

    #[tokio::test]
    async fn uncommitted_writes_are_invisible_and_discarded() -> anyhow::Result<()> {
        let (repo, user, product) = seeded().await?;
        repo.insert_cart_item(NewCartItem {
            user_id: user.id,
            product_id: product.id,
            quantity: 1,
        })
        .await?;

        let mut uow = repo.begin().await?;
        let items = uow.lock_cart_items(user.id).await?;
        uow.insert_transaction(NewTransaction {
            user_id: user.id,
            created_at: Utc::now(),
        })
        .await?;
        assert_eq!(uow.delete_cart_item(user.id, items[0].id).await?, 1);
        uow.rollback().await?;

        assert_eq!(repo.list_cart_items(user.id).await?.len(), 1);
        assert!(repo.list_transactions(user.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn dropped_unit_of_work_releases_lock_without_writing() -> anyhow::Result<()> {
        let (repo, user, _) = seeded().await?;
        {
            let mut uow = repo.begin().await?;
            uow.insert_transaction(NewTransaction {
                user_id: user.id,
                created_at: Utc::now(),
            })
            .await?;
        }
        assert!(repo.list_transactions(user.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn finished_unit_of_work_rejects_further_use() -> anyhow::Result<()> {
        let (repo, user, _) = seeded().await?;
        let mut uow = repo.begin().await?;
        uow.commit().await?;
        assert!(uow.lock_cart_items(user.id).await.is_err());
        assert!(uow.commit().await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn rows_for_unknown_users_are_rejected() -> anyhow::Result<()> {
        let (repo, _, product) = seeded().await?;
        let stranger = Uuid::now_v7();

        let result = repo
            .insert_cart_item(NewCartItem {
                user_id: stranger,
                product_id: product.id,
                quantity: 1,
            })
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));
        assert!(repo.list_cart_items(stranger).await?.is_empty());

        let mut uow = repo.begin().await?;
        let result = uow
            .insert_transaction(NewTransaction {
                user_id: stranger,
                created_at: Utc::now(),
            })
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));
        uow.rollback().await?;
        Ok(())
    }

    #[tokio::test]
    async fn delete_is_scoped_to_owner() -> anyhow::Result<()> {
        let (repo, user, product) = seeded().await?;
        let item = repo
            .insert_cart_item(NewCartItem {
                user_id: user.id,
                product_id: product.id,
                quantity: 2,
            })
            .await?;

        let mut uow = repo.begin().await?;
        assert_eq!(uow.delete_cart_item(Uuid::now_v7(), item.id).await?, 0);
        uow.commit().await?;

        assert_eq!(repo.list_cart_items(user.id).await?, vec![item]);
        Ok(())
    }
}
