//! Postgres store.
//!
//! Plain reads go through the sqlx pool; inserts and the checkout unit of work
//! go through sea-orm over the same pool.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    db::{DbPool, OrmConn},
    entity::{
        cart_items::{self, ActiveModel as CartItemActive, Column as CartCol, Entity as CartItems},
        line_items::{self, ActiveModel as LineItemActive},
        products::{self, ActiveModel as ProductActive},
        transactions::{self, ActiveModel as TransactionActive},
        users::{self, ActiveModel as UserActive},
    },
    error::{AppError, AppResult},
    models::{
        CartItem, LineItem, NewCartItem, NewLineItem, NewProduct, NewTransaction, NewUser,
        Product, Transaction, User,
    },
    repository::{Repository, UnitOfWork},
};

#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: DbPool,
    orm: OrmConn,
}

impl PgRepository {
    pub fn new(pool: DbPool, orm: OrmConn) -> Self {
        Self { pool, orm }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let model = UserActive {
            id: Set(Uuid::now_v7()),
            username: Set(user.username),
            password_hash: Set(user.password_hash),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.orm)
        .await?;
        Ok(user_from_entity(model))
    }

    async fn list_products(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, created_at FROM products ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, created_at FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn insert_product(&self, product: NewProduct) -> AppResult<Product> {
        let model = ProductActive {
            id: Set(Uuid::now_v7()),
            name: Set(product.name),
            description: Set(product.description),
            price: Set(product.price),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.orm)
        .await?;
        Ok(product_from_entity(model))
    }

    async fn insert_cart_item(&self, item: NewCartItem) -> AppResult<CartItem> {
        let model = CartItemActive {
            id: Set(Uuid::now_v7()),
            user_id: Set(item.user_id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.orm)
        .await?;
        Ok(cart_item_from_entity(model))
    }

    async fn list_cart_items(&self, user_id: Uuid) -> AppResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT id, user_id, product_id, quantity, created_at
            FROM cart_items
            WHERE user_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn list_transactions(&self, user_id: Uuid) -> AppResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }

    async fn find_transaction(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(
            "SELECT id, user_id, created_at FROM transactions WHERE user_id = $1 AND id = $2",
        )
        .bind(user_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(transaction)
    }

    async fn list_line_items(&self, transaction_id: Uuid) -> AppResult<Vec<LineItem>> {
        let items = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT id, transaction_id, product_id, quantity
            FROM line_items
            WHERE transaction_id = $1
            ORDER BY id
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let txn = self.orm.begin().await?;
        Ok(Box::new(PgUnitOfWork { txn: Some(txn) }))
    }
}

struct PgUnitOfWork {
    txn: Option<DatabaseTransaction>,
}

impl PgUnitOfWork {
    fn txn(&self) -> AppResult<&DatabaseTransaction> {
        self.txn
            .as_ref()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unit of work already finished")))
    }

    fn finish(&mut self) -> AppResult<DatabaseTransaction> {
        self.txn
            .take()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unit of work already finished")))
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_cart_items(&mut self, user_id: Uuid) -> AppResult<Vec<CartItem>> {
        let items = CartItems::find()
            .filter(CartCol::UserId.eq(user_id))
            .order_by_asc(CartCol::CreatedAt)
            .order_by_asc(CartCol::Id)
            .lock(LockType::Update)
            .all(self.txn()?)
            .await?
            .into_iter()
            .map(cart_item_from_entity)
            .collect();
        Ok(items)
    }

    async fn insert_transaction(&mut self, transaction: NewTransaction) -> AppResult<Transaction> {
        let model = TransactionActive {
            id: Set(Uuid::now_v7()),
            user_id: Set(transaction.user_id),
            created_at: Set(transaction.created_at.into()),
        }
        .insert(self.txn()?)
        .await?;
        Ok(transaction_from_entity(model))
    }

    async fn insert_line_item(&mut self, item: NewLineItem) -> AppResult<LineItem> {
        let model = LineItemActive {
            id: Set(Uuid::now_v7()),
            transaction_id: Set(item.transaction_id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
        }
        .insert(self.txn()?)
        .await?;
        Ok(line_item_from_entity(model))
    }

    async fn delete_cart_item(&mut self, user_id: Uuid, id: Uuid) -> AppResult<u64> {
        let result = CartItems::delete_many()
            .filter(CartCol::Id.eq(id))
            .filter(CartCol::UserId.eq(user_id))
            .exec(self.txn()?)
            .await?;
        Ok(result.rows_affected)
    }

    async fn commit(&mut self) -> AppResult<()> {
        self.finish()?.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> AppResult<()> {
        self.finish()?.rollback().await?;
        Ok(())
    }
}

fn user_from_entity(model: users::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        password_hash: model.password_hash,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn product_from_entity(model: products::Model) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn cart_item_from_entity(model: cart_items::Model) -> CartItem {
    CartItem {
        id: model.id,
        user_id: model.user_id,
        product_id: model.product_id,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn transaction_from_entity(model: transactions::Model) -> Transaction {
    Transaction {
        id: model.id,
        user_id: model.user_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn line_item_from_entity(model: line_items::Model) -> LineItem {
    LineItem {
        id: model.id,
        transaction_id: model.transaction_id,
        product_id: model.product_id,
        quantity: model.quantity,
    }
}
