use std::collections::HashMap;

use chrono::Utc;

use crate::{
    dto::{
        cart::{AddToCart, CartLine, CartView},
        transactions::Receipt,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, NewCartItem, NewLineItem, NewTransaction, Product},
    repository::{Repository, UnitOfWork},
};

#[derive(Debug, Clone)]
pub struct AddedToCart {
    pub item: CartItem,
    pub product: Product,
}

/// Puts a new row in the user's cart. Repeated adds of one product are kept
/// as separate rows.
pub async fn add_item(
    repo: &dyn Repository,
    user: &AuthUser,
    request: AddToCart,
) -> AppResult<AddedToCart> {
    let product = repo
        .find_product(request.product_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let item = repo
        .insert_cart_item(NewCartItem {
            user_id: user.user_id,
            product_id: product.id,
            quantity: request.quantity,
        })
        .await?;

    tracing::info!(
        user_id = %user.user_id,
        product_id = %product.id,
        quantity = item.quantity,
        "cart item added"
    );

    Ok(AddedToCart { item, product })
}

pub async fn list_cart(repo: &dyn Repository, user: &AuthUser) -> AppResult<Vec<CartItem>> {
    repo.list_cart_items(user.user_id).await
}

/// The cart joined with its products, for the checkout page.
pub async fn cart_view(repo: &dyn Repository, user: &AuthUser) -> AppResult<CartView> {
    let items = list_cart(repo, user).await?;
    let products: HashMap<_, _> = repo
        .list_products()
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let cart_items = items
        .into_iter()
        .map(|item| {
            let product = products.get(&item.product_id).cloned().ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "cart item {} references missing product {}",
                    item.id,
                    item.product_id
                ))
            })?;
            Ok(CartLine {
                id: item.id,
                product,
                quantity: item.quantity,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(CartView {
        username: user.username.clone(),
        cart_items,
    })
}

/// Converts the user's whole cart into a transaction.
///
/// Runs in one unit of work: either every cart item becomes a line item and
/// the cart is emptied, or nothing is written. An empty cart still records a
/// transaction with no line items.
pub async fn checkout(repo: &dyn Repository, user: &AuthUser) -> AppResult<Receipt> {
    let mut uow = repo.begin().await?;

    match convert_cart(uow.as_mut(), user).await {
        Ok(receipt) => {
            uow.commit().await?;
            tracing::info!(
                user_id = %user.user_id,
                transaction_id = %receipt.transaction.id,
                items = receipt.items.len(),
                "checkout completed"
            );
            Ok(receipt)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                tracing::warn!(error = %rollback_err, "checkout rollback failed");
            }
            Err(err)
        }
    }
}

async fn convert_cart(uow: &mut dyn UnitOfWork, user: &AuthUser) -> AppResult<Receipt> {
    let cart = uow.lock_cart_items(user.user_id).await?;

    let transaction = uow
        .insert_transaction(NewTransaction {
            user_id: user.user_id,
            created_at: Utc::now(),
        })
        .await?;

    let mut items = Vec::with_capacity(cart.len());
    for cart_item in cart {
        let line_item = uow
            .insert_line_item(NewLineItem {
                transaction_id: transaction.id,
                product_id: cart_item.product_id,
                quantity: cart_item.quantity,
            })
            .await?;
        items.push(line_item);

        if uow.delete_cart_item(user.user_id, cart_item.id).await? == 0 {
            return Err(AppError::Conflict(format!(
                "cart item {} changed during checkout",
                cart_item.id
            )));
        }
    }

    Ok(Receipt { transaction, items })
}
