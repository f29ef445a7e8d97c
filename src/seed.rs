//! Demo data shared by the `seed` binary and the in-process store.

use crate::{
    error::AppResult,
    models::NewProduct,
    repository::Repository,
    services::auth_service,
};

pub const DEMO_USERS: &[(&str, &str)] = &[("alice", "alice123"), ("bob", "bob123")];

const DEMO_PRODUCTS: &[(&str, &str, i64)] = &[
    ("Espresso", "Double shot, house blend", 250),
    ("Flat White", "Espresso with steamed milk", 380),
    ("Cold Brew", "Steeped for 18 hours", 420),
    ("Almond Croissant", "Baked every morning", 350),
];

/// Inserts the demo users and products that are not there yet.
pub async fn seed_demo(repo: &dyn Repository) -> AppResult<()> {
    for (username, password) in DEMO_USERS {
        if repo.find_user_by_username(username).await?.is_none() {
            auth_service::create_user(repo, username, password).await?;
            tracing::info!(username, "seeded user");
        }
    }

    let existing: Vec<String> = repo
        .list_products()
        .await?
        .into_iter()
        .map(|product| product.name)
        .collect();

    for (name, description, price) in DEMO_PRODUCTS {
        if existing.iter().any(|n| n == name) {
            continue;
        }
        repo.insert_product(NewProduct {
            name: (*name).to_string(),
            description: Some((*description).to_string()),
            price: *price,
        })
        .await?;
        tracing::info!(name, "seeded product");
    }

    Ok(())
}
