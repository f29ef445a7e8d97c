use uuid::Uuid;

use crate::{
    dto::products::CatalogView,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    repository::Repository,
};

pub async fn catalog(repo: &dyn Repository, user: &AuthUser) -> AppResult<CatalogView> {
    let products = repo.list_products().await?;
    Ok(CatalogView {
        username: user.username.clone(),
        products,
    })
}

pub async fn get_product(repo: &dyn Repository, id: Uuid) -> AppResult<Product> {
    repo.find_product(id).await?.ok_or(AppError::NotFound)
}
