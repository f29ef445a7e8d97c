use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Product;

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogView {
    pub username: String,
    pub products: Vec<Product>,
}
