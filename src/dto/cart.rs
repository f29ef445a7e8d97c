use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Product,
};

/// Raw add-to-cart form. Both fields arrive as text.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartForm {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: String,
}

/// Validated add-to-cart request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddToCart {
    pub product_id: Uuid,
    pub quantity: i32,
}

impl TryFrom<AddToCartForm> for AddToCart {
    type Error = AppError;

    fn try_from(form: AddToCartForm) -> AppResult<Self> {
        let product_id = Uuid::parse_str(form.product_id.trim())
            .map_err(|_| AppError::BadRequest("product_id must be a valid id".into()))?;
        let quantity = form
            .quantity
            .trim()
            .parse::<i32>()
            .map_err(|_| AppError::BadRequest("quantity must be a whole number".into()))?;
        if quantity <= 0 {
            return Err(AppError::BadRequest(
                "quantity must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            product_id,
            quantity,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub username: String,
    pub cart_items: Vec<CartLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(product_id: &str, quantity: &str) -> AddToCartForm {
        AddToCartForm {
            product_id: product_id.into(),
            quantity: quantity.into(),
        }
    }

    #[test]
    fn parses_valid_form() {
        let id = Uuid::now_v7();
        let parsed = AddToCart::try_from(form(&id.to_string(), " 3 ")).unwrap();
        assert_eq!(
            parsed,
            AddToCart {
                product_id: id,
                quantity: 3
            }
        );
    }

    #[test]
    fn rejects_non_positive_and_non_numeric_quantities() {
        let id = Uuid::now_v7().to_string();
        for quantity in ["0", "-2", "two", "1.5", "", "99999999999"] {
            let result = AddToCart::try_from(form(&id, quantity));
            assert!(
                matches!(result, Err(AppError::BadRequest(_))),
                "quantity {quantity:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_malformed_product_id() {
        let result = AddToCart::try_from(form("42", "1"));
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
