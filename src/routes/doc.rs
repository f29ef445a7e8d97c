use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginForm, LoginView},
        cart::{AddToCartForm, CartLine, CartView},
        products::CatalogView,
        transactions::{Receipt, TransactionHistory},
    },
    models::{CartItem, LineItem, Product, Transaction},
    response::{ApiResponse, Meta},
    routes::{auth, cart, checkout, health, products, transactions},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Signed session token set by POST /login",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login_form,
        auth::login,
        auth::logout,
        products::index,
        products::product_detail,
        cart::add_to_cart,
        checkout::checkout_view,
        checkout::checkout,
        transactions::list_transactions,
        transactions::get_transaction
    ),
    components(
        schemas(
            Product,
            CartItem,
            Transaction,
            LineItem,
            LoginForm,
            LoginView,
            AddToCartForm,
            CartLine,
            CartView,
            CatalogView,
            Receipt,
            TransactionHistory,
            health::HealthData,
            Meta,
            ApiResponse<CatalogView>,
            ApiResponse<Product>,
            ApiResponse<CartView>,
            ApiResponse<TransactionHistory>,
            ApiResponse<Receipt>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Login and logout"),
        (name = "Products", description = "Product catalog"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Checkout", description = "Cart review and checkout"),
        (name = "Transactions", description = "Purchase history"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
