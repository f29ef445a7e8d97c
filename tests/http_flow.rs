use std::{collections::HashMap, sync::Arc};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        HeaderValue, Method, Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
    response::Response,
};
use cafe_storefront::{
    middleware::session::SessionKeys,
    models::{Product, User},
    repository::{MemoryRepository, Repository},
    routes::create_router,
    seed::seed_demo,
    state::AppState,
};
use chrono::Duration;
use serde_json::Value;
use tower::ServiceExt;

/// Sends requests through the router and keeps cookies between them.
struct Browser {
    app: Router,
    cookies: HashMap<String, String>,
}

impl Browser {
    fn new(repo: MemoryRepository) -> Self {
        let state = AppState {
            repo: Arc::new(repo),
            session: SessionKeys::new("test-secret", Duration::hours(1), false),
        };
        Self {
            app: create_router().with_state(state),
            cookies: HashMap::new(),
        }
    }

    async fn send(&mut self, method: Method, uri: &str, form: Option<&str>) -> anyhow::Result<Response> {
        let mut builder = Request::builder().method(method).uri(uri);
        if !self.cookies.is_empty() {
            let header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(COOKIE, header);
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };

        let response = self.app.clone().oneshot(builder.body(body)?).await?;
        self.store_cookies(&response);
        Ok(response)
    }

    fn store_cookies(&mut self, response: &Response) {
        for header in response.headers().get_all(SET_COOKIE) {
            self.store_cookies_from(header);
        }
    }

    fn store_cookies_from(&mut self, header: &HeaderValue) {
        let Ok(raw) = header.to_str() else { return };
        let Some((name, rest)) = raw.split_once('=') else { return };
        let value = rest.split(';').next().unwrap_or_default();
        if raw.contains("Max-Age=0") {
            self.cookies.remove(name);
        } else {
            self.cookies.insert(name.to_string(), value.to_string());
        }
    }

    async fn get(&mut self, uri: &str) -> anyhow::Result<Response> {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&mut self, uri: &str, form: &str) -> anyhow::Result<Response> {
        self.send(Method::POST, uri, Some(form)).await
    }

    async fn json(&mut self, uri: &str) -> anyhow::Result<Value> {
        let response = self.get(uri).await?;
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        body_json(response).await
    }

    async fn login(&mut self, username: &str, password: &str) -> anyhow::Result<Response> {
        self.post("/login", &format!("username={username}&password={password}"))
            .await
    }
}

async fn body_json(response: Response) -> anyhow::Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
}

fn notices(body: &Value) -> Vec<String> {
    body["notices"]
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|n| n.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

async fn seeded() -> anyhow::Result<(MemoryRepository, Vec<Product>)> {
    let repo = MemoryRepository::new();
    seed_demo(&repo).await?;
    let products = repo.list_products().await?;
    Ok((repo, products))
}

#[tokio::test]
async fn protected_pages_redirect_to_login_without_session() -> anyhow::Result<()> {
    let (repo, products) = seeded().await?;
    let mut browser = Browser::new(repo);
    let detail = format!("/products/{}", products[0].id);
    let receipt = format!("/transactions/{}", uuid::Uuid::now_v7());

    for uri in [
        "/",
        detail.as_str(),
        "/checkout",
        "/transactions",
        receipt.as_str(),
    ] {
        let response = browser.get(uri).await?;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "GET {uri}");
        assert_eq!(location(&response), Some("/login"), "GET {uri}");
    }
    Ok(())
}

#[tokio::test]
async fn protected_writes_without_session_change_nothing() -> anyhow::Result<()> {
    let (repo, products) = seeded().await?;
    let alice = repo
        .find_user_by_username("alice")
        .await?
        .expect("seeded user");
    let mut browser = Browser::new(repo.clone());

    let add = browser
        .post(
            "/cart",
            &format!("product_id={}&quantity=2", products[0].id),
        )
        .await?;
    assert_eq!(add.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&add), Some("/login"));

    let checkout = browser.post("/checkout", "").await?;
    assert_eq!(checkout.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&checkout), Some("/login"));

    assert!(repo.list_cart_items(alice.id).await?.is_empty());
    assert!(repo.list_transactions(alice.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn invalid_login_shows_notice_once_and_sets_no_session() -> anyhow::Result<()> {
    let (repo, _) = seeded().await?;
    let mut browser = Browser::new(repo);

    let response = browser.login("alice", "wrong-password").await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    assert!(!browser.cookies.contains_key("session"));

    let form = browser.json("/login").await?;
    assert_eq!(notices(&form), vec!["Invalid login."]);

    let again = browser.json("/login").await?;
    assert!(notices(&again).is_empty());

    let catalog = browser.get("/").await?;
    assert_eq!(location(&catalog), Some("/login"));
    Ok(())
}

#[tokio::test]
async fn unknown_user_gets_the_same_notice() -> anyhow::Result<()> {
    let (repo, _) = seeded().await?;
    let mut browser = Browser::new(repo);

    let response = browser.login("mallory", "alice123").await?;
    assert_eq!(location(&response), Some("/login"));

    let form = browser.json("/login").await?;
    assert_eq!(notices(&form), vec!["Invalid login."]);
    Ok(())
}

#[tokio::test]
async fn shopping_flow_from_login_to_history() -> anyhow::Result<()> {
    let (repo, products) = seeded().await?;
    let espresso = products
        .iter()
        .find(|p| p.name == "Espresso")
        .expect("seeded product");
    let mut browser = Browser::new(repo);

    let login = browser.login("alice", "alice123").await?;
    assert_eq!(login.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&login), Some("/"));
    assert!(browser.cookies.contains_key("session"));

    let catalog = browser.json("/").await?;
    assert_eq!(catalog["data"]["username"], "alice");
    assert_eq!(
        catalog["data"]["products"].as_array().map(Vec::len),
        Some(products.len())
    );

    let detail = browser.json(&format!("/products/{}", espresso.id)).await?;
    assert_eq!(detail["data"]["name"], "Espresso");

    let add = browser
        .post("/cart", &format!("product_id={}&quantity=2", espresso.id))
        .await?;
    assert_eq!(add.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&add), Some("/"));

    let catalog = browser.json("/").await?;
    assert_eq!(notices(&catalog), vec!["Added 2 of Espresso to your cart"]);

    let cart = browser.json("/checkout").await?;
    let lines = cart["data"]["cart_items"].as_array().cloned().unwrap_or_default();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 2);
    assert_eq!(lines[0]["product"]["name"], "Espresso");

    let checkout = browser.post("/checkout", "").await?;
    assert_eq!(checkout.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&checkout), Some("/"));

    let catalog = browser.json("/").await?;
    assert_eq!(notices(&catalog), vec!["Thank you for your purchase!"]);

    let cart = browser.json("/checkout").await?;
    assert_eq!(cart["data"]["cart_items"].as_array().map(Vec::len), Some(0));

    let history = browser.json("/transactions").await?;
    let transactions = history["data"]["transactions"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["items"][0]["quantity"], 2);
    assert_eq!(
        transactions[0]["items"][0]["product_id"],
        espresso.id.to_string()
    );

    let id = transactions[0]["transaction"]["id"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let receipt = browser.json(&format!("/transactions/{id}")).await?;
    assert_eq!(receipt["data"]["transaction"]["id"], id);
    Ok(())
}

#[tokio::test]
async fn invalid_cart_input_is_a_client_error() -> anyhow::Result<()> {
    let (repo, products) = seeded().await?;
    let alice = repo
        .find_user_by_username("alice")
        .await?
        .expect("seeded user");
    let mut browser = Browser::new(repo.clone());
    browser.login("alice", "alice123").await?;

    for quantity in ["0", "-1", "abc"] {
        let response = browser
            .post(
                "/cart",
                &format!("product_id={}&quantity={quantity}", products[0].id),
            )
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "quantity {quantity}");
    }

    let unknown = browser
        .post(
            "/cart",
            &format!("product_id={}&quantity=1", uuid::Uuid::now_v7()),
        )
        .await?;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let missing = browser.get(&format!("/products/{}", uuid::Uuid::now_v7())).await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    assert!(repo.list_cart_items(alice.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn empty_cart_checkout_still_thanks_the_user() -> anyhow::Result<()> {
    let (repo, _) = seeded().await?;
    let mut browser = Browser::new(repo);
    browser.login("bob", "bob123").await?;

    let response = browser.post("/checkout", "").await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));

    let catalog = browser.json("/").await?;
    assert_eq!(notices(&catalog), vec!["Thank you for your purchase!"]);

    let history = browser.json("/transactions").await?;
    let transactions = history["data"]["transactions"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["items"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn unread_notices_accumulate() -> anyhow::Result<()> {
    let (repo, products) = seeded().await?;
    let mut browser = Browser::new(repo);
    browser.login("alice", "alice123").await?;

    for product in products.iter().take(2) {
        let response = browser
            .post("/cart", &format!("product_id={}&quantity=1", product.id))
            .await?;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let catalog = browser.json("/").await?;
    assert_eq!(
        notices(&catalog),
        vec![
            format!("Added 1 of {} to your cart", products[0].name),
            format!("Added 1 of {} to your cart", products[1].name),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn logout_ends_the_session() -> anyhow::Result<()> {
    let (repo, _) = seeded().await?;
    let mut browser = Browser::new(repo);
    browser.login("alice", "alice123").await?;
    assert_eq!(browser.get("/").await?.status(), StatusCode::OK);

    let response = browser.post("/logout", "").await?;
    assert_eq!(location(&response), Some("/login"));
    assert!(!browser.cookies.contains_key("session"));

    let catalog = browser.get("/").await?;
    assert_eq!(location(&catalog), Some("/login"));
    Ok(())
}

#[tokio::test]
async fn forged_session_cookie_is_rejected() -> anyhow::Result<()> {
    let (repo, _) = seeded().await?;
    let mut browser = Browser::new(repo);
    browser
        .cookies
        .insert("session".into(), "not-a-token".into());

    let response = browser.get("/").await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    Ok(())
}

#[tokio::test]
async fn signed_session_for_unknown_user_is_rejected() -> anyhow::Result<()> {
    let (repo, products) = seeded().await?;
    let ghost = User {
        id: uuid::Uuid::now_v7(),
        username: "alice".into(),
        password_hash: String::new(),
        created_at: chrono::Utc::now(),
    };
    let mut browser = Browser::new(repo.clone());
    let cookie =
        SessionKeys::new("test-secret", Duration::hours(1), false).session_cookie(&ghost)?;
    browser.store_cookies_from(&cookie);

    let catalog = browser.get("/").await?;
    assert_eq!(catalog.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&catalog), Some("/login"));

    let add = browser
        .post("/cart", &format!("product_id={}&quantity=2", products[0].id))
        .await?;
    assert_eq!(location(&add), Some("/login"));

    let checkout = browser.post("/checkout", "").await?;
    assert_eq!(location(&checkout), Some("/login"));

    assert!(repo.list_cart_items(ghost.id).await?.is_empty());
    assert!(repo.list_transactions(ghost.id).await?.is_empty());
    Ok(())
}
