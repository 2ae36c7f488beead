//! Integration tests for the API server.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use api::{AppState, Config, SharedGateway};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use checkout::{InMemoryPaymentGateway, SignatureVerifier};
use common::OrderId;
use domain::{Money, NewProduct, OrderStatus, Product};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::{InMemoryStore, Store};
use tempfile::TempDir;
use tower::ServiceExt;

const KEY_SECRET: &str = "rzp_test_secret";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: Router,
    state: Arc<AppState<InMemoryStore>>,
    gateway: InMemoryPaymentGateway,
    _uploads: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let upload_dir = uploads.path().to_string_lossy().to_string();
        let vars = HashMap::from([
            ("JWT_SECRET", "test-jwt-secret".to_string()),
            ("BCRYPT_COST", "4".to_string()),
            ("RAZORPAY_KEY_ID", "rzp_test_key".to_string()),
            ("RAZORPAY_KEY_SECRET", KEY_SECRET.to_string()),
            ("UPLOAD_DIR", upload_dir),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let gateway = InMemoryPaymentGateway::new();
        let shared: SharedGateway = Arc::new(gateway.clone());
        let state = Arc::new(AppState::from_config(InMemoryStore::new(), shared, &config).unwrap());
        let app = api::create_app(state.clone(), get_metrics_handle(), &config.cors_origin);

        Self {
            app,
            state,
            gateway,
            _uploads: uploads,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&body).to_string())
            })
        };
        (status, json)
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Registers and logs in a customer, returning (user id, token).
    async fn sign_up(&self, email: &str) -> (i64, String) {
        let (status, _) = self
            .call(
                "POST",
                "/api/register",
                None,
                Some(json!({"email": email, "name": "Asha", "password": "pw-123"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .call(
                "POST",
                "/api/login",
                None,
                Some(json!({"email": email, "password": "pw-123"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        (
            body["user"]["userId"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    async fn product(&self, title: &str, category: &str, paise: i64) -> Product {
        self.state
            .store
            .insert_product(NewProduct {
                image_url: format!("/images/{}.png", title.to_lowercase()),
                brand: "KraftKart".into(),
                title: title.into(),
                colour: None,
                discounted_price: Money::from_paise(paise),
                price: Money::from_paise(paise * 2),
                percentage_discount: 50,
                sizes: vec!["M".into(), "L".into()],
                stock: 10,
                top_level_category: category.into(),
                second_level_category: None,
                third_level_category: None,
                description: None,
                slug: title.to_lowercase(),
            })
            .await
            .unwrap()
    }

    async fn address(&self, user_id: i64, token: &str) -> i64 {
        let (status, body) = self
            .call(
                "POST",
                "/api/addresses",
                Some(token),
                Some(json!({
                    "userId": user_id,
                    "address_line1": "12 MG Road",
                    "city": "Pune",
                    "state": "MH",
                    "postal_code": "411001",
                    "country": "India",
                    "is_default": true
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["address"]["address_id"].as_i64().unwrap()
    }

    async fn add_to_cart(&self, user_id: i64, token: &str, product: &Product, qty: i64) -> Value {
        let (status, body) = self
            .call(
                "POST",
                "/api/cart",
                Some(token),
                Some(json!({
                    "userId": user_id,
                    "productId": product.id.get(),
                    "quantity": qty,
                    "size": "M"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

fn sign(order_id: &str, payment_id: &str) -> String {
    SignatureVerifier::new(KEY_SECRET)
        .unwrap()
        .sign(order_id, payment_id)
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_login_and_validate() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("Asha@Example.com").await;

    let (status, body) = app
        .call("GET", "/api/validate-token", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["userId"], user_id);
    assert_eq!(body["user"]["email"], "asha@example.com");
    assert_eq!(body["user"]["provider"], "manual");
    assert!(body["user"].get("password_hash").is_none());

    let (status, body) = app
        .call(
            "POST",
            "/api/register",
            None,
            Some(json!({"email": "asha@example.com", "name": "A", "password": "x"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already exists");

    let (status, body) = app
        .call(
            "POST",
            "/api/login",
            None,
            Some(json!({"email": "asha@example.com", "password": "wrong"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_register_requires_fields() {
    let app = TestApp::new();
    let (status, body) = app
        .call(
            "POST",
            "/api/register",
            None,
            Some(json!({"email": "a@example.com", "name": "A"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email, name, and password are required");
}

#[tokio::test]
async fn test_google_login_creates_then_reuses_account() {
    let app = TestApp::new();
    let profile = json!({"email": "g@example.com", "name": "Gita", "picture": "https://img/g.png"});

    let (status, first) = app
        .call("POST", "/api/google-login", None, Some(profile.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["user"]["provider"], "google");
    assert!(first["token"].is_string());

    let (_, second) = app
        .call("POST", "/api/google-login", None, Some(profile))
        .await;
    assert_eq!(second["user"]["userId"], first["user"]["userId"]);

    // Google accounts cannot sign in with a password
    let (status, _) = app
        .call(
            "POST",
            "/api/login",
            None,
            Some(json!({"email": "g@example.com", "password": "anything"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth_is_enforced() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("a@example.com").await;
    let (other_id, _) = app.sign_up("b@example.com").await;

    let (status, body) = app
        .call("GET", &format!("/api/cart/{user_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");

    let (status, body) = app
        .call("GET", &format!("/api/cart/{user_id}"), Some("forged.token.value"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");

    let (status, body) = app
        .call("GET", &format!("/api/orders/{other_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Unauthorized");

    let (status, _) = app
        .call(
            "PUT",
            &format!("/api/user/{other_id}"),
            Some(&token),
            Some(json!({"name": "Mallory", "email": "m@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("a@example.com").await;

    let (status, body) = app
        .call(
            "PUT",
            &format!("/api/user/{user_id}"),
            Some(&token),
            Some(json!({"name": "Asha R", "email": "asha.r@example.com", "phone_number": "99999"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User updated successfully");
    assert_eq!(body["user"]["name"], "Asha R");
    assert_eq!(body["user"]["phone_number"], "99999");

    let (status, body) = app
        .call(
            "PUT",
            &format!("/api/user/{user_id}"),
            Some(&token),
            Some(json!({"name": "Asha R"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Name and email are required");
}

#[tokio::test]
async fn test_products_listing() {
    let app = TestApp::new();
    let tee = app.product("Tee", "Tees", 49_900).await;
    app.product("Hoodie", "Hoodies", 129_900).await;
    app.product("Polo", "Tees", 59_900).await;

    let (status, body) = app.call("GET", "/api/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (_, body) = app
        .call(
            "GET",
            &format!("/api/products?category=tees&exclude={}", tee.id),
            None,
            None,
        )
        .await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Polo"]);

    let (status, body) = app
        .call("GET", &format!("/api/product/{}", tee.id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["discounted_price"], 499.0);
    assert_eq!(body["price"], 998.0);

    let (status, body) = app.call("GET", "/api/product/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
async fn test_cart_lifecycle() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("a@example.com").await;
    let (_, other_token) = app.sign_up("b@example.com").await;
    let tee = app.product("Tee", "Tees", 49_900).await;

    let first = app.add_to_cart(user_id, &token, &tee, 1).await;
    assert_eq!(first["message"], "Added to cart");
    let second = app.add_to_cart(user_id, &token, &tee, 2).await;
    assert_eq!(first["cartId"], second["cartId"]);
    let cart_id = first["cartId"].as_i64().unwrap();

    let (_, cart) = app
        .call("GET", &format!("/api/cart/{user_id}"), Some(&token), None)
        .await;
    assert_eq!(cart.as_array().unwrap().len(), 1);
    assert_eq!(cart[0]["quantity"], 3);
    assert_eq!(cart[0]["discounted_price"], 499.0);
    assert!(cart[0].get("discounted_price_paise").is_none());

    let (status, body) = app
        .call(
            "PUT",
            &format!("/api/cart/{cart_id}"),
            Some(&token),
            Some(json!({"quantity": 0})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid quantity");

    let (status, body) = app
        .call(
            "PUT",
            &format!("/api/cart/{cart_id}"),
            Some(&other_token),
            Some(json!({"quantity": 5})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Cart item not found or unauthorized");

    let (status, _) = app
        .call(
            "PUT",
            &format!("/api/cart/{cart_id}"),
            Some(&token),
            Some(json!({"quantity": 5})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call("DELETE", &format!("/api/cart/{cart_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item removed from cart");

    let (_, cart) = app
        .call("GET", &format!("/api/cart/{user_id}"), Some(&token), None)
        .await;
    assert!(cart.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cart_rejects_bad_input() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("a@example.com").await;
    let tee = app.product("Tee", "Tees", 49_900).await;

    let (status, body) = app
        .call(
            "POST",
            "/api/cart",
            Some(&token),
            Some(json!({"userId": user_id, "productId": tee.id.get()})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "userId, productId, and quantity are required");

    let (status, body) = app
        .call(
            "POST",
            "/api/cart",
            Some(&token),
            Some(json!({"userId": user_id, "productId": tee.id.get(), "quantity": -1})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "quantity must be a positive integer");

    let (status, _) = app
        .call(
            "POST",
            "/api/cart",
            Some(&token),
            Some(json!({"userId": user_id, "productId": "999", "quantity": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(
            "POST",
            "/api/cart",
            Some(&token),
            Some(json!({"userId": user_id + 1, "productId": tee.id.get(), "quantity": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_addresses() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("a@example.com").await;

    let (status, body) = app
        .call(
            "POST",
            "/api/addresses",
            Some(&token),
            Some(json!({"userId": user_id, "address_line1": "12 MG Road"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Required fields are missing");

    app.address(user_id, &token).await;
    let (status, body) = app
        .call("GET", &format!("/api/addresses/{user_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["city"], "Pune");
    assert_eq!(body[0]["is_default"], true);
}

#[tokio::test]
async fn test_checkout_places_order() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("a@example.com").await;
    let address_id = app.address(user_id, &token).await;
    let tee = app.product("Tee", "Tees", 49_900).await;
    let mug = app.product("Mug", "Mugs", 25_050).await;
    app.add_to_cart(user_id, &token, &tee, 2).await;
    app.add_to_cart(user_id, &token, &mug, 1).await;

    let (status, intent) = app
        .call(
            "POST",
            "/api/payment/orders",
            Some(&token),
            Some(json!({"userId": user_id, "addressId": address_id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{intent}");
    // rupees on the wire; the gateway order itself is in paise
    assert_eq!(intent["totalAmount"], 1248.5);
    assert_eq!(intent["items"][0]["price"], 499.0);
    assert_eq!(intent["items"][1]["price"], 250.5);
    assert_eq!(app.gateway.orders()[0].amount, Money::from_paise(124_850));
    assert_eq!(intent["currency"], "INR");
    assert_eq!(intent["addressId"], address_id);
    assert_eq!(intent["items"].as_array().unwrap().len(), 2);
    assert_eq!(app.gateway.order_count(), 1);

    let gateway_order_id = intent["orderId"].as_str().unwrap();
    let (status, body) = app
        .call(
            "POST",
            "/api/payment/verify",
            Some(&token),
            Some(json!({
                "razorpay_order_id": gateway_order_id,
                "razorpay_payment_id": "pay_29QQoUBi66xm2f",
                "razorpay_signature": sign(gateway_order_id, "pay_29QQoUBi66xm2f"),
                "userId": user_id,
                "addressId": address_id,
                "items": intent["items"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    let order_id = body["orderId"].as_i64().unwrap();

    let (_, cart) = app
        .call("GET", &format!("/api/cart/{user_id}"), Some(&token), None)
        .await;
    assert!(cart.as_array().unwrap().is_empty());

    let (status, orders) = app
        .call("GET", &format!("/api/orders/{user_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders[0]["order_id"], order_id);
    assert_eq!(orders[0]["status"], "placed");
    assert_eq!(orders[0]["total_amount"], 1248.5);
    assert!(orders[0].get("total_amount_paise").is_none());
    assert_eq!(orders[0]["address"]["city"], "Pune");
    assert_eq!(orders[0]["items"].as_array().unwrap().len(), 2);
    assert_eq!(orders[0]["items"][0]["price"], 499.0);
    assert_eq!(orders[0]["items"][1]["price"], 250.5);

    let (_, metrics) = app.call("GET", "/metrics", None, None).await;
    assert!(metrics.as_str().unwrap().contains("checkout_orders_placed_total"));
}

#[tokio::test]
async fn test_bad_signature_places_nothing() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("a@example.com").await;
    let address_id = app.address(user_id, &token).await;
    let tee = app.product("Tee", "Tees", 49_900).await;
    app.add_to_cart(user_id, &token, &tee, 1).await;

    let (_, intent) = app
        .call(
            "POST",
            "/api/payment/orders",
            Some(&token),
            Some(json!({"userId": user_id, "addressId": address_id})),
        )
        .await;

    let (status, body) = app
        .call(
            "POST",
            "/api/payment/verify",
            Some(&token),
            Some(json!({
                "razorpay_order_id": intent["orderId"],
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": sign("order_other", "pay_1"),
                "userId": user_id,
                "addressId": address_id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Payment verification failed");

    assert_eq!(app.state.store.order_count().await, 0);
    let (_, cart) = app
        .call("GET", &format!("/api/cart/{user_id}"), Some(&token), None)
        .await;
    assert_eq!(cart.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_placement_failure_is_server_error() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("a@example.com").await;
    let (other_id, other_token) = app.sign_up("b@example.com").await;
    let address_id = app.address(user_id, &token).await;
    let foreign_address = app.address(other_id, &other_token).await;
    let tee = app.product("Tee", "Tees", 49_900).await;
    app.add_to_cart(user_id, &token, &tee, 1).await;

    let (_, intent) = app
        .call(
            "POST",
            "/api/payment/orders",
            Some(&token),
            Some(json!({"userId": user_id, "addressId": address_id})),
        )
        .await;
    let gateway_order_id = intent["orderId"].as_str().unwrap();

    let (status, body) = app
        .call(
            "POST",
            "/api/payment/verify",
            Some(&token),
            Some(json!({
                "razorpay_order_id": gateway_order_id,
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": sign(gateway_order_id, "pay_1"),
                "userId": user_id,
                "addressId": foreign_address
            })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error processing payment");
    assert_eq!(body["error"], "Invalid address ID");
    assert_eq!(app.state.store.order_count().await, 0);
}

#[tokio::test]
async fn test_payment_order_needs_items() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("a@example.com").await;
    let address_id = app.address(user_id, &token).await;

    let (status, body) = app
        .call(
            "POST",
            "/api/payment/orders",
            Some(&token),
            Some(json!({"userId": user_id, "addressId": address_id})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cart is empty");
    assert_eq!(app.gateway.order_count(), 0);
}

#[tokio::test]
async fn test_gateway_failure() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("a@example.com").await;
    let address_id = app.address(user_id, &token).await;
    let tee = app.product("Tee", "Tees", 49_900).await;
    app.add_to_cart(user_id, &token, &tee, 1).await;
    app.gateway.set_fail_on_create(true);

    let (status, body) = app
        .call(
            "POST",
            "/api/payment/orders",
            Some(&token),
            Some(json!({"userId": user_id, "addressId": address_id})),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error creating payment order");
    assert!(body["error"].as_str().unwrap().contains("503"));
}

async fn place_order(app: &TestApp, user_id: i64, token: &str) -> i64 {
    let address_id = app.address(user_id, token).await;
    let tee = app.product("Tee", "Tees", 49_900).await;
    app.add_to_cart(user_id, token, &tee, 1).await;
    let (_, intent) = app
        .call(
            "POST",
            "/api/payment/orders",
            Some(token),
            Some(json!({"userId": user_id, "addressId": address_id})),
        )
        .await;
    let gateway_order_id = intent["orderId"].as_str().unwrap();
    let (_, body) = app
        .call(
            "POST",
            "/api/payment/verify",
            Some(token),
            Some(json!({
                "razorpay_order_id": gateway_order_id,
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": sign(gateway_order_id, "pay_1"),
                "userId": user_id,
                "addressId": address_id
            })),
        )
        .await;
    body["orderId"].as_i64().unwrap()
}

#[tokio::test]
async fn test_cancel_order() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("a@example.com").await;
    let (_, other_token) = app.sign_up("b@example.com").await;
    let order_id = place_order(&app, user_id, &token).await;
    let cancel_uri = format!("/api/orders/{order_id}/cancel");

    let (status, body) = app.call("PUT", &cancel_uri, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order not found or unauthorized");

    let (status, body) = app.call("PUT", &cancel_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order cancelled successfully");

    let (status, body) = app.call("PUT", &cancel_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Order is already cancelled");
}

#[tokio::test]
async fn test_delivered_order_cannot_be_cancelled() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("a@example.com").await;
    let order_id = place_order(&app, user_id, &token).await;
    app.state
        .store
        .force_order_status(OrderId::new(order_id), OrderStatus::Delivered)
        .await
        .unwrap();

    let (status, body) = app
        .call("PUT", &format!("/api/orders/{order_id}/cancel"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot cancel a delivered order");
}

fn multipart_body(boundary: &str, fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"fullDesign\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

fn upload_request(token: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/customized-products")
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "multipart/form-data; boundary=XBOUNDARY")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_customized_product_upload() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("a@example.com").await;
    let tee = app.product("Tee", "Tees", 49_900).await;
    let user = user_id.to_string();
    let product = tee.id.to_string();

    let body = multipart_body(
        "XBOUNDARY",
        &[
            ("userId", user.as_str()),
            ("productId", product.as_str()),
            ("customizationDetails", r##"{"text":"Hello","color":"#ff0000"}"##),
            ("price", "649"),
        ],
        Some(("front.png", &b"\x89PNG-fake"[..])),
    );
    let (status, created) = app.send(upload_request(&token, body)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["message"], "Customized product created");
    let custom_id = created["customId"].as_i64().unwrap();

    let (status, _) = app
        .call(
            "POST",
            "/api/cart",
            Some(&token),
            Some(json!({"userId": user_id, "productId": tee.id.get(), "quantity": 1, "customId": custom_id})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, cart) = app
        .call("GET", &format!("/api/cart/{user_id}"), Some(&token), None)
        .await;
    let details = &cart[0]["customization_details"];
    assert_eq!(details["text"], "Hello");
    let design_path = details["fullDesignPath"].as_str().unwrap();
    assert!(design_path.starts_with("/uploads/design-"));
    assert!(design_path.ends_with(".png"));

    let response = app
        .app
        .clone()
        .oneshot(Request::builder().uri(design_path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"\x89PNG-fake");
}

#[tokio::test]
async fn test_customized_product_requires_design() {
    let app = TestApp::new();
    let (user_id, token) = app.sign_up("a@example.com").await;
    let tee = app.product("Tee", "Tees", 49_900).await;
    let user = user_id.to_string();
    let product = tee.id.to_string();

    let body = multipart_body(
        "XBOUNDARY",
        &[
            ("userId", user.as_str()),
            ("productId", product.as_str()),
            ("customizationDetails", "{}"),
            ("price", "649"),
        ],
        None,
    );
    let (status, body) = app.send(upload_request(&token, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "productId, customizationDetails, price, and fullDesign are required"
    );

    let body = multipart_body(
        "XBOUNDARY",
        &[
            ("userId", user.as_str()),
            ("productId", product.as_str()),
            ("customizationDetails", "[1, 2]"),
            ("price", "649"),
        ],
        Some(("front.png", &b"png"[..])),
    );
    let (status, body) = app.send(upload_request(&token, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "customizationDetails must be a JSON object");
}
