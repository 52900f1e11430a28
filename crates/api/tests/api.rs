//! End-to-end tests driving the full router over an in-memory store.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use atelier_api::config::ApiConfig;
use atelier_api::state::AppState;
use atelier_api::store::{MemStore, Store};

fn app() -> Router {
    let store: Arc<dyn Store> = Arc::new(MemStore::new());
    atelier_api::router(AppState::new(ApiConfig::default(), store))
}

fn request(method: &str, path: &str, user: Option<(i64, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some((id, role)) = user {
        builder = builder
            .header("x-user-id", id.to_string())
            .header("x-user-role", role);
    }
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn product_input(sku: &str, base_price: i64, stock: i64) -> Value {
    json!({
        "name": format!("Product {sku}"),
        "base_price": base_price,
        "category_id": 1,
        "sku": sku,
        "variants": [
            { "color_id": 1, "size_id": 1, "stock": stock }
        ]
    })
}

fn address() -> Value {
    json!({
        "full_name": "Nguyen Van A",
        "phone": "0900000000",
        "address": "12 Hang Bac",
        "city": "Ha Noi",
        "district": "Hoan Kiem",
        "ward": "Hang Bac"
    })
}

/// Create a product as admin and return (`product_id`, `variant_id`).
async fn seed_product(app: &Router, sku: &str, base_price: i64, stock: i64) -> (i64, i64) {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/admin/products",
            Some((1, "admin")),
            Some(product_input(sku, base_price, stock)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "seed failed: {body}");
    let data = &body["data"];
    (
        data["id"].as_i64().unwrap(),
        data["variants"][0]["id"].as_i64().unwrap(),
    )
}

async fn checkout(app: &Router, user: i64, product: i64, variant: i64, quantity: u32) -> (StatusCode, Value) {
    send(
        app,
        request(
            "POST",
            "/api/orders/checkout",
            Some((user, "customer")),
            Some(json!({
                "lines": [
                    { "product_id": product, "variant_id": variant, "quantity": quantity }
                ],
                "shipping_address": address(),
                "payment_method": "COD"
            })),
        ),
    )
    .await
}

async fn variant_stock(app: &Router, product: i64) -> i64 {
    let (status, body) = send(
        app,
        request("GET", &format!("/api/products/{product}"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["variants"][0]["stock"].as_i64().unwrap()
}

#[tokio::test]
async fn health_endpoints() {
    let app = app();

    let (status, _) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, request("GET", "/health/ready", None, None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = app();
    let response = app
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn identity_is_required_for_cart_and_orders() {
    let app = app();

    let (status, body) = send(&app, request("GET", "/api/cart", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error_kind"], json!("UNAUTHORIZED"));

    let (status, _) = send(&app, request("GET", "/api/orders/my", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn product_crud_and_listing() {
    let app = app();

    // Customers cannot create products.
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/admin/products",
            Some((7, "customer")),
            Some(product_input("SKU-1", 100_000, 5)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_kind"], json!("FORBIDDEN"));

    let (id, _) = seed_product(&app, "SKU-1", 100_000, 5).await;
    seed_product(&app, "SKU-2", 200_000, 3).await;

    // Duplicate SKU conflicts.
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/admin/products",
            Some((1, "admin")),
            Some(product_input("SKU-1", 100_000, 5)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_kind"], json!("CONFLICT"));

    // Public listing is paged, newest first.
    let (status, body) = send(&app, request("GET", "/api/products?page=1&limit=1", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"][0]["sku"], json!("SKU-2"));
    assert_eq!(body["pagination"]["total"], json!(2));
    assert_eq!(body["pagination"]["total_pages"], json!(2));

    let (status, body) = send(&app, request("GET", &format!("/api/products/{id}"), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sku"], json!("SKU-1"));

    let (status, body) = send(&app, request("GET", "/api/products/999", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_kind"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn cart_flow_merges_updates_and_removes() {
    let app = app();
    let (product, variant) = seed_product(&app, "SKU-1", 150_000, 10).await;
    let user = Some((7, "customer"));
    let item = |q: u32| json!({ "product_id": product, "variant_id": variant, "quantity": q });

    let (status, body) = send(&app, request("POST", "/api/cart/items", user, Some(item(2)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lines"][0]["quantity"], json!(2));

    // Second add merges.
    let (_, body) = send(&app, request("POST", "/api/cart/items", user, Some(item(3)))).await;
    assert_eq!(body["data"]["lines"][0]["quantity"], json!(5));
    assert_eq!(body["data"]["total_amount"], json!(750_000));

    // Update is absolute.
    let (_, body) = send(&app, request("PUT", "/api/cart/items", user, Some(item(1)))).await;
    assert_eq!(body["data"]["lines"][0]["quantity"], json!(1));

    // Merged add beyond stock is rejected.
    let (status, body) = send(&app, request("POST", "/api/cart/items", user, Some(item(10)))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_kind"], json!("INSUFFICIENT_STOCK"));

    let (status, body) = send(
        &app,
        request(
            "DELETE",
            "/api/cart/items",
            user,
            Some(json!({ "product_id": product, "variant_id": variant })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lines"], json!([]));

    // Carts are per user.
    let (_, body) = send(&app, request("GET", "/api/cart", Some((8, "customer")), None)).await;
    assert_eq!(body["data"]["lines"], json!([]));
}

#[tokio::test]
async fn checkout_computes_totals_and_decrements_stock() {
    let app = app();
    let (product, variant) = seed_product(&app, "SKU-1", 120_000, 10).await;

    let (status, body) = checkout(&app, 7, product, variant, 2).await;
    assert_eq!(status, StatusCode::CREATED);
    let order = &body["data"];
    assert_eq!(order["items_subtotal"], json!(240_000));
    assert_eq!(order["shipping_fee"], json!(30_000));
    assert_eq!(order["tax_amount"], json!(24_000));
    assert_eq!(order["grand_total"], json!(294_000));
    assert_eq!(order["status"], json!("PENDING"));
    assert_eq!(order["payment_status"], json!("PENDING"));
    assert_eq!(order["lines"][0]["unit_price"]["source"], json!("product_base"));
    assert!(order["order_number"].as_str().unwrap().starts_with("ORD"));

    assert_eq!(variant_stock(&app, product).await, 8);
}

#[tokio::test]
async fn checkout_above_threshold_ships_free() {
    let app = app();
    let (product, variant) = seed_product(&app, "SKU-1", 500_001, 5).await;

    let (_, body) = checkout(&app, 7, product, variant, 1).await;
    assert_eq!(body["data"]["shipping_fee"], json!(0));
}

#[tokio::test]
async fn checkout_insufficient_stock_is_rejected() {
    let app = app();
    let (product, variant) = seed_product(&app, "SKU-1", 100_000, 1).await;

    let (status, body) = checkout(&app, 7, product, variant, 2).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_kind"], json!("INSUFFICIENT_STOCK"));
    assert_eq!(variant_stock(&app, product).await, 1);
}

#[tokio::test]
async fn order_visibility_and_ownership() {
    let app = app();
    let (product, variant) = seed_product(&app, "SKU-1", 100_000, 10).await;

    let (_, body) = checkout(&app, 7, product, variant, 1).await;
    let order_id = body["data"]["id"].as_i64().unwrap();

    // Owner sees it.
    let (status, body) = send(
        &app,
        request("GET", &format!("/api/orders/{order_id}"), Some((7, "customer")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(order_id));

    // A stranger does not.
    let (status, _) = send(
        &app,
        request("GET", &format!("/api/orders/{order_id}"), Some((8, "customer")), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An admin does.
    let (status, _) = send(
        &app,
        request("GET", &format!("/api/orders/{order_id}"), Some((1, "admin")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, request("GET", "/api/orders/my", Some((7, "customer")), None)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn cancel_restores_stock_and_repeats_conflict() {
    let app = app();
    let (product, variant) = seed_product(&app, "SKU-1", 100_000, 10).await;

    let (_, body) = checkout(&app, 7, product, variant, 4).await;
    let order_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(variant_stock(&app, product).await, 6);

    let cancel_path = format!("/api/orders/{order_id}/cancel");
    let (status, body) = send(&app, request("POST", &cancel_path, Some((7, "customer")), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("CANCELLED"));
    assert_eq!(variant_stock(&app, product).await, 10);

    // Cancelling again conflicts and restores nothing further.
    let (status, body) = send(&app, request("POST", &cancel_path, Some((7, "customer")), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_kind"], json!("CONFLICT"));
    assert_eq!(variant_stock(&app, product).await, 10);
}

#[tokio::test]
async fn pay_stamps_payment_once() {
    let app = app();
    let (product, variant) = seed_product(&app, "SKU-1", 100_000, 10).await;

    let (_, body) = checkout(&app, 7, product, variant, 1).await;
    let order_id = body["data"]["id"].as_i64().unwrap();
    let pay_path = format!("/api/orders/{order_id}/pay");

    let (status, body) = send(&app, request("PUT", &pay_path, Some((7, "customer")), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["payment_status"], json!("PAID"));
    assert!(body["data"]["paid_at"].is_string());

    let (status, _) = send(&app, request("PUT", &pay_path, Some((7, "customer")), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn admin_lifecycle_and_listing() {
    let app = app();
    let (product, variant) = seed_product(&app, "SKU-1", 100_000, 10).await;

    let (_, body) = checkout(&app, 7, product, variant, 1).await;
    let first = body["data"]["id"].as_i64().unwrap();
    let (_, body) = checkout(&app, 8, product, variant, 1).await;
    let second = body["data"]["id"].as_i64().unwrap();

    // Customers cannot touch the admin surface.
    let (status, _) = send(&app, request("GET", "/api/admin/orders", Some((7, "customer")), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Deliver the first order.
    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/api/admin/orders/{first}/status"),
            Some((1, "admin")),
            Some(json!({ "status": "DELIVERED" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("DELIVERED"));
    assert!(body["data"]["delivered_at"].is_string());

    // Admin-side cancel of the second order restores stock.
    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/api/admin/orders/{second}/status"),
            Some((1, "admin")),
            Some(json!({ "status": "CANCELLED" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("CANCELLED"));
    assert_eq!(variant_stock(&app, product).await, 9);

    // Filtered listing.
    let (status, body) = send(
        &app,
        request("GET", "/api/admin/orders?status=DELIVERED", Some((1, "admin")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], json!(first));
    assert_eq!(body["pagination"]["total"], json!(1));

    // Delivered orders cannot be cancelled by the customer.
    let (status, _) = send(
        &app,
        request("POST", &format!("/api/orders/{first}/cancel"), Some((7, "customer")), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn checkout_from_cart() {
    let app = app();
    let (product, variant) = seed_product(&app, "SKU-1", 100_000, 10).await;
    let user = Some((7, "customer"));

    send(
        &app,
        request(
            "POST",
            "/api/cart/items",
            user,
            Some(json!({ "product_id": product, "variant_id": variant, "quantity": 3 })),
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/orders/checkout",
            user,
            Some(json!({
                "from_cart": true,
                "shipping_address": address(),
                "payment_method": "BANK_TRANSFER"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["lines"][0]["quantity"], json!(3));
    assert_eq!(body["data"]["payment_method"], json!("BANK_TRANSFER"));

    // Checkout swept the cart.
    let (_, body) = send(&app, request("GET", "/api/cart", user, None)).await;
    assert_eq!(body["data"]["lines"], json!([]));
}
