//! Integration tests for the HTTP API.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use minipos_core::Product;
use minipos_db::{Database, DbConfig};
use minipos_sales::{SaleEngine, SalesConfig};
use minipos_server::{create_app, AppState};

async fn setup() -> (Router, Database) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    for (id, price, stock) in [("A", 2500, 10), ("B", 1000, 1)] {
        let now = Utc::now();
        db.products()
            .insert(&Product {
                id: id.to_string(),
                name: format!("Product {id}"),
                barcode: None,
                price_cents: price,
                stock_quantity: stock,
                min_stock: 0,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    let engine = SaleEngine::new(db.clone(), SalesConfig::default());
    (create_app(AppState::new(engine)), db)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn reference_sale() -> Value {
    json!({
        "items": [{ "product_id": "A", "quantity": 2, "unit_price": 2500 }],
        "discount_amount": 0,
        "tax_amount": 250,
        "payment_method": "cash"
    })
}

async fn stock_of(db: &Database, id: &str) -> i64 {
    db.products()
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup().await;

    let (status, body) = send(&app, empty_request("GET", "/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_health_check_after_close() {
    let (app, db) = setup().await;
    db.close().await;

    let (status, body) = send(&app, empty_request("GET", "/health")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");
}

#[tokio::test]
async fn test_create_sale() {
    let (app, db) = setup().await;

    let (status, body) = send(&app, json_request("POST", "/sales", reference_sale())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["final_amount"], 5250);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["payment_method"], "cash");
    assert_eq!(body["items"][0]["unit_price"], 2500);
    assert_eq!(body["items"][0]["total_price"], 5000);
    assert_eq!(stock_of(&db, "A").await, 8);

    // Round trip through GET
    let id = body["id"].as_str().unwrap();
    let (status, fetched) = send(&app, empty_request("GET", &format!("/sales/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["final_amount"], 5250);
    assert_eq!(fetched["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_insufficient_stock_is_conflict() {
    let (app, db) = setup().await;

    let request = json!({
        "items": [
            { "product_id": "A", "quantity": 3 },
            { "product_id": "B", "quantity": 2 }
        ],
        "payment_method": "card"
    });
    let (status, body) = send(&app, json_request("POST", "/sales", request)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    assert_eq!(body["product_id"], "B");
    assert_eq!(stock_of(&db, "A").await, 10);
}

#[tokio::test]
async fn test_validation_errors_are_bad_request() {
    let (app, _) = setup().await;

    let cases = [
        json!({ "items": [], "payment_method": "cash" }),
        json!({ "items": [{ "product_id": "A", "quantity": -1 }], "payment_method": "cash" }),
        json!({ "items": [{ "product_id": "A", "quantity": 1 }], "payment_method": "barter" }),
        json!({ "items": [{ "product_id": "A", "quantity": 1 }] }),
        json!({ "items": "not-a-list", "payment_method": "cash" }),
        json!({
            "items": [{ "product_id": "A", "quantity": 1 }],
            "tax_amount": i64::MAX,
            "payment_method": "cash"
        }),
    ];

    for case in cases {
        let (status, body) = send(&app, json_request("POST", "/sales", case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{case}");
        assert_eq!(body["code"], "VALIDATION_ERROR", "{case}");
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _) = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/sales")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let (app, _) = setup().await;

    let request = json!({
        "items": [{ "product_id": "ghost", "quantity": 1 }],
        "payment_method": "cash"
    });
    let (status, body) = send(&app, json_request("POST", "/sales", request)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_idempotency_key_replays_with_ok() {
    let (app, db) = setup().await;

    let request = || {
        Request::builder()
            .method("POST")
            .uri("/sales")
            .header("content-type", "application/json")
            .header("Idempotency-Key", "receipt-1")
            .header("X-Cashier-Id", "7")
            .body(Body::from(reference_sale().to_string()))
            .unwrap()
    };

    let (first_status, first) = send(&app, request()).await;
    let (second_status, second) = send(&app, request()).await;

    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["cashier_id"], "7");
    assert_eq!(stock_of(&db, "A").await, 8);
}

#[tokio::test]
async fn test_void_then_delete() {
    let (app, db) = setup().await;

    let (_, created) = send(&app, json_request("POST", "/sales", reference_sale())).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, voided) = send(&app, empty_request("POST", &format!("/sales/{id}/void"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(voided["status"], "refunded");
    assert_eq!(stock_of(&db, "A").await, 10);

    let (status, _) = send(&app, empty_request("POST", &format!("/sales/{id}/void"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, deleted) = send(&app, empty_request("DELETE", &format!("/sales/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["stock_restored"], false);
    assert_eq!(stock_of(&db, "A").await, 10);

    let (status, _) = send(&app, empty_request("DELETE", &format!("/sales/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_status() {
    let (app, _) = setup().await;

    let mut pending = reference_sale();
    pending["status"] = json!("pending");
    let (_, created) = send(&app, json_request("POST", "/sales", pending)).await;
    assert_eq!(created["status"], "pending");
    let uri = format!("/sales/{}/status", created["id"].as_str().unwrap());

    let (status, body) = send(&app, json_request("PATCH", &uri, json!({ "status": "completed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    let (status, body) = send(&app, json_request("PATCH", &uri, json!({ "status": "pending" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(&app, json_request("PATCH", &uri, json!({ "status": "lost" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        json_request("PATCH", "/sales/missing/status", json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_sales() {
    let (app, _) = setup().await;

    send(&app, json_request("POST", "/sales", reference_sale())).await;
    send(&app, json_request("POST", "/sales", reference_sale())).await;

    let (status, body) = send(&app, empty_request("GET", "/sales")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(&app, empty_request("GET", "/sales?start_date=2000-01-01&cashier_id=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(&app, empty_request("GET", "/sales?end_date=2000-01-01")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = send(&app, empty_request("GET", "/sales?start_date=yesterday")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_list_sales_by_status_method_and_page() {
    let (app, _) = setup().await;

    let mut pending = reference_sale();
    pending["status"] = json!("pending");
    let (_, pending) = send(&app, json_request("POST", "/sales", pending)).await;
    let mut card = reference_sale();
    card["payment_method"] = json!("card");
    let (_, card) = send(&app, json_request("POST", "/sales", card)).await;

    let (status, body) = send(&app, empty_request("GET", "/sales?status=pending")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], pending["id"]);

    let (status, body) = send(&app, empty_request("GET", "/sales?payment_method=card")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], card["id"]);

    let (status, body) = send(&app, empty_request("GET", "/sales?limit=1&offset=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    for bad in [
        "/sales?status=lost",
        "/sales?payment_method=barter",
        "/sales?limit=0",
        "/sales?limit=100000",
        "/sales?offset=-1",
        "/sales?limit=ten",
    ] {
        let (status, body) = send(&app, empty_request("GET", bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}");
        assert_eq!(body["code"], "VALIDATION_ERROR", "{bad}");
    }
}

#[tokio::test]
async fn test_get_unknown_sale() {
    let (app, _) = setup().await;

    let (status, body) = send(&app, empty_request("GET", "/sales/nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}
