//! Router tests driven in-process with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use bazaar_api::{build_router, AppState, JwtManager};
use bazaar_core::{NewAddress, NewVariant, Role};
use bazaar_db::{Database, DbConfig};

const SECRET: &str = "test-secret";

struct TestApp {
    router: Router,
    db: Database,
    jwt: JwtManager,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let router = build_router(AppState::new(
            db.clone(),
            JwtManager::new(SECRET.to_string(), 3600),
        ));
        TestApp {
            router,
            db,
            jwt: JwtManager::new(SECRET.to_string(), 3600),
        }
    }

    fn token(&self, user_id: i64, role: Role) -> String {
        self.jwt.generate_access_token(user_id, role).unwrap()
    }

    async fn seed_variant(&self, sku: &str, price_cents: i64, stock: i64) -> (i64, i64) {
        let product = self.db.catalog().insert_product("Canvas Tote").await.unwrap();
        let variant = self
            .db
            .catalog()
            .insert_variant(&NewVariant {
                product_id: product.id,
                sku: sku.to_string(),
                attributes: Default::default(),
                price_cents,
                stock,
            })
            .await
            .unwrap();
        (product.id, variant.id)
    }

    async fn address_for(&self, user_id: i64) -> i64 {
        self.db
            .addresses()
            .insert(
                user_id,
                &NewAddress {
                    recipient: "Sam Lee".to_string(),
                    line1: "9 Harbor Rd".to_string(),
                    city: "Seattle".to_string(),
                    postal_code: "98101".to_string(),
                },
            )
            .await
            .unwrap()
            .id
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send("POST", "/api/orders/bill", None, Some(json!({"addressId": 1, "items": []})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app
        .send("GET", "/api/orders", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bill_then_order() {
    let app = TestApp::new().await;
    let (product_id, variant_id) = app.seed_variant("TOTE-NAT", 1000, 5).await;
    let address_id = app.address_for(1).await;
    let customer = app.token(1, Role::Customer);
    let admin = app.token(99, Role::Admin);

    // 20% off, min 5.00, capped at 1.50
    let (status, event) = app
        .send(
            "POST",
            "/api/admin/events",
            Some(&admin),
            Some(json!({
                "name": "Always On Sale",
                "startDate": "2000-01-01T00:00:00Z",
                "endDate": "2999-12-31T23:59:59Z",
                "status": "ACTIVE"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = event["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            "POST",
            &format!("/api/admin/events/{event_id}/discounts"),
            Some(&admin),
            Some(json!({
                "discountType": "PERCENTAGE",
                "value": 20,
                "minPurchaseAmount": 500,
                "maxDiscountAmount": 150
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .send(
            "PUT",
            &format!("/api/admin/events/{event_id}/products"),
            Some(&admin),
            Some(json!({ "productIds": [product_id] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let request = json!({
        "addressId": address_id,
        "items": [{ "variantId": variant_id, "quantity": 2 }]
    });

    let (status, bill) = app
        .send("POST", "/api/orders/bill", Some(&customer), Some(request.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bill["subtotal"], 2000);
    assert_eq!(bill["discountAmount"], 150);
    assert_eq!(bill["deliveryFee"], 500);
    assert_eq!(bill["totalAmount"], 2350);
    assert_eq!(bill["items"][0]["sku"], "TOTE-NAT");
    assert_eq!(bill["items"][0]["totalPrice"], 1850);

    let (status, order) = app
        .send("POST", "/api/orders", Some(&customer), Some(request))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["addressId"], address_id);
    assert_eq!(order["originalAmount"], 2000);
    assert_eq!(order["discountAmount"], 150);
    assert_eq!(order["totalAmount"], 2350);
    assert_eq!(order["orderItems"][0]["quantity"], 2);
    assert!(order["orderNumber"].as_str().unwrap().starts_with("ORD-"));

    let order_id = order["orderId"].as_i64().unwrap();
    let (status, listed) = app.send("GET", "/api/orders", Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["orderId"], order_id);

    // another customer cannot read it
    let stranger = app.token(2, Role::Customer);
    let (status, body) = app
        .send("GET", &format!("/api/orders/{order_id}"), Some(&stranger), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_insufficient_stock_reports_sku() {
    let app = TestApp::new().await;
    let (_, in_stock) = app.seed_variant("TOTE-NAT", 1000, 5).await;
    let (_, sold_out) = app.seed_variant("TOTE-BLK", 1000, 0).await;
    let address_id = app.address_for(1).await;
    let customer = app.token(1, Role::Customer);

    let (status, body) = app
        .send(
            "POST",
            "/api/orders",
            Some(&customer),
            Some(json!({
                "addressId": address_id,
                "items": [
                    { "variantId": in_stock, "quantity": 1 },
                    { "variantId": sold_out, "quantity": 1 }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    assert_eq!(body["shortfalls"][0]["sku"], "TOTE-BLK");
    assert_eq!(app.db.stock().available(in_stock).await.unwrap(), 5);
}

#[tokio::test]
async fn test_invalid_input_is_bad_request() {
    let app = TestApp::new().await;
    let address_id = app.address_for(1).await;
    let customer = app.token(1, Role::Customer);

    let (status, body) = app
        .send(
            "POST",
            "/api/orders/bill",
            Some(&customer),
            Some(json!({ "addressId": address_id, "items": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .send(
            "POST",
            "/api/orders/bill",
            Some(&customer),
            Some(json!({ "addressId": "home" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_variant_is_not_found() {
    let app = TestApp::new().await;
    let address_id = app.address_for(1).await;
    let customer = app.token(1, Role::Customer);

    let (status, body) = app
        .send(
            "POST",
            "/api/orders/bill",
            Some(&customer),
            Some(json!({
                "addressId": address_id,
                "items": [{ "variantId": 4040, "quantity": 1 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let app = TestApp::new().await;
    let (_, variant_id) = app.seed_variant("TOTE-NAT", 1000, 5).await;
    let customer = app.token(1, Role::Customer);
    let admin = app.token(99, Role::Admin);
    let uri = format!("/api/admin/variants/{variant_id}/stock");

    let (status, _) = app
        .send("POST", &uri, Some(&customer), Some(json!({ "quantity": 3 })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send("POST", &uri, Some(&admin), Some(json!({ "quantity": 3 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["previousStock"], 5);
    assert_eq!(body["newStock"], 8);

    let (status, body) = app
        .send("POST", &uri, Some(&admin), Some(json!({ "quantity": i64::MAX })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(app.db.stock().available(variant_id).await.unwrap(), 8);
}

#[tokio::test]
async fn test_admin_status_transitions() {
    let app = TestApp::new().await;
    let (_, variant_id) = app.seed_variant("TOTE-NAT", 1000, 5).await;
    let address_id = app.address_for(1).await;
    let customer = app.token(1, Role::Customer);
    let admin = app.token(99, Role::Admin);

    let (_, order) = app
        .send(
            "POST",
            "/api/orders",
            Some(&customer),
            Some(json!({
                "addressId": address_id,
                "items": [{ "variantId": variant_id, "quantity": 2 }]
            })),
        )
        .await;
    let uri = format!("/api/admin/orders/{}/status", order["orderId"]);

    let (status, body) = app
        .send("PATCH", &uri, Some(&admin), Some(json!({ "status": "CANCELLED" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED");
    assert_eq!(app.db.stock().available(variant_id).await.unwrap(), 5);

    let (status, body) = app
        .send("PATCH", &uri, Some(&admin), Some(json!({ "status": "SHIPPED" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");
}
