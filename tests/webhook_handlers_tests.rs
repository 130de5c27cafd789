//! HTTP surface: health, WhatsApp webhook, Paystack webhook/callback/status, orders.

mod common;

use common::{
    TestApp, TestAppOptions, body_of, new_customer, paystack_event, test_app::VERIFY_TOKEN,
};
use foodbot::models::{OrderStatus, PendingPaymentStatus};
use foodbot::repository::{OrderRepository, PaymentRepository};
use foodbot::services::payments::{GatewayStatus, signature};
use reqwest::StatusCode;
use serde_json::{Value, json};

const APP_SECRET: &str = "meta-app-secret";

fn whatsapp_text(customer: &str, name: &str, text: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "changes": [{
                "field": "messages",
                "value": {
                    "contacts": [{ "wa_id": customer, "profile": { "name": name } }],
                    "messages": [{
                        "from": customer,
                        "id": format!("wamid.{}", nanoid::nanoid!(8)),
                        "timestamp": "1760000000",
                        "type": "text",
                        "text": { "body": text }
                    }]
                }
            }]
        }]
    }))
    .unwrap()
}

async fn post_whatsapp(app: &TestApp, body: Vec<u8>, signature: Option<String>) -> reqwest::Response {
    let mut request = app
        .client
        .post(app.url("/webhooks/whatsapp"))
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        request = request.header("x-hub-signature-256", signature);
    }
    request.body(body).send().await.unwrap()
}

/// A paid order for a fresh customer, settled through the service.
async fn paid_order(app: &TestApp) -> (String, String) {
    let customer = new_customer();
    let reference = app.customer_awaiting_payment(&customer).await;
    let promotion = app
        .state
        .conversation
        .settle_payment(&reference, None)
        .await
        .unwrap();
    let order_number = promotion.order().unwrap().order_number.clone();
    app.messenger.clear().await;
    (customer, order_number)
}

// ============================================================================
// HEALTH
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let response = app.client.get(app.url("/api/v1/health")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["gateway"], "mock");
}

// ============================================================================
// WHATSAPP
// ============================================================================

#[tokio::test]
async fn test_whatsapp_verification_echoes_challenge() {
    let app = TestApp::new().await;

    let response = app
        .client
        .get(app.url("/webhooks/whatsapp"))
        .query(&[
            ("hub.mode", "subscribe"),
            ("hub.verify_token", VERIFY_TOKEN),
            ("hub.challenge", "1158201444"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "1158201444");
}

#[tokio::test]
async fn test_whatsapp_verification_rejects_wrong_token() {
    let app = TestApp::new().await;

    for (mode, token) in [("subscribe", "wrong-token"), ("unsubscribe", VERIFY_TOKEN)] {
        let response = app
            .client
            .get(app.url("/webhooks/whatsapp"))
            .query(&[
                ("hub.mode", mode),
                ("hub.verify_token", token),
                ("hub.challenge", "42"),
            ])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn test_whatsapp_message_gets_welcome() {
    let app = TestApp::new().await;
    let customer = new_customer();

    let response = post_whatsapp(&app, whatsapp_text(&customer, "Ada Obi", "hi"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let replies = app.wait_for_replies(&customer, 1).await;
    assert!(body_of(&replies[0]).contains("Hi Ada, welcome to FoodBot"));
}

#[tokio::test]
async fn test_whatsapp_delivery_without_messages_is_acknowledged() {
    let app = TestApp::new().await;
    let body = serde_json::to_vec(&json!({
        "object": "whatsapp_business_account",
        "entry": [{ "changes": [{ "field": "messages", "value": { "statuses": [] } }] }]
    }))
    .unwrap();

    let response = post_whatsapp(&app, body, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.session_count(), 0);
}

#[tokio::test]
async fn test_whatsapp_malformed_payload() {
    let app = TestApp::new().await;

    let response = post_whatsapp(&app, b"not json".to_vec(), None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_whatsapp_signature_required_when_secret_configured() {
    let app = TestApp::with_options(TestAppOptions {
        whatsapp_app_secret: Some(APP_SECRET.to_string()),
        ..Default::default()
    })
    .await;
    let customer = new_customer();
    let body = whatsapp_text(&customer, "Ada Obi", "hi");

    let missing = post_whatsapp(&app, body.clone(), None).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let forged = post_whatsapp(&app, body.clone(), Some(format!("sha256={}", "00".repeat(32)))).await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
    assert!(app.session(&customer).await.is_none());

    let valid = signature::sign_sha256(APP_SECRET.as_bytes(), &body).unwrap();
    let accepted = post_whatsapp(&app, body, Some(format!("sha256={valid}"))).await;
    assert_eq!(accepted.status(), StatusCode::OK);
    app.wait_for_replies(&customer, 1).await;
}

// ============================================================================
// PAYSTACK WEBHOOK
// ============================================================================

#[tokio::test]
async fn test_paystack_webhook_rejects_bad_signatures() {
    let app = TestApp::new().await;
    let customer = new_customer();
    let reference = app.customer_awaiting_payment(&customer).await;
    let body = paystack_event("charge.success", &reference);

    let forged = app.post_paystack_webhook(body.clone(), Some(&"ab".repeat(64))).await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

    let missing = app
        .client
        .post(app.url("/api/v1/payments/paystack/webhook"))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let payment = app.store.pending_payment(&reference).await.unwrap().unwrap();
    assert_eq!(payment.status, PendingPaymentStatus::Pending);
    assert_eq!(app.store.order_count(), 0);
}

#[tokio::test]
async fn test_paystack_charge_success_creates_order() {
    let app = TestApp::new().await;
    let customer = new_customer();
    let reference = app.customer_awaiting_payment(&customer).await;

    let response = app
        .post_paystack_webhook(paystack_event("charge.success", &reference), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let order = app
        .store
        .order_by_payment_reference(&reference)
        .await
        .unwrap()
        .expect("order should exist");
    assert_eq!(order.customer_identifier, customer);
    assert_eq!(order.total_amount, 500_000);
    let details = order.payment_details.unwrap();
    assert_eq!(details.transaction_id.as_deref(), Some("302961"));
    assert_eq!(details.card_brand.as_deref(), Some("visa"));
    assert_eq!(details.last4.as_deref(), Some("4081"));

    let session = app.session(&customer).await.unwrap();
    assert!(session.cart.is_empty());
    assert!(body_of(&app.last_reply(&customer).await).contains(&order.order_number));
}

#[tokio::test]
async fn test_paystack_duplicate_delivery_is_acknowledged_once() {
    let app = TestApp::new().await;
    let customer = new_customer();
    let reference = app.customer_awaiting_payment(&customer).await;
    app.messenger.clear().await;
    let body = paystack_event("charge.success", &reference);

    for _ in 0..3 {
        let response = app.post_paystack_webhook(body.clone(), None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(app.store.order_count(), 1);
    assert_eq!(app.sent_to(&customer).await.len(), 1);
}

#[tokio::test]
async fn test_paystack_webhook_after_customer_confirmed() {
    let app = TestApp::new().await;
    let customer = new_customer();
    let reference = app.customer_awaiting_payment(&customer).await;
    app.gateway.set_status(&reference, GatewayStatus::Success).await;
    app.press(&customer, "Confirm Payment").await;
    assert_eq!(app.store.order_count(), 1);

    let response = app
        .post_paystack_webhook(paystack_event("charge.success", &reference), None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.order_count(), 1);
}

#[tokio::test]
async fn test_paystack_charge_failed() {
    let app = TestApp::new().await;
    let customer = new_customer();
    let reference = app.customer_awaiting_payment(&customer).await;

    let response = app
        .post_paystack_webhook(paystack_event("charge.failed", &reference), None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payment = app.store.pending_payment(&reference).await.unwrap().unwrap();
    assert_eq!(payment.status, PendingPaymentStatus::Failed);
    assert_eq!(app.store.order_count(), 0);
}

#[tokio::test]
async fn test_paystack_unknown_event_and_reference_are_acknowledged() {
    let app = TestApp::new().await;
    let customer = new_customer();
    let reference = app.customer_awaiting_payment(&customer).await;

    let unknown_event = app
        .post_paystack_webhook(paystack_event("subscription.create", &reference), None)
        .await;
    assert_eq!(unknown_event.status(), StatusCode::OK);

    let unknown_reference = app
        .post_paystack_webhook(paystack_event("charge.success", "FB_not_ours"), None)
        .await;
    assert_eq!(unknown_reference.status(), StatusCode::OK);

    assert_eq!(app.store.order_count(), 0);
}

#[tokio::test]
async fn test_paystack_malformed_body_with_valid_signature() {
    let app = TestApp::new().await;

    let response = app.post_paystack_webhook(b"{\"event\":".to_vec(), None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// CALLBACK AND STATUS
// ============================================================================

#[tokio::test]
async fn test_payment_status_endpoint() {
    let app = TestApp::new().await;
    let customer = new_customer();
    let reference = app.customer_awaiting_payment(&customer).await;
    let url = app.url(&format!("/api/v1/payments/{reference}/status"));

    let pending: Value = app.client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(pending["status"], "pending");
    assert!(pending.get("order_number").is_none());

    app.gateway.set_status(&reference, GatewayStatus::Success).await;
    let paid: Value = app.client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(paid["status"], "paid");
    assert!(paid["order_number"].as_str().unwrap().starts_with("ORD"));
    assert_eq!(app.store.order_count(), 1);

    let missing = app
        .client
        .get(app.url("/api/v1/payments/FB_missing/status"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_payment_callback() {
    let app = TestApp::new().await;
    let customer = new_customer();
    let reference = app.customer_awaiting_payment(&customer).await;
    let callback = app.url("/api/v1/payments/paystack/callback");

    let no_reference = app.client.get(&callback).send().await.unwrap();
    assert_eq!(no_reference.status(), StatusCode::BAD_REQUEST);

    let pending = app
        .client
        .get(&callback)
        .query(&[("reference", reference.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(pending.status(), StatusCode::BAD_REQUEST);

    app.gateway.set_status(&reference, GatewayStatus::Success).await;
    let paid = app
        .client
        .get(&callback)
        .query(&[("trxref", reference.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(paid.status(), StatusCode::OK);
    assert_eq!(app.store.order_count(), 1);
}

#[tokio::test]
async fn test_payment_callback_gateway_down() {
    let app = TestApp::new().await;
    let customer = new_customer();
    let reference = app.customer_awaiting_payment(&customer).await;
    app.gateway.set_fail_verify(true);

    let response = app
        .client
        .get(app.url("/api/v1/payments/paystack/callback"))
        .query(&[("reference", reference.as_str())])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// ============================================================================
// ORDERS
// ============================================================================

#[tokio::test]
async fn test_get_order() {
    let app = TestApp::new().await;
    let (customer, order_number) = paid_order(&app).await;

    let response = app
        .client
        .get(app.url(&format!("/api/v1/orders/{order_number}")))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["order_number"], order_number.as_str());
    assert_eq!(body["customer_identifier"], customer.as_str());
    assert_eq!(body["status"], "confirmed");

    let missing = app
        .client
        .get(app.url("/api/v1/orders/FB000000NOPE"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_order_status_notifies_customer() {
    let app = TestApp::new().await;
    let (customer, order_number) = paid_order(&app).await;

    let response = app
        .client
        .patch(app.url(&format!("/api/v1/orders/{order_number}/status")))
        .json(&json!({ "status": "preparing" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "preparing");

    let notice = app.last_reply(&customer).await;
    assert!(body_of(&notice).contains(&order_number));
    assert!(body_of(&notice).contains("being prepared"));
    assert!(body_of(&notice).contains("30-45 mins"));

    let stored = app
        .store
        .order_by_number(&order_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Preparing);
}

#[tokio::test]
async fn test_update_status_of_final_order_is_rejected() {
    let app = TestApp::new().await;
    let (_, order_number) = paid_order(&app).await;
    let url = app.url(&format!("/api/v1/orders/{order_number}/status"));

    let delivered = app
        .client
        .patch(&url)
        .json(&json!({ "status": "delivered" }))
        .send()
        .await
        .unwrap();
    assert_eq!(delivered.status(), StatusCode::OK);

    let reopened = app
        .client
        .patch(&url)
        .json(&json!({ "status": "preparing" }))
        .send()
        .await
        .unwrap();
    assert_eq!(reopened.status(), StatusCode::BAD_REQUEST);

    let unknown = app
        .client
        .patch(app.url("/api/v1/orders/FB000000NOPE/status"))
        .json(&json!({ "status": "preparing" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}
