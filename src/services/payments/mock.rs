//! Scripted in-process gateway for tests and local development.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use super::gateway::{GatewayStatus, PaymentGateway, PaymentLink, PaymentRequest, Verification};
use super::signature;
use crate::error::{Error, Result};
use crate::models::PaymentDetails;

pub struct MockGateway {
    secret: String,
    statuses: scc::HashMap<String, GatewayStatus>,
    fail_create: AtomicBool,
    fail_verify: AtomicBool,
    created: AtomicUsize,
    verified: AtomicUsize,
}

impl MockGateway {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            statuses: scc::HashMap::new(),
            fail_create: AtomicBool::new(false),
            fail_verify: AtomicBool::new(false),
            created: AtomicUsize::new(0),
            verified: AtomicUsize::new(0),
        }
    }

    /// Sets what `verify_payment` reports for `reference`. Unknown references report pending.
    pub async fn set_status(&self, reference: &str, status: GatewayStatus) {
        self.statuses.upsert_async(reference.to_string(), status).await;
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_verify(&self, fail: bool) {
        self.fail_verify.store(fail, Ordering::SeqCst);
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn verified_count(&self) -> usize {
        self.verified.load(Ordering::SeqCst)
    }

    /// Signs a payload the way the real gateway signs webhooks.
    pub fn sign(&self, payload: &[u8]) -> Result<String> {
        signature::sign_sha512(self.secret.as_bytes(), payload)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentLink> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Error::Gateway("mock gateway create failure".to_string()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentLink {
            pay_url: format!("https://checkout.mock.local/pay/{}", request.reference),
            gateway_reference: request.reference.clone(),
        })
    }

    async fn verify_payment(&self, reference: &str) -> Result<Verification> {
        if self.fail_verify.load(Ordering::SeqCst) {
            return Err(Error::Gateway("mock gateway verify failure".to_string()));
        }
        self.verified.fetch_add(1, Ordering::SeqCst);
        let status = self
            .statuses
            .read_async(reference, |_, status| *status)
            .await
            .unwrap_or(GatewayStatus::Pending);

        Ok(Verification {
            status,
            details: PaymentDetails {
                transaction_id: Some(format!("mock-{reference}")),
                channel: Some("card".to_string()),
                card_brand: Some("visa".to_string()),
                last4: Some("4081".to_string()),
                paid_at: (status == GatewayStatus::Success).then(Utc::now),
            },
            raw: serde_json::json!({ "reference": reference, "status": status.to_string() }),
        })
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature_hex: &str) -> Result<()> {
        signature::verify_sha512(self.secret.as_bytes(), payload, signature_hex)
    }
}
