//! Payment gateway capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::Result;
use crate::models::PaymentDetails;

/// What the gateway needs to open a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    pub reference: String,
    pub order_number: String,
    pub customer_identifier: String,
    pub customer_name: Option<String>,
    /// Minor units.
    pub total_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub pay_url: String,
    pub gateway_reference: String,
}

/// Normalised gateway verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayStatus {
    Success,
    Fail,
    Pending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub status: GatewayStatus,
    pub details: PaymentDetails,
    /// Raw gateway response, kept for logging.
    pub raw: serde_json::Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentLink>;

    /// Read-only status check. Safe to retry.
    async fn verify_payment(&self, reference: &str) -> Result<Verification>;

    /// Checks a webhook delivery's signature against the shared secret.
    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<()>;
}
