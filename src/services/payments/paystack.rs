//! Paystack REST client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use super::gateway::{GatewayStatus, PaymentGateway, PaymentLink, PaymentRequest, Verification};
use super::signature;
use crate::config::PaystackConfig;
use crate::error::{Error, Result};
use crate::models::PaymentDetails;

pub struct PaystackGateway {
    client: Client,
    base_url: String,
    secret_key: SecretString,
    callback_url: String,
    currency: String,
    email_domain: String,
}

/// Paystack wraps every response in `{status, message, data}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    id: Option<serde_json::Value>,
    status: String,
    channel: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    authorization: Option<AuthorizationData>,
}

#[derive(Debug, Deserialize)]
struct AuthorizationData {
    brand: Option<String>,
    last4: Option<String>,
}

impl PaystackGateway {
    pub fn new(config: &PaystackConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build Paystack client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            callback_url: config.callback_url.clone(),
            currency: config.currency.clone(),
            email_domain: config.customer_email_domain.clone(),
        })
    }

    /// Paystack requires an email; derive a stable one from the phone digits.
    fn customer_email(&self, identifier: &str) -> String {
        let digits: String = identifier.chars().filter(char::is_ascii_digit).collect();
        format!("{digits}@{}", self.email_domain)
    }
}

/// Maps Paystack's transaction status onto the normalised verdict.
pub fn map_status(status: &str) -> GatewayStatus {
    match status {
        "success" => GatewayStatus::Success,
        "failed" | "abandoned" | "reversed" => GatewayStatus::Fail,
        _ => GatewayStatus::Pending,
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    fn name(&self) -> &'static str {
        "paystack"
    }

    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentLink> {
        let body = json!({
            "email": self.customer_email(&request.customer_identifier),
            "amount": request.total_amount,
            "currency": self.currency,
            "reference": request.reference,
            "callback_url": self.callback_url,
            "metadata": {
                "order_number": request.order_number,
                "customer_identifier": request.customer_identifier,
                "customer_name": request.customer_name,
            },
        });

        let envelope: Envelope<InitializeData> = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Gateway(format!("Paystack initialize failed: {e}")))?
            .json()
            .await
            .map_err(|e| Error::Gateway(format!("Paystack initialize returned bad JSON: {e}")))?;

        match envelope.data {
            Some(data) if envelope.status => Ok(PaymentLink {
                pay_url: data.authorization_url,
                gateway_reference: data.reference,
            }),
            _ => Err(Error::Gateway(format!(
                "Paystack initialize rejected: {}",
                envelope.message
            ))),
        }
    }

    async fn verify_payment(&self, reference: &str) -> Result<Verification> {
        let raw: serde_json::Value = self
            .client
            .get(format!("{}/transaction/verify/{}", self.base_url, reference))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| Error::Gateway(format!("Paystack verify failed: {e}")))?
            .json()
            .await
            .map_err(|e| Error::Gateway(format!("Paystack verify returned bad JSON: {e}")))?;

        let envelope: Envelope<VerifyData> = serde_json::from_value(raw.clone())
            .map_err(|e| Error::Gateway(format!("Unexpected Paystack verify payload: {e}")))?;

        let Some(data) = envelope.data.filter(|_| envelope.status) else {
            return Err(Error::Gateway(format!(
                "Paystack verify rejected: {}",
                envelope.message
            )));
        };

        let authorization = data.authorization;
        Ok(Verification {
            status: map_status(&data.status),
            details: PaymentDetails {
                transaction_id: data.id.map(|id| id.to_string().trim_matches('"').to_string()),
                channel: data.channel,
                card_brand: authorization.as_ref().and_then(|a| a.brand.clone()),
                last4: authorization.as_ref().and_then(|a| a.last4.clone()),
                paid_at: data.paid_at,
            },
            raw,
        })
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature_hex: &str) -> Result<()> {
        signature::verify_sha512(
            self.secret_key.expose_secret().as_bytes(),
            payload,
            signature_hex,
        )
    }
}
