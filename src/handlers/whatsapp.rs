//! WhatsApp Cloud API webhook handlers
//!
//! The subscription handshake and inbound message deliveries. Deliveries are
//! acknowledged right away; the conversation work runs on spawned tasks.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::{
    error::{Error, Result},
    models::{InboundMessage, webhooks::WhatsAppWebhook},
    services::payments::signature,
    state::AppState,
};

const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Query parameters Meta sends when verifying a webhook subscription.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

// ============================================================================
// SUBSCRIPTION HANDSHAKE
// ============================================================================

/// GET /webhooks/whatsapp
///
/// Echoes `hub.challenge` when the mode is `subscribe` and the token matches
/// the configured verify token.
///
/// # HTTP Status Codes
/// - `200 OK`: Challenge echoed
/// - `403 FORBIDDEN`: Wrong mode or token, or no token configured
pub async fn verify_subscription(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let expected = state.config.whatsapp.verify_token.expose_secret();
    let token_matches = match params.verify_token.as_deref() {
        Some(token) if !expected.is_empty() => token.as_bytes().ct_eq(expected.as_bytes()).into(),
        _ => false,
    };

    if params.mode.as_deref() == Some("subscribe") && token_matches {
        tracing::info!("WhatsApp webhook subscription verified");
        (StatusCode::OK, params.challenge.unwrap_or_default()).into_response()
    } else {
        tracing::warn!(mode = ?params.mode, "WhatsApp webhook verification rejected");
        StatusCode::FORBIDDEN.into_response()
    }
}

// ============================================================================
// INBOUND MESSAGES
// ============================================================================

/// POST /webhooks/whatsapp
///
/// Verifies `X-Hub-Signature-256` when an app secret is configured, then
/// hands the delivery's messages to the conversation service. Each customer's
/// messages run on their own task, in delivery order.
///
/// # HTTP Status Codes
/// - `200 OK`: Delivery accepted
/// - `400 BAD_REQUEST`: Malformed payload
/// - `401 UNAUTHORIZED`: Missing or invalid signature
pub async fn receive_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    if state.config.whatsapp.requires_signature() {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| Error::Signature("Missing X-Hub-Signature-256".to_string()))?;
        signature::verify_sha256_header(
            state.config.whatsapp.app_secret.expose_secret().as_bytes(),
            &body,
            header,
        )?;
    }

    let delivery: WhatsAppWebhook = serde_json::from_slice(&body)?;
    let messages = delivery.into_messages();
    if messages.is_empty() {
        tracing::debug!("WhatsApp delivery without supported messages");
        return Ok(StatusCode::OK);
    }

    for (sender, batch) in by_sender(messages) {
        let conversation = state.conversation.clone();
        tokio::spawn(async move {
            for message in batch {
                // Failures are logged and answered inside the service
                if conversation.handle_inbound(message).await.is_err() {
                    tracing::debug!(identifier = %sender, "Inbound message not processed");
                }
            }
        });
    }

    Ok(StatusCode::OK)
}

/// Groups messages by sender, keeping each sender's order.
fn by_sender(messages: Vec<InboundMessage>) -> HashMap<String, Vec<InboundMessage>> {
    let mut grouped: HashMap<String, Vec<InboundMessage>> = HashMap::new();
    for message in messages {
        grouped
            .entry(message.sender.clone())
            .or_default()
            .push(message);
    }
    grouped
}
