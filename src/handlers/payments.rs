//! Payment gateway handlers
//!
//! Signed Paystack webhook events, the post-payment browser callback and a
//! status endpoint. Settlement always goes through the conversation service
//! so it is serialized with the customer's own messages.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    models::webhooks::PaystackEvent,
    services::payments::{ConfirmOutcome, Promotion},
    state::AppState,
};

const SIGNATURE_HEADER: &str = "x-paystack-signature";

// ============================================================================
// WEBHOOK
// ============================================================================

/// POST /api/v1/payments/paystack/webhook
///
/// Verifies the HMAC-SHA512 signature over the raw body before anything is
/// parsed or mutated. Every verified delivery is acknowledged with `200`,
/// including duplicates and events we do not act on.
///
/// # Events
/// - `charge.success`: promote the pending payment to an order (idempotent)
/// - `charge.failed`: mark a still-pending payment failed and notify
/// - `transfer.success` / `transfer.failed`: refund notification only
///
/// # HTTP Status Codes
/// - `200 OK`: Event processed (or ignored)
/// - `400 BAD_REQUEST`: Malformed payload
/// - `401 UNAUTHORIZED`: Missing or invalid signature
/// - `500 INTERNAL_SERVER_ERROR`: Storage failure; the gateway will retry
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| Error::Signature("Missing x-paystack-signature".to_string()))?;

    if let Err(e) = state
        .payments
        .gateway()
        .verify_webhook_signature(&body, signature)
    {
        tracing::warn!(error = %e, "Rejected payment webhook");
        return Err(e);
    }

    let event: PaystackEvent = serde_json::from_slice(&body)?;
    let reference = event.data.reference.as_str();
    tracing::info!(event = %event.event, reference = %reference, "Payment webhook received");

    match event.event.as_str() {
        "charge.success" => {
            let promotion = state
                .conversation
                .settle_payment(reference, Some(event.data.payment_details()))
                .await?;
            log_promotion(reference, &promotion);
        }
        "charge.failed" => {
            let changed = state.conversation.payment_failed(reference).await?;
            tracing::info!(reference = %reference, changed, "Charge failure processed");
        }
        "transfer.success" | "transfer.failed" => {
            let succeeded = event.event == "transfer.success";
            state.conversation.refund_event(reference, succeeded).await?;
        }
        other => {
            tracing::info!(event = %other, "Unhandled payment webhook event");
        }
    }

    Ok(Json(serde_json::json!({ "message": "Webhook processed" })))
}

fn log_promotion(reference: &str, promotion: &Promotion) {
    match promotion {
        Promotion::Created(order) => {
            tracing::info!(reference = %reference, order_number = %order.order_number, "Order created from webhook");
        }
        Promotion::AlreadyPromoted(_) => {
            tracing::info!(reference = %reference, "Duplicate charge.success ignored");
        }
        Promotion::InProgress => {
            tracing::info!(reference = %reference, "Promotion already in progress");
        }
        Promotion::Rejected(status) => {
            tracing::warn!(reference = %reference, status = %status, "Charge for a payment that cannot be promoted");
        }
        Promotion::NotFound => {
            tracing::warn!(reference = %reference, "Charge for unknown payment reference");
        }
    }
}

// ============================================================================
// CALLBACK AND STATUS
// ============================================================================

/// Query parameters on the gateway's redirect back to us.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub reference: Option<String>,
    pub trxref: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub reference: String,
    /// One of `paid`, `processing`, `pending`, `failed`, `expired`, `unknown`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
}

impl PaymentStatusResponse {
    fn from_outcome(reference: String, outcome: &ConfirmOutcome) -> Self {
        let (status, order_number) = match outcome {
            ConfirmOutcome::Paid(Promotion::InProgress) => ("processing", None),
            ConfirmOutcome::Paid(Promotion::Rejected(_)) => ("failed", None),
            ConfirmOutcome::Paid(Promotion::NotFound) => ("unknown", None),
            ConfirmOutcome::Paid(promotion) => (
                "paid",
                promotion.order().map(|order| order.order_number.clone()),
            ),
            ConfirmOutcome::Pending => ("pending", None),
            ConfirmOutcome::Failed => ("failed", None),
            ConfirmOutcome::Expired => ("expired", None),
            ConfirmOutcome::Unknown => ("unknown", None),
        };
        Self {
            reference,
            status,
            order_number,
        }
    }
}

/// GET /api/v1/payments/paystack/callback?reference=
///
/// Verifies the payment the customer was redirected back from. Success
/// promotes it exactly like the webhook would.
///
/// # HTTP Status Codes
/// - `200 OK`: Payment verified and settled
/// - `400 BAD_REQUEST`: Missing reference, or payment not successful
/// - `502 BAD_GATEWAY`: Gateway unavailable
pub async fn paystack_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Response> {
    let reference = params
        .reference
        .or(params.trxref)
        .filter(|reference| !reference.trim().is_empty())
        .ok_or_else(|| Error::Validation("Missing payment reference".to_string()))?;

    let outcome = state.conversation.verify_payment(&reference).await?;
    let body = PaymentStatusResponse::from_outcome(reference, &outcome);
    let status = if body.status == "paid" {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(body)).into_response())
}

/// GET /api/v1/payments/{reference}/status
///
/// Verifies and reports a payment's status. Success promotes it.
///
/// # HTTP Status Codes
/// - `200 OK`: Status reported
/// - `404 NOT_FOUND`: No such payment
/// - `502 BAD_GATEWAY`: Gateway unavailable
pub async fn payment_status(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<PaymentStatusResponse>> {
    let outcome = state.conversation.verify_payment(&reference).await?;
    if outcome == ConfirmOutcome::Unknown {
        return Err(Error::NotFound(format!("Payment {reference} not found")));
    }
    Ok(Json(PaymentStatusResponse::from_outcome(reference, &outcome)))
}
