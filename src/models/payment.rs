use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use super::order::OrderLineItem;

/// Lifecycle of a checkout attempt awaiting gateway confirmation.
///
/// `pending` → `processing` (claimed for promotion) → `paid`, or
/// `pending` → `failed` / `cancelled` / `expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PendingPaymentStatus {
    Pending,
    Processing,
    Paid,
    Failed,
    Cancelled,
    Expired,
}

impl PendingPaymentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPayment {
    pub id: Uuid,
    /// Gateway transaction reference. Unique.
    pub reference: String,
    pub order_number: String,
    pub customer_identifier: String,
    pub customer_name: Option<String>,
    /// Cart snapshot taken at checkout, immune to later price changes.
    pub line_items: Vec<OrderLineItem>,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total_amount: i64,
    pub delivery_address: String,
    pub payment_url: Option<String>,
    pub status: PendingPaymentStatus,
    pub expires_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPendingPayment {
    pub reference: String,
    pub order_number: String,
    pub customer_identifier: String,
    pub customer_name: Option<String>,
    pub line_items: Vec<OrderLineItem>,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total_amount: i64,
    pub delivery_address: String,
    pub expires_at: DateTime<Utc>,
}

impl NewPendingPayment {
    pub fn into_pending_payment(self, now: DateTime<Utc>) -> PendingPayment {
        PendingPayment {
            id: Uuid::now_v7(),
            reference: self.reference,
            order_number: self.order_number,
            customer_identifier: self.customer_identifier,
            customer_name: self.customer_name,
            line_items: self.line_items,
            subtotal: self.subtotal,
            delivery_fee: self.delivery_fee,
            total_amount: self.total_amount,
            delivery_address: self.delivery_address,
            payment_url: None,
            status: PendingPaymentStatus::Pending,
            expires_at: self.expires_at,
            claimed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public view of a payment's state, returned by the status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusResponse {
    pub reference: String,
    pub status: PendingPaymentStatus,
    pub order_number: Option<String>,
}
