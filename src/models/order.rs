use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Delivered and cancelled orders accept no further status changes.
    pub fn is_final(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        !self.is_final() && self != target
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Paystack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderPaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Price-frozen line captured when a cart is turned into a payment or order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub food_id: Uuid,
    pub name: String,
    pub quantity: u32,
    /// Unit price in minor units at snapshot time.
    pub unit_price: i64,
}

impl OrderLineItem {
    pub fn line_total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

/// Gateway facts recorded on a paid order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub transaction_id: Option<String>,
    pub channel: Option<String>,
    pub card_brand: Option<String>,
    pub last4: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_identifier: String,
    pub customer_name: Option<String>,
    pub line_items: Vec<OrderLineItem>,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total_amount: i64,
    pub delivery_address: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    /// Present only for gateway-paid orders. Unique.
    pub payment_reference: Option<String>,
    pub payment_status: OrderPaymentStatus,
    pub payment_details: Option<PaymentDetails>,
    /// Checkout attempt that placed a cash order. Unique.
    pub checkout_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to insert an order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_number: String,
    pub customer_identifier: String,
    pub customer_name: Option<String>,
    pub line_items: Vec<OrderLineItem>,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total_amount: i64,
    pub delivery_address: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub payment_status: OrderPaymentStatus,
    pub payment_details: Option<PaymentDetails>,
    pub checkout_key: Option<String>,
}

impl NewOrder {
    pub fn into_order(self, now: DateTime<Utc>) -> Order {
        Order {
            id: Uuid::now_v7(),
            order_number: self.order_number,
            customer_identifier: self.customer_identifier,
            customer_name: self.customer_name,
            line_items: self.line_items,
            subtotal: self.subtotal,
            delivery_fee: self.delivery_fee,
            total_amount: self.total_amount,
            delivery_address: self.delivery_address,
            status: self.status,
            payment_method: self.payment_method,
            payment_reference: self.payment_reference,
            payment_status: self.payment_status,
            payment_details: self.payment_details,
            checkout_key: self.checkout_key,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of an order status update request.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(OrderStatus::OutForDelivery.to_string(), "out_for_delivery");
        assert_eq!(
            serde_json::to_string(&OrderStatus::OutForDelivery).unwrap(),
            "\"out_for_delivery\""
        );
    }

    #[test]
    fn test_final_statuses_are_locked() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Preparing));
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Ready));
    }

    #[test]
    fn test_line_total() {
        let line = OrderLineItem {
            food_id: Uuid::now_v7(),
            name: "Suya".to_string(),
            quantity: 3,
            unit_price: 120_000,
        };
        assert_eq!(line.line_total(), 360_000);
    }
}
