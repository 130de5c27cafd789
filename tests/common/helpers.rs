//! Shared test helper functions

use foodbot::services::messaging::OutboundMessage;

const DIGITS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// A unique WhatsApp-style customer identifier, so tests never share sessions.
pub fn new_customer() -> String {
    format!("234{}", nanoid::nanoid!(10, &DIGITS))
}

pub fn body_of(message: &OutboundMessage) -> &str {
    message.body()
}

pub fn button_labels(message: &OutboundMessage) -> Vec<String> {
    message.button_labels().to_vec()
}

/// A Paystack webhook body for `event` on `reference`.
pub fn paystack_event(event: &str, reference: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "event": event,
        "data": {
            "id": 302961,
            "reference": reference,
            "status": if event == "charge.success" { "success" } else { "failed" },
            "amount": 500000,
            "channel": "card",
            "paid_at": "2026-01-01T12:00:00Z",
            "authorization": { "brand": "visa", "last4": "4081", "channel": "card" }
        }
    }))
    .expect("serializable event")
}
