//! Wire types for inbound webhooks (WhatsApp Cloud API and Paystack).

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use super::message::{InboundContent, InboundMessage, Selection};
use super::order::PaymentDetails;

// ============================================================================
// WhatsApp Cloud API
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppWebhook {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WhatsAppEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppEntry {
    #[serde(default)]
    pub changes: Vec<WhatsAppChange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppChange {
    #[serde(default)]
    pub field: String,
    pub value: WhatsAppValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppValue {
    #[serde(default)]
    pub contacts: Vec<WhatsAppContact>,
    #[serde(default)]
    pub messages: Vec<WhatsAppMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppContact {
    pub wa_id: String,
    pub profile: Option<WhatsAppProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppProfile {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppMessage {
    pub from: String,
    #[serde(default)]
    pub id: String,
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<WhatsAppText>,
    pub interactive: Option<WhatsAppInteractive>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppText {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppInteractive {
    #[serde(rename = "type")]
    pub kind: String,
    pub button_reply: Option<WhatsAppReply>,
    pub list_reply: Option<WhatsAppReply>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppReply {
    pub id: String,
    pub title: String,
}

impl WhatsAppMessage {
    /// Decodes the message body. Unsupported types (media, reactions) yield `None`.
    pub fn content(&self) -> Option<InboundContent> {
        match self.kind.as_str() {
            "text" => self
                .text
                .as_ref()
                .map(|text| InboundContent::Text(text.body.trim().to_string())),
            "interactive" => {
                let interactive = self.interactive.as_ref()?;
                match interactive.kind.as_str() {
                    "button_reply" => interactive
                        .button_reply
                        .as_ref()
                        .map(|reply| InboundContent::Selection(Selection::from_button_title(&reply.title))),
                    "list_reply" => interactive
                        .list_reply
                        .as_ref()
                        .map(|reply| InboundContent::Selection(Selection::from_row_id(&reply.id))),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn received_at(&self) -> DateTime<Utc> {
        self.timestamp
            .as_deref()
            .and_then(|ts| ts.parse::<i64>().ok())
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(Utc::now)
    }
}

impl WhatsAppWebhook {
    /// Flattens the delivery into normalised messages, skipping unsupported ones.
    pub fn into_messages(self) -> Vec<InboundMessage> {
        let mut messages = Vec::new();
        for change in self.entry.into_iter().flat_map(|entry| entry.changes) {
            let WhatsAppValue { contacts, messages: raw } = change.value;
            for message in raw {
                let Some(content) = message.content() else {
                    tracing::debug!(
                        message_id = %message.id,
                        kind = %message.kind,
                        "Skipping unsupported WhatsApp message type"
                    );
                    continue;
                };
                let display_name = contacts
                    .iter()
                    .find(|contact| contact.wa_id == message.from)
                    .and_then(|contact| contact.profile.as_ref())
                    .and_then(|profile| profile.name.clone());
                messages.push(InboundMessage {
                    received_at: message.received_at(),
                    sender: message.from,
                    display_name,
                    content,
                });
            }
        }
        messages
    }
}

// ============================================================================
// Paystack
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PaystackEvent {
    pub event: String,
    pub data: PaystackEventData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaystackEventData {
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub reference: String,
    pub status: Option<String>,
    pub amount: Option<i64>,
    pub channel: Option<String>,
    pub gateway_response: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub authorization: Option<PaystackAuthorization>,
    /// Present on transfer events.
    pub reason: Option<String>,
}

impl PaystackEventData {
    /// Transaction facts worth keeping on the order.
    pub fn payment_details(&self) -> PaymentDetails {
        let authorization = self.authorization.as_ref();
        PaymentDetails {
            transaction_id: self
                .id
                .as_ref()
                .map(|id| id.to_string().trim_matches('"').to_string()),
            channel: self
                .channel
                .clone()
                .or_else(|| authorization.and_then(|a| a.channel.clone())),
            card_brand: authorization.and_then(|a| a.brand.clone()),
            last4: authorization.and_then(|a| a.last4.clone()),
            paid_at: self.paid_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaystackAuthorization {
    pub brand: Option<String>,
    pub last4: Option<String>,
    pub channel: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn delivery(message: serde_json::Value) -> WhatsAppWebhook {
        serde_json::from_value(serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "1",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "contacts": [{ "wa_id": "2348000000001", "profile": { "name": "Ada Obi" } }],
                        "messages": [message]
                    }
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_text_message() {
        let messages = delivery(serde_json::json!({
            "from": "2348000000001", "id": "wamid.1", "timestamp": "1700000000",
            "type": "text", "text": { "body": " Jollof Rice " }
        }))
        .into_messages();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, "2348000000001");
        assert_eq!(messages[0].display_name.as_deref(), Some("Ada Obi"));
        assert_eq!(messages[0].content, InboundContent::Text("Jollof Rice".to_string()));
    }

    #[test]
    fn test_list_reply_decodes_selection() {
        let id = Uuid::now_v7();
        let messages = delivery(serde_json::json!({
            "from": "2348000000001", "id": "wamid.2", "type": "interactive",
            "interactive": { "type": "list_reply", "list_reply": { "id": format!("food_{id}"), "title": "Jollof" } }
        }))
        .into_messages();

        assert_eq!(
            messages[0].content,
            InboundContent::Selection(Selection::Food(id))
        );
    }

    #[test]
    fn test_button_reply_uses_title() {
        let messages = delivery(serde_json::json!({
            "from": "2348000000001", "id": "wamid.3", "type": "interactive",
            "interactive": { "type": "button_reply", "button_reply": { "id": "btn_1", "title": "View Cart" } }
        }))
        .into_messages();

        assert_eq!(
            messages[0].content,
            InboundContent::Selection(Selection::Reply("view cart".to_string()))
        );
    }

    #[test]
    fn test_unsupported_type_is_skipped() {
        let messages = delivery(serde_json::json!({
            "from": "2348000000001", "id": "wamid.4", "type": "image", "image": { "id": "media" }
        }))
        .into_messages();
        assert!(messages.is_empty());
    }

    #[test]
    fn test_paystack_event_parses() {
        let event: PaystackEvent = serde_json::from_value(serde_json::json!({
            "event": "charge.success",
            "data": {
                "id": 302961,
                "reference": "FB_abc",
                "status": "success",
                "amount": 500000,
                "channel": "card",
                "authorization": { "brand": "visa", "last4": "4081" }
            }
        }))
        .unwrap();
        assert_eq!(event.event, "charge.success");
        assert_eq!(event.data.reference, "FB_abc");

        let details = event.data.payment_details();
        assert_eq!(details.transaction_id.as_deref(), Some("302961"));
        assert_eq!(details.card_brand.as_deref(), Some("visa"));
        assert_eq!(details.last4.as_deref(), Some("4081"));
    }
}
