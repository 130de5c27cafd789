//! WhatsApp Cloud API client.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use super::{ListSection, Messenger};
use crate::config::WhatsAppConfig;
use crate::error::{Error, Result};

pub struct WhatsAppMessenger {
    client: Client,
    messages_url: String,
    access_token: SecretString,
}

impl WhatsAppMessenger {
    pub fn new(config: &WhatsAppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build WhatsApp client: {e}")))?;

        Ok(Self {
            client,
            messages_url: format!(
                "{}/{}/messages",
                config.api_base_url.trim_end_matches('/'),
                config.phone_number_id
            ),
            access_token: config.access_token.clone(),
        })
    }

    async fn post(&self, payload: Value) -> Result<()> {
        let response = self
            .client
            .post(&self.messages_url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Messaging(format!("WhatsApp request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Messaging(format!(
                "WhatsApp API returned {status}: {}",
                crate::utils::safe_preview(&body, 200)
            )));
        }
        Ok(())
    }
}

fn envelope(recipient: &str, kind: &str, body: Value) -> Value {
    let mut payload = json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": recipient,
        "type": kind,
    });
    payload[kind] = body;
    payload
}

pub(crate) fn button_payload(recipient: &str, body: &str, buttons: &[String]) -> Value {
    let buttons: Vec<Value> = buttons
        .iter()
        .enumerate()
        .map(|(i, title)| json!({ "type": "reply", "reply": { "id": format!("btn_{i}"), "title": title } }))
        .collect();

    envelope(
        recipient,
        "interactive",
        json!({
            "type": "button",
            "body": { "text": body },
            "action": { "buttons": buttons },
        }),
    )
}

pub(crate) fn list_payload(
    recipient: &str,
    header: Option<&str>,
    body: &str,
    button_label: &str,
    sections: &[ListSection],
) -> Value {
    let sections: Vec<Value> = sections
        .iter()
        .map(|section| {
            let rows: Vec<Value> = section
                .rows
                .iter()
                .map(|row| {
                    let mut value = json!({ "id": row.id, "title": row.title });
                    if let Some(description) = &row.description {
                        value["description"] = json!(description);
                    }
                    value
                })
                .collect();
            json!({ "title": section.title, "rows": rows })
        })
        .collect();

    let mut interactive = json!({
        "type": "list",
        "body": { "text": body },
        "action": { "button": button_label, "sections": sections },
    });
    if let Some(header) = header {
        interactive["header"] = json!({ "type": "text", "text": header });
    }

    envelope(recipient, "interactive", interactive)
}

#[async_trait]
impl Messenger for WhatsAppMessenger {
    async fn send_text(&self, recipient: &str, body: &str) -> Result<()> {
        self.post(envelope(recipient, "text", json!({ "body": body })))
            .await
    }

    async fn send_buttons(&self, recipient: &str, body: &str, buttons: &[String]) -> Result<()> {
        self.post(button_payload(recipient, body, buttons)).await
    }

    async fn send_list(
        &self,
        recipient: &str,
        header: Option<&str>,
        body: &str,
        button_label: &str,
        sections: &[ListSection],
    ) -> Result<()> {
        self.post(list_payload(recipient, header, body, button_label, sections))
            .await
    }
}
