//! Outbound messaging capability.
//!
//! The conversation core only ever talks to [`Messenger`]. Sends are bounded
//! network calls; callers treat a failed send as non-fatal once state has
//! been committed.

pub mod outbound;
pub mod recording;
pub mod whatsapp;

use async_trait::async_trait;

use crate::error::Result;

pub use outbound::{ListRow, ListSection, OutboundMessage};
pub use recording::RecordingMessenger;
pub use whatsapp::WhatsAppMessenger;

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, recipient: &str, body: &str) -> Result<()>;

    async fn send_buttons(&self, recipient: &str, body: &str, buttons: &[String]) -> Result<()>;

    async fn send_list(
        &self,
        recipient: &str,
        header: Option<&str>,
        body: &str,
        button_label: &str,
        sections: &[ListSection],
    ) -> Result<()>;

    /// Dispatches a prepared message to the matching operation.
    async fn send(&self, recipient: &str, message: &OutboundMessage) -> Result<()> {
        match message {
            OutboundMessage::Text { body } => self.send_text(recipient, body).await,
            OutboundMessage::Buttons { body, buttons } => {
                self.send_buttons(recipient, body, buttons).await
            }
            OutboundMessage::List {
                header,
                body,
                button_label,
                sections,
            } => {
                self.send_list(recipient, header.as_deref(), body, button_label, sections)
                    .await
            }
        }
    }
}

/// Sends every message in order, logging failures instead of returning them.
///
/// Returns the number of messages that were delivered.
pub async fn deliver_all(
    messenger: &dyn Messenger,
    recipient: &str,
    messages: &[OutboundMessage],
) -> usize {
    let mut delivered = 0;
    for message in messages {
        match messenger.send(recipient, message).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                tracing::warn!(
                    recipient = %recipient,
                    error = %e,
                    "Failed to deliver outbound message"
                );
            }
        }
    }
    delivered
}
