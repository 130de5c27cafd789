use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ListSection, Messenger, OutboundMessage};
use crate::error::{Error, Result};

/// Keeps every outbound message in memory and logs it.
///
/// Used by tests, and by the binary when no WhatsApp credentials are set.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<(String, OutboundMessage)>>,
    failing: AtomicBool,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent send fail, simulating a platform outage.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<(String, OutboundMessage)> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, recipient: &str) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(to, _)| to == recipient)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }

    async fn record(&self, recipient: &str, message: OutboundMessage) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Messaging("recording messenger set to fail".to_string()));
        }
        tracing::info!(
            recipient = %recipient,
            body = %crate::utils::safe_preview(message.body(), crate::utils::string::MAX_PREVIEW_LEN),
            "[Messenger] outbound message"
        );
        self.sent.lock().await.push((recipient.to_string(), message));
        Ok(())
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, recipient: &str, body: &str) -> Result<()> {
        self.record(
            recipient,
            OutboundMessage::Text {
                body: body.to_string(),
            },
        )
        .await
    }

    async fn send_buttons(&self, recipient: &str, body: &str, buttons: &[String]) -> Result<()> {
        self.record(
            recipient,
            OutboundMessage::Buttons {
                body: body.to_string(),
                buttons: buttons.to_vec(),
            },
        )
        .await
    }

    async fn send_list(
        &self,
        recipient: &str,
        header: Option<&str>,
        body: &str,
        button_label: &str,
        sections: &[ListSection],
    ) -> Result<()> {
        self.record(
            recipient,
            OutboundMessage::List {
                header: header.map(str::to_string),
                body: body.to_string(),
                button_label: button_label.to_string(),
                sections: sections.to_vec(),
            },
        )
        .await
    }
}
