use crate::{
    config::Config,
    services::{ConversationService, OrderService, PaymentService},
};
use std::sync::Arc;

/// Application state shared across all HTTP handlers
///
/// Services are built once at startup and shared behind `Arc`; the state
/// itself is cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration (webhook secrets, verify token)
    pub config: Arc<Config>,
    /// Conversation core: inbound messages and payment settlement
    pub conversation: Arc<ConversationService>,
    /// Checkout, verification and promotion
    pub payments: Arc<PaymentService>,
    /// Order lookups and status updates
    pub orders: Arc<OrderService>,
}

impl AppState {
    /// Create a new AppState instance
    ///
    /// # Arguments
    /// * `config` - Loaded configuration
    /// * `conversation` - Conversation service
    /// * `payments` - Payment service (also held by the conversation service)
    /// * `orders` - Order service
    pub fn new(
        config: Config,
        conversation: Arc<ConversationService>,
        payments: Arc<PaymentService>,
        orders: Arc<OrderService>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            conversation,
            payments,
            orders,
        }
    }
}
