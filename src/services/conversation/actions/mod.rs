//! Step handlers, one async function per [`Action`](super::state_machine::Action).
//!
//! A handler takes the session by value, applies its step's rules through the
//! session's own mutators (so the step-scoped invariants hold) and returns the
//! updated session with the replies to send. Handlers never persist or send
//! anything themselves; the service commits the session first and delivers
//! the replies after.

pub mod browse;
pub mod cart;
pub mod checkout;
pub mod general;
pub mod payment;

use crate::config::ConversationConfig;
use crate::models::{CartLimits, Session};
use crate::repository::CatalogRepository;
use crate::services::messaging::OutboundMessage;
use crate::services::payments::PaymentService;

/// Conversation tunables.
#[derive(Debug, Clone)]
pub struct ConversationSettings {
    pub cart_limits: CartLimits,
    pub min_address_length: usize,
    pub search_result_limit: usize,
    /// Shown in cart totals; charged at checkout.
    pub delivery_fee: i64,
}

impl ConversationSettings {
    pub fn from_config(config: &ConversationConfig) -> Self {
        Self {
            cart_limits: CartLimits {
                max_per_add: config.max_quantity_per_add,
                max_per_line: config.max_line_quantity,
            },
            min_address_length: config.min_address_length,
            search_result_limit: config.search_result_limit,
            delivery_fee: config.delivery_fee,
        }
    }
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self::from_config(&crate::config::Config::default().conversation)
    }
}

/// What step handlers may read and call.
pub struct StepContext<'a> {
    pub catalog: &'a dyn CatalogRepository,
    pub payments: &'a PaymentService,
    pub settings: &'a ConversationSettings,
}

/// The result of one handler run.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub session: Session,
    pub replies: Vec<OutboundMessage>,
}

impl Outcome {
    pub fn new(session: Session, replies: Vec<OutboundMessage>) -> Self {
        Self { session, replies }
    }

    pub fn reply(session: Session, reply: OutboundMessage) -> Self {
        Self::new(session, vec![reply])
    }

    /// Puts `reply` before the existing replies.
    pub fn preceded_by(mut self, reply: OutboundMessage) -> Self {
        self.replies.insert(0, reply);
        self
    }
}
