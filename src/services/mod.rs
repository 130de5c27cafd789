pub mod conversation;
pub mod messaging;
pub mod orders;
pub mod payments;

pub use conversation::ConversationService;
pub use orders::OrderService;
pub use payments::PaymentService;
