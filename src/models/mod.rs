pub mod cart;
pub mod catalog;
pub mod message;
pub mod order;
pub mod payment;
pub mod session;
pub mod webhooks;

pub use cart::{Cart, CartError, CartLimits, CartLine};
pub use catalog::{Category, FoodItem, Restaurant};
pub use message::{InboundContent, InboundMessage, Selection};
pub use order::{
    NewOrder, Order, OrderLineItem, OrderPaymentStatus, OrderStatus, PaymentDetails, PaymentMethod,
};
pub use payment::{NewPendingPayment, PendingPayment, PendingPaymentStatus};
pub use session::{ConversationStep, Session};
