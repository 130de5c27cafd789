//! The conversation state machine.
//!
//! The machine is composed of:
//! - **Steps** ([`ConversationStep`]): where a customer is in the ordering flow
//! - **Events** ([`ConversationEvent`]): what an inbound message asks for
//! - **Transitions** ([`TransitionTable`]): `(step, event)` → [`Action`], as data
//! - **Machine** ([`StateMachine`]): runs the action's handler and logs the move
//!
//! # Step Diagram
//!
//! ```text
//!             menu / search                 food_<id>
//!  ┌─────────┐ ───────────> ┌─────────────────┐ ──────> ┌───────────────┐
//!  │ Initial │              │ ViewingOptions  │         │ AddingToCart  │
//!  └─────────┘ <─────────── └─────────────────┘         └───────────────┘
//!    ▲    ▲     no results          ▲   │ cat_<id>              │ 1..=10
//!    │    │                         └───┘                       ▼
//!    │    │  clear cart / continue shopping        ┌──────────────────┐
//!    │    └─────────────────────────────────────── │ CartManagement   │
//!    │                                              └──────────────────┘
//!    │                                          cancel ▲      │ checkout
//!    │                                                 │      ▼
//!    │        paid (order created)     address    ┌──────────┐
//!    │  ┌─────────────────┐ <──────────────────── │ Checkout │
//!    └──│ AwaitingPayment │                       └──────────┘
//!       └─────────────────┘
//!
//!   reset: any step → Initial (cart, selection and pending payment cleared)
//! ```
//!
//! There is no terminal step: a completed order or a reset returns to
//! `Initial`, and the loop starts over.
//!
//! # Example
//!
//! ```rust
//! use foodbot::models::ConversationStep;
//! use foodbot::services::conversation::state_machine::{
//!     Action, ConversationEvent, TransitionTable,
//! };
//!
//! let table = TransitionTable::new();
//! let event = ConversationEvent::from_text("reset", ConversationStep::Checkout);
//! assert_eq!(table.resolve(ConversationStep::Checkout, event.event_type()), Action::Reset);
//! ```
//!
//! [`ConversationStep`]: crate::models::ConversationStep

mod event;
mod machine;
mod transition;

pub use event::{ConversationEvent, EventKind, EventType};
pub use machine::StateMachine;
pub use transition::{Action, TransitionTable};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversationStep, InboundMessage, Selection};
    use uuid::Uuid;

    fn action_for(step: ConversationStep, message: &InboundMessage) -> Action {
        let table = TransitionTable::new();
        let event = ConversationEvent::from_inbound(message, step);
        table.resolve(step, event.event_type())
    }

    /// Walks the happy path through the table.
    #[test]
    fn test_ordering_flow_actions() {
        let customer = "2348000000001";
        assert_eq!(
            action_for(ConversationStep::Initial, &InboundMessage::text(customer, "jollof rice")),
            Action::SearchOrWelcome
        );
        assert_eq!(
            action_for(
                ConversationStep::ViewingOptions,
                &InboundMessage::selection(customer, Selection::Food(Uuid::now_v7()))
            ),
            Action::ShowFoodDetails
        );
        assert_eq!(
            action_for(ConversationStep::AddingToCart, &InboundMessage::text(customer, "3")),
            Action::AddQuantity
        );
        assert_eq!(
            action_for(
                ConversationStep::CartManagement,
                &InboundMessage::selection(customer, Selection::from_button_title("Checkout"))
            ),
            Action::InitiateCheckout
        );
        assert_eq!(
            action_for(
                ConversationStep::Checkout,
                &InboundMessage::text(customer, "12 Allen Avenue, Ikeja")
            ),
            Action::SubmitAddress
        );
        assert_eq!(
            action_for(
                ConversationStep::AwaitingPayment,
                &InboundMessage::selection(customer, Selection::from_button_title("Confirm Payment"))
            ),
            Action::ConfirmPayment
        );
    }

    #[test]
    fn test_cart_management_free_text_searches() {
        assert_eq!(
            action_for(
                ConversationStep::CartManagement,
                &InboundMessage::text("1", "fried plantain")
            ),
            Action::Search
        );
    }

    #[test]
    fn test_checkout_cancel_and_reset() {
        let cancel = InboundMessage::text("1", "cancel");
        let reset = InboundMessage::text("1", "reset");
        assert_eq!(action_for(ConversationStep::Checkout, &cancel), Action::CancelCheckout);
        assert_eq!(action_for(ConversationStep::Checkout, &reset), Action::Reset);
        assert_eq!(
            action_for(ConversationStep::AwaitingPayment, &reset),
            Action::Reset
        );
    }
}
