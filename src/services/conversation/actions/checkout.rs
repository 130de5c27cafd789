//! Checkout: address collection and pending payment creation.

use super::{Outcome, StepContext, cart};
use crate::error::Result;
use crate::models::{ConversationStep, Session};
use crate::services::conversation::replies;
use crate::services::orders::confirmation_message;
use crate::services::payments::CheckoutOutcome;

/// Asks for a delivery address. An empty cart is refused and the step is
/// left as it was.
pub fn initiate_checkout(mut session: Session) -> Outcome {
    if session.cart.is_empty() {
        return Outcome::reply(session, replies::checkout_empty());
    }
    session.transition_to(ConversationStep::Checkout);
    Outcome::reply(session, replies::address_prompt())
}

/// Takes the delivery address and opens a payment (or places a cash order).
///
/// A too-short address re-prompts. A gateway failure keeps the session in
/// `checkout` so the customer can send the address again.
pub async fn submit_address(
    ctx: &StepContext<'_>,
    mut session: Session,
    text: &str,
) -> Result<Outcome> {
    let address = text.trim();
    if address.chars().count() < ctx.settings.min_address_length {
        return Ok(Outcome::reply(session, replies::address_too_short()));
    }

    let outcome = match ctx.payments.checkout(&session, address).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_gateway() => {
            tracing::warn!(
                identifier = %session.identifier,
                error = %e,
                "Payment gateway unavailable during checkout"
            );
            return Ok(Outcome::reply(session, replies::gateway_unavailable()));
        }
        Err(e) => return Err(e),
    };

    match outcome {
        CheckoutOutcome::AwaitingPayment { payment, pay_url } => {
            session.await_payment(payment.reference.clone());
            Ok(Outcome::reply(session, replies::payment_link(&payment, &pay_url)))
        }
        CheckoutOutcome::CashOrder(order) => {
            session.complete_order();
            Ok(Outcome::reply(session, confirmation_message(&order)))
        }
        CheckoutOutcome::EmptyCart => {
            session.transition_to(ConversationStep::Initial);
            Ok(Outcome::reply(session, replies::checkout_empty()))
        }
        CheckoutOutcome::Unavailable { food_ids, .. } => {
            tracing::info!(
                identifier = %session.identifier,
                unavailable = food_ids.len(),
                "Checkout stopped on unavailable items"
            );
            // show_cart drops the stale lines and tells the customer
            cart::show_cart(ctx, session).await
        }
    }
}

/// Leaves checkout with the cart intact.
pub fn cancel_checkout(mut session: Session) -> Outcome {
    session.transition_to(ConversationStep::CartManagement);
    Outcome::reply(session, replies::checkout_cancelled())
}
