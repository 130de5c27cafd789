//! The `awaiting_payment` step.

use super::{Outcome, StepContext};
use crate::error::Result;
use crate::models::{ConversationStep, Session};
use crate::services::conversation::replies;
use crate::services::orders::confirmation_message;
use crate::services::payments::{ConfirmOutcome, Promotion};

/// Customer-initiated check of the pending payment.
///
/// Success completes the order and returns to `initial`. Anything short of
/// success leaves the session waiting so the customer can retry.
pub async fn confirm_payment(ctx: &StepContext<'_>, mut session: Session) -> Result<Outcome> {
    let Some(reference) = session.pending_payment_reference.clone() else {
        session.transition_to(ConversationStep::CartManagement);
        return Ok(Outcome::reply(session, replies::payment_not_found()));
    };

    let outcome = match ctx.payments.confirm(&reference).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_gateway() => {
            tracing::warn!(
                identifier = %session.identifier,
                reference = %reference,
                error = %e,
                "Payment verification unavailable"
            );
            return Ok(Outcome::reply(session, replies::gateway_unavailable()));
        }
        Err(e) => return Err(e),
    };

    match outcome {
        ConfirmOutcome::Paid(promotion) => Ok(settled(session, &promotion)),
        ConfirmOutcome::Pending => Ok(Outcome::reply(session, replies::payment_pending())),
        ConfirmOutcome::Failed => Ok(Outcome::reply(session, replies::payment_failed())),
        ConfirmOutcome::Expired => {
            session.transition_to(ConversationStep::CartManagement);
            Ok(Outcome::reply(session, replies::payment_expired()))
        }
        ConfirmOutcome::Unknown => {
            session.transition_to(ConversationStep::CartManagement);
            Ok(Outcome::reply(session, replies::payment_not_found()))
        }
    }
}

fn settled(mut session: Session, promotion: &Promotion) -> Outcome {
    match promotion {
        Promotion::Created(order) | Promotion::AlreadyPromoted(Some(order)) => {
            session.complete_order();
            Outcome::reply(session, confirmation_message(order))
        }
        Promotion::AlreadyPromoted(None) => {
            session.complete_order();
            Outcome::reply(session, replies::payment_confirmed())
        }
        Promotion::InProgress => Outcome::reply(session, replies::payment_processing()),
        Promotion::Rejected(_) => Outcome::reply(session, replies::payment_failed()),
        Promotion::NotFound => {
            session.transition_to(ConversationStep::CartManagement);
            Outcome::reply(session, replies::payment_not_found())
        }
    }
}

/// Goes back to the cart. The pending payment is left to expire so a late
/// gateway success still produces the order.
pub fn abandon_payment(mut session: Session) -> Outcome {
    if let Some(reference) = &session.pending_payment_reference {
        tracing::info!(
            identifier = %session.identifier,
            reference = %reference,
            "Customer abandoned payment"
        );
    }
    session.transition_to(ConversationStep::CartManagement);
    Outcome::reply(session, replies::payment_abandoned())
}

/// Re-explains how to pay and confirm, with the payment link when known.
pub async fn explain_payment(ctx: &StepContext<'_>, session: Session) -> Result<Outcome> {
    let pay_url = match &session.pending_payment_reference {
        Some(reference) => ctx
            .payments
            .pending_payment(reference)
            .await?
            .and_then(|payment| payment.payment_url),
        None => None,
    };
    Ok(Outcome::reply(
        session,
        replies::payment_instructions(pay_url.as_deref()),
    ))
}
