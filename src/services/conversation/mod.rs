//! The conversation core.
//!
//! [`ConversationService`] is the shell around the pure parts: it serializes
//! work per customer, loads the session, runs one event through the
//! [`StateMachine`], commits the session and only then delivers the replies.
//! Payment settlements from webhooks go through the same lock so they never
//! race the customer's own messages.

pub mod actions;
pub mod intent;
pub mod locks;
pub mod replies;
pub mod state_machine;

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::models::{InboundMessage, PaymentDetails, Session};
use crate::repository::{CatalogRepository, SessionRepository};
use crate::services::messaging::{Messenger, OutboundMessage, deliver_all};
use crate::services::orders::confirmation_message;
use crate::services::payments::{ConfirmOutcome, PaymentService, Promotion};

pub use actions::{ConversationSettings, Outcome, StepContext};
pub use locks::SessionLocks;
pub use state_machine::{Action, ConversationEvent, StateMachine};

pub struct ConversationService {
    sessions: Arc<dyn SessionRepository>,
    catalog: Arc<dyn CatalogRepository>,
    payments: Arc<PaymentService>,
    messenger: Arc<dyn Messenger>,
    settings: ConversationSettings,
    machine: StateMachine,
    locks: SessionLocks,
}

impl ConversationService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        catalog: Arc<dyn CatalogRepository>,
        payments: Arc<PaymentService>,
        messenger: Arc<dyn Messenger>,
        settings: ConversationSettings,
    ) -> Self {
        Self {
            sessions,
            catalog,
            payments,
            messenger,
            settings,
            machine: StateMachine::new(),
            locks: SessionLocks::new(),
        }
    }

    pub fn settings(&self) -> &ConversationSettings {
        &self.settings
    }

    /// Runs `work` while holding the customer's lock.
    async fn locked<T>(&self, identifier: &str, work: impl Future<Output = T>) -> T {
        let guard = self.locks.acquire(identifier).await;
        let output = work.await;
        self.locks.release(guard).await;
        output
    }

    /// Handles one inbound message end to end.
    ///
    /// The session is committed before any reply is sent; a failed send is
    /// logged and does not undo the transition. On failure the customer gets
    /// the generic retry message and the stored session is left untouched.
    pub async fn handle_inbound(&self, message: InboundMessage) -> Result<Session> {
        let recipient = message.sender.clone();
        self.locked(&recipient, async {
            match self.process(&message).await {
                Ok((session, replies)) => {
                    deliver_all(self.messenger.as_ref(), &recipient, &replies).await;
                    Ok(session)
                }
                Err(e) => {
                    tracing::error!(
                        identifier = %recipient,
                        error = %e,
                        "Failed to handle inbound message"
                    );
                    deliver_all(
                        self.messenger.as_ref(),
                        &recipient,
                        &[replies::generic_error()],
                    )
                    .await;
                    Err(e)
                }
            }
        })
        .await
    }

    async fn process(&self, message: &InboundMessage) -> Result<(Session, Vec<OutboundMessage>)> {
        let mut session = self.load_or_create(message).await?;
        session.touch(Utc::now());
        if message.display_name.is_some() {
            session.display_name = message.display_name.clone();
        }

        // The very first message only gets the welcome
        if session.is_first_contact {
            session.is_first_contact = false;
            let saved = self.sessions.save(&session).await?;
            let welcome = replies::welcome(saved.first_name());
            tracing::info!(identifier = %saved.identifier, "New customer welcomed");
            return Ok((saved, vec![welcome]));
        }

        let event = ConversationEvent::from_inbound(message, session.step);
        let ctx = StepContext {
            catalog: self.catalog.as_ref(),
            payments: self.payments.as_ref(),
            settings: &self.settings,
        };
        let Outcome { session, replies } = self.machine.handle_event(&ctx, session, &event).await?;

        let saved = self.sessions.save(&session).await?;
        Ok((saved, replies))
    }

    async fn load_or_create(&self, message: &InboundMessage) -> Result<Session> {
        if let Some(session) = self.sessions.find(&message.sender).await? {
            return Ok(session);
        }
        let session = Session::new(message.sender.clone(), message.display_name.clone());
        self.sessions.create(session).await
    }

    /// Settles a payment the gateway reported as successful.
    ///
    /// Promotion is idempotent; only the delivery that creates the order
    /// notifies the customer. A session still waiting on this reference goes
    /// back to `initial` with an empty cart.
    pub async fn settle_payment(
        &self,
        reference: &str,
        details: Option<PaymentDetails>,
    ) -> Result<Promotion> {
        let Some(payment) = self.payments.pending_payment(reference).await? else {
            tracing::warn!(reference = %reference, "Settlement for unknown payment");
            return Ok(Promotion::NotFound);
        };
        let customer = payment.customer_identifier;

        self.locked(&customer, async {
            let promotion = self.payments.promote(reference, details).await?;
            self.after_promotion(&customer, reference, &promotion).await;
            Ok(promotion)
        })
        .await
    }

    /// Verifies a payment with the gateway on behalf of a callback or status
    /// poll, settling it when the gateway says it succeeded.
    pub async fn verify_payment(&self, reference: &str) -> Result<ConfirmOutcome> {
        let Some(payment) = self.payments.pending_payment(reference).await? else {
            return Ok(ConfirmOutcome::Unknown);
        };
        let customer = payment.customer_identifier;

        self.locked(&customer, async {
            let outcome = self.payments.confirm(reference).await?;
            if let ConfirmOutcome::Paid(promotion) = &outcome {
                self.after_promotion(&customer, reference, promotion).await;
            }
            Ok(outcome)
        })
        .await
    }

    /// Must be called with the customer's lock held.
    async fn after_promotion(&self, customer: &str, reference: &str, promotion: &Promotion) {
        if !promotion.is_settled() {
            return;
        }
        if let Err(e) = self.finish_session(customer, reference).await {
            tracing::error!(
                identifier = %customer,
                reference = %reference,
                error = %e,
                "Failed to reset session after payment"
            );
        }
        if let Promotion::Created(order) = promotion {
            deliver_all(
                self.messenger.as_ref(),
                customer,
                &[confirmation_message(order)],
            )
            .await;
        }
    }

    async fn finish_session(&self, customer: &str, reference: &str) -> Result<()> {
        let Some(mut session) = self.sessions.find(customer).await? else {
            return Ok(());
        };
        if session.pending_payment_reference.as_deref() != Some(reference) {
            return Ok(());
        }
        session.complete_order();
        self.sessions.save(&session).await?;
        tracing::info!(
            identifier = %customer,
            reference = %reference,
            "Session returned to initial after payment"
        );
        Ok(())
    }

    /// Records a failed charge and tells the customer. The session stays in
    /// `awaiting_payment`; returns whether the payment changed.
    pub async fn payment_failed(&self, reference: &str) -> Result<bool> {
        let Some(payment) = self.payments.pending_payment(reference).await? else {
            tracing::warn!(reference = %reference, "Failure for unknown payment");
            return Ok(false);
        };
        let customer = payment.customer_identifier;

        self.locked(&customer, async {
            let changed = self.payments.record_failure(reference).await?;
            if changed {
                deliver_all(
                    self.messenger.as_ref(),
                    &customer,
                    &[replies::payment_failed_notice(&payment.order_number)],
                )
                .await;
            }
            Ok(changed)
        })
        .await
    }

    /// Tells the customer how a refund transfer went. No state changes.
    pub async fn refund_event(&self, reference: &str, succeeded: bool) -> Result<bool> {
        let Some(payment) = self.payments.pending_payment(reference).await? else {
            tracing::info!(
                reference = %reference,
                succeeded,
                "Refund transfer without a matching payment"
            );
            return Ok(false);
        };

        deliver_all(
            self.messenger.as_ref(),
            &payment.customer_identifier,
            &[replies::refund_notice(&payment.order_number, succeeded)],
        )
        .await;
        Ok(true)
    }
}
