//! Dispatches resolved actions to their step handlers.

use super::event::{ConversationEvent, EventKind};
use super::transition::{Action, TransitionTable};
use crate::error::Result;
use crate::models::Session;
use crate::services::conversation::actions::{
    Outcome, StepContext, browse, cart, checkout, general, payment,
};

/// The conversation state machine: a transition table plus the handler
/// behind every action.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    transition_table: TransitionTable,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            transition_table: TransitionTable::new(),
        }
    }

    pub fn transition_table(&self) -> &TransitionTable {
        &self.transition_table
    }

    /// The action `event` triggers in the session's current step.
    pub fn resolve(&self, session: &Session, event: &ConversationEvent) -> Action {
        self.transition_table
            .resolve(session.step, event.event_type())
    }

    /// Runs one event against `session` and returns the updated session with
    /// its replies. Nothing is persisted or sent here.
    pub async fn handle_event(
        &self,
        ctx: &StepContext<'_>,
        session: Session,
        event: &ConversationEvent,
    ) -> Result<Outcome> {
        let from = session.step;
        let action = self.resolve(&session, event);
        let identifier = session.identifier.clone();

        let outcome = self.dispatch(ctx, action, session, event).await?;

        tracing::info!(
            identifier = %identifier,
            from = %from,
            event = %event.event_type(),
            intent = %event.intent,
            action = %action,
            to = %outcome.session.step,
            "Conversation transition"
        );
        debug_assert!(
            outcome.session.is_consistent(),
            "step-scoped session fields out of step"
        );
        Ok(outcome)
    }

    async fn dispatch(
        &self,
        ctx: &StepContext<'_>,
        action: Action,
        session: Session,
        event: &ConversationEvent,
    ) -> Result<Outcome> {
        match (action, &event.kind) {
            (Action::Reset, _) => Ok(general::reset(session)),
            (Action::Welcome, _) => Ok(general::welcome(session)),
            (Action::ShowHelp, _) => Ok(general::show_help(session)),
            (Action::NoLongerAvailable, _) => Ok(general::no_longer_available(session)),

            (Action::ShowCategories, _) => browse::show_categories(ctx, session).await,
            (Action::ShowCategoryItems, EventKind::SelectCategory(id)) => {
                browse::show_category_items(ctx, session, *id).await
            }
            (Action::ShowFoodDetails, EventKind::SelectFood(id)) => {
                browse::show_food_details(ctx, session, *id).await
            }
            // The table only routes selection events to these two
            (Action::ShowCategoryItems | Action::ShowFoodDetails, _) => {
                Ok(general::no_longer_available(session))
            }
            (Action::Search, _) => browse::search(ctx, session, &event.text).await,
            (Action::SearchOrWelcome, _) => browse::search_or_welcome(ctx, session, event).await,
            (Action::SearchOrPrompt, _) => browse::search_or_prompt(ctx, session, event).await,

            (Action::AddQuantity, _) => cart::add_quantity(ctx, session, &event.text).await,
            (Action::PromptCustomQuantity, _) => Ok(cart::prompt_custom_quantity(ctx, session)),
            (Action::CancelSelection, _) => cart::cancel_selection(ctx, session).await,
            (Action::ShowCart, _) => cart::show_cart(ctx, session).await,
            (Action::ClearCart, _) => Ok(cart::clear_cart(session)),
            (Action::ContinueShopping, _) => Ok(cart::continue_shopping(session)),

            (Action::InitiateCheckout, _) => Ok(checkout::initiate_checkout(session)),
            (Action::SubmitAddress, _) => {
                checkout::submit_address(ctx, session, &event.text).await
            }
            (Action::CancelCheckout, _) => Ok(checkout::cancel_checkout(session)),

            (Action::ConfirmPayment, _) => payment::confirm_payment(ctx, session).await,
            (Action::AbandonPayment, _) => Ok(payment::abandon_payment(session)),
            (Action::ExplainPayment, _) => payment::explain_payment(ctx, session).await,
        }
    }
}
