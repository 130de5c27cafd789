//! The conversation transition table.
//!
//! Lookup order for `(step, event)`:
//! 1. global entries, valid in every step (reset and structured selections);
//! 2. per-step entries;
//! 3. the step's fallback action, which every step has.

use std::collections::HashMap;

use serde::Serialize;
use strum_macros::{Display, EnumIter};

use super::event::EventType;
use crate::models::ConversationStep;

/// A step handler. The machine maps each action to one async function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Reset,
    Welcome,
    ShowHelp,
    ShowCategories,
    ShowCategoryItems,
    ShowFoodDetails,
    NoLongerAvailable,
    Search,
    /// Search when the text looks like a query, otherwise greet.
    SearchOrWelcome,
    /// Search when the text looks like a query, otherwise ask for a selection.
    SearchOrPrompt,
    AddQuantity,
    PromptCustomQuantity,
    CancelSelection,
    ShowCart,
    ClearCart,
    ContinueShopping,
    InitiateCheckout,
    SubmitAddress,
    CancelCheckout,
    ConfirmPayment,
    AbandonPayment,
    ExplainPayment,
}

/// Maps `(step, event type)` to the action that handles it.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    global: HashMap<EventType, Action>,
    transitions: HashMap<(ConversationStep, EventType), Action>,
}

impl TransitionTable {
    /// Creates the table with the bot's conversation rules.
    pub fn new() -> Self {
        let mut table = Self {
            global: HashMap::new(),
            transitions: HashMap::new(),
        };
        table.initialize_default_transitions();
        table
    }

    fn initialize_default_transitions(&mut self) {
        use ConversationStep as S;
        use EventType as E;

        // Any step
        self.global.insert(E::Reset, Action::Reset);
        self.global.insert(E::SelectFood, Action::ShowFoodDetails);
        self.global.insert(E::SelectCategory, Action::ShowCategoryItems);
        self.global.insert(E::StaleSelection, Action::NoLongerAvailable);

        // From Initial
        self.insert(S::Initial, E::Menu, Action::ShowCategories);
        self.insert(S::Initial, E::ViewCart, Action::ShowCart);
        self.insert(S::Initial, E::Help, Action::ShowHelp);
        self.insert(S::Initial, E::Greeting, Action::Welcome);
        self.insert(S::Initial, E::Checkout, Action::InitiateCheckout);
        self.insert(S::Initial, E::ClearCart, Action::ClearCart);
        self.insert(S::Initial, E::ContinueShopping, Action::ContinueShopping);

        // From ViewingOptions
        self.insert(S::ViewingOptions, E::Menu, Action::ShowCategories);
        self.insert(S::ViewingOptions, E::ViewCart, Action::ShowCart);
        self.insert(S::ViewingOptions, E::Help, Action::ShowHelp);
        self.insert(S::ViewingOptions, E::Checkout, Action::InitiateCheckout);

        // From AddingToCart
        self.insert(S::AddingToCart, E::CustomAmount, Action::PromptCustomQuantity);
        self.insert(S::AddingToCart, E::Cancel, Action::CancelSelection);

        // From CartManagement
        self.insert(S::CartManagement, E::Checkout, Action::InitiateCheckout);
        self.insert(S::CartManagement, E::ViewCart, Action::ShowCart);
        self.insert(S::CartManagement, E::ClearCart, Action::ClearCart);
        self.insert(S::CartManagement, E::ContinueShopping, Action::ContinueShopping);
        self.insert(S::CartManagement, E::Menu, Action::ShowCategories);
        self.insert(S::CartManagement, E::Help, Action::ShowHelp);

        // From Checkout
        self.insert(S::Checkout, E::Cancel, Action::CancelCheckout);
        self.insert(S::Checkout, E::ViewCart, Action::ShowCart);
        self.insert(S::Checkout, E::ClearCart, Action::ClearCart);

        // From AwaitingPayment
        self.insert(S::AwaitingPayment, E::ConfirmPayment, Action::ConfirmPayment);
        self.insert(S::AwaitingPayment, E::Cancel, Action::AbandonPayment);
        self.insert(S::AwaitingPayment, E::Help, Action::ExplainPayment);
    }

    fn insert(&mut self, from: ConversationStep, event: EventType, action: Action) {
        self.transitions.insert((from, event), action);
    }

    /// What a step does with input no entry claims.
    pub fn fallback(step: ConversationStep) -> Action {
        match step {
            ConversationStep::Initial => Action::SearchOrWelcome,
            ConversationStep::Searching => Action::Search,
            ConversationStep::ViewingOptions => Action::SearchOrPrompt,
            ConversationStep::AddingToCart => Action::AddQuantity,
            ConversationStep::CartManagement => Action::Search,
            ConversationStep::Checkout => Action::SubmitAddress,
            ConversationStep::AwaitingPayment => Action::ExplainPayment,
        }
    }

    /// The action for `event` in `step`. Always defined.
    pub fn resolve(&self, step: ConversationStep, event: EventType) -> Action {
        self.global
            .get(&event)
            .or_else(|| self.transitions.get(&(step, event)))
            .copied()
            .unwrap_or_else(|| Self::fallback(step))
    }

    /// Whether `(step, event)` has an explicit entry, global or per-step.
    pub fn is_explicit(&self, step: ConversationStep, event: EventType) -> bool {
        self.global.contains_key(&event) || self.transitions.contains_key(&(step, event))
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_reset_is_global() {
        let table = TransitionTable::new();
        for step in ConversationStep::iter() {
            assert_eq!(table.resolve(step, EventType::Reset), Action::Reset);
        }
    }

    #[test]
    fn test_selections_take_precedence_in_every_step() {
        let table = TransitionTable::new();
        for step in ConversationStep::iter() {
            assert_eq!(
                table.resolve(step, EventType::SelectFood),
                Action::ShowFoodDetails
            );
            assert_eq!(
                table.resolve(step, EventType::StaleSelection),
                Action::NoLongerAvailable
            );
        }
    }

    #[test]
    fn test_every_pair_resolves() {
        let table = TransitionTable::new();
        for step in ConversationStep::iter() {
            for event in EventType::iter() {
                let action = table.resolve(step, event);
                if !table.is_explicit(step, event) {
                    assert_eq!(action, TransitionTable::fallback(step));
                }
            }
        }
    }

    #[test]
    fn test_step_specific_entries() {
        let table = TransitionTable::new();
        assert_eq!(
            table.resolve(ConversationStep::Initial, EventType::Menu),
            Action::ShowCategories
        );
        assert_eq!(
            table.resolve(ConversationStep::CartManagement, EventType::Checkout),
            Action::InitiateCheckout
        );
        assert_eq!(
            table.resolve(ConversationStep::Checkout, EventType::Cancel),
            Action::CancelCheckout
        );
        assert_eq!(
            table.resolve(ConversationStep::AwaitingPayment, EventType::Cancel),
            Action::AbandonPayment
        );
        assert_eq!(
            table.resolve(ConversationStep::AddingToCart, EventType::CustomAmount),
            Action::PromptCustomQuantity
        );
    }

    #[test]
    fn test_fallbacks() {
        let table = TransitionTable::new();
        assert_eq!(
            table.resolve(ConversationStep::Searching, EventType::Menu),
            Action::Search
        );
        assert_eq!(
            table.resolve(ConversationStep::AddingToCart, EventType::Text),
            Action::AddQuantity
        );
        assert_eq!(
            table.resolve(ConversationStep::Checkout, EventType::Menu),
            Action::SubmitAddress
        );
        assert_eq!(
            table.resolve(ConversationStep::AwaitingPayment, EventType::Text),
            Action::ExplainPayment
        );
    }
}
