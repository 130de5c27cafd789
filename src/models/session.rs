use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use uuid::Uuid;

use super::cart::Cart;

/// The conversation step a customer is currently in.
///
/// There is no terminal step. Every completed order and every reset returns
/// the session to [`ConversationStep::Initial`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConversationStep {
    #[default]
    Initial,
    Searching,
    ViewingOptions,
    AddingToCart,
    CartManagement,
    Checkout,
    AwaitingPayment,
}

impl ConversationStep {
    /// Steps where the customer types free-form text (an address), so command
    /// keywords only count on an exact match.
    pub fn expects_free_text(self) -> bool {
        matches!(self, Self::Checkout)
    }
}

/// Durable per-customer conversation state. Exactly one per identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    /// Stable customer key (the phone number). Immutable.
    pub identifier: String,
    pub display_name: Option<String>,
    pub is_first_contact: bool,
    pub step: ConversationStep,
    pub search_query: Option<String>,
    /// Set only while in `adding_to_cart`.
    pub selected_food_id: Option<Uuid>,
    pub search_result_ids: Vec<Uuid>,
    pub cart: Cart,
    /// Set only while in `awaiting_payment`.
    pub pending_payment_reference: Option<String>,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Incremented on every successful save; guards against lost updates.
    pub version: i64,
}

impl Session {
    /// A brand-new session for a customer we have never seen.
    pub fn new(identifier: impl Into<String>, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            identifier: identifier.into(),
            display_name,
            is_first_contact: true,
            step: ConversationStep::Initial,
            search_query: None,
            selected_food_id: None,
            search_result_ids: Vec::new(),
            cart: Cart::default(),
            pending_payment_reference: None,
            last_activity_at: now,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Moves to `step`, dropping state that is only valid in other steps.
    pub fn transition_to(&mut self, step: ConversationStep) {
        if step != ConversationStep::AddingToCart {
            self.selected_food_id = None;
        }
        if step != ConversationStep::AwaitingPayment {
            self.pending_payment_reference = None;
        }
        self.step = step;
    }

    /// Enters `adding_to_cart` with `food_id` awaiting a quantity.
    pub fn select_food(&mut self, food_id: Uuid) {
        self.transition_to(ConversationStep::AddingToCart);
        self.selected_food_id = Some(food_id);
    }

    /// Enters `awaiting_payment` for the given pending payment.
    pub fn await_payment(&mut self, reference: impl Into<String>) {
        self.transition_to(ConversationStep::AwaitingPayment);
        self.pending_payment_reference = Some(reference.into());
    }

    /// Records the last presented search and its result ids.
    pub fn record_results(&mut self, query: Option<String>, result_ids: Vec<Uuid>) {
        self.search_query = query;
        self.search_result_ids = result_ids;
    }

    /// Global escape hatch: back to `initial` with nothing selected or pending.
    pub fn reset(&mut self) {
        self.cart.clear();
        self.search_query = None;
        self.search_result_ids.clear();
        self.transition_to(ConversationStep::Initial);
    }

    /// Completes an order: empties the cart and returns to `initial`.
    pub fn complete_order(&mut self) {
        self.cart.clear();
        self.transition_to(ConversationStep::Initial);
    }

    /// Names one checkout attempt. Stable until the session is next saved, so
    /// a retry after a failed save lands on the same key.
    pub fn checkout_key(&self) -> String {
        format!("{}-{}", self.id.simple(), self.version)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }

    /// Checks the step-scoped field invariants.
    pub fn is_consistent(&self) -> bool {
        let selection_ok =
            self.selected_food_id.is_none() || self.step == ConversationStep::AddingToCart;
        let pending_ok = self.pending_payment_reference.is_none()
            || self.step == ConversationStep::AwaitingPayment;
        selection_ok && pending_ok
    }

    /// First name for greetings, if the platform told us one.
    pub fn first_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_step_string_round_trip() {
        assert_eq!(ConversationStep::AwaitingPayment.to_string(), "awaiting_payment");
        assert_eq!(
            ConversationStep::from_str("viewing_options").unwrap(),
            ConversationStep::ViewingOptions
        );
        assert!(ConversationStep::from_str("paying").is_err());
    }

    #[test]
    fn test_new_session_defaults() {
        let session = Session::new("2348012345678", Some("Ada Obi".to_string()));
        assert!(session.is_first_contact);
        assert_eq!(session.step, ConversationStep::Initial);
        assert_eq!(session.first_name(), Some("Ada"));
        assert!(session.cart.is_empty());
        assert!(session.is_consistent());
    }

    #[test]
    fn test_checkout_key_follows_saved_version() {
        let mut session = Session::new("2348012345678", None);
        let key = session.checkout_key();
        session.touch(Utc::now());
        session.transition_to(ConversationStep::Checkout);
        assert_eq!(session.checkout_key(), key);

        session.version += 1;
        assert_ne!(session.checkout_key(), key);
        assert!(session.checkout_key().starts_with(&session.id.simple().to_string()));
    }

    #[test]
    fn test_transition_clears_step_scoped_fields() {
        let mut session = Session::new("1", None);
        session.select_food(Uuid::now_v7());
        assert!(session.selected_food_id.is_some());
        session.transition_to(ConversationStep::CartManagement);
        assert!(session.selected_food_id.is_none());

        session.await_payment("REF1");
        assert_eq!(session.pending_payment_reference.as_deref(), Some("REF1"));
        session.transition_to(ConversationStep::Checkout);
        assert!(session.pending_payment_reference.is_none());
        assert!(session.is_consistent());
    }

    #[test]
    fn test_reset_from_every_step() {
        for step in ConversationStep::iter() {
            let mut session = Session::new("1", None);
            session.step = step;
            session.selected_food_id = Some(Uuid::now_v7());
            session.pending_payment_reference = Some("REF".to_string());
            session.search_query = Some("rice".to_string());
            session.reset();
            assert_eq!(session.step, ConversationStep::Initial);
            assert!(session.selected_food_id.is_none());
            assert!(session.pending_payment_reference.is_none());
            assert!(session.search_query.is_none());
        }
    }
}
