//! Conversation events derived from inbound messages.
//!
//! Derivation order:
//! 1. structured selections (list rows) map straight to selection events;
//! 2. literal button labels and phrases ("clear cart", "confirm payment", ...);
//! 3. the intent classifier, in strict mode for steps that expect free text;
//! 4. while a payment is open, any mention of having paid confirms it unless
//!    the message resets or cancels.

use strum_macros::{Display, EnumDiscriminants, EnumIter};
use uuid::Uuid;

use crate::models::{ConversationStep, InboundContent, InboundMessage, Selection};
use crate::services::conversation::intent::{self, Intent};
use crate::utils::normalize;

/// What the customer asked for, with any payload the handler needs.
#[derive(Debug, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(EventType), derive(Hash, Display, EnumIter))]
pub enum EventKind {
    SelectFood(Uuid),
    SelectCategory(Uuid),
    /// A catalog id from an old list that no longer decodes.
    StaleSelection,
    Reset,
    Cancel,
    Checkout,
    ViewCart,
    Menu,
    Help,
    Greeting,
    ClearCart,
    ContinueShopping,
    CustomAmount,
    ConfirmPayment,
    /// Anything else; handlers read the text and intent.
    Text,
}

/// Literal labels and phrases that name an event outright. These are the
/// labels of the quick-reply buttons the bot sends.
const LITERALS: &[(&str, EventKind)] = &[
    ("browse menu", EventKind::Menu),
    ("view cart", EventKind::ViewCart),
    ("clear cart", EventKind::ClearCart),
    ("continue shopping", EventKind::ContinueShopping),
    ("custom amount", EventKind::CustomAmount),
    ("confirm payment", EventKind::ConfirmPayment),
    ("paid", EventKind::ConfirmPayment),
    ("i have paid", EventKind::ConfirmPayment),
    ("i've paid", EventKind::ConfirmPayment),
];

/// One inbound message, ready for the transition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEvent {
    pub kind: EventKind,
    /// The trimmed text as typed, or the label of the pressed button.
    pub text: String,
    pub intent: Intent,
}

impl ConversationEvent {
    pub fn event_type(&self) -> EventType {
        EventType::from(&self.kind)
    }

    /// Derives the event for `message` arriving while the session is in `step`.
    pub fn from_inbound(message: &InboundMessage, step: ConversationStep) -> Self {
        match &message.content {
            InboundContent::Selection(Selection::Food(id)) => {
                Self::structured(EventKind::SelectFood(*id))
            }
            InboundContent::Selection(Selection::Category(id)) => {
                Self::structured(EventKind::SelectCategory(*id))
            }
            InboundContent::Selection(Selection::Stale(id)) => Self {
                kind: EventKind::StaleSelection,
                text: id.clone(),
                intent: Intent::Unknown,
            },
            InboundContent::Selection(Selection::Reply(label)) => Self::from_text(label, step),
            InboundContent::Text(text) => Self::from_text(text, step),
        }
    }

    /// Derives the event for free text (or a button label) in `step`.
    pub fn from_text(text: &str, step: ConversationStep) -> Self {
        let text = text.trim().to_string();
        let intent = if step.expects_free_text() {
            intent::classify_strict(&text)
        } else {
            intent::classify(&text)
        };

        let kind = literal_kind(&text).unwrap_or_else(|| kind_for_intent(intent));
        let kind = if step == ConversationStep::AwaitingPayment
            && !matches!(kind, EventKind::Reset | EventKind::Cancel)
            && intent::mentions_payment(&text)
        {
            EventKind::ConfirmPayment
        } else {
            kind
        };
        Self { kind, text, intent }
    }

    fn structured(kind: EventKind) -> Self {
        Self {
            kind,
            text: String::new(),
            intent: Intent::Unknown,
        }
    }
}

fn literal_kind(text: &str) -> Option<EventKind> {
    let normalized = normalize(text);
    let normalized = normalized.trim_end_matches(['.', '!']);
    LITERALS
        .iter()
        .find(|(literal, _)| *literal == normalized)
        .map(|(_, kind)| kind.clone())
}

fn kind_for_intent(intent: Intent) -> EventKind {
    match intent {
        Intent::Reset => EventKind::Reset,
        Intent::Cancel => EventKind::Cancel,
        Intent::Checkout => EventKind::Checkout,
        Intent::Cart => EventKind::ViewCart,
        Intent::Menu => EventKind::Menu,
        Intent::Help => EventKind::Help,
        Intent::Greeting => EventKind::Greeting,
        Intent::Search
        | Intent::Yes
        | Intent::No
        | Intent::FoodSearch
        | Intent::Quantity
        | Intent::Address
        | Intent::Unknown => EventKind::Text,
    }
}
