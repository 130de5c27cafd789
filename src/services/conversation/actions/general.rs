//! Step-independent handlers: reset, greeting, help, stale selections.

use super::Outcome;
use crate::models::{ConversationStep, Session};
use crate::services::conversation::replies;

/// Global escape hatch: empty cart, nothing selected or pending, back to `initial`.
pub fn reset(mut session: Session) -> Outcome {
    session.reset();
    let greeting = replies::welcome(session.first_name());
    Outcome::new(session, vec![replies::starting_over(), greeting])
}

pub fn welcome(session: Session) -> Outcome {
    let greeting = replies::welcome(session.first_name());
    Outcome::reply(session, greeting)
}

pub fn show_help(session: Session) -> Outcome {
    Outcome::reply(session, replies::help())
}

/// A catalog id from an old message no longer resolves.
pub fn no_longer_available(mut session: Session) -> Outcome {
    session.transition_to(ConversationStep::Initial);
    Outcome::reply(session, replies::no_longer_available())
}
