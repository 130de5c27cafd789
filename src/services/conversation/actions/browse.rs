//! Catalog browsing: categories, search, item details.

use uuid::Uuid;

use super::{Outcome, StepContext, general};
use crate::error::Result;
use crate::models::{ConversationStep, Session};
use crate::services::conversation::intent::{self, Intent};
use crate::services::conversation::replies;
use crate::services::conversation::state_machine::ConversationEvent;

/// Shortest free text treated as a search query.
const MIN_QUERY_CHARS: usize = 3;

pub async fn show_categories(ctx: &StepContext<'_>, mut session: Session) -> Result<Outcome> {
    let categories = ctx.catalog.active_categories().await?;
    if categories.is_empty() {
        return Ok(Outcome::reply(session, replies::no_categories()));
    }

    session.transition_to(ConversationStep::ViewingOptions);
    Ok(Outcome::reply(session, replies::categories(&categories)))
}

pub async fn show_category_items(
    ctx: &StepContext<'_>,
    mut session: Session,
    category_id: Uuid,
) -> Result<Outcome> {
    let Some(category) = ctx
        .catalog
        .category(category_id)
        .await?
        .filter(|category| category.is_active)
    else {
        return Ok(general::no_longer_available(session));
    };

    let foods = ctx
        .catalog
        .foods_in_category(category_id, ctx.settings.search_result_limit)
        .await?;

    if foods.is_empty() {
        session.transition_to(ConversationStep::Initial);
        return Ok(Outcome::reply(session, replies::empty_category(&category)));
    }

    session.record_results(None, foods.iter().map(|food| food.id).collect());
    session.transition_to(ConversationStep::ViewingOptions);
    Ok(Outcome::reply(session, replies::category_items(&category, &foods)))
}

/// Loads a selected item and asks for a quantity.
pub async fn show_food_details(
    ctx: &StepContext<'_>,
    mut session: Session,
    food_id: Uuid,
) -> Result<Outcome> {
    let Some(food) = ctx.catalog.food(food_id).await?.filter(|food| food.is_available) else {
        tracing::info!(
            identifier = %session.identifier,
            food_id = %food_id,
            "Selected food is no longer available"
        );
        return Ok(general::no_longer_available(session));
    };

    session.select_food(food.id);
    Ok(Outcome::reply(session, replies::food_details(&food)))
}

/// Runs a catalog search with the message text as the query.
///
/// Zero results return the session to `initial`; any result moves it to
/// `viewing_options`.
pub async fn search(ctx: &StepContext<'_>, mut session: Session, text: &str) -> Result<Outcome> {
    let query = intent::search_terms(text);
    if query.is_empty() {
        session.transition_to(ConversationStep::Searching);
        return Ok(Outcome::reply(session, replies::search_prompt()));
    }

    let foods = ctx
        .catalog
        .search_foods(&query, ctx.settings.search_result_limit)
        .await?;

    tracing::debug!(
        identifier = %session.identifier,
        query = %query,
        results = foods.len(),
        "Catalog search"
    );

    session.record_results(Some(query.clone()), foods.iter().map(|food| food.id).collect());
    if foods.is_empty() {
        session.transition_to(ConversationStep::Initial);
        return Ok(Outcome::reply(session, replies::no_results(&query)));
    }

    session.transition_to(ConversationStep::ViewingOptions);
    Ok(Outcome::reply(session, replies::search_results(&query, &foods)))
}

fn looks_like_query(event: &ConversationEvent) -> bool {
    !matches!(event.intent, Intent::Greeting | Intent::Yes | Intent::No)
        && event.text.chars().count() >= MIN_QUERY_CHARS
}

/// `initial` fallback: search for anything that looks like a query, otherwise greet.
pub async fn search_or_welcome(
    ctx: &StepContext<'_>,
    session: Session,
    event: &ConversationEvent,
) -> Result<Outcome> {
    if looks_like_query(event) {
        search(ctx, session, &event.text).await
    } else {
        Ok(general::welcome(session))
    }
}

/// `viewing_options` fallback: a new search, or a nudge to pick something.
pub async fn search_or_prompt(
    ctx: &StepContext<'_>,
    session: Session,
    event: &ConversationEvent,
) -> Result<Outcome> {
    if looks_like_query(event) {
        search(ctx, session, &event.text).await
    } else {
        Ok(Outcome::reply(session, replies::select_prompt()))
    }
}
