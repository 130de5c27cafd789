//! Quantity entry and cart management.

use futures::future::try_join_all;

use super::{Outcome, StepContext, general};
use crate::error::Result;
use crate::models::{CartError, ConversationStep, FoodItem, Session, cart::parse_quantity};
use crate::services::conversation::replies::{self, CartEntry};

/// Adds the typed quantity of the selected food to the cart.
///
/// Invalid input re-prompts without touching the cart or the step.
pub async fn add_quantity(
    ctx: &StepContext<'_>,
    mut session: Session,
    text: &str,
) -> Result<Outcome> {
    let Some(food_id) = session.selected_food_id else {
        session.transition_to(ConversationStep::Initial);
        return Ok(Outcome::reply(session, replies::search_prompt()));
    };
    let limits = ctx.settings.cart_limits;

    let quantity = match parse_quantity(text, limits.max_per_add) {
        Ok(quantity) => quantity,
        Err(CartError::OutOfRange { max }) if is_positive_number(text) => {
            return Ok(Outcome::reply(session, replies::quantity_too_large(max)));
        }
        Err(_) => {
            return Ok(Outcome::reply(
                session,
                replies::invalid_quantity(limits.max_per_add),
            ));
        }
    };

    let Some(food) = ctx.catalog.food(food_id).await?.filter(|food| food.is_available) else {
        return Ok(general::no_longer_available(session));
    };

    match session.cart.add(food.id, quantity, limits) {
        Ok(line_quantity) => {
            tracing::info!(
                identifier = %session.identifier,
                food_id = %food.id,
                quantity,
                line_quantity,
                "Added to cart"
            );
            session.transition_to(ConversationStep::CartManagement);
            Ok(Outcome::reply(session, replies::added_to_cart(quantity, &food.name)))
        }
        Err(CartError::LineLimit { max, attempted }) => {
            let current = attempted - quantity;
            Ok(Outcome::reply(session, replies::line_limit(&food.name, max, current)))
        }
        Err(_) => Ok(Outcome::reply(
            session,
            replies::invalid_quantity(limits.max_per_add),
        )),
    }
}

fn is_positive_number(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) && text.chars().any(|c| c != '0')
}

pub fn prompt_custom_quantity(ctx: &StepContext<'_>, session: Session) -> Outcome {
    Outcome::reply(
        session,
        replies::custom_quantity_prompt(ctx.settings.cart_limits.max_per_add),
    )
}

/// Drops the pending selection. Shows the cart when it has something in it.
pub async fn cancel_selection(ctx: &StepContext<'_>, mut session: Session) -> Result<Outcome> {
    if session.cart.is_empty() {
        session.transition_to(ConversationStep::Initial);
        return Ok(Outcome::reply(session, replies::selection_cancelled()));
    }
    show_cart(ctx, session).await
}

/// Renders the cart at current catalog prices.
///
/// Lines whose food is gone or unavailable are dropped from the cart and the
/// customer is told. An empty cart leaves the session in `initial`.
pub async fn show_cart(ctx: &StepContext<'_>, mut session: Session) -> Result<Outcome> {
    if session.cart.is_empty() {
        session.transition_to(ConversationStep::Initial);
        return Ok(Outcome::reply(session, replies::empty_cart()));
    }

    let foods = try_join_all(
        session
            .cart
            .lines()
            .iter()
            .map(|line| ctx.catalog.food(line.food_id)),
    )
    .await?;

    let mut priced: Vec<(FoodItem, u32)> = Vec::with_capacity(foods.len());
    let mut stale = Vec::new();
    for (line, food) in session.cart.lines().iter().zip(foods) {
        match food.filter(|food| food.is_available) {
            Some(food) => priced.push((food, line.quantity)),
            None => stale.push(line.food_id),
        }
    }

    let mut messages = Vec::new();
    if !stale.is_empty() {
        session.cart.remove_all(&stale);
        messages.push(replies::items_removed(stale.len()));
    }

    if priced.is_empty() {
        session.transition_to(ConversationStep::Initial);
        messages.push(replies::empty_cart());
        return Ok(Outcome::new(session, messages));
    }

    let entries: Vec<CartEntry<'_>> = priced
        .iter()
        .map(|(food, quantity)| CartEntry {
            food,
            quantity: *quantity,
        })
        .collect();
    messages.push(replies::cart(&entries, ctx.settings.delivery_fee));

    session.transition_to(ConversationStep::CartManagement);
    Ok(Outcome::new(session, messages))
}

pub fn clear_cart(mut session: Session) -> Outcome {
    session.cart.clear();
    session.transition_to(ConversationStep::Initial);
    Outcome::reply(session, replies::cart_cleared())
}

pub fn continue_shopping(mut session: Session) -> Outcome {
    session.transition_to(ConversationStep::Initial);
    Outcome::reply(session, replies::search_prompt())
}
