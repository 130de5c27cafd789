//! Customer-facing message templates.
//!
//! Every template returns a ready [`OutboundMessage`]; the budgets and
//! truncation are enforced by the message constructors.

use crate::models::{Category, FoodItem, PendingPayment, Selection};
use crate::services::messaging::{ListRow, ListSection, OutboundMessage};
use crate::utils::format_amount;

pub const BROWSE_MENU: &str = "Browse Menu";
pub const VIEW_CART: &str = "View Cart";
pub const HELP: &str = "Help";
pub const CUSTOM_AMOUNT: &str = "Custom Amount";
pub const CONTINUE_SHOPPING: &str = "Continue Shopping";
pub const CHECKOUT: &str = "Checkout";
pub const CLEAR_CART: &str = "Clear Cart";
pub const CONFIRM_PAYMENT: &str = "Confirm Payment";
pub const CANCEL: &str = "Cancel";

const LIST_BUTTON: &str = "Choose Option";
/// Queries up to this length are echoed in the result section title.
const ECHO_QUERY_MAX: usize = 12;

pub fn welcome(first_name: Option<&str>) -> OutboundMessage {
    let greeting = match first_name {
        Some(name) => format!("🍽️ Hi {name}, welcome to FoodBot! 🤖"),
        None => "🍽️ Welcome to FoodBot! 🤖".to_string(),
    };
    OutboundMessage::buttons(
        format!(
            "{greeting}\n\n\
             I can help you order delicious food from various restaurants.\n\n\
             What would you like to eat today? You can:\n\
             • Type a food name (e.g., \"pizza\", \"burger\", \"pasta\")\n\
             • Browse by category\n\
             • Check your cart\n\
             • Get help\n\n\
             Just tell me what you're craving! 😋"
        ),
        &[BROWSE_MENU, VIEW_CART, HELP],
    )
}

pub fn starting_over() -> OutboundMessage {
    OutboundMessage::text("🔄 Starting over. Your cart has been cleared.")
}

pub fn help() -> OutboundMessage {
    OutboundMessage::text(
        "🤖 *FoodBot Help*\n\n\
         *How to order:*\n\
         1. Tell me what food you want\n\
         2. Choose from the results\n\
         3. Select quantity\n\
         4. Continue shopping or checkout\n\
         5. Provide delivery address\n\
         6. Pay and confirm your order\n\n\
         *Commands:*\n\
         • Search food: Just type what you want\n\
         • Browse menu: Say \"menu\"\n\
         • View cart: Say \"cart\"\n\
         • Start over: Say \"reset\"\n\
         • Get help: Say \"help\"\n\n\
         Need assistance? Just ask! 😊",
    )
}

pub fn generic_error() -> OutboundMessage {
    OutboundMessage::text("Sorry, something went wrong. Please try again.")
}

pub fn no_categories() -> OutboundMessage {
    OutboundMessage::text("No categories available at the moment.")
}

pub fn categories(categories: &[Category]) -> OutboundMessage {
    let rows = categories
        .iter()
        .map(|category| {
            ListRow::new(
                Selection::category_row_id(category.id),
                &category.name,
                category.description.as_deref(),
            )
        })
        .collect();
    OutboundMessage::list(
        None,
        "🍴 Choose a food category to browse:",
        LIST_BUTTON,
        vec![ListSection::new("Categories", rows)],
    )
}

fn food_rows(foods: &[FoodItem]) -> Vec<ListRow> {
    foods
        .iter()
        .map(|food| {
            ListRow::new(
                Selection::food_row_id(food.id),
                &format!("{} - {}", food.name, format_amount(food.price)),
                Some(&format!("📍 {} • {}", food.restaurant_name, food.preparation_time)),
            )
        })
        .collect()
}

pub fn search_results(query: &str, foods: &[FoodItem]) -> OutboundMessage {
    let count = foods.len();
    let section_title = if query.chars().count() <= ECHO_QUERY_MAX {
        format!("{count} {query} items")
    } else {
        format!("{count} Results")
    };
    OutboundMessage::list(
        None,
        format!("🔍 Found {count} items for \"{query}\":"),
        LIST_BUTTON,
        vec![ListSection::new(&section_title, food_rows(foods))],
    )
}

pub fn no_results(query: &str) -> OutboundMessage {
    OutboundMessage::text(format!(
        "😔 Sorry, I couldn't find any food matching \"{query}\". \
         Try searching for something else or type \"menu\" to browse categories."
    ))
}

pub fn search_prompt() -> OutboundMessage {
    OutboundMessage::text("What would you like to search for?")
}

pub fn select_prompt() -> OutboundMessage {
    OutboundMessage::text("Please select a food item or search for something new.")
}

pub fn category_items(category: &Category, foods: &[FoodItem]) -> OutboundMessage {
    OutboundMessage::list(
        None,
        format!("🍴 {} items:", category.name),
        LIST_BUTTON,
        vec![ListSection::new(&category.name, food_rows(foods))],
    )
}

pub fn empty_category(category: &Category) -> OutboundMessage {
    OutboundMessage::text(format!(
        "😔 No items available in {} category at the moment.",
        category.name
    ))
}

pub fn no_longer_available() -> OutboundMessage {
    OutboundMessage::text("Sorry, that item is no longer available.")
}

pub fn food_details(food: &FoodItem) -> OutboundMessage {
    OutboundMessage::buttons(
        format!(
            "🍽️ *{}*\n\
             📍 {}\n\
             💰 {}\n\
             📝 {}\n\
             ⏱️ Prep time: {}\n\
             🚚 Delivery: {}\n\n\
             How many would you like to add to your cart?",
            food.name,
            food.restaurant_name,
            format_amount(food.price),
            food.description,
            food.preparation_time,
            food.delivery_time,
        ),
        &["1", "2", CUSTOM_AMOUNT],
    )
}

pub fn custom_quantity_prompt(max: u32) -> OutboundMessage {
    OutboundMessage::text(format!("Please enter the quantity you want (1-{max}):"))
}

pub fn invalid_quantity(max: u32) -> OutboundMessage {
    OutboundMessage::text(format!("Please enter a valid quantity (1-{max})"))
}

pub fn quantity_too_large(max: u32) -> OutboundMessage {
    OutboundMessage::text(format!(
        "Maximum quantity is {max} items at a time. Please enter a smaller number."
    ))
}

pub fn line_limit(name: &str, max: u32, current: u32) -> OutboundMessage {
    OutboundMessage::text(format!(
        "You can have at most {max} of {name} in your cart and you already have {current}. \
         Please enter a smaller number."
    ))
}

pub fn added_to_cart(quantity: u32, name: &str) -> OutboundMessage {
    OutboundMessage::buttons(
        format!("✅ Added {quantity}x {name} to your cart!\n\nWhat would you like to do next?"),
        &[CONTINUE_SHOPPING, VIEW_CART, CHECKOUT],
    )
}

/// One priced cart line as rendered.
pub struct CartEntry<'a> {
    pub food: &'a FoodItem,
    pub quantity: u32,
}

pub fn cart(entries: &[CartEntry<'_>], delivery_fee: i64) -> OutboundMessage {
    let mut body = String::from("🛒 *Your Cart:*\n\n");
    let mut total = 0i64;
    for (index, entry) in entries.iter().enumerate() {
        let line_total = entry.food.price * i64::from(entry.quantity);
        total += line_total;
        body.push_str(&format!(
            "{}. *{}*\n   📍 {}\n   Qty: {} × {} = {}\n\n",
            index + 1,
            entry.food.name,
            entry.food.restaurant_name,
            entry.quantity,
            format_amount(entry.food.price),
            format_amount(line_total),
        ));
    }
    if delivery_fee > 0 {
        body.push_str(&format!("🚚 Delivery: {}\n", format_amount(delivery_fee)));
        total += delivery_fee;
    }
    body.push_str(&format!("💰 *Total: {}*", format_amount(total)));

    OutboundMessage::buttons(body, &[CHECKOUT, CONTINUE_SHOPPING, CLEAR_CART])
}

pub fn empty_cart() -> OutboundMessage {
    OutboundMessage::text("🛒 Your cart is empty. Start by telling me what you'd like to eat!")
}

pub fn items_removed(count: usize) -> OutboundMessage {
    let noun = if count == 1 { "item is" } else { "items are" };
    OutboundMessage::text(format!(
        "⚠️ {count} {noun} no longer available and were removed from your cart."
    ))
}

pub fn cart_cleared() -> OutboundMessage {
    OutboundMessage::text("🛒 Cart cleared! What would you like to order?")
}

pub fn checkout_empty() -> OutboundMessage {
    OutboundMessage::text("🛒 Your cart is empty. Add some items first!")
}

pub fn address_prompt() -> OutboundMessage {
    OutboundMessage::text(
        "🏁 Ready to checkout!\n\n\
         Please provide your delivery address:\n\
         (Example: \"123 Main Street, Victoria Island, Lagos\")",
    )
}

pub fn address_too_short() -> OutboundMessage {
    OutboundMessage::text("Please provide a more detailed delivery address.")
}

pub fn checkout_cancelled() -> OutboundMessage {
    OutboundMessage::buttons(
        "Checkout cancelled. Your cart is still saved.",
        &[CHECKOUT, CONTINUE_SHOPPING, CLEAR_CART],
    )
}

pub fn selection_cancelled() -> OutboundMessage {
    OutboundMessage::text("No problem. What would you like to search for?")
}

pub fn payment_link(payment: &PendingPayment, pay_url: &str) -> OutboundMessage {
    OutboundMessage::buttons(
        format!(
            "💳 *Payment Required*\n\n\
             Order #: {}\n\
             Total: {}\n\
             Delivery to: {}\n\n\
             Pay securely here:\n{}\n\n\
             Once you've paid, tap *Confirm Payment*.",
            payment.order_number,
            format_amount(payment.total_amount),
            payment.delivery_address,
            pay_url,
        ),
        &[CONFIRM_PAYMENT, CANCEL],
    )
}

pub fn payment_instructions(pay_url: Option<&str>) -> OutboundMessage {
    let link = pay_url
        .map(|url| format!("Pay here: {url}\n\n"))
        .unwrap_or_default();
    OutboundMessage::buttons(
        format!(
            "⏳ We're waiting for your payment.\n\n{link}\
             After paying, tap *Confirm Payment*. \
             Tap *Cancel* to go back to your cart, or say \"reset\" to start over."
        ),
        &[CONFIRM_PAYMENT, CANCEL],
    )
}

pub fn payment_pending() -> OutboundMessage {
    OutboundMessage::buttons(
        "⏳ Your payment hasn't been confirmed yet. \
         If you've just paid, wait a moment and tap *Confirm Payment* again.",
        &[CONFIRM_PAYMENT, CANCEL],
    )
}

pub fn payment_processing() -> OutboundMessage {
    OutboundMessage::text("⏳ We're finalising your payment. You'll get a confirmation shortly.")
}

pub fn payment_failed() -> OutboundMessage {
    OutboundMessage::buttons(
        "❌ Your payment didn't go through. You can try paying again with the same link, \
         or tap *Cancel* to go back to your cart.",
        &[CONFIRM_PAYMENT, CANCEL],
    )
}

pub fn payment_expired() -> OutboundMessage {
    OutboundMessage::buttons(
        "⌛ This payment link has expired. Your cart is still saved; \
         checkout again to get a new link.",
        &[CHECKOUT, CONTINUE_SHOPPING, CLEAR_CART],
    )
}

pub fn payment_not_found() -> OutboundMessage {
    OutboundMessage::buttons(
        "We couldn't find your payment. Your cart is still saved; please checkout again.",
        &[CHECKOUT, CONTINUE_SHOPPING, CLEAR_CART],
    )
}

pub fn payment_abandoned() -> OutboundMessage {
    OutboundMessage::buttons(
        "Payment cancelled. Your cart is still saved.",
        &[CHECKOUT, CONTINUE_SHOPPING, CLEAR_CART],
    )
}

pub fn payment_confirmed() -> OutboundMessage {
    OutboundMessage::text("✅ Your payment has been confirmed. Thank you!")
}

pub fn payment_failed_notice(order_number: &str) -> OutboundMessage {
    OutboundMessage::text(format!(
        "❌ The payment for order {order_number} failed. \
         Tap *Confirm Payment* after retrying, or say \"reset\" to start over."
    ))
}

pub fn refund_notice(order_number: &str, succeeded: bool) -> OutboundMessage {
    if succeeded {
        OutboundMessage::text(format!("💸 Your refund for order {order_number} has been sent."))
    } else {
        OutboundMessage::text(format!(
            "⚠️ We couldn't complete the refund for order {order_number}. \
             Our team will contact you shortly."
        ))
    }
}

pub fn gateway_unavailable() -> OutboundMessage {
    OutboundMessage::text(
        "Sorry, we couldn't reach the payment service. Please try again in a moment.",
    )
}
