//! Cart → order assembly, totals, and order status notifications.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use rand::Rng;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Cart, Order, OrderLineItem, OrderStatus, PaymentMethod};
use crate::repository::{CatalogRepository, OrderRepository};
use crate::services::messaging::{Messenger, OutboundMessage};
use crate::utils::format_amount;

/// A priced snapshot of a cart at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub line_items: Vec<OrderLineItem>,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total_amount: i64,
    /// Cart lines whose food is gone or unavailable, left out of the totals.
    pub unavailable: Vec<Uuid>,
}

impl OrderDraft {
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }
}

/// Prices every cart line at current catalog prices.
pub async fn draft_from_cart(
    catalog: &dyn CatalogRepository,
    cart: &Cart,
    delivery_fee: i64,
) -> Result<OrderDraft> {
    let foods = try_join_all(cart.lines().iter().map(|line| catalog.food(line.food_id))).await?;

    let mut line_items = Vec::with_capacity(cart.len());
    let mut unavailable = Vec::new();
    for (line, food) in cart.lines().iter().zip(foods) {
        match food.filter(|food| food.is_available) {
            Some(food) => line_items.push(OrderLineItem {
                food_id: food.id,
                name: food.name,
                quantity: line.quantity,
                unit_price: food.price,
            }),
            None => unavailable.push(line.food_id),
        }
    }

    let subtotal: i64 = line_items.iter().map(OrderLineItem::line_total).sum();
    let delivery_fee = if line_items.is_empty() { 0 } else { delivery_fee };
    Ok(OrderDraft {
        line_items,
        subtotal,
        delivery_fee,
        total_amount: subtotal + delivery_fee,
        unavailable,
    })
}

/// `ORD` + creation time in milliseconds + a random suffix against same-millisecond collisions.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::rng().random_range(100..1000);
    format!("ORD{}{}", now.timestamp_millis(), suffix)
}

/// Gateway reference for a checkout attempt, derived from its checkout key
/// so a retried attempt reuses the reference.
pub fn payment_reference_for(checkout_key: &str) -> String {
    format!("FB_{checkout_key}")
}

/// Customer-facing order confirmation.
pub fn confirmation_message(order: &Order) -> OutboundMessage {
    let items = order
        .line_items
        .iter()
        .map(|item| format!("• {}x {}", item.quantity, item.name))
        .collect::<Vec<_>>()
        .join("\n");

    let payment = match order.payment_method {
        PaymentMethod::Cash => "Cash on delivery".to_string(),
        _ => format!("Paid ({})", format_amount(order.total_amount)),
    };

    OutboundMessage::text(format!(
        "✅ *Order Confirmed!*\n\n\
         Order #: {}\n\
         Items:\n{}\n\n\
         Total: {}\n\
         Delivery to: {}\n\
         Payment: {}\n\n\
         Estimated delivery: 45-60 minutes\n\
         We'll keep you posted on your order status! 🚚",
        order.order_number,
        items,
        format_amount(order.total_amount),
        order.delivery_address,
        payment,
    ))
}

/// Status-change notification text.
pub fn status_message(order: &Order, delivery_time: Option<&str>) -> String {
    let number = &order.order_number;
    match order.status {
        OrderStatus::Pending => format!("📝 Your order {number} has been received."),
        OrderStatus::Confirmed => format!(
            "✅ Your order {number} has been confirmed and will be prepared shortly."
        ),
        OrderStatus::Preparing => format!(
            "👨‍🍳 Your order {number} is being prepared. Estimated delivery: {}.",
            delivery_time.unwrap_or("45-60 minutes")
        ),
        OrderStatus::Ready => format!("📦 Your order {number} is ready and will be picked up for delivery soon."),
        OrderStatus::OutForDelivery => format!("🚚 Your order {number} is on its way!"),
        OrderStatus::Delivered => format!("🎉 Your order {number} has been delivered. Enjoy your meal!"),
        OrderStatus::Cancelled => format!(
            "❌ Your order {number} has been cancelled. Please contact us if you have any questions."
        ),
    }
}

/// Administrative order operations that notify the customer.
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn CatalogRepository>,
    messenger: Arc<dyn Messenger>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn CatalogRepository>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            orders,
            catalog,
            messenger,
        }
    }

    pub async fn get(&self, order_number: &str) -> Result<Order> {
        self.orders
            .order_by_number(order_number)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Order {order_number} not found")))
    }

    /// Moves an order to `status` and tells the customer. A failed notification
    /// is logged and does not undo the update.
    pub async fn update_status(&self, order_number: &str, status: OrderStatus) -> Result<Order> {
        let current = self.get(order_number).await?;
        if !current.status.can_transition_to(status) {
            return Err(Error::Validation(format!(
                "Order {order_number} cannot move from {} to {status}",
                current.status
            )));
        }

        let order = self
            .orders
            .update_order_status(order_number, status)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Order {order_number} not found")))?;

        tracing::info!(
            order_number = %order.order_number,
            from = %current.status,
            to = %order.status,
            "Order status updated"
        );

        let delivery_time = match order.line_items.first() {
            Some(item) if status == OrderStatus::Preparing => self
                .catalog
                .food(item.food_id)
                .await
                .ok()
                .flatten()
                .map(|food| food.delivery_time),
            _ => None,
        };

        let text = status_message(&order, delivery_time.as_deref());
        if let Err(e) = self.messenger.send_text(&order.customer_identifier, &text).await {
            tracing::warn!(
                order_number = %order.order_number,
                error = %e,
                "Failed to send order status notification"
            );
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CartLimits, FoodItem};
    use crate::repository::InMemoryCatalog;

    fn food(name: &str, price: i64) -> FoodItem {
        FoodItem {
            id: Uuid::now_v7(),
            name: name.to_string(),
            description: String::new(),
            price,
            category_id: Uuid::now_v7(),
            restaurant_id: Uuid::now_v7(),
            restaurant_name: "Mama Put".to_string(),
            delivery_time: "30-45 mins".to_string(),
            preparation_time: "20 mins".to_string(),
            tags: vec![],
            is_available: true,
        }
    }

    #[tokio::test]
    async fn test_draft_uses_current_prices() {
        let catalog = InMemoryCatalog::new();
        let rice = food("Jollof Rice", 250_000);
        let suya = food("Suya", 150_000);
        catalog.insert_food(rice.clone()).await;
        catalog.insert_food(suya.clone()).await;

        let mut cart = Cart::default();
        cart.add(rice.id, 2, CartLimits::default()).unwrap();
        cart.add(suya.id, 1, CartLimits::default()).unwrap();

        catalog.set_price(rice.id, 300_000).await;
        let draft = draft_from_cart(&catalog, &cart, 50_000).await.unwrap();

        assert_eq!(draft.subtotal, 2 * 300_000 + 150_000);
        assert_eq!(draft.total_amount, draft.subtotal + 50_000);
        assert!(draft.unavailable.is_empty());
    }

    #[tokio::test]
    async fn test_draft_reports_unavailable_lines() {
        let catalog = InMemoryCatalog::new();
        let rice = food("Jollof Rice", 250_000);
        catalog.insert_food(rice.clone()).await;
        let gone = Uuid::now_v7();

        let mut cart = Cart::default();
        cart.add(rice.id, 1, CartLimits::default()).unwrap();
        cart.add(gone, 1, CartLimits::default()).unwrap();

        let draft = draft_from_cart(&catalog, &cart, 0).await.unwrap();
        assert_eq!(draft.line_items.len(), 1);
        assert_eq!(draft.unavailable, vec![gone]);
    }

    #[tokio::test]
    async fn test_empty_draft_has_no_delivery_fee() {
        let catalog = InMemoryCatalog::new();
        let draft = draft_from_cart(&catalog, &Cart::default(), 50_000).await.unwrap();
        assert!(draft.is_empty());
        assert_eq!(draft.total_amount, 0);
    }

    #[test]
    fn test_identifiers_are_prefixed() {
        let number = generate_order_number(Utc::now());
        assert!(number.starts_with("ORD"));
        assert!(number[3..].chars().all(|c| c.is_ascii_digit()));
        let reference = payment_reference_for("0193a1b2c3-4");
        assert_eq!(reference, "FB_0193a1b2c3-4");
    }
}
