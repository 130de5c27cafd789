//! In-memory storage backed by `scc` concurrent maps.
//!
//! Every mutation goes through a single-entry atomic operation
//! (`insert_async`, `update_async`), so the guarantees match the Postgres
//! implementation: one session per identifier, version-checked saves, an
//! atomic payment claim and unique payment references and checkout keys
//! on orders.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CatalogRepository, OrderRepository, PaymentRepository, SessionRepository};
use crate::error::{Error, Result};
use crate::models::{
    Category, FoodItem, NewOrder, NewPendingPayment, Order, OrderStatus, PendingPayment,
    PendingPaymentStatus, Restaurant, Session,
};

/// Sessions, pending payments and orders.
#[derive(Default)]
pub struct InMemoryStore {
    sessions: scc::HashMap<String, Session>,
    payments: scc::HashMap<String, PendingPayment>,
    orders: scc::HashMap<String, Order>,
    /// payment reference → order number; doubles as the uniqueness guard.
    orders_by_reference: scc::HashMap<String, String>,
    /// checkout key → order number, same role for cash orders.
    orders_by_checkout_key: scc::HashMap<String, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    async fn release_reference(&self, order: &Order) {
        if let Some(reference) = &order.payment_reference {
            self.orders_by_reference.remove_async(reference).await;
        }
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn find(&self, identifier: &str) -> Result<Option<Session>> {
        Ok(self
            .sessions
            .read_async(identifier, |_, session| session.clone())
            .await)
    }

    async fn create(&self, session: Session) -> Result<Session> {
        match self
            .sessions
            .insert_async(session.identifier.clone(), session.clone())
            .await
        {
            Ok(()) => Ok(session),
            Err((identifier, _)) => self
                .sessions
                .read_async(&identifier, |_, existing| existing.clone())
                .await
                .ok_or_else(|| Error::Internal(format!("Session {identifier} vanished during create"))),
        }
    }

    async fn save(&self, session: &Session) -> Result<Session> {
        let outcome = self
            .sessions
            .update_async(&session.identifier, |_, stored| {
                if stored.version != session.version {
                    return Err(Error::Conflict(format!(
                        "Session {} was modified concurrently",
                        session.identifier
                    )));
                }
                let mut next = session.clone();
                next.version = stored.version + 1;
                next.updated_at = Utc::now();
                *stored = next.clone();
                Ok(next)
            })
            .await;

        outcome.unwrap_or_else(|| {
            Err(Error::NotFound(format!(
                "Session {} not found",
                session.identifier
            )))
        })
    }

    async fn delete_idle(&self, idle_before: DateTime<Utc>) -> Result<u64> {
        let mut removed = 0u64;
        self.sessions
            .retain_async(|_, session| {
                let keep = session.last_activity_at >= idle_before;
                if !keep {
                    removed += 1;
                }
                keep
            })
            .await;
        Ok(removed)
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn insert_pending_payment(&self, payment: NewPendingPayment) -> Result<PendingPayment> {
        let payment = payment.into_pending_payment(Utc::now());
        self.payments
            .insert_async(payment.reference.clone(), payment.clone())
            .await
            .map_err(|(reference, _)| {
                Error::Conflict(format!("Payment reference {reference} already exists"))
            })?;
        Ok(payment)
    }

    async fn pending_payment(&self, reference: &str) -> Result<Option<PendingPayment>> {
        Ok(self
            .payments
            .read_async(reference, |_, payment| payment.clone())
            .await)
    }

    async fn attach_payment_url(&self, reference: &str, payment_url: &str) -> Result<()> {
        self.payments
            .update_async(reference, |_, payment| {
                payment.payment_url = Some(payment_url.to_string());
                payment.updated_at = Utc::now();
            })
            .await
            .ok_or_else(|| Error::NotFound(format!("Pending payment {reference} not found")))
    }

    async fn claim_pending_payment(
        &self,
        reference: &str,
        stale_before: DateTime<Utc>,
    ) -> Result<Option<PendingPayment>> {
        let claimed = self
            .payments
            .update_async(reference, |_, payment| {
                let claimable = match payment.status {
                    PendingPaymentStatus::Pending
                    | PendingPaymentStatus::Expired
                    | PendingPaymentStatus::Failed => true,
                    PendingPaymentStatus::Processing => payment
                        .claimed_at
                        .is_some_and(|claimed_at| claimed_at < stale_before),
                    _ => false,
                };
                if !claimable {
                    return None;
                }
                let now = Utc::now();
                payment.status = PendingPaymentStatus::Processing;
                payment.claimed_at = Some(now);
                payment.updated_at = now;
                Some(payment.clone())
            })
            .await;
        Ok(claimed.flatten())
    }

    async fn transition_pending_payment(
        &self,
        reference: &str,
        from: &[PendingPaymentStatus],
        to: PendingPaymentStatus,
    ) -> Result<bool> {
        let changed = self
            .payments
            .update_async(reference, |_, payment| {
                if !from.contains(&payment.status) {
                    return false;
                }
                payment.status = to;
                payment.updated_at = Utc::now();
                true
            })
            .await;
        Ok(changed.unwrap_or(false))
    }

    async fn expire_pending_payments(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut expired = 0u64;
        self.payments
            .retain_async(|_, payment| {
                if payment.status == PendingPaymentStatus::Pending && payment.expires_at < now {
                    payment.status = PendingPaymentStatus::Expired;
                    payment.updated_at = now;
                    expired += 1;
                }
                true
            })
            .await;
        Ok(expired)
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        let order = order.into_order(Utc::now());

        if let Some(reference) = &order.payment_reference {
            self.orders_by_reference
                .insert_async(reference.clone(), order.order_number.clone())
                .await
                .map_err(|(reference, _)| {
                    Error::Conflict(format!("An order for payment {reference} already exists"))
                })?;
        }

        if let Some(key) = &order.checkout_key {
            if let Err((key, _)) = self
                .orders_by_checkout_key
                .insert_async(key.clone(), order.order_number.clone())
                .await
            {
                self.release_reference(&order).await;
                return Err(Error::Conflict(format!(
                    "An order for checkout {key} already exists"
                )));
            }
        }

        if let Err((order_number, order)) = self
            .orders
            .insert_async(order.order_number.clone(), order.clone())
            .await
        {
            self.release_reference(&order).await;
            if let Some(key) = &order.checkout_key {
                self.orders_by_checkout_key.remove_async(key).await;
            }
            return Err(Error::Conflict(format!(
                "Order number {order_number} already exists"
            )));
        }

        Ok(order)
    }

    async fn order_by_number(&self, order_number: &str) -> Result<Option<Order>> {
        Ok(self
            .orders
            .read_async(order_number, |_, order| order.clone())
            .await)
    }

    async fn order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>> {
        let Some(order_number) = self
            .orders_by_reference
            .read_async(reference, |_, number| number.clone())
            .await
        else {
            return Ok(None);
        };
        self.order_by_number(&order_number).await
    }

    async fn order_by_checkout_key(&self, checkout_key: &str) -> Result<Option<Order>> {
        let Some(order_number) = self
            .orders_by_checkout_key
            .read_async(checkout_key, |_, number| number.clone())
            .await
        else {
            return Ok(None);
        };
        self.order_by_number(&order_number).await
    }

    async fn update_order_status(
        &self,
        order_number: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>> {
        Ok(self
            .orders
            .update_async(order_number, |_, order| {
                order.status = status;
                order.updated_at = Utc::now();
                order.clone()
            })
            .await)
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// YAML catalog layout used to seed [`InMemoryCatalog`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
    #[serde(default)]
    pub foods: Vec<FoodSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoodSeed {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub category_id: Uuid,
    pub restaurant_id: Uuid,
    #[serde(default = "default_preparation_time")]
    pub preparation_time: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_preparation_time() -> String {
    "20-30 mins".to_string()
}

fn default_available() -> bool {
    true
}

#[derive(Default)]
struct CatalogData {
    categories: Vec<Category>,
    foods: Vec<FoodItem>,
}

/// Catalog held in memory, in insertion order.
#[derive(Default)]
pub struct InMemoryCatalog {
    data: RwLock<CatalogData>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from a seed, resolving each food's restaurant.
    pub fn from_seed(seed: CatalogSeed) -> Result<Self> {
        let mut foods = Vec::with_capacity(seed.foods.len());
        for food in seed.foods {
            let restaurant = seed
                .restaurants
                .iter()
                .find(|r| r.id == food.restaurant_id)
                .ok_or_else(|| {
                    Error::Validation(format!(
                        "Food {} references unknown restaurant {}",
                        food.name, food.restaurant_id
                    ))
                })?;
            foods.push(FoodItem {
                id: food.id,
                name: food.name,
                description: food.description,
                price: food.price,
                category_id: food.category_id,
                restaurant_id: restaurant.id,
                restaurant_name: restaurant.name.clone(),
                delivery_time: restaurant.delivery_time.clone(),
                preparation_time: food.preparation_time,
                tags: food.tags,
                is_available: food.is_available && restaurant.is_active,
            });
        }

        Ok(Self {
            data: RwLock::new(CatalogData {
                categories: seed.categories,
                foods,
            }),
        })
    }

    /// Loads a YAML seed file.
    pub async fn load(path: &str) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Internal(format!("Failed to read catalog seed {path}: {e}")))?;
        let seed: CatalogSeed = serde_yaml::from_str(&raw)
            .map_err(|e| Error::Validation(format!("Invalid catalog seed {path}: {e}")))?;
        Self::from_seed(seed)
    }

    pub async fn insert_category(&self, category: Category) {
        self.data.write().await.categories.push(category);
    }

    pub async fn insert_food(&self, food: FoodItem) {
        self.data.write().await.foods.push(food);
    }

    pub async fn remove_food(&self, id: Uuid) {
        self.data.write().await.foods.retain(|food| food.id != id);
    }

    pub async fn set_price(&self, id: Uuid, price: i64) {
        let mut data = self.data.write().await;
        if let Some(food) = data.foods.iter_mut().find(|food| food.id == id) {
            food.price = price;
        }
    }

    pub async fn set_available(&self, id: Uuid, is_available: bool) {
        let mut data = self.data.write().await;
        if let Some(food) = data.foods.iter_mut().find(|food| food.id == id) {
            food.is_available = is_available;
        }
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn active_categories(&self) -> Result<Vec<Category>> {
        let data = self.data.read().await;
        Ok(data
            .categories
            .iter()
            .filter(|category| category.is_active)
            .cloned()
            .collect())
    }

    async fn category(&self, id: Uuid) -> Result<Option<Category>> {
        let data = self.data.read().await;
        Ok(data.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn food(&self, id: Uuid) -> Result<Option<FoodItem>> {
        let data = self.data.read().await;
        Ok(data.foods.iter().find(|food| food.id == id).cloned())
    }

    async fn search_foods(&self, query: &str, limit: usize) -> Result<Vec<FoodItem>> {
        let data = self.data.read().await;
        Ok(data
            .foods
            .iter()
            .filter(|food| food.is_available && food.matches(query))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn foods_in_category(&self, category_id: Uuid, limit: usize) -> Result<Vec<FoodItem>> {
        let data = self.data.read().await;
        Ok(data
            .foods
            .iter()
            .filter(|food| food.is_available && food.category_id == category_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
