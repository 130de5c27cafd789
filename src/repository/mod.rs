//! Storage capabilities injected into the services.
//!
//! Each trait has an in-memory implementation ([`memory`]) used by tests and
//! local development, and a Postgres implementation ([`postgres`]) built on
//! the raw queries in [`crate::queries`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Category, FoodItem, NewOrder, NewPendingPayment, Order, OrderStatus, PendingPayment,
    PendingPaymentStatus, Session,
};

pub use memory::{InMemoryCatalog, InMemoryStore};
pub use postgres::PgStore;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find(&self, identifier: &str) -> Result<Option<Session>>;

    /// Inserts `session`, or returns the already stored one if a concurrent
    /// writer created it first. Never produces two sessions per identifier.
    async fn create(&self, session: Session) -> Result<Session>;

    /// Version-checked write. Fails with `Error::Conflict` when the stored
    /// version differs from `session.version`; returns the stored copy with
    /// its version bumped on success.
    async fn save(&self, session: &Session) -> Result<Session>;

    /// Deletes sessions idle since before `idle_before`.
    async fn delete_idle(&self, idle_before: DateTime<Utc>) -> Result<u64>;
}

/// Read-only catalog lookups.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn active_categories(&self) -> Result<Vec<Category>>;

    async fn category(&self, id: Uuid) -> Result<Option<Category>>;

    /// Any food item by id, available or not.
    async fn food(&self, id: Uuid) -> Result<Option<FoodItem>>;

    /// Available items matching `query` in name, description or tags.
    async fn search_foods(&self, query: &str, limit: usize) -> Result<Vec<FoodItem>>;

    /// Available items in a category.
    async fn foods_in_category(&self, category_id: Uuid, limit: usize) -> Result<Vec<FoodItem>>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert_pending_payment(&self, payment: NewPendingPayment) -> Result<PendingPayment>;

    async fn pending_payment(&self, reference: &str) -> Result<Option<PendingPayment>>;

    async fn attach_payment_url(&self, reference: &str, payment_url: &str) -> Result<()>;

    /// Atomically moves a payment to `processing` for promotion.
    ///
    /// Succeeds from `pending`, `expired` or `failed` (a gateway success outranks
    /// earlier verdicts), or from a `processing` claim taken before
    /// `stale_before`. Returns `None` when another worker holds the claim or
    /// the payment is already `paid` or `cancelled`.
    async fn claim_pending_payment(
        &self,
        reference: &str,
        stale_before: DateTime<Utc>,
    ) -> Result<Option<PendingPayment>>;

    /// Sets the status when the current one is in `from`. Returns whether it changed.
    async fn transition_pending_payment(
        &self,
        reference: &str,
        from: &[PendingPaymentStatus],
        to: PendingPaymentStatus,
    ) -> Result<bool>;

    /// Marks `pending` payments whose window closed before `now` as `expired`.
    async fn expire_pending_payments(&self, now: DateTime<Utc>) -> Result<u64>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Fails with `Error::Conflict` if the order number, payment reference or
    /// checkout key exists.
    async fn insert_order(&self, order: NewOrder) -> Result<Order>;

    async fn order_by_number(&self, order_number: &str) -> Result<Option<Order>>;

    async fn order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>>;

    async fn order_by_checkout_key(&self, checkout_key: &str) -> Result<Option<Order>>;

    async fn update_order_status(
        &self,
        order_number: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>>;
}
