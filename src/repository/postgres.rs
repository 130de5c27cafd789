//! Postgres-backed repositories delegating to [`crate::queries`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{CatalogRepository, OrderRepository, PaymentRepository, SessionRepository};
use crate::{
    database::DbPool,
    error::{Error, Result},
    models::{
        Category, FoodItem, NewOrder, NewPendingPayment, Order, OrderStatus, PendingPayment,
        PendingPaymentStatus, Session,
    },
    queries,
};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>> {
        self.pool.acquire().await.map_err(Error::Sqlx)
    }
}

#[async_trait]
impl SessionRepository for PgStore {
    async fn find(&self, identifier: &str) -> Result<Option<Session>> {
        let mut conn = self.conn().await?;
        queries::sessions::get_session_by_identifier(&mut conn, identifier).await
    }

    async fn create(&self, session: Session) -> Result<Session> {
        let mut conn = self.conn().await?;
        if let Some(created) = queries::sessions::insert_session(&mut conn, &session).await? {
            return Ok(created);
        }
        queries::sessions::get_session_by_identifier(&mut conn, &session.identifier)
            .await?
            .ok_or_else(|| {
                Error::Internal(format!(
                    "Session {} vanished during create",
                    session.identifier
                ))
            })
    }

    async fn save(&self, session: &Session) -> Result<Session> {
        let mut conn = self.conn().await?;
        queries::sessions::update_session_if_version(&mut conn, session)
            .await?
            .ok_or_else(|| {
                Error::Conflict(format!(
                    "Session {} was modified concurrently",
                    session.identifier
                ))
            })
    }

    async fn delete_idle(&self, idle_before: DateTime<Utc>) -> Result<u64> {
        let mut conn = self.conn().await?;
        queries::sessions::delete_idle_sessions(&mut conn, idle_before).await
    }
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn active_categories(&self) -> Result<Vec<Category>> {
        let mut conn = self.conn().await?;
        queries::catalog::list_active_categories(&mut conn).await
    }

    async fn category(&self, id: Uuid) -> Result<Option<Category>> {
        let mut conn = self.conn().await?;
        queries::catalog::get_category_by_id(&mut conn, id).await
    }

    async fn food(&self, id: Uuid) -> Result<Option<FoodItem>> {
        let mut conn = self.conn().await?;
        queries::catalog::get_food_by_id(&mut conn, id).await
    }

    async fn search_foods(&self, query: &str, limit: usize) -> Result<Vec<FoodItem>> {
        let mut conn = self.conn().await?;
        queries::catalog::search_available_foods(&mut conn, query, limit as i64).await
    }

    async fn foods_in_category(&self, category_id: Uuid, limit: usize) -> Result<Vec<FoodItem>> {
        let mut conn = self.conn().await?;
        queries::catalog::list_available_foods_in_category(&mut conn, category_id, limit as i64)
            .await
    }
}

#[async_trait]
impl PaymentRepository for PgStore {
    async fn insert_pending_payment(&self, payment: NewPendingPayment) -> Result<PendingPayment> {
        let mut conn = self.conn().await?;
        queries::payments::create_pending_payment(&mut conn, payment).await
    }

    async fn pending_payment(&self, reference: &str) -> Result<Option<PendingPayment>> {
        let mut conn = self.conn().await?;
        queries::payments::get_pending_payment_by_reference(&mut conn, reference).await
    }

    async fn attach_payment_url(&self, reference: &str, payment_url: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        if queries::payments::set_payment_url(&mut conn, reference, payment_url).await? {
            Ok(())
        } else {
            Err(Error::NotFound(format!("Pending payment {reference} not found")))
        }
    }

    async fn claim_pending_payment(
        &self,
        reference: &str,
        stale_before: DateTime<Utc>,
    ) -> Result<Option<PendingPayment>> {
        let mut conn = self.conn().await?;
        queries::payments::claim_pending_payment(&mut conn, reference, stale_before).await
    }

    async fn transition_pending_payment(
        &self,
        reference: &str,
        from: &[PendingPaymentStatus],
        to: PendingPaymentStatus,
    ) -> Result<bool> {
        let mut conn = self.conn().await?;
        queries::payments::transition_pending_payment(&mut conn, reference, from, to).await
    }

    async fn expire_pending_payments(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut conn = self.conn().await?;
        queries::payments::expire_pending_payments(&mut conn, now).await
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        let mut conn = self.conn().await?;
        queries::orders::create_order(&mut conn, order).await
    }

    async fn order_by_number(&self, order_number: &str) -> Result<Option<Order>> {
        let mut conn = self.conn().await?;
        queries::orders::get_order_by_number(&mut conn, order_number).await
    }

    async fn order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>> {
        let mut conn = self.conn().await?;
        queries::orders::get_order_by_payment_reference(&mut conn, reference).await
    }

    async fn order_by_checkout_key(&self, checkout_key: &str) -> Result<Option<Order>> {
        let mut conn = self.conn().await?;
        queries::orders::get_order_by_checkout_key(&mut conn, checkout_key).await
    }

    async fn update_order_status(
        &self,
        order_number: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>> {
        let mut conn = self.conn().await?;
        queries::orders::update_order_status(&mut conn, order_number, status).await
    }
}
