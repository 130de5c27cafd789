use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    DbConn,
    error::{Error, Result},
    models::{NewPendingPayment, OrderLineItem, PendingPayment, PendingPaymentStatus},
};

#[derive(Debug, sqlx::FromRow)]
struct PendingPaymentRow {
    id: Uuid,
    reference: String,
    order_number: String,
    customer_identifier: String,
    customer_name: Option<String>,
    line_items: Json<Vec<OrderLineItem>>,
    subtotal: i64,
    delivery_fee: i64,
    total_amount: i64,
    delivery_address: String,
    payment_url: Option<String>,
    status: String,
    expires_at: DateTime<Utc>,
    claimed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PendingPaymentRow> for PendingPayment {
    type Error = Error;

    fn try_from(row: PendingPaymentRow) -> Result<Self> {
        let status = row.status.parse().map_err(|_| {
            Error::Internal(format!("Unknown pending payment status '{}'", row.status))
        })?;
        Ok(PendingPayment {
            id: row.id,
            reference: row.reference,
            order_number: row.order_number,
            customer_identifier: row.customer_identifier,
            customer_name: row.customer_name,
            line_items: row.line_items.0,
            subtotal: row.subtotal,
            delivery_fee: row.delivery_fee,
            total_amount: row.total_amount,
            delivery_address: row.delivery_address,
            payment_url: row.payment_url,
            status,
            expires_at: row.expires_at,
            claimed_at: row.claimed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PAYMENT_COLUMNS: &str = "id, reference, order_number, customer_identifier, customer_name, \
     line_items, subtotal, delivery_fee, total_amount, delivery_address, payment_url, status, \
     expires_at, claimed_at, created_at, updated_at";

/// Creates a pending payment. Fails with `Error::Conflict` on a duplicate reference.
pub async fn create_pending_payment(
    conn: &mut DbConn,
    payment: NewPendingPayment,
) -> Result<PendingPayment> {
    let row = sqlx::query_as::<_, PendingPaymentRow>(&format!(
        r#"
        INSERT INTO pending_payments
            (id, reference, order_number, customer_identifier, customer_name, line_items,
             subtotal, delivery_fee, total_amount, delivery_address, status, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending', $11)
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(Uuid::now_v7())
    .bind(&payment.reference)
    .bind(&payment.order_number)
    .bind(&payment.customer_identifier)
    .bind(&payment.customer_name)
    .bind(Json(&payment.line_items))
    .bind(payment.subtotal)
    .bind(payment.delivery_fee)
    .bind(payment.total_amount)
    .bind(&payment.delivery_address)
    .bind(payment.expires_at)
    .fetch_one(conn)
    .await
    .map_err(|e| super::conflict_or_sqlx(e, || {
        format!("Payment reference {} already exists", payment.reference)
    }))?;

    PendingPayment::try_from(row)
}

pub async fn get_pending_payment_by_reference(
    conn: &mut DbConn,
    reference: &str,
) -> Result<Option<PendingPayment>> {
    let row = sqlx::query_as::<_, PendingPaymentRow>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM pending_payments WHERE reference = $1"
    ))
    .bind(reference)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    row.map(PendingPayment::try_from).transpose()
}

/// Stores the gateway checkout URL. Returns false if the reference is unknown.
pub async fn set_payment_url(conn: &mut DbConn, reference: &str, payment_url: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE pending_payments SET payment_url = $2, updated_at = now() WHERE reference = $1",
    )
    .bind(reference)
    .bind(payment_url)
    .execute(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(result.rows_affected() == 1)
}

/// Atomically claims a pending payment for promotion.
///
/// The conditional UPDATE is the single serialization point between the
/// webhook and the customer's own confirmation: only one caller gets a row.
pub async fn claim_pending_payment(
    conn: &mut DbConn,
    reference: &str,
    stale_before: DateTime<Utc>,
) -> Result<Option<PendingPayment>> {
    let row = sqlx::query_as::<_, PendingPaymentRow>(&format!(
        r#"
        UPDATE pending_payments
        SET status = 'processing', claimed_at = now(), updated_at = now()
        WHERE reference = $1
          AND (status IN ('pending', 'expired', 'failed')
               OR (status = 'processing' AND claimed_at < $2))
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(reference)
    .bind(stale_before)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    row.map(PendingPayment::try_from).transpose()
}

/// Moves a payment to `to` if its current status is one of `from`.
pub async fn transition_pending_payment(
    conn: &mut DbConn,
    reference: &str,
    from: &[PendingPaymentStatus],
    to: PendingPaymentStatus,
) -> Result<bool> {
    let from: Vec<String> = from.iter().map(ToString::to_string).collect();
    let result = sqlx::query(
        r#"
        UPDATE pending_payments
        SET status = $3, updated_at = now()
        WHERE reference = $1 AND status = ANY($2)
        "#,
    )
    .bind(reference)
    .bind(&from)
    .bind(to.to_string())
    .execute(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(result.rows_affected() == 1)
}

/// Expires pending payments whose window has closed. Returns the count.
pub async fn expire_pending_payments(conn: &mut DbConn, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE pending_payments
        SET status = 'expired', updated_at = now()
        WHERE status = 'pending' AND expires_at < $1
        "#,
    )
    .bind(now)
    .execute(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(result.rows_affected())
}
