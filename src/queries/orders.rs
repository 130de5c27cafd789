use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    DbConn,
    error::{Error, Result},
    models::{NewOrder, Order, OrderLineItem, OrderStatus, PaymentDetails},
};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    customer_identifier: String,
    customer_name: Option<String>,
    line_items: Json<Vec<OrderLineItem>>,
    subtotal: i64,
    delivery_fee: i64,
    total_amount: i64,
    delivery_address: String,
    status: String,
    payment_method: String,
    payment_reference: Option<String>,
    payment_status: String,
    payment_details: Option<Json<PaymentDetails>>,
    checkout_key: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_column<T: std::str::FromStr>(column: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Internal(format!("Unknown {column} '{value}'")))
}

impl TryFrom<OrderRow> for Order {
    type Error = Error;

    fn try_from(row: OrderRow) -> Result<Self> {
        Ok(Order {
            id: row.id,
            status: parse_column("order status", &row.status)?,
            payment_method: parse_column("payment method", &row.payment_method)?,
            payment_status: parse_column("payment status", &row.payment_status)?,
            order_number: row.order_number,
            customer_identifier: row.customer_identifier,
            customer_name: row.customer_name,
            line_items: row.line_items.0,
            subtotal: row.subtotal,
            delivery_fee: row.delivery_fee,
            total_amount: row.total_amount,
            delivery_address: row.delivery_address,
            payment_reference: row.payment_reference,
            payment_details: row.payment_details.map(|details| details.0),
            checkout_key: row.checkout_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, order_number, customer_identifier, customer_name, line_items, \
     subtotal, delivery_fee, total_amount, delivery_address, status, payment_method, \
     payment_reference, payment_status, payment_details, checkout_key, created_at, updated_at";

/// Creates an order. A duplicate order number, payment reference or checkout
/// key yields `Error::Conflict`.
pub async fn create_order(conn: &mut DbConn, order: NewOrder) -> Result<Order> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        INSERT INTO orders
            (id, order_number, customer_identifier, customer_name, line_items, subtotal,
             delivery_fee, total_amount, delivery_address, status, payment_method,
             payment_reference, payment_status, payment_details, checkout_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(Uuid::now_v7())
    .bind(&order.order_number)
    .bind(&order.customer_identifier)
    .bind(&order.customer_name)
    .bind(Json(&order.line_items))
    .bind(order.subtotal)
    .bind(order.delivery_fee)
    .bind(order.total_amount)
    .bind(&order.delivery_address)
    .bind(order.status.to_string())
    .bind(order.payment_method.to_string())
    .bind(&order.payment_reference)
    .bind(order.payment_status.to_string())
    .bind(order.payment_details.as_ref().map(Json))
    .bind(&order.checkout_key)
    .fetch_one(conn)
    .await
    .map_err(|e| super::conflict_or_sqlx(e, || {
        format!("Order {} already exists", order.order_number)
    }))?;

    Order::try_from(row)
}

pub async fn get_order_by_number(conn: &mut DbConn, order_number: &str) -> Result<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"
    ))
    .bind(order_number)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    row.map(Order::try_from).transpose()
}

pub async fn get_order_by_payment_reference(
    conn: &mut DbConn,
    reference: &str,
) -> Result<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_reference = $1"
    ))
    .bind(reference)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    row.map(Order::try_from).transpose()
}

pub async fn get_order_by_checkout_key(
    conn: &mut DbConn,
    checkout_key: &str,
) -> Result<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE checkout_key = $1"
    ))
    .bind(checkout_key)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    row.map(Order::try_from).transpose()
}

pub async fn update_order_status(
    conn: &mut DbConn,
    order_number: &str,
    status: OrderStatus,
) -> Result<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        UPDATE orders SET status = $2, updated_at = now()
        WHERE order_number = $1
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(order_number)
    .bind(status.to_string())
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    row.map(Order::try_from).transpose()
}
