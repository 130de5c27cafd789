//! Order handlers
//!
//! Read an order and move it through its fulfilment statuses. Status changes
//! notify the customer over WhatsApp.

use axum::{
    Json,
    extract::{Path, State},
};
use crate::{
    error::Result,
    models::{Order, order::UpdateOrderStatusRequest},
    state::AppState,
};

/// GET /api/v1/orders/{order_number}
///
/// # HTTP Status Codes
/// - `200 OK`: Order found
/// - `404 NOT_FOUND`: No such order
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<Json<Order>> {
    let order = state.orders.get(&order_number).await?;
    Ok(Json(order))
}

/// PATCH /api/v1/orders/{order_number}/status
///
/// # Request Body
/// - `status`: `confirmed`, `preparing`, `ready`, `out_for_delivery`,
///   `delivered` or `cancelled`
///
/// # HTTP Status Codes
/// - `200 OK`: Status updated and customer notified
/// - `400 BAD_REQUEST`: Transition not allowed (order already final)
/// - `404 NOT_FOUND`: No such order
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Order>> {
    let order = state
        .orders
        .update_status(&order_number, request.status)
        .await?;
    Ok(Json(order))
}
