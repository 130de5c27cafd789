use crate::repository::PaymentRepository;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

/// Background worker that expires pending payments past their window
///
/// Expired payments can still be promoted if the gateway later reports a
/// success; expiry only stops "confirm payment" from waiting on them.
pub async fn payment_expiry_worker(
    payments: Arc<dyn PaymentRepository>,
    every: Duration,
    mut shutdown_rx: tokio::sync::broadcast::Receiver<()>,
) {
    let mut expiry_interval = interval(every);
    info!(every_secs = every.as_secs(), "Payment expiry worker started");

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Payment expiry worker shutting down");
                break;
            }
            _ = expiry_interval.tick() => {
                expire_overdue_payments(payments.as_ref()).await;
            }
        }
    }

    info!("Payment expiry worker stopped");
}

/// One pass. Returns how many payments were expired.
pub async fn expire_overdue_payments(payments: &dyn PaymentRepository) -> u64 {
    match payments.expire_pending_payments(Utc::now()).await {
        Ok(count) => {
            if count > 0 {
                info!(count, "Expired overdue pending payments");
            }
            count
        }
        Err(e) => {
            warn!(error = %e, "Failed to expire pending payments");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewPendingPayment, PendingPaymentStatus};
    use crate::repository::InMemoryStore;

    fn payment(reference: &str, expires_in: chrono::Duration) -> NewPendingPayment {
        NewPendingPayment {
            reference: reference.to_string(),
            order_number: format!("ORD-{reference}"),
            customer_identifier: "2348000000001".to_string(),
            customer_name: None,
            line_items: Vec::new(),
            subtotal: 150_000,
            delivery_fee: 0,
            total_amount: 150_000,
            delivery_address: "12 Allen Avenue, Ikeja".to_string(),
            expires_at: Utc::now() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_expires_only_overdue_pending_payments() {
        let store = InMemoryStore::new();
        store
            .insert_pending_payment(payment("overdue", chrono::Duration::minutes(-5)))
            .await
            .unwrap();
        store
            .insert_pending_payment(payment("open", chrono::Duration::minutes(25)))
            .await
            .unwrap();

        assert_eq!(expire_overdue_payments(&store).await, 1);

        let overdue = store.pending_payment("overdue").await.unwrap().unwrap();
        let open = store.pending_payment("open").await.unwrap().unwrap();
        assert_eq!(overdue.status, PendingPaymentStatus::Expired);
        assert_eq!(open.status, PendingPaymentStatus::Pending);

        // A second pass finds nothing left to do
        assert_eq!(expire_overdue_payments(&store).await, 0);
    }
}
