//! Checkout, payment confirmation and promotion.
//!
//! Promotion turns a paid [`PendingPayment`] into an [`Order`] exactly once.
//! Two guards make that hold across the webhook and the customer's own
//! "confirm payment" poll, in-process or across instances:
//!
//! 1. an atomic claim (`pending` → `processing`) that only one caller wins;
//! 2. the unique `payment_reference` on orders, which turns a duplicate insert
//!    into `Error::Conflict` and an "already promoted" outcome.

pub mod gateway;
pub mod mock;
pub mod paystack;
pub mod signature;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::config::{CheckoutMode, Config};
use crate::error::{Error, Result};
use crate::models::{
    NewOrder, NewPendingPayment, Order, OrderPaymentStatus, OrderStatus, PaymentDetails,
    PaymentMethod, PendingPayment, PendingPaymentStatus, Session,
};
use crate::repository::{CatalogRepository, OrderRepository, PaymentRepository};
use crate::services::orders::{self, OrderDraft};

pub use gateway::{GatewayStatus, PaymentGateway, PaymentLink, PaymentRequest, Verification};
pub use mock::MockGateway;
pub use paystack::PaystackGateway;

/// Tunables for checkout and promotion.
#[derive(Debug, Clone)]
pub struct PaymentSettings {
    pub checkout_mode: CheckoutMode,
    pub delivery_fee: i64,
    pub payment_window: chrono::Duration,
    pub claim_timeout: chrono::Duration,
    pub gateway_timeout: Duration,
}

impl PaymentSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            checkout_mode: config.conversation.checkout_mode,
            delivery_fee: config.conversation.delivery_fee,
            payment_window: chrono::Duration::minutes(config.workers.payment_window_minutes),
            claim_timeout: chrono::Duration::seconds(config.workers.claim_timeout_secs),
            gateway_timeout: config.paystack.timeout(),
        }
    }
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Result of submitting a delivery address.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// A pending payment exists and the customer has a link to pay.
    AwaitingPayment {
        payment: PendingPayment,
        pay_url: String,
    },
    /// Cash on delivery: the order was created directly.
    CashOrder(Order),
    EmptyCart,
    /// Some cart items are gone or unavailable; nothing was created.
    Unavailable { food_ids: Vec<Uuid>, draft: OrderDraft },
}

/// Result of a promotion attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Promotion {
    /// This call created the order.
    Created(Order),
    /// An order already exists for the reference.
    AlreadyPromoted(Option<Order>),
    /// Another caller holds the claim right now.
    InProgress,
    /// The payment was cancelled and will not be promoted.
    Rejected(PendingPaymentStatus),
    NotFound,
}

impl Promotion {
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::Created(order) | Self::AlreadyPromoted(Some(order)) => Some(order),
            _ => None,
        }
    }

    /// True once an order exists for the reference, whoever created it.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Created(_) | Self::AlreadyPromoted(_))
    }
}

/// Result of checking a payment with the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    Paid(Promotion),
    Pending,
    Failed,
    Expired,
    Unknown,
}

pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
    payments: Arc<dyn PaymentRepository>,
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn CatalogRepository>,
    settings: PaymentSettings,
}

impl PaymentService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        payments: Arc<dyn PaymentRepository>,
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn CatalogRepository>,
        settings: PaymentSettings,
    ) -> Self {
        Self {
            gateway,
            payments,
            orders,
            catalog,
            settings,
        }
    }

    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.gateway.as_ref()
    }

    pub fn checkout_mode(&self) -> CheckoutMode {
        self.settings.checkout_mode
    }

    pub async fn pending_payment(&self, reference: &str) -> Result<Option<PendingPayment>> {
        self.payments.pending_payment(reference).await
    }

    /// Bounds a gateway call by the configured timeout.
    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.settings.gateway_timeout, call)
            .await
            .map_err(|_| {
                Error::Gateway(format!(
                    "{} did not answer within {:?}",
                    self.gateway.name(),
                    self.settings.gateway_timeout
                ))
            })?
    }

    /// Turns the session's cart and `address` into a pending payment (or a
    /// cash order) priced at current catalog prices.
    ///
    /// Records are keyed by [`Session::checkout_key`]. Retrying an attempt
    /// whose session save failed returns the order or payment link created
    /// the first time instead of a second one.
    pub async fn checkout(&self, session: &Session, address: &str) -> Result<CheckoutOutcome> {
        let draft =
            orders::draft_from_cart(self.catalog.as_ref(), &session.cart, self.settings.delivery_fee)
                .await?;

        if !draft.unavailable.is_empty() {
            return Ok(CheckoutOutcome::Unavailable {
                food_ids: draft.unavailable.clone(),
                draft,
            });
        }
        if draft.is_empty() {
            return Ok(CheckoutOutcome::EmptyCart);
        }

        let now = Utc::now();
        let order_number = orders::generate_order_number(now);
        let checkout_key = session.checkout_key();

        if self.settings.checkout_mode == CheckoutMode::Cash {
            let inserted = self
                .orders
                .insert_order(NewOrder {
                    order_number,
                    customer_identifier: session.identifier.clone(),
                    customer_name: session.display_name.clone(),
                    line_items: draft.line_items,
                    subtotal: draft.subtotal,
                    delivery_fee: draft.delivery_fee,
                    total_amount: draft.total_amount,
                    delivery_address: address.to_string(),
                    status: OrderStatus::Pending,
                    payment_method: PaymentMethod::Cash,
                    payment_reference: None,
                    payment_status: OrderPaymentStatus::Pending,
                    payment_details: None,
                    checkout_key: Some(checkout_key.clone()),
                })
                .await;

            let order = match inserted {
                Ok(order) => {
                    tracing::info!(
                        identifier = %session.identifier,
                        order_number = %order.order_number,
                        "Cash on delivery order created"
                    );
                    order
                }
                // The attempt already placed its order but the session was never saved
                Err(Error::Conflict(message)) => {
                    let existing = self.orders.order_by_checkout_key(&checkout_key).await?;
                    let Some(order) = existing else {
                        return Err(Error::Conflict(message));
                    };
                    tracing::info!(
                        identifier = %session.identifier,
                        order_number = %order.order_number,
                        "Cash order already placed for this checkout"
                    );
                    order
                }
                Err(e) => return Err(e),
            };
            return Ok(CheckoutOutcome::CashOrder(order));
        }

        let reference = orders::payment_reference_for(&checkout_key);
        let inserted = self
            .payments
            .insert_pending_payment(NewPendingPayment {
                reference: reference.clone(),
                order_number,
                customer_identifier: session.identifier.clone(),
                customer_name: session.display_name.clone(),
                line_items: draft.line_items,
                subtotal: draft.subtotal,
                delivery_fee: draft.delivery_fee,
                total_amount: draft.total_amount,
                delivery_address: address.to_string(),
                expires_at: now + self.settings.payment_window,
            })
            .await;

        let payment = match inserted {
            Ok(payment) => payment,
            Err(Error::Conflict(message)) => {
                let Some(existing) = self.payments.pending_payment(&reference).await? else {
                    return Err(Error::Conflict(message));
                };
                if let Some(pay_url) = existing.payment_url.clone() {
                    tracing::info!(
                        identifier = %session.identifier,
                        reference = %reference,
                        "Reusing the pending payment of an unsaved checkout"
                    );
                    return Ok(CheckoutOutcome::AwaitingPayment {
                        payment: existing,
                        pay_url,
                    });
                }
                existing
            }
            Err(e) => return Err(e),
        };

        let request = PaymentRequest {
            reference: payment.reference.clone(),
            order_number: payment.order_number.clone(),
            customer_identifier: payment.customer_identifier.clone(),
            customer_name: payment.customer_name.clone(),
            total_amount: payment.total_amount,
        };

        // On failure the pending payment stays `pending` and simply expires
        let link = self.bounded(self.gateway.create_payment(&request)).await?;
        self.payments
            .attach_payment_url(&payment.reference, &link.pay_url)
            .await?;

        tracing::info!(
            identifier = %session.identifier,
            reference = %payment.reference,
            total = payment.total_amount,
            "Pending payment created"
        );

        Ok(CheckoutOutcome::AwaitingPayment {
            payment: PendingPayment {
                payment_url: Some(link.pay_url.clone()),
                ..payment
            },
            pay_url: link.pay_url,
        })
    }

    /// Customer-initiated check: verify with the gateway, promote on success.
    pub async fn confirm(&self, reference: &str) -> Result<ConfirmOutcome> {
        let Some(payment) = self.payments.pending_payment(reference).await? else {
            return Ok(ConfirmOutcome::Unknown);
        };

        if payment.status == PendingPaymentStatus::Paid {
            let order = self.orders.order_by_payment_reference(reference).await?;
            return Ok(ConfirmOutcome::Paid(Promotion::AlreadyPromoted(order)));
        }

        let verification = self.bounded(self.gateway.verify_payment(reference)).await?;
        tracing::info!(
            reference = %reference,
            status = %verification.status,
            "Payment verified with gateway"
        );

        match verification.status {
            GatewayStatus::Success => Ok(ConfirmOutcome::Paid(
                self.promote(reference, Some(verification.details)).await?,
            )),
            GatewayStatus::Fail => {
                self.record_failure(reference).await?;
                Ok(ConfirmOutcome::Failed)
            }
            GatewayStatus::Pending => {
                if payment.status == PendingPaymentStatus::Expired || payment.expires_at < Utc::now() {
                    Ok(ConfirmOutcome::Expired)
                } else {
                    Ok(ConfirmOutcome::Pending)
                }
            }
        }
    }

    /// Promotes a paid pending payment to an order, at most once per reference.
    pub async fn promote(
        &self,
        reference: &str,
        details: Option<PaymentDetails>,
    ) -> Result<Promotion> {
        let stale_before = Utc::now() - self.settings.claim_timeout;
        let Some(payment) = self
            .payments
            .claim_pending_payment(reference, stale_before)
            .await?
        else {
            return self.unclaimed_outcome(reference).await;
        };

        // A crash after inserting the order but before marking the payment
        // paid leaves an order behind; finish the job instead of duplicating.
        if let Some(existing) = self.orders.order_by_payment_reference(reference).await? {
            self.mark_paid(reference).await?;
            return Ok(Promotion::AlreadyPromoted(Some(existing)));
        }

        let new_order = NewOrder {
            order_number: payment.order_number.clone(),
            customer_identifier: payment.customer_identifier.clone(),
            customer_name: payment.customer_name.clone(),
            line_items: payment.line_items.clone(),
            subtotal: payment.subtotal,
            delivery_fee: payment.delivery_fee,
            total_amount: payment.total_amount,
            delivery_address: payment.delivery_address.clone(),
            status: OrderStatus::Confirmed,
            payment_method: PaymentMethod::Paystack,
            payment_reference: Some(reference.to_string()),
            payment_status: OrderPaymentStatus::Paid,
            payment_details: details,
            checkout_key: None,
        };

        match self.orders.insert_order(new_order).await {
            Ok(order) => {
                self.mark_paid(reference).await?;
                tracing::info!(
                    reference = %reference,
                    order_number = %order.order_number,
                    "Pending payment promoted to order"
                );
                Ok(Promotion::Created(order))
            }
            Err(Error::Conflict(_)) => {
                self.mark_paid(reference).await?;
                let order = self.orders.order_by_payment_reference(reference).await?;
                Ok(Promotion::AlreadyPromoted(order))
            }
            Err(e) => {
                // Release the claim so a retry can promote
                if let Err(release_error) = self
                    .payments
                    .transition_pending_payment(
                        reference,
                        &[PendingPaymentStatus::Processing],
                        PendingPaymentStatus::Pending,
                    )
                    .await
                {
                    tracing::error!(
                        reference = %reference,
                        error = %release_error,
                        "Failed to release payment claim"
                    );
                }
                Err(e)
            }
        }
    }

    /// Marks a still-pending payment as failed. Returns whether it changed.
    pub async fn record_failure(&self, reference: &str) -> Result<bool> {
        let changed = self
            .payments
            .transition_pending_payment(
                reference,
                &[PendingPaymentStatus::Pending],
                PendingPaymentStatus::Failed,
            )
            .await?;
        if changed {
            tracing::info!(reference = %reference, "Pending payment marked failed");
        }
        Ok(changed)
    }

    async fn mark_paid(&self, reference: &str) -> Result<()> {
        self.payments
            .transition_pending_payment(
                reference,
                &[PendingPaymentStatus::Processing],
                PendingPaymentStatus::Paid,
            )
            .await?;
        Ok(())
    }

    async fn unclaimed_outcome(&self, reference: &str) -> Result<Promotion> {
        let Some(payment) = self.payments.pending_payment(reference).await? else {
            return Ok(Promotion::NotFound);
        };
        match payment.status {
            PendingPaymentStatus::Paid => Ok(Promotion::AlreadyPromoted(
                self.orders.order_by_payment_reference(reference).await?,
            )),
            PendingPaymentStatus::Processing => Ok(Promotion::InProgress),
            status => Ok(Promotion::Rejected(status)),
        }
    }
}
