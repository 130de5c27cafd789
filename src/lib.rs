pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod queries;
pub mod repository;
pub mod services;
pub mod state;
pub mod utils;
pub mod workers;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use database::{DbConn, DbPool};
pub use error::{Error, Result};
pub use state::AppState;

use handlers::{
    get_order, health_check, payment_status, paystack_callback, paystack_webhook,
    receive_messages, update_order_status, verify_subscription,
};
use repository::{
    CatalogRepository, InMemoryCatalog, InMemoryStore, OrderRepository, PaymentRepository,
    PgStore, SessionRepository,
};
use services::conversation::ConversationSettings;
use services::messaging::Messenger;
use services::payments::{PaymentGateway, PaymentSettings};
use services::{ConversationService, OrderService, PaymentService};

/// Load configuration from environment variables
pub fn load_config() -> std::result::Result<Config, Box<dyn std::error::Error>> {
    Ok(Config::load()?)
}

/// The storage capabilities the services are built on.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub orders: Arc<dyn OrderRepository>,
}

impl Storage {
    /// Everything in process memory; state is lost on restart.
    pub fn in_memory(store: Arc<InMemoryStore>, catalog: Arc<InMemoryCatalog>) -> Self {
        Self {
            sessions: store.clone(),
            catalog,
            payments: store.clone(),
            orders: store,
        }
    }

    pub fn postgres(store: Arc<PgStore>) -> Self {
        Self {
            sessions: store.clone(),
            catalog: store.clone(),
            payments: store.clone(),
            orders: store,
        }
    }
}

/// Wires the services together.
pub fn build_state(
    config: Config,
    storage: &Storage,
    gateway: Arc<dyn PaymentGateway>,
    messenger: Arc<dyn Messenger>,
) -> AppState {
    let payments = Arc::new(PaymentService::new(
        gateway,
        storage.payments.clone(),
        storage.orders.clone(),
        storage.catalog.clone(),
        PaymentSettings::from_config(&config),
    ));
    let conversation = Arc::new(ConversationService::new(
        storage.sessions.clone(),
        storage.catalog.clone(),
        payments.clone(),
        messenger.clone(),
        ConversationSettings::from_config(&config.conversation),
    ));
    let orders = Arc::new(OrderService::new(
        storage.orders.clone(),
        storage.catalog.clone(),
        messenger,
    ));

    AppState::new(config, conversation, payments, orders)
}

/// Builds the HTTP router.
///
/// - `/api/v1`: health, payment webhook/callback/status, orders
/// - `/webhooks/whatsapp`: subscription handshake and inbound messages
pub fn build_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/payments/paystack/webhook", post(paystack_webhook))
        .route("/payments/paystack/callback", get(paystack_callback))
        .route("/payments/{reference}/status", get(payment_status))
        .route("/orders/{order_number}", get(get_order))
        .route("/orders/{order_number}/status", patch(update_order_status));

    let webhook_routes = Router::new().route(
        "/whatsapp",
        get(verify_subscription).post(receive_messages),
    );

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/webhooks", webhook_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
