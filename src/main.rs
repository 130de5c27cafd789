use std::sync::Arc;
use std::time::Duration;

use foodbot::{
    Storage, build_app, build_state, database,
    config::StorageBackend,
    load_config,
    repository::{InMemoryCatalog, InMemoryStore, PgStore},
    services::messaging::{Messenger, RecordingMessenger, WhatsAppMessenger},
    services::payments::{MockGateway, PaymentGateway, PaystackGateway},
    workers::{payment_expiry_worker, session_cleanup_worker},
};
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foodbot=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config()?;
    tracing::info!("Loaded configuration:\n{}", config);

    // Storage
    let storage = match config.storage.backend {
        StorageBackend::Memory => {
            let catalog = match &config.storage.catalog_seed_path {
                Some(path) => InMemoryCatalog::load(path).await?,
                None => InMemoryCatalog::new(),
            };
            tracing::warn!("Using in-memory storage; sessions and orders are lost on restart");
            Storage::in_memory(Arc::new(InMemoryStore::new()), Arc::new(catalog))
        }
        StorageBackend::Postgres => {
            let pool = database::connect(&config.database).await?;
            Storage::postgres(Arc::new(PgStore::new(pool)))
        }
    };

    // Payment gateway
    let gateway: Arc<dyn PaymentGateway> =
        if config.paystack.secret_key.expose_secret().is_empty() {
            tracing::warn!("No Paystack secret key configured; using the mock gateway");
            Arc::new(MockGateway::new("mock-secret"))
        } else {
            Arc::new(PaystackGateway::new(&config.paystack)?)
        };

    // Messaging
    let messenger: Arc<dyn Messenger> =
        if config.whatsapp.access_token.expose_secret().is_empty() {
            tracing::warn!("No WhatsApp access token configured; outbound messages are only logged");
            Arc::new(RecordingMessenger::new())
        } else {
            Arc::new(WhatsAppMessenger::new(&config.whatsapp)?)
        };

    // Background workers
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let sweep_every = Duration::from_secs(config.workers.sweep_interval_secs);
    let workers = vec![
        tokio::spawn(session_cleanup_worker(
            storage.sessions.clone(),
            chrono::Duration::hours(config.workers.session_idle_hours),
            sweep_every,
            shutdown_tx.subscribe(),
        )),
        tokio::spawn(payment_expiry_worker(
            storage.payments.clone(),
            sweep_every,
            shutdown_tx.subscribe(),
        )),
    ];

    let bind_address = config.server.bind_address();
    let state = build_state(config, &storage, gateway, messenger);
    let app = build_app(state);

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %bind_address, "foodbot listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped; stopping workers");
    let _ = shutdown_tx.send(());
    futures::future::join_all(workers).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
