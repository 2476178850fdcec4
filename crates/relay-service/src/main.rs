//! Switchboard Relay Service
//!
//! Entry point for the session relay: account endpoints, room provisioning,
//! and the WebSocket fan-out engine.

use common::secret::ExposeSecret;
use credential::service::CredentialService;
use credential::signer::{AccessVerifier, TokenSigner};
use relay_service::actors::registry::RoomRegistry;
use relay_service::config::Config;
use relay_service::repositories::PgCredentialStore;
use relay_service::routes::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Switchboard Relay");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        access_ttl_seconds = config.access_ttl_seconds,
        "Configuration loaded successfully"
    );

    // Initialize database connection pool
    info!("Connecting to database...");
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(config.database_url.expose_secret())
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

    info!("Database connection established");

    // Root cancellation token; rooms and connections run under children of
    // it so a shutdown signal reaches every task.
    let cancel_token = CancellationToken::new();

    let signer = TokenSigner::new(&config.token_secret, config.access_ttl());
    let verifier: Arc<dyn AccessVerifier> = Arc::new(signer.clone());
    let store = Arc::new(PgCredentialStore::new(db_pool));
    let credentials = CredentialService::new(store, signer, config.renewal_ttl());
    let registry = RoomRegistry::new(cancel_token.clone());

    // Create application state
    let state = Arc::new(AppState {
        credentials,
        verifier,
        registry,
        public_ws_base: config.public_ws_base.clone(),
        cancel_token: cancel_token.clone(),
    });

    // Build application routes
    let app = routes::build_routes(state);

    // Parse bind address
    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Relay listening on {}", addr);

    // Start server with graceful shutdown support
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    info!("Relay shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT), then cancels the root
/// token so room actors and open connections wind down with the server.
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    cancel_token.cancel();
}
