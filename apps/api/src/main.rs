use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::services::{calendar_from_config, notifier_from_config};
use shared_config::AppConfig;
use shared_database::{BookingStore, InMemoryBookingStore, SupabaseBookingStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting booking API server");

    // Load configuration
    let config = Arc::new(AppConfig::from_env());

    let store: Arc<dyn BookingStore> = if config.is_storage_configured() {
        info!("Using PostgREST storage at {}", config.supabase_url);
        Arc::new(SupabaseBookingStore::new(&config))
    } else {
        info!("Using in-memory storage; data is lost on restart");
        Arc::new(InMemoryBookingStore::new())
    };

    let services = router::Services {
        store,
        notifier: notifier_from_config(&config),
        calendar: calendar_from_config(&config),
        config: config.clone(),
    };

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(services)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server terminated")?;
    Ok(())
}
