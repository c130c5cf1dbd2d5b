//! Standalone worker process.
//!
//! Coordinates with the API process only through the durable store: its
//! local queue is fed exclusively by the pending sweep, so prompts get
//! processed even when the API process's own consumer is down. The
//! idempotency guard makes concurrent processing by both processes safe.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promptdeck_core::PromptService;
use promptdeck_db::PgPromptStore;
use promptdeck_events::{PromptQueue, QueueSettings};
use promptdeck_llm::client_from_env;
use promptdeck_worker::{PendingSweeper, PromptProcessor, WorkerConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promptdeck_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = promptdeck_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");

    promptdeck_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection established");

    // --- Pipeline wiring ---
    let store = Arc::new(PgPromptStore::new(pool));
    let service = PromptService::new(store);
    let llm = client_from_env();

    let (queue, consumer) = PromptQueue::new(QueueSettings::default());
    let processor = Arc::new(PromptProcessor::new(service.clone(), llm));
    let consumer_handle = tokio::spawn(consumer.run(processor));

    let sweep_cancel = CancellationToken::new();
    let sweeper = PendingSweeper::new(
        service,
        queue.clone(),
        config.sweep_interval,
        config.sweep_min_age,
    );
    let sweeper_handle = tokio::spawn(sweeper.run(sweep_cancel.clone()));

    tracing::info!(
        sweep_interval_secs = config.sweep_interval.as_secs(),
        sweep_min_age_secs = config.sweep_min_age.as_secs(),
        "Worker started",
    );

    shutdown_signal().await;

    // --- Graceful shutdown ---
    sweep_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweeper_handle).await;
    tracing::info!("Pending sweeper stopped");

    // Dropping the last publish handle closes the queue and lets the
    // consumer drain whatever is already buffered.
    drop(queue);
    let _ = tokio::time::timeout(Duration::from_secs(30), consumer_handle).await;
    tracing::info!("Consumer drained, shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
