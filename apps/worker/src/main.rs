use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loopcast_queue::{QueueClient, QueueName};
use loopcast_worker::config::Config;
use loopcast_worker::jobs::process::{handle_message, ProcessContext};
use loopcast_worker::repository::LoopStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loopcast_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing::info!("Starting Loopcast worker");

    let pool = PgPoolOptions::new()
        .max_connections(config.database().max_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database().connect_timeout_secs,
        ))
        .connect(&config.database().url)
        .await?;

    tracing::info!("Database connection established");

    let queue = QueueClient::connect(config.amqp().clone()).await;

    let ctx = Arc::new(ProcessContext {
        store: LoopStore::new(pool),
        queue: queue.clone(),
        storage: config.storage().clone(),
        job_timeout: config.job_timeout(),
    });

    let reconnect_delay = std::time::Duration::from_secs(config.amqp().reconnect_delay_secs);

    tracing::info!("Worker is running and waiting for messages");

    // Prefetch 1: one transcode+waveform+probe sequence runs to completion
    // before the next job is fetched
    loop {
        let handler_ctx = Arc::clone(&ctx);
        let result = queue
            .consume(QueueName::AudioProcessing, 1, "loopcast-worker", move |payload| {
                let ctx = Arc::clone(&handler_ctx);
                async move { handle_message(&ctx, payload).await }
            })
            .await;

        if let Err(e) = result {
            tracing::error!(error = %e, "Processing consumer failed");
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}
