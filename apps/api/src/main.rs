use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{header, Method},
    routing::get,
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loopcast_api::config::Config;
use loopcast_api::repositories::{
    CommentRepository, DownloadRepository, LoopRepository, NotificationRepository, RatingRepository,
    UserRepository,
};
use loopcast_api::routes::{
    auth_router, comments_router, downloads_router, health_router, loops_router,
    notifications_router, ratings_router, AuthState, CommentsState, DownloadsState, LoopsState,
    NotificationsState, RatingsState,
};
use loopcast_api::services::auth::{AuthConfig, AuthService};
use loopcast_api::services::notifications::{run_consumer, NotificationService};
use loopcast_api::websocket::{ws_handler, ConnectionRegistry};
use loopcast_queue::QueueClient;

/// Build the CORS layer based on configuration.
///
/// Configured origins are always honored. Without configuration, CORS is
/// permissive in development and rejects cross-origin requests in
/// production.
fn build_cors_layer(config: &Config) -> CorsLayer {
    match &config.cors_allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let allowed: Vec<_> = origins
                .iter()
                .filter_map(|origin| {
                    origin.parse().ok().or_else(|| {
                        tracing::warn!("Invalid CORS origin '{}', skipping", origin);
                        None
                    })
                })
                .collect();

            if allowed.is_empty() {
                tracing::error!("No valid CORS origins configured, CORS requests will be rejected");
                CorsLayer::new()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed)
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                    .allow_credentials(true)
            }
        }
        _ if config.is_production() => {
            tracing::warn!(
                "CORS_ORIGINS not configured in production mode; cross-origin requests will be rejected"
            );
            CorsLayer::new()
        }
        _ => {
            tracing::warn!("Using permissive CORS in development mode");
            CorsLayer::permissive()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loopcast_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing::info!("Starting Loopcast API server on port {}", config.port);

    let pool = PgPoolOptions::new()
        .max_connections(config.database().max_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database().connect_timeout_secs,
        ))
        .connect(&config.database().url)
        .await?;

    tracing::info!("Database connection established");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations completed");

    // Repositories
    let loops = std::sync::Arc::new(LoopRepository::new(pool.clone()));
    let users = UserRepository::new(pool.clone());
    let comments = CommentRepository::new(pool.clone());
    let ratings = RatingRepository::new(pool.clone());
    let downloads = DownloadRepository::new(pool.clone());
    let notifications = NotificationRepository::new(pool.clone());

    // Broker client (retries until the broker is reachable)
    let queue = QueueClient::connect(config.amqp().clone()).await;

    // Live push registry and the notification consumer feeding it
    let registry = ConnectionRegistry::new();
    let notification_service =
        NotificationService::new(notifications.clone(), registry.clone());
    let reconnect_delay = std::time::Duration::from_secs(config.amqp().reconnect_delay_secs);
    tokio::spawn(run_consumer(
        queue.clone(),
        notification_service,
        reconnect_delay,
    ));
    tracing::info!("Notification consumer started");

    // Auth
    let auth_service = AuthService::new(AuthConfig {
        jwt_secret: config.jwt_secret.clone(),
        token_expiry_hours: config.token_expiry_hours,
    });

    // Route states
    let auth_state = AuthState::new(auth_service.clone(), users);
    let loops_state = LoopsState::new(loops.clone(), queue.clone(), config.storage().clone());
    let comments_state = CommentsState::new(comments, loops.clone(), queue.clone());
    let ratings_state = RatingsState::new(ratings, loops.clone(), queue.clone());
    let downloads_state = DownloadsState::new(
        downloads,
        loops.clone(),
        queue.clone(),
        config.storage().clone(),
    );
    let notifications_state = NotificationsState::new(notifications);

    let cors_layer = build_cors_layer(&config);

    let app = Router::new()
        .route("/", get(root))
        .nest("/health", health_router())
        .nest("/auth", auth_router(auth_state))
        .merge(loops_router(loops_state))
        .merge(comments_router(comments_state))
        .merge(ratings_router(ratings_state))
        .merge(downloads_router(downloads_state))
        .merge(notifications_router(notifications_state))
        .route("/ws", get(ws_handler))
        .layer(Extension(auth_service))
        .layer(Extension(registry))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn root() -> &'static str {
    "Loopcast - share your loops"
}
