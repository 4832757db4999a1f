use sqlx::postgres::PgPoolOptions;
use stackloom_server::{AppState, ServerConfig, routes};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    let state = AppState::new(db_pool, &config);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_address);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("server error");
}
