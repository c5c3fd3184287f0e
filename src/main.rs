//! Bingo Back binary entrypoint wiring configuration, storage and the REST layer.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bingo_back::{
    config::AppConfig,
    dao::game_store::memory::MemoryGameStore,
    routes,
    state::{AppState, SharedState},
};

const STORE_BACKEND_ENV: &str = "STORE_BACKEND";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    let backend = env::var(STORE_BACKEND_ENV).unwrap_or_else(|_| "mongo".into());
    start_storage(app_state.clone(), &backend).await;

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, backend = %backend, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the in-memory store right away, or supervise a MongoDB connection in
/// the background. The server runs degraded until the store is reachable.
async fn start_storage(state: SharedState, backend: &str) {
    match backend {
        "memory" => {
            info!("using in-memory storage; data is lost on restart");
            state.set_game_store(Arc::new(MemoryGameStore::new())).await;
        }
        #[cfg(feature = "mongo-store")]
        "mongo" => {
            tokio::spawn(bingo_back::services::storage_supervisor::run(
                state,
                connect_mongo,
            ));
        }
        other => {
            warn!(backend = other, "unsupported storage backend; falling back to memory");
            state.set_game_store(Arc::new(MemoryGameStore::new())).await;
        }
    }
}

#[cfg(feature = "mongo-store")]
async fn connect_mongo() -> Result<
    Arc<dyn bingo_back::dao::game_store::GameStore>,
    bingo_back::dao::storage::StorageError,
> {
    use bingo_back::dao::game_store::mongodb::{MongoConfig, MongoGameStore};

    let config = MongoConfig::from_env().await?;
    let store = MongoGameStore::connect(config).await?;
    Ok(Arc::new(store))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
