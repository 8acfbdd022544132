//! Curator worker: boots the repository layer, cache store, job queue
//! workers, and the websocket broadcaster against a SQLite database.
//!
//! The HTTP REST surface is out of scope here; this binary exposes
//! only the realtime invalidation bus so a separate API layer can subscribe
//! to it the same way the teacher's frontend subscribes to `graphql_ws_handler`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::WebSocketUpgrade;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use curator::cache::CacheStore;
use curator::config::Config;
use curator::facts::FfprobeVideoProbe;
use curator::identify::{ProviderClient, RateLimitConfig, RateLimitedClient, TmdbClient};
use curator::jobs::{self, HandlerDependencies, JobWorker};
use curator::repo::Database;
use curator::ws::{self, Broadcaster};

#[derive(Clone)]
struct AppState {
    broadcaster: Broadcaster,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(Config::from_env()?);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "curator=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;
    tracing::info!("database migrated");

    let cache = Arc::new(CacheStore::new(config.cache_root()));
    let broadcaster = Broadcaster::new();
    let video_probe: Arc<dyn curator::facts::VideoProbe> = Arc::new(FfprobeVideoProbe::default());
    let provider = build_provider(&db, &config).await?;

    let deps = HandlerDependencies {
        db: db.clone(),
        cache,
        broadcaster: broadcaster.clone(),
        provider,
        video_probe,
        config: config.clone(),
        http: reqwest::Client::new(),
    };

    let registry = Arc::new(jobs::registry());
    let mut workers = Vec::with_capacity(config.worker_count);
    for i in 0..config.worker_count {
        let worker = Arc::new(JobWorker::new(
            format!("worker-{i}"),
            deps.clone(),
            registry.clone(),
            std::time::Duration::from_secs(config.poll_interval_secs),
        ));
        worker.start().await?;
        tracing::info!(worker = worker.name(), "job worker started");
        workers.push(worker);
    }

    let state = AppState { broadcaster };
    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8088));
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    for worker in &workers {
        worker.stop().await?;
    }

    Ok(())
}

/// Builds the provider client, wrapping it in `RateLimitedClient` once a
/// `tmdb_api_key` is configured; the rate-limit quota is seeded from the
/// `provider_config` table when a row exists, falling back to the
/// conservative default otherwise.
async fn build_provider(db: &Database, config: &Config) -> anyhow::Result<Arc<dyn ProviderClient>> {
    let api_key = match &config.tmdb_api_key {
        Some(key) => key.clone(),
        None => {
            tracing::warn!("TMDB_API_KEY not set; identify/enrich jobs will fail with a permanent error");
            String::new()
        }
    };

    let limit = db.provider_config().get("tmdb").await?;
    let rate_config = match limit {
        Some(l) => RateLimitConfig { requests_per_window: l.requests_per_window, window_secs: l.window_secs },
        None => RateLimitConfig::default(),
    };

    let client = TmdbClient::new(api_key);
    Ok(Arc::new(RateLimitedClient::new(client, rate_config)))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws::run_session(socket, state.broadcaster))
}
