mod config;
mod handlers;
mod pages;
pub mod service;


use auth::{IdentityProvider, MemoryIdentityProvider, PgIdentityProvider};
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use genapi::{BackendGenerator, ImageGenerator, PlaceholderGenerator};
use handlers::AppState;
use service::{DemoLedgerService, RealLedgerService};
use std::sync::Arc;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::load_config;

#[derive(Parser)]
#[command(name = "image-studio")]
struct Args {
    #[arg(long, default_value = "config")]
    config_file: String,

    #[arg(long)]
    demo: bool,
}

pub fn build_router(state: AppState) -> Router {
    let base = state.base_path.clone();

    let routes = Router::new()
        .route("/", get(handlers::root))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/signup", get(handlers::signup_form).post(handlers::signup))
        .route("/logout", get(handlers::logout))
        .route("/dashboard", get(handlers::dashboard))
        .route("/generate", post(handlers::generate_form))
        .route("/api/generate", post(handlers::api_generate))
        .with_state(state);

    if base == "/" {
        routes
    } else {
        Router::new().nest(&base, routes)
    }
}

fn session_layer() -> SessionManagerLayer<MemoryStore> {
    let session_store = MemoryStore::default();
    SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(86400)))
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("server=info"));

    let args = Args::parse();

    if args.demo {
        log::info!("Running in DEMO mode (in-memory state, placeholder images)");

        let state = AppState {
            ledger: Arc::new(DemoLedgerService::new()),
            identity: Arc::new(MemoryIdentityProvider::default()),
            base_path: "/".to_string(),
        };

        let app = build_router(state).layer(session_layer());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
        log::info!("Listening on http://127.0.0.1:8080");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        return Ok(());
    }

    let app_config = load_config(&args.config_file).await?;

    let pool = db::init_pool(&app_config.database_url).await?;
    db::create_ledger_tables(&pool).await?;

    let identity = PgIdentityProvider::new(pool.clone());
    identity.migrate().await?;

    let generator: Arc<dyn ImageGenerator> = if app_config.generation_api_url.is_empty() {
        log::info!("No generation backend configured, using placeholder images");
        Arc::new(PlaceholderGenerator)
    } else {
        Arc::new(BackendGenerator::new(
            &app_config.generation_api_url,
            &app_config.generation_api_key,
            app_config.generation_timeout_secs,
        )?)
    };

    let state = AppState {
        ledger: Arc::new(RealLedgerService { pool, generator }),
        identity: Arc::new(identity) as Arc<dyn IdentityProvider>,
        base_path: app_config.base_path,
    };

    let app = build_router(state).layer(session_layer());

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", app_config.host, app_config.port)).await?;
    log::info!(
        "Listening on http://{}:{}",
        app_config.host,
        app_config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
