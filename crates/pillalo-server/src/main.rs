mod api;
mod middleware;
mod session;

use std::sync::Arc;
use std::time::Duration;

use pillalo_core::EventLog;
use pillalo_scraper::{
    build_http_client, BcvRateSource, CachedCatalog, RateProvider, RateSettings, SheetClient,
};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
    session::SessionStore,
};

const SESSION_IDLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = pillalo_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting pillalo-server");

    let client = build_http_client(config.request_timeout_secs, &config.user_agent)?;
    let rates = RateProvider::new(
        BcvRateSource::new(client.clone(), config.rate_source_url.clone()),
        RateSettings::from_app_config(&config),
    );
    let catalog = CachedCatalog::new(
        SheetClient::new(client, config.sheet_url.clone()),
        Duration::from_secs(config.sheet_cache_ttl_secs),
    );

    let state = AppState {
        rates: Arc::new(rates),
        catalog: Arc::new(catalog),
        sessions: SessionStore::new(SESSION_IDLE_TTL),
        events: Arc::new(Mutex::new(EventLog::new())),
    };

    let auth = AuthState::from_keys(&config.admin_keys, config.is_development())?;
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
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
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
