mod api;
mod middleware;
mod planner;
mod session;
mod templates;

use std::sync::Arc;

use anyhow::Context;
use farmalog_maps::MapsClient;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};
use crate::session::SessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = farmalog_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting farmalog server");

    let mapping = farmalog_core::load_column_mapping(&config.columns_path)
        .inspect_err(|e| tracing::error!(error = %e, "column mapping is unusable"))?;
    let registry = farmalog_core::load_registry(&config.registry_path, &mapping)
        .inspect_err(|e| tracing::error!(error = %e, "point-of-sale registry is unusable"))
        .with_context(|| format!("loading {}", config.registry_path.display()))?;
    let maps = MapsClient::from_config(&config)?;

    let state = AppState {
        registry: Arc::new(registry),
        maps: Arc::new(maps),
        sessions: SessionStore::default(),
        browser_key: Arc::from(config.google_api_key.as_str()),
    };
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
