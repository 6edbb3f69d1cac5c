mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use venturepulse_ai::OpenAiClient;
use venturepulse_core::AdminPolicy;
use venturepulse_pipeline::RefreshLocks;
use venturepulse_signals::FeedClient;

use crate::api::{build_app, default_rate_limit_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(venturepulse_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = venturepulse_db::PoolConfig::from_app_config(&config);
    let pool = venturepulse_db::connect_pool(&config.database_url, pool_config).await?;
    venturepulse_db::run_migrations(&pool).await?;

    let locks = Arc::new(RefreshLocks::new());
    let feed = Arc::new(FeedClient::new(config.fetch_timeout_secs)?);
    // An absent key still builds a client; its operations fail closed to
    // deterministic fallbacks, so validation degrades rather than breaking.
    let analyst = Arc::new(OpenAiClient::new(
        config.openai_api_key.as_deref().unwrap_or_default(),
        &config.openai_model,
        config.fetch_timeout_secs,
    )?);
    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; keyword extraction and scoring use fallbacks");
    }

    let _scheduler = scheduler::build_scheduler(
        pool.clone(),
        Arc::clone(&config),
        Arc::clone(&locks),
        Arc::clone(&feed),
    )
    .await?;

    let state = AppState {
        pool,
        policy: AdminPolicy::new(config.admin_emails.clone()),
        locks,
        feed,
        analyst,
        config: Arc::clone(&config),
    };
    let app = build_app(state, default_rate_limit_state());

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
