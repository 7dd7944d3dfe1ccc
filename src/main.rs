use std::{net::SocketAddr, sync::Arc};

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rewear::api::{self, AppState};
use rewear::config::Config;
use rewear::db::seed;
use rewear::jobs::balance_reconciler;
use rewear::services::user_directory::{HttpUserDirectory, InMemoryUserDirectory, UserDirectory};
use rewear::services::Marketplace;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rewear=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ReWear ledger...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let demo_users = config.user_service_url.is_none();
    let users: Arc<dyn UserDirectory> = match &config.user_service_url {
        Some(url) => {
            tracing::info!(url = %url, "Using remote user service");
            Arc::new(HttpUserDirectory::new(
                url,
                config.user_service_token.clone(),
                config.user_service_timeout(),
            )?)
        }
        None => {
            tracing::warn!("USER_SERVICE_URL not set, using in-memory demo users");
            Arc::new(InMemoryUserDirectory::demo())
        }
    };

    let market = Marketplace::in_memory();
    if config.seed_demo_data {
        seed::seed_demo_items(&market)?;
        if demo_users {
            seed::seed_opening_balances(&market, users.as_ref()).await?;
        }
    }

    let state = AppState::new(market, users);

    // Schedule balance reconciliation
    let _scheduler = match &config.reconcile_schedule {
        Some(schedule) => Some(start_reconciler(schedule, state.clone()).await?),
        None => None,
    };

    let app = api::app(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn start_reconciler(schedule: &str, state: AppState) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let state = state.clone();
        Box::pin(async move {
            if let Err(e) =
                balance_reconciler::reconcile_balances(&state.market, state.users.as_ref()).await
            {
                tracing::error!(error = %e, "Balance reconciliation job failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!(schedule = %schedule, "Balance reconciliation scheduled");

    Ok(scheduler)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, cleaning up...");
}
