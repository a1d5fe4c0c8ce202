//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, checker and queue setup, worker spawning,
//! and the Axum server lifecycle.

use crate::application::services::{
    AuthService, BulkImportService, ClickService, RedirectService, ShortUrlService,
    ValidationService,
};
use crate::config::{Config, ReachabilityDispatch};
use crate::domain::checkers::{BlockListChecker, SafetyChecker};
use crate::domain::click_worker::run_click_worker;
use crate::domain::repositories::{ClickRepository, ShortUrlRepository};
use crate::infrastructure::checkers::{
    DisabledSafetyChecker, FileBlockListProvider, HttpReachabilityChecker, SafeBrowsingChecker,
    SafeBrowsingConfig,
};
use crate::infrastructure::persistence::{PgClickRepository, PgShortUrlRepository};
use crate::infrastructure::queue::{ChannelQueue, RedisQueue};
use crate::infrastructure::reports::FileReportStore;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Block lists, reachability probe and threat lookup
/// - Reachability queue and its consumer (queue dispatch only)
/// - Report directory
/// - Background click worker
/// - Axum HTTP server
///
/// On Ctrl-C the server stops accepting requests and in-flight validation
/// checks are signalled to stop.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - An HTTP client cannot be built
/// - The report directory cannot be prepared
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let pool = Arc::new(pool);
    let short_urls: Arc<dyn ShortUrlRepository> = Arc::new(PgShortUrlRepository::new(pool.clone()));
    let clicks: Arc<dyn ClickRepository> = Arc::new(PgClickRepository::new(pool));

    let validation = build_validation(&config, short_urls.clone()).await?;

    let reports = Arc::new(FileReportStore::new(&config.report_dir));
    reports
        .init()
        .await
        .with_context(|| format!("Failed to prepare report directory {}", config.report_dir))?;

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);
    tokio::spawn(run_click_worker(click_rx, clicks.clone()));
    tracing::info!("Click worker started");

    let short_url_service = Arc::new(ShortUrlService::new(
        short_urls.clone(),
        clicks,
        validation.clone(),
        config.base_url.clone(),
    ));

    let state = AppState {
        redirect_service: Arc::new(RedirectService::new(short_urls.clone())),
        bulk_import_service: Arc::new(BulkImportService::new(
            short_url_service.clone(),
            reports,
        )),
        short_url_service,
        validation_service: validation.clone(),
        auth_service: Arc::new(AuthService::new(
            config.admin_token.clone(),
            config.token_signing_secret.clone(),
        )),
        click_service: ClickService::new(click_tx),
        short_url_repository: short_urls,
        behind_proxy: config.behind_proxy,
    };

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal(validation))
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn connect(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Builds the checkers and, for queue dispatch, the reachability queue with
/// its consumer.
async fn build_validation(
    config: &Config,
    short_urls: Arc<dyn ShortUrlRepository>,
) -> Result<Arc<ValidationService>> {
    let block_list = BlockListChecker::new(Arc::new(FileBlockListProvider::new(
        &config.block_url_list,
        &config.block_ip_list,
    )));

    let reachability = Arc::new(
        HttpReachabilityChecker::new(config.reachability_timeout())
            .context("Failed to build reachability client")?,
    );

    let safety: Arc<dyn SafetyChecker> = match &config.safe_browsing_api_key {
        Some(api_key) => {
            let checker = SafeBrowsingChecker::new(
                SafeBrowsingConfig::new(api_key.clone())
                    .with_endpoint(config.safe_browsing_url.clone())
                    .with_client_info(
                        config.safe_browsing_client_name.clone(),
                        config.safe_browsing_client_version.clone(),
                    ),
            )
            .context("Failed to build threat lookup client")?;
            tracing::info!("Threat lookup enabled");
            Arc::new(checker)
        }
        None => {
            tracing::warn!("SAFE_BROWSING_API_KEY not set, every URL is recorded as safe");
            Arc::new(DisabledSafetyChecker)
        }
    };

    let service = ValidationService::new(short_urls, block_list, reachability, safety);

    if config.reachability_dispatch == ReachabilityDispatch::Inline {
        tracing::info!("Reachability checks run inline");
        return Ok(Arc::new(service));
    }

    if let Some(redis_url) = &config.redis_url {
        match RedisQueue::connect(redis_url).await {
            Ok(queue) => {
                let service = Arc::new(service.with_reachability_queue(Arc::new(queue.clone())));
                tokio::spawn(queue.run_consumer(service.clone()));
                tracing::info!("Reachability checks dispatched through Redis");
                return Ok(service);
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using in-process queue.", e);
            }
        }
    }

    let (queue, consumer) = ChannelQueue::new(config.reachability_queue_capacity);
    let service = Arc::new(service.with_reachability_queue(Arc::new(queue)));
    tokio::spawn(consumer.run(service.clone()));
    tracing::info!("Reachability checks dispatched through in-process queue");

    Ok(service)
}

/// Waits for Ctrl-C, then signals in-flight validation checks to stop.
async fn shutdown_signal(validation: Arc<ValidationService>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown signal received");
    validation.shutdown();
}
