//! imgvault server - main entry point

use anyhow::Result;
use imgvault_common::logging::{init_logging, LogConfig};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use imgvault_server::{
    api,
    config::Config,
    db::{self, PgImageRepository},
    describe::{
        DescriberConfig, DescriptionGenerator, HttpDescriptionGenerator,
        UnconfiguredDescriptionGenerator,
    },
    features::FeatureState,
    ingest::{IngestPipeline, MonotonicStamps},
    storage::{config::StorageConfig, HttpBlobReader, Storage},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("imgvault-server".to_string())
        .filter_directives("imgvault_server=debug,tower_http=debug,sqlx=info".to_string())
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting imgvault server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let pool = db::create_pool(&config.database).await?;
    info!("Database connection pool established");

    db::run_migrations(&pool).await?;

    let storage_config = StorageConfig::from_env()?;
    let reader = HttpBlobReader::new(storage_config.readback_timeout_secs)?;
    let storage = Storage::new(storage_config);

    let describer: Arc<dyn DescriptionGenerator> = match DescriberConfig::from_env() {
        Some(describer_config) => {
            info!(model = %describer_config.model, "Description generator enabled");
            Arc::new(HttpDescriptionGenerator::new(describer_config)?)
        },
        None => {
            tracing::warn!(
                "DESCRIBER_ENDPOINT/DESCRIBER_API_KEY not set, images will be stored without captions"
            );
            Arc::new(UnconfiguredDescriptionGenerator)
        },
    };

    let pipeline = IngestPipeline::new(
        Arc::new(storage),
        Arc::new(reader),
        describer,
        Arc::new(PgImageRepository::new(pool)),
        Arc::new(MonotonicStamps::new()),
    );

    let app = api::create_router(FeatureState::new(pipeline), &config);

    api::serve(app, &config, shutdown_signal()).await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
