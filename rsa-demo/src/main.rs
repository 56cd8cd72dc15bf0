//! rsa-demo - Review Sentiment demo service
//!
//! Serves a single page on 127.0.0.1. Each click analyzes one random review
//! from the dataset with a pretrained sentiment model and logs the result to
//! a remote collector.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use rsa_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rsa_demo::classifier::huggingface::HuggingFaceClassifier;
use rsa_demo::reviews::DatasetSource;
use rsa_demo::telemetry::{HttpTelemetrySink, TelemetryEmitter};
use rsa_demo::{build_router, startup, AppState, MODULE_NAME};

/// Command-line arguments for rsa-demo
#[derive(Parser, Debug)]
#[command(name = "rsa-demo")]
#[command(about = "Review sentiment demo service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "RSA_PORT")]
    port: Option<u16>,

    /// Folder holding the settings database
    #[arg(short, long, env = "RSA_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Dataset file path or http(s) URL
    #[arg(short, long, env = "RSA_DATASET")]
    dataset: Option<String>,

    /// Hugging Face model id
    #[arg(short, long, env = "RSA_MODEL")]
    model: Option<String>,

    /// Interaction log collector URL
    #[arg(long, env = "RSA_LOG_ENDPOINT")]
    log_endpoint: Option<String>,

    /// Do not send interaction logs
    #[arg(long)]
    no_telemetry: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing so its log level applies; outcome is logged below
    let loaded = TomlConfig::try_load(MODULE_NAME);
    let config = match &loaded {
        Ok(Some((config, _))) => config.clone(),
        _ => TomlConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("rsa_demo={0},rsa_common={0},tower_http=info", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Review Sentiment demo (rsa-demo) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match loaded {
        Ok(Some((_, path))) => info!("Loaded config from {}", path.display()),
        Ok(None) => info!("No config file, using defaults"),
        Err(e) => warn!("Ignoring config file: {}", e),
    }

    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_override(args.root_folder)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());

    let db_pool = rsa_common::db::init_database_pool(&db_path)
        .await
        .context("Failed to open settings database")?;
    info!("✓ Database connection established");

    let http_client = Client::builder()
        .user_agent(concat!("rsa-demo/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let telemetry = if args.no_telemetry || !config.telemetry.enabled {
        info!("Interaction logging disabled");
        TelemetryEmitter::disabled()
    } else {
        let endpoint = args
            .log_endpoint
            .unwrap_or_else(|| config.telemetry.endpoint.clone());
        info!("Interaction logs sent to {}", endpoint);
        TelemetryEmitter::new(Arc::new(HttpTelemetrySink::new(
            http_client.clone(),
            endpoint,
        )))
    };

    let state = AppState::new(db_pool, telemetry);

    let model = args
        .model
        .unwrap_or_else(|| config.classifier.model.clone());
    let classifier = Arc::new(HuggingFaceClassifier::new(
        http_client.clone(),
        model,
        config.classifier.hub_url.clone(),
        config.classifier.inference_url.clone(),
        state.credentials.clone(),
    ));

    startup::restore_saved_token(&state).await;
    startup::refresh_status(&state).await;

    let dataset = DatasetSource::parse(
        &args.dataset.unwrap_or_else(|| config.dataset_or_default()),
    );
    // Handles are not awaited: both tasks report through the view
    let _ = startup::spawn_background_init(state.clone(), dataset, http_client, classifier);

    let app = build_router(state);

    let port = args.port.unwrap_or_else(|| config.port_or_default());
    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("rsa-demo listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
