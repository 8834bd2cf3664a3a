//! chordscope-fe - Chord detection front end service
//!
//! Serves the input, progress and results views, forwards analyses to the
//! remote chord/note detection backend, and streams progress over SSE.

use anyhow::{Context, Result};
use chordscope_common::config::{resolve_config_path, write_toml_config, ConfigLoad};
use chordscope_common::events::EventBus;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chordscope_fe::config::{log_level, FrontendConfig, Overrides};
use chordscope_fe::services::HttpAnalysisClient;
use chordscope_fe::AppState;

const MODULE_NAME: &str = "chordscope-fe";

/// Command-line arguments for chordscope-fe
#[derive(Parser, Debug)]
#[command(name = "chordscope-fe")]
#[command(about = "Chord and note detection front end")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "CHORDSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address (host:port)
    #[arg(short, long, env = "CHORDSCOPE_BIND")]
    bind: Option<String>,

    /// Base URL of the analysis backend
    #[arg(long, env = "CHORDSCOPE_BACKEND_URL")]
    backend_url: Option<String>,

    /// Analysis timeout in seconds
    #[arg(long, env = "CHORDSCOPE_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Progress tick interval in milliseconds
    #[arg(long, env = "CHORDSCOPE_TICK_MILLIS")]
    tick_millis: Option<u64>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "CHORDSCOPE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Write the resolved configuration to the config file and exit
    #[arg(long)]
    init_config: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            bind: self.bind.clone(),
            backend_url: self.backend_url.clone(),
            timeout_secs: self.timeout_secs,
            tick_millis: self.tick_millis,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = args.overrides();
    let config_path = resolve_config_path(args.config.as_deref(), MODULE_NAME);
    let config_load = ConfigLoad::inspect(config_path.as_deref());
    let toml_config = config_load.config();

    // Initialize tracing before resolving so source choices are logged
    let level = log_level(&overrides, &toml_config);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=info", level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting {} v{} ({} {}, built {})",
        MODULE_NAME,
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TIMESTAMP")
    );

    config_load.log();
    let config = FrontendConfig::resolve(&overrides, &toml_config)
        .context("Invalid configuration")?;

    if args.init_config {
        let path = config_path.context("No config file location available on this platform")?;
        write_toml_config(&config.to_toml(), &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    info!("Analysis backend: {}", config.backend_url);
    info!(
        timeout_secs = config.analysis.timeout.as_secs(),
        tick_millis = config.analysis.tick.as_millis() as u64,
        settle_millis = config.analysis.settle.as_millis() as u64,
        "Analysis timing"
    );

    let backend = HttpAnalysisClient::new(&config.backend_url)
        .context("Failed to create analysis backend client")?;

    let event_bus = EventBus::new(config.event_capacity);
    info!("Event bus initialized (capacity {})", event_bus.capacity());

    let state = AppState::new(Arc::new(backend), event_bus, config.analysis.clone());
    let orchestrator = state.orchestrator.clone();

    let app = chordscope_fe::build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;
    info!("Listening on http://{}", config.bind);
    info!("Health check: http://{}/health", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Ends session tasks and open SSE streams
            orchestrator.shutdown().await;
        })
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
