//! FeelRate - restaurant feedback service
//!
//! # Usage
//!
//! ```bash
//! # Serve the API (default command)
//! FEELRATE_ADMIN_PASSWORD=secret cargo run --release
//!
//! # Export the last 30 days of one restaurant to CSV
//! ./feelrate export --restaurant bistro-7 --period 30days --output feedback.csv
//! ```
//!
//! # Environment Variables
//!
//! - `FEELRATE_CONFIG`: Path to a TOML config file (default: ./feelrate.toml)
//! - `FEELRATE_SERVER_ADDR` / `PORT`: HTTP bind address / port
//! - `FEELRATE_DATA_DIR`: Directory for the sled database
//! - `FEELRATE_ADMIN_PASSWORD`: Enables admin login
//! - `FEELRATE_CORS_ORIGINS`: Comma-separated allowed origins
//! - `RUST_LOG`: Logging level (default: info)
//! - `LOG_FORMAT`: Set to "json" for JSON log lines
//!
//! A `.env` file in the working directory is loaded first.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use feelrate::api::{create_app, ApiState};
use feelrate::config::AppConfig;
use feelrate::export::{export_filename, to_csv};
use feelrate::storage::{FeedbackFilter, FeedbackStore, SledFeedbackStore};
use feelrate::{Aggregator, Period};

/// How often expired admin sessions are swept.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(300);

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "feelrate")]
#[command(about = "Restaurant feedback collection and analytics service")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides FEELRATE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the feedback database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Run the HTTP API (default)
    Serve {
        /// Override the server address (default: "0.0.0.0:5000")
        #[arg(short, long)]
        addr: Option<String>,
    },

    /// Write stored feedback as CSV
    Export {
        /// Only this restaurant's feedback
        #[arg(long)]
        restaurant: Option<String>,
        /// all, week, month, 7days or 30days
        #[arg(long, default_value = "all")]
        period: String,
        /// Output file, "-" for stdout (default: generated filename)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// ============================================================================
// Startup
// ============================================================================

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

/// File (or defaults), then environment, then CLI flags.
fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load(),
    };

    config.apply_env_overrides();

    if let Some(dir) = &args.data_dir {
        config.storage.data_dir = dir.clone();
    }
    if let Some(SubCommand::Serve { addr: Some(addr) }) = &args.command {
        config.server.addr = addr.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn open_store(config: &AppConfig) -> Result<SledFeedbackStore> {
    std::fs::create_dir_all(&config.storage.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.storage.data_dir.display()
        )
    })?;
    let path = config.storage.db_path();
    SledFeedbackStore::open(&path)
        .with_context(|| format!("Failed to open feedback store at {}", path.display()))
}

// ============================================================================
// Commands
// ============================================================================

async fn run_server(config: AppConfig) -> Result<()> {
    let store = open_store(&config)?;

    if config.auth.admin_password.is_empty() {
        warn!(
            "No admin password configured (set FEELRATE_ADMIN_PASSWORD); \
             admin endpoints will refuse logins"
        );
    }

    let addr = config.server.addr.clone();
    let state = ApiState::new(config, Arc::new(store.clone()));
    let sessions = state.auth.sessions().clone();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  FeelRate v{}", env!("CARGO_PKG_VERSION"));
    info!("  Listening on http://{}", addr);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let purge_token = cancel_token.clone();
    let purge_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            tokio::select! {
                () = purge_token.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = sessions.purge_expired(Utc::now());
                    if removed > 0 {
                        info!(removed, "[SessionPurge] Dropped expired sessions");
                    }
                }
            }
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await
        .context("HTTP server error")?;

    purge_task.await.ok();
    store.flush().context("Failed to flush feedback store")?;
    info!("FeelRate shutdown complete");
    Ok(())
}

fn run_export(
    config: &AppConfig,
    restaurant: Option<String>,
    period: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let store = open_store(config)?;
    let tz = Aggregator::new(&config.analytics).timezone();
    let now = Utc::now();

    let period = Period::parse_lenient(Some(period));
    let filter = FeedbackFilter::for_restaurant(restaurant.filter(|r| !r.trim().is_empty()))
        .since(period.lower_bound(now, tz));
    let records = store.find(&filter).context("Failed to read feedback")?;
    let csv = to_csv(&records, tz);

    let output = output.unwrap_or_else(|| {
        PathBuf::from(export_filename(period, now.with_timezone(&tz).date_naive()))
    });
    if output.as_os_str() == "-" {
        print!("{csv}");
    } else {
        std::fs::write(&output, csv)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        info!(rows = records.len(), path = %output.display(), "Export written");
    }
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    match args.command {
        Some(SubCommand::Export {
            restaurant,
            period,
            output,
        }) => run_export(&config, restaurant, &period, output),
        Some(SubCommand::Serve { .. }) | None => run_server(config).await,
    }
}
