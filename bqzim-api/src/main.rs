//! bqzim-api - house attribute prediction and cost estimation service
//!
//! Startup order: configuration, tracing, database, model artifacts, router.
//! Any failure before the listener is bound aborts startup, except a missing
//! or broken image model which leaves `/api/predict/` answering 500.

use anyhow::{Context, Result};
use bqzim_api::model::ModelBundle;
use bqzim_api::{build_router, AppState};
use bqzim_common::config::{config_file_path, CliOverrides, ServiceConfig, TomlConfig};
use bqzim_common::db::init_database;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Command-line arguments; each falls back to its environment variable
#[derive(Debug, Parser)]
#[command(name = "bqzim-api", version, about = "House cost estimation API")]
struct Args {
    /// Folder holding the database and (by default) the model artifacts
    #[arg(long, env = "BQZIM_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Folder holding model_boq.onnx, scaler.json, reg_scaler.json and linear_regression_model.json
    #[arg(long, env = "BQZIM_MODELS_DIR")]
    models_dir: Option<PathBuf>,

    /// Listen address
    #[arg(long, env = "BQZIM_HOST")]
    host: Option<String>,

    /// Listen port
    #[arg(long, env = "BQZIM_PORT")]
    port: Option<u16>,

    /// Request body limit in bytes
    #[arg(long, env = "BQZIM_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,
}

impl From<Args> for CliOverrides {
    fn from(args: Args) -> Self {
        CliOverrides {
            root_folder: args.root_folder,
            models_dir: args.models_dir,
            host: args.host,
            port: args.port,
            max_upload_bytes: args.max_upload_bytes,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: CliOverrides = Args::parse().into();

    // Config is read before tracing so the TOML log level can apply
    let config_file = config_file_path().map(|path| {
        let loaded = TomlConfig::from_file(&path);
        (path, loaded)
    });
    let toml = match &config_file {
        Some((_, Ok(toml))) => toml.clone(),
        _ => TomlConfig::default(),
    };
    let config = ServiceConfig::resolve(&cli, &toml);

    let default_level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    info!(
        "Starting BQ Zim API (bqzim-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config_file {
        Some((path, Ok(_))) => info!("Loaded config file: {}", path.display()),
        Some((path, Err(e))) => warn!("Ignoring config file {}: {}", path.display(), e),
        None => info!("No config file found, using defaults"),
    }

    let config = config.context("Invalid configuration")?;
    config.ensure_root_folder()?;

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());
    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    info!("Loading model artifacts from {}", config.models_dir.display());
    let models = ModelBundle::load(&config.models_dir).context("Failed to load model artifacts")?;
    if models.is_image_model_available() {
        info!("✓ Model artifacts loaded");
    } else {
        warn!("Image model unavailable: /api/predict/ will answer 500 until restart");
    }

    let state = AppState::new(pool, models).with_max_upload_bytes(config.max_upload_bytes);
    let app = build_router(state);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("bqzim-api listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
