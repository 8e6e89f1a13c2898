//! psdb-curator - submission intake and review service

use anyhow::Result;
use clap::Parser;
use psdb_common::config::{
    default_config_path, load_toml_config, resolve_root_folder, RootFolder, TomlConfig,
};
use psdb_common::db::init_database;
use psdb_curator::storage::Sweeper;
use psdb_curator::{build_router, AppState, CuratorConfig};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "psdb-curator", version, about = "Song and synth preset submission curator")]
struct Args {
    /// Root folder holding the database and upload storage
    /// (falls back to PSDB_ROOT_FOLDER, then the config file)
    #[arg(long)]
    root_folder: Option<String>,

    /// Address to bind the HTTP server to
    #[arg(long, env = "PSDB_BIND")]
    bind: Option<String>,

    /// Path to the TOML configuration file
    #[arg(long, env = "PSDB_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting PSDB Curator (psdb-curator) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let toml_config = match args.config.clone().or_else(default_config_path) {
        Some(path) => load_toml_config(&path)?,
        None => TomlConfig::default(),
    };

    let root = RootFolder::new(resolve_root_folder(args.root_folder.as_deref(), &toml_config));
    root.ensure_directory_exists()?;
    info!("Root folder: {}", root.path().display());

    let mut config = CuratorConfig::new(root, &toml_config.curator);
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if config.admin_token.is_none() {
        warn!("No admin token configured; admin routes are not protected");
    }

    let db = match init_database(&config.database_path()).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let dirs = config.upload_dirs();
    dirs.ensure_exist().await?;
    info!("Upload storage: {}", dirs.root().display());

    let state = AppState::new(db.clone(), config.clone());

    // First tick runs immediately, replaying journal entries left by a crash
    Sweeper::new(db, state.files().clone(), config.orphan_grace).spawn(config.sweep_interval);

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("psdb-curator listening on http://{}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
