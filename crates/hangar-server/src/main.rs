//! `hangar` binary.
//!
//! Reads `hangar.toml` (or the path given with `--config`), opens the SQLite
//! store, and either serves the HTTP API or runs one operator command and
//! prints its result as JSON.
//!
//! ```text
//! hangar                                   # serve
//! hangar import ships.csv --franchise "Star Trek"
//! hangar migrate
//! hangar orphans
//! hangar cleanup remove_orphaned_factions --yes
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use hangar_server::{ServerConfig, commands};
use hangar_store_sqlite::SqliteStore;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Hangar collection server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "hangar.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Import a CSV or JSON file of starships.
  Import {
    file:       PathBuf,
    /// Edition rows default to when they name none.
    #[arg(long)]
    edition_id: Option<Uuid>,
    /// Franchise rows default to when they name none.
    #[arg(long)]
    franchise:  Option<String>,
  },
  /// Copy every starship under a fresh identifier.
  Migrate,
  /// Report reference entities no starship uses.
  Orphans,
  /// Run a destructive cleanup action.
  Cleanup {
    action: String,
    /// Confirm the action.
    #[arg(long)]
    yes:    bool,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("HANGAR"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open SQLite store.
  let store_path = server_cfg.resolved_store_path();
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, &server_cfg).await?,
    Command::Import { file, edition_id, franchise } => {
      let result = commands::import(&store, &file, edition_id, franchise).await;
      finish(store, result).await?;
    }
    Command::Migrate => {
      let result = commands::migrate(&store).await;
      finish(store, result).await?;
    }
    Command::Orphans => {
      let result = commands::orphans(&store).await;
      finish(store, result).await?;
    }
    Command::Cleanup { action, yes } => {
      let result = commands::cleanup(&store, &action, yes).await;
      finish(store, result).await?;
    }
  }

  Ok(())
}

async fn serve(store: SqliteStore, config: &ServerConfig) -> anyhow::Result<()> {
  let store = Arc::new(store);
  let app = hangar_server::router(store.clone(), config);
  let address = config.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  match Arc::try_unwrap(store) {
    Ok(store) => store.close().await.context("failed to close store")?,
    Err(_) => tracing::warn!("store still shared at shutdown; leaving it to drop"),
  }
  tracing::info!("shut down");
  Ok(())
}

/// Close the store, then print the command's result as pretty JSON.
async fn finish<T: Serialize>(
  store: SqliteStore,
  result: hangar_server::error::Result<T>,
) -> anyhow::Result<()> {
  store.close().await.context("failed to close store")?;
  let output = result.context("command failed")?;
  println!("{}", serde_json::to_string_pretty(&output)?);
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
}
