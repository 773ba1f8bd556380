//! rollcall server binary.
//!
//! Reads `rollcall.toml` (or the path given with `--config`), overlays
//! `ROLLCALL_*` environment variables, opens the SQLite store and serves the
//! JSON API over HTTP.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use rollcall_admission::Admission;
use rollcall_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Rollcall attendance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "rollcall.toml")]
  config: PathBuf,

  /// Override the listening port from the configuration.
  #[arg(short, long)]
  port: Option<u16>,
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

  let mut server_cfg = settings::load(&cli.config)?;
  if let Some(port) = cli.port {
    server_cfg.port = port;
  }

  let store_path = settings::expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let rp = &server_cfg.admission.relying_party;
  tracing::info!(
    rp_id = %rp.id,
    origins = ?rp.origins,
    counter_policy = ?server_cfg.admission.counter_policy,
    missing_geofence = ?server_cfg.admission.missing_geofence,
    "admission policy loaded"
  );

  let admission = Arc::new(Admission::new(Arc::new(store), server_cfg.admission.clone()));
  let app = axum::Router::new()
    .nest("/api", rollcall_api::api_router(admission))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
