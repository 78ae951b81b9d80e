//! buildgate API server
//!
//! HTTP front end that accepts cancel/restart/cron commands and hands the
//! accepted ones to the worker queue.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use buildgate_api::auth::JwtManager;
use buildgate_api::commands::Commands;
use buildgate_api::dispatch::SqliteQueue;
use buildgate_api::features::StaticFeatureFlags;
use buildgate_api::http::{AppState, build_router};
use buildgate_api::storage::Database;
use buildgate_core::config::{self, Config};
use buildgate_core::tracing_init;

#[derive(Parser, Debug)]
#[command(name = "buildgate-api")]
#[command(version, about = "buildgate API server - authorization-gated build commands")]
struct Cli {
    /// Explicit configuration file (JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JWT secret key.
    #[arg(
        long,
        global = true,
        env = "BUILDGATE_JWT_SECRET",
        default_value = "dev-secret-change-me"
    )]
    jwt_secret: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Address to listen on.
        #[arg(long)]
        addr: Option<SocketAddr>,

        /// Path to SQLite database file.
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Output logs as JSON (for structured log aggregation).
        #[arg(long)]
        log_json: bool,

        /// OTLP endpoint for traces and metrics.
        #[cfg(feature = "metrics")]
        #[arg(long, env = "BUILDGATE_OTLP_ENDPOINT")]
        otlp_endpoint: Option<String>,
    },

    /// Print a signed access token for local use.
    Token {
        #[arg(long)]
        user_id: i64,

        #[arg(long)]
        login: String,
    },
}

#[tokio::main]
#[allow(clippy::print_stdout)]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Serve {
            addr,
            db_path,
            log_json,
            #[cfg(feature = "metrics")]
            otlp_endpoint,
        } => {
            if let Some(addr) = addr {
                config.server.addr = addr;
            }
            if db_path.is_some() {
                config.server.database_path = db_path;
            }

            let filter = tracing_init::default_filter(
                env!("CARGO_PKG_NAME"),
                &config.server.log_level,
            );
            #[cfg(feature = "metrics")]
            let guard =
                tracing_init::init_tracing_with_metrics(&filter, log_json, otlp_endpoint.as_deref())?;
            #[cfg(not(feature = "metrics"))]
            tracing_init::init_tracing(&filter, log_json);

            serve(config, &cli.jwt_secret).await?;

            #[cfg(feature = "metrics")]
            if let Some(guard) = guard {
                guard.shutdown()?;
            }
            Ok(())
        }
        Command::Token { user_id, login } => {
            let jwt = JwtManager::new(cli.jwt_secret.as_bytes(), config.auth.access_ttl_secs);
            let (token, _) = jwt.issue_access_token(user_id, &login)?;
            println!("{token}");
            Ok(())
        }
    }
}

async fn serve(config: Config, jwt_secret: &str) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.addr,
        "Starting buildgate-api"
    );

    let db_path = match config.server.database_path.clone() {
        Some(path) => path,
        None => config::database_path().context("Cannot determine database path")?,
    };
    info!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path).await?;

    let commands = Commands::new(
        db.clone(),
        Arc::new(StaticFeatureFlags::new(config.features)),
        Arc::new(SqliteQueue::new(db)),
        config.dispatch.worker_namespace,
    );
    let jwt = JwtManager::new(jwt_secret.as_bytes(), config.auth.access_ttl_secs);
    let app = build_router(AppState::new(Arc::new(commands), Arc::new(jwt)));

    let listener = tokio::net::TcpListener::bind(config.server.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;

    info!("Server stopped");
    Ok(())
}
