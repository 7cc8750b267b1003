mod error;
mod routes;
mod state;

use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use envref_core::{enumerate_roots, Config, EnvResolver};
use state::{AppState, SharedState};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "envref-service")]
#[command(about = "Serve environment-variable definition lookups over HTTP", long_about = None)]
struct Args {
    #[arg(long, default_value_t = 3000)]
    port: u16,

    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Project root to scan (repeatable; defaults to the current directory)
    #[arg(long = "root")]
    roots: Vec<PathBuf>,

    /// Config file (defaults to .envref.toml in the first root)
    #[arg(long, env = "ENVREF_CONFIG")]
    config: Option<PathBuf>,
}

fn build_state(args: &Args) -> envref_core::Result<SharedState> {
    let roots = if args.roots.is_empty() {
        vec![std::env::current_dir()?]
    } else {
        args.roots.clone()
    };
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&roots[0])?,
    };
    let resolver = EnvResolver::new(config)?;
    let project_roots = enumerate_roots(&roots)?;
    Ok(Arc::new(AppState::new(resolver, project_roots)))
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/status", get(routes::status))
        .route("/reindex", post(routes::reindex))
        .route("/definitions/{name}", get(routes::definitions))
        .route("/resolve", post(routes::resolve))
        .route("/references/extract", post(routes::extract))
        .route("/reference_at", post(routes::reference_at))
        .route("/definition", post(routes::definition))
        .route("/references", post(routes::references))
        .route("/hover", post(routes::hover))
        .route("/annotate", post(routes::annotate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let state = match build_state(&args) {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(error = %err, "failed to start");
            std::process::exit(1);
        }
    };

    if let Err(err) = state.rebuild().await {
        tracing::error!(error = %err.body.message, "initial index build failed");
        std::process::exit(1);
    }

    let app = router(state);

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "envref-service listening");

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!(error = %err, "server error");
        std::process::exit(1);
    }
}
