//! pdfops Server
//!
//! An HTTP service for everyday PDF chores. Provides REST API endpoints for:
//!
//! - Unlocking password-protected PDFs
//! - Recompressing PDF streams
//! - Assembling uploaded images into one multi-page PDF
//!
//! ## Architecture
//!
//! Handlers read the multipart form, check declared content types, then run
//! the pdfops-core operation on the blocking pool under a timeout. The result
//! is staged in a per-request scratch file and streamed back.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
mod staging;
mod upload;

use api::{
    handle_compress_pdf, handle_decrypt_pdf, handle_health, handle_images_to_pdf, handle_usage,
};
use staging::Scratch;

/// Command-line arguments for the pdfops server
#[derive(Parser, Debug)]
#[command(name = "pdfops-server")]
#[command(about = "HTTP service to unlock, compress and assemble PDF files")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PDFOPS_PORT", default_value = "8000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "PDFOPS_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Maximum request body size in megabytes
    #[arg(long, env = "PDFOPS_MAX_UPLOAD_MB", default_value = "64")]
    max_upload_mb: usize,

    /// Processing timeout in milliseconds
    #[arg(long, env = "PDFOPS_TIMEOUT_MS", default_value = "30000")]
    timeout_ms: u64,

    /// Directory for staged response files (defaults to the system temp dir)
    #[arg(long, env = "PDFOPS_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, env = "PDFOPS_VERBOSE")]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Processing timeout in milliseconds
    pub timeout_ms: u64,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
    pub scratch: Arc<Scratch>,
}

/// Routes and body limit, without the transport layers added in `main`.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(handle_usage))
        .route("/health", get(handle_health))
        .route("/decryptPdf", post(handle_decrypt_pdf))
        .route("/compressPdf", post(handle_compress_pdf))
        .route("/imagesToPdf", post(handle_images_to_pdf))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pdfops server on {}:{}", args.host, args.port);

    let scratch = Scratch::new(args.scratch_dir.clone())?;
    info!("Scratch directory: {}", scratch.dir().display());

    let state = AppState {
        timeout_ms: args.timeout_ms,
        max_upload_bytes: args.max_upload_mb * 1024 * 1024,
        scratch: Arc::new(scratch),
    };

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Upload limit: {} MB", args.max_upload_mb);
    info!("Processing timeout: {}ms", args.timeout_ms);

    axum::serve(listener, app).await?;

    Ok(())
}
