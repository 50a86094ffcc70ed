// Main entry point for rembg-server.
// Parses configuration, loads the native background-removal library,
// assembles the Axum router, and runs the HTTP server.

mod app;
mod config;
mod error;
mod extract_upload;
mod handlers;
mod image_codec;
mod listeners;
mod models;
mod remover;
mod remover_ffi;

use clap::Parser;
use config::ServiceConfig;
use remover::NativeRemover;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::Level;

/// Command line arguments for rembg-server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct AppConfig {
    /// Hostname/IP to bind the server to. "*" listens on all interfaces
    /// (IPv6 + IPv4 dual-stack where available).
    #[arg(long, env = "REMBG_SERVER_HOST", default_value = "*")]
    host: String,

    /// Port number to listen on.
    #[arg(short, long, env = "REMBG_SERVER_PORT", default_value_t = 5000)]
    port: u16,

    /// Path to the background-removal shared library.
    #[arg(
        long,
        env = "REMBG_SERVER_LIBRARY",
        default_value = "librembg_native.so"
    )]
    library: PathBuf,

    /// Directory for temporary output files, created on first use.
    #[arg(
        long,
        env = "REMBG_SERVER_UPLOAD_DIR",
        default_value = config::DEFAULT_UPLOAD_DIR
    )]
    upload_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    // Parse command line args and environment variables
    let args = AppConfig::parse();

    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting rembg-server...");

    // --- Load the background-removal library ---
    // `unsafe` because it loads and runs foreign code via FFI. The server is
    // useless without the capability, so a load failure is fatal.
    let native_remover = match unsafe { NativeRemover::load(&args.library) } {
        Ok(remover) => {
            tracing::info!(
                "Loaded background-removal library '{}' v{} from {:?}",
                remover.info.name,
                remover.info.version,
                remover.path
            );
            remover
        }
        Err(err) => {
            tracing::error!(
                "FATAL: Failed to load background-removal library: {}. Server cannot operate without it.",
                err
            );
            eprintln!("FATAL: Library initialization failed. See logs for details. Exiting.");
            std::process::exit(1);
        }
    };

    // --- Service configuration handed to the handlers ---
    let service_config = ServiceConfig::new(args.upload_dir);
    match service_config.ensure_upload_dir() {
        Ok(dir) => tracing::info!("Upload directory ready at {:?}", dir),
        Err(e) => {
            tracing::error!("FATAL: Failed to create upload directory: {}", e);
            eprintln!("FATAL: Could not create upload directory. Error: {}. Exiting.", e);
            std::process::exit(1);
        }
    }

    // --- Build Axum Application Router ---
    let app = app::create_app(service_config, Arc::new(native_remover));
    tracing::info!("Axum router configured.");

    // --- Start HTTP Server ---
    let listener = match listeners::create_listener(&args.host, args.port).await {
        Ok((addr, l)) => {
            tracing::info!("Server successfully bound. Listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("FATAL: Failed to bind server: {}", e);
            eprintln!("FATAL: Could not bind server. Error: {}. Exiting.", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server run error: {}", e);
        eprintln!("ERROR: Server shut down unexpectedly. Error: {}", e);
    }

    tracing::info!("rembg-server has shut down.");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
