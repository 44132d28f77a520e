use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sharkview::api::{routes, AppState};
use sharkview::export::{ExportCoordinators, HttpReportService};
use sharkview::models::config::AppConfig;
use sharkview::store::{loader, CaptureStore};
use sharkview::utils::logging;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Capture dashboard backend with filtering, communication graphs and exports")]
struct Args {
    /// Address the REST API binds to
    #[clap(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port for the REST API server
    #[clap(short, long, default_value = "3000")]
    port: u16,

    /// Directory holding decoded capture JSON files
    #[clap(short, long, default_value = "json_files")]
    data_dir: PathBuf,

    /// Base URL of the report/export service
    #[clap(long, default_value = "http://127.0.0.1:5000")]
    report_service: String,

    /// Timeout in seconds for one export request
    #[clap(long, default_value = "30")]
    request_timeout: u64,

    /// Log level (trace, debug, info, warn, error, off)
    #[clap(long, default_value = "info")]
    log_level: String,
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Create application config
    let config = AppConfig {
        bind_address: args.bind,
        port: args.port,
        data_dir: args.data_dir,
        report_service_url: args.report_service,
        request_timeout_secs: args.request_timeout,
        log_level: args.log_level,
    };

    // Initialize logger with specified level
    logging::init_logger(logging::get_log_level(&config.log_level));

    info!("Starting sharkview v{}", env!("CARGO_PKG_VERSION"));

    // Load decoded captures
    let store = CaptureStore::new();
    match loader::load_capture_dir(&config.data_dir) {
        Ok(captures) => {
            for capture in captures {
                store.insert(capture);
            }
        }
        Err(e) => warn!(
            "Could not read capture directory {}: {}",
            config.data_dir.display(),
            e
        ),
    }
    if store.is_empty() {
        warn!("No captures loaded from {}", config.data_dir.display());
    } else {
        info!("Serving {} captures", store.len());
    }

    // Client for the report/export service
    let service = HttpReportService::new(
        &config.report_service_url,
        Duration::from_secs(config.request_timeout_secs),
    )
    .context("failed to build the report service client")?;
    info!("Exports go to {}", config.report_service_url);

    // Create a shared state for our application
    let app_state = web::Data::new(AppState {
        store,
        exports: ExportCoordinators::new(Arc::new(service)),
    });

    info!(
        "Starting sharkview API server on {}:{}",
        config.bind_address, config.port
    );

    // Start the HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
