//! This file defines the raisin binary entry point.

use raisin::app;
use raisin::app_state::AppState;
use raisin::cli;
use raisin::metrics;
use raisin::server;
use raisin::tracing;

use std::error::Error;
use std::process::exit;
use std::sync::Arc;

/// Log an error with its chain of causes and exit.
fn fail(message: &str, error: &dyn Error) -> ! {
    ::tracing::error!(%error, "{}", message);
    let mut current = error.source();
    while let Some(source) = current {
        ::tracing::error!("Caused by: {}", source);
        current = source.source();
    }
    exit(1)
}

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing();
    metrics::register_metrics();
    let state = match AppState::new(&args) {
        Ok(state) => Arc::new(state),
        Err(error) => fail("failed to start", &error),
    };
    let service = app::service(state);
    if let Err(error) = server::serve(&args, service).await {
        fail("server stopped", &error)
    }
}
