//! HTTP(S) server for the raisin API
//!
//! Binds the configured address and serves the API until a shutdown signal arrives. With
//! `--https` the certificate and key files are resolved and loaded before binding.

use crate::app::Service;
use crate::cli::CommandLineArgs;

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use axum::ServiceExt;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use expanduser::expanduser;
use thiserror::Error;
use tokio::signal;
use tracing::info;

/// Failure to start or run the server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Host and port do not form a socket address
    #[error("invalid listen address {address}")]
    Address {
        address: String,
        #[source]
        source: AddrParseError,
    },

    /// A TLS file path could not be resolved
    #[error("TLS {kind} file {path} not found")]
    TlsFile {
        kind: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The TLS certificate or key could not be loaded
    #[error("failed to load TLS certificate and key")]
    TlsConfig(#[source] std::io::Error),

    /// The server stopped with an error
    #[error("server failed")]
    Serve(#[source] std::io::Error),
}

/// Socket address to listen on.
fn listen_address(args: &CommandLineArgs) -> Result<SocketAddr, ServerError> {
    // Brackets let IPv6 hosts carry a port.
    let address = if args.host.contains(':') {
        format!("[{}]:{}", args.host, args.port)
    } else {
        format!("{}:{}", args.host, args.port)
    };
    address
        .parse()
        .map_err(|source| ServerError::Address { address, source })
}

/// Expand `~` in a TLS file path and make it absolute.
fn tls_file(kind: &'static str, path: &str) -> Result<PathBuf, ServerError> {
    let error = |source| ServerError::TlsFile {
        kind,
        path: path.to_string(),
        source,
    };
    expanduser(path)
        .map_err(error)?
        .canonicalize()
        .map_err(error)
}

/// Serve the raisin API
///
/// Returns once the server has shut down gracefully.
///
/// # Arguments
///
/// * `args`: Command line arguments
/// * `service`: The [Service] to serve
pub async fn serve(args: &CommandLineArgs, service: Service) -> Result<(), ServerError> {
    let addr = listen_address(args)?;

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(
        handle.clone(),
        args.graceful_shutdown_timeout,
    ));

    if args.https {
        let cert_file = tls_file("certificate", &args.cert_file)?;
        let key_file = tls_file("key", &args.key_file)?;
        let tls_config = RustlsConfig::from_pem_file(cert_file, key_file)
            .await
            .map_err(ServerError::TlsConfig)?;
        info!(%addr, "listening for HTTPS requests");
        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(service.into_make_service())
            .await
            .map_err(ServerError::Serve)
    } else {
        info!(%addr, "listening for HTTP requests");
        axum_server::bind(addr)
            .handle(handle)
            .serve(service.into_make_service())
            .await
            .map_err(ServerError::Serve)
    }
}

/// Wait for Ctrl-C or SIGTERM, then shut the server down, giving in-flight requests `timeout`
/// seconds to complete.
async fn shutdown_signal(handle: Handle, timeout: u64) {
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

    info!(timeout, "signal received, starting graceful shutdown");
    handle.graceful_shutdown(Some(Duration::from_secs(timeout)));
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;

    fn args(host: &str, port: &str) -> CommandLineArgs {
        CommandLineArgs::try_parse_from(["raisin", "--host", host, "--port", port]).unwrap()
    }

    #[test]
    fn ipv4_address() {
        let addr = listen_address(&args("127.0.0.1", "8081")).unwrap();
        assert_eq!("127.0.0.1:8081", addr.to_string());
    }

    #[test]
    fn ipv6_address() {
        let addr = listen_address(&args("::1", "8080")).unwrap();
        assert_eq!("[::1]:8080", addr.to_string());
    }

    #[test]
    fn host_name_is_not_an_address() {
        match listen_address(&args("localhost", "8080")) {
            Err(ServerError::Address { address, .. }) => assert_eq!("localhost:8080", address),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn missing_tls_file() {
        match tls_file("key", "/nonexistent/raisin/key.pem") {
            Err(error @ ServerError::TlsFile { .. }) => assert_eq!(
                "TLS key file /nonexistent/raisin/key.pem not found",
                error.to_string()
            ),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
