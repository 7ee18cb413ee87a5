//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve and bind the configured `host:port`
//! - Classify bind failures so the operator gets an actionable message

use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("invalid bind address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("port {port} is already in use")]
    AddrInUse {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("permission denied binding {address}")]
    PermissionDenied {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to bind {address}: {source}")]
    Other {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },
}

impl ListenerError {
    fn from_io(address: SocketAddr, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::AddrInUse => ListenerError::AddrInUse {
                port: address.port(),
                source,
            },
            io::ErrorKind::PermissionDenied => ListenerError::PermissionDenied { address, source },
            _ => ListenerError::Other { address, source },
        }
    }

    /// What the operator can do about it.
    pub fn hint(&self) -> &'static str {
        match self {
            ListenerError::InvalidAddress { .. } => "Check HOST and PORT in your .env file",
            ListenerError::AddrInUse { .. } => {
                "Stop the other process using this port or set a different PORT"
            }
            ListenerError::PermissionDenied { .. } => {
                "Ports below 1024 need elevated privileges; choose a higher PORT"
            }
            ListenerError::Other { .. } => "Check the network configuration of this machine",
        }
    }
}

/// Bind a listener on `address` (`host:port`).
pub async fn bind(address: &str) -> Result<TcpListener, ListenerError> {
    let addr: SocketAddr = address
        .parse()
        .map_err(|e: std::net::AddrParseError| ListenerError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ListenerError::from_io(addr, e))?;

    let local_addr = listener
        .local_addr()
        .map_err(|e| ListenerError::from_io(addr, e))?;
    tracing::debug!(address = %local_addr, "Listener bound");

    Ok(listener)
}
