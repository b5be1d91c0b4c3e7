//! Advisory connection status from the service's health probe.

use botdash_client::{ClientError, StatusReport};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No probe has completed yet.
    #[default]
    Unknown,
    Connected,
    /// The service answered but its exchange link is down.
    ExchangeError(String),
    /// The service itself is unreachable or answered garbage.
    Error,
}

impl ConnectionStatus {
    pub fn from_probe(result: &Result<StatusReport, ClientError>, exchange: &str) -> Self {
        match result {
            Ok(report) if report.exchange_ok() => ConnectionStatus::Connected,
            Ok(_) => ConnectionStatus::ExchangeError(exchange.to_string()),
            Err(_) => ConnectionStatus::Error,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Unknown => f.write_str("Checking..."),
            ConnectionStatus::Connected => f.write_str("Connected"),
            ConnectionStatus::ExchangeError(exchange) => write!(f, "{exchange} Error"),
            ConnectionStatus::Error => f.write_str("Error"),
        }
    }
}
