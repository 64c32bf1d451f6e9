//! Error types for survey operations

use std::net::Ipv4Addr;
use thiserror::Error;

/// Errors that can occur while preparing or running a survey
///
/// Range exhaustion is not represented here: a drained range simply yields
/// `None` from [`AddressRange::next`](crate::AddressRange::next).
#[derive(Debug, Error)]
pub enum SurveyError {
    /// A range ends before it starts
    #[error("Invalid range: end {end} is before start {start}")]
    InvalidRange {
        /// First address of the range
        start: Ipv4Addr,
        /// Last address of the range
        end: Ipv4Addr,
    },

    /// An address could not be parsed as a dotted quad
    #[error("Invalid IPv4 address: {0}")]
    InvalidAddress(String),

    /// A line in a range list could not be parsed
    #[error("Line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What was wrong with it
        message: String,
    },

    /// Raw socket creation failed due to insufficient permissions
    ///
    /// This error provides structured information about what permissions
    /// are needed and how to obtain them.
    #[error("Insufficient permissions: {required}")]
    InsufficientPermissions {
        /// Description of required permissions (e.g., "root or CAP_NET_RAW")
        required: String,
        /// Suggested remedy (e.g., "Run with sudo")
        suggestion: String,
    },

    /// Socket creation failed for other reasons
    #[error("Failed to create socket: {0}")]
    SocketError(String),

    /// Failed to transmit an echo request
    #[error("Failed to send probe: {0}")]
    ProbeSendError(String),

    /// The reply log could not be opened or written
    #[error("Reply log error: {0}")]
    LogSinkError(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The listener thread could not be started or did not exit cleanly
    #[error("Listener failed: {0}")]
    ListenerError(String),
}
