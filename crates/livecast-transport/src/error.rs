//! Error types for the publish pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the synchronous publisher/session API.
///
/// Connection failures discovered on the writer thread are reported
/// through the status sink instead, as [`StreamErrorCode`]s.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Invalid RTMP URL.
    #[error("Invalid RTMP URL: {0}")]
    InvalidUrl(String),

    /// A writer task is already running.
    #[error("Already publishing")]
    AlreadyPublishing,

    /// No publisher has been initialized.
    #[error("Publisher not initialized")]
    NotInitialized,

    /// IO error (writer thread creation).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error codes delivered to the status sink.
///
/// Negative values for host-boundary compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamErrorCode {
    /// Transport handle allocation failed. Fatal for this session.
    InitFailure,

    /// The transport rejected the URL. Fatal.
    UrlSetupFailure,

    /// TCP connect, handshake or stream creation failed. Fatal for
    /// this session; the host may retry with a fresh init/start.
    ConnectFailure,

    /// Reserved for controller-initiated close notifications.
    Closed,
}

impl StreamErrorCode {
    /// Numeric code as seen across the host boundary.
    pub fn code(self) -> i32 {
        match self {
            Self::InitFailure => -9,
            Self::UrlSetupFailure => -10,
            Self::ConnectFailure => -11,
            Self::Closed => -12,
        }
    }
}
