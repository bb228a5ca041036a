//! Error handling module with type-safe, non-exhaustive error types
//!
//! This module provides a unified error handling approach with:
//! - Non-exhaustive enums for forward compatibility
//! - Stable error codes mapped onto gRPC status codes
//! - Conversion from `tonic::Status` on the calling side, so a caller can
//!   tell an authentication failure from a missing prefix from a dead link

use thiserror::Error;
use tonic::{Code, Status};

use crate::config::ConfigError;

const NOT_FOUND_MESSAGE: &str = "value not found for number: ";
const MISSING_CREDENTIAL_MESSAGE: &str = "missing credential";

/// Non-exhaustive error enum for forward compatibility
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LookupError {
    /// No registered prefix matches the number
    #[error("No code found for number: {number}")]
    NotFound {
        /// The number that was looked up
        number: String,
    },

    /// The call carried no `authorization` metadata
    #[error("Missing credential")]
    MissingCredential,

    /// The presented bearer token does not match
    #[error("Invalid credential")]
    InvalidCredential,

    /// Certificates, trust bundle or listener could not be set up
    #[error("Transport setup failed: {reason}")]
    TransportSetup {
        /// Description of the setup failure
        reason: String,
    },

    /// Connection-level failure (handshake, refused, reset)
    #[error("Transport error: {reason}")]
    Transport {
        /// Description of the transport failure
        reason: String,
    },

    /// The peer violated the request/response pairing
    #[error("Protocol error: {reason}")]
    Protocol {
        /// Description of the violation
        reason: String,
    },

    /// The bulk data file could not be loaded
    #[error("Failed to load {path}: {reason}")]
    DataLoad {
        /// Path of the data file
        path: String,
        /// Description of the failure
        reason: String,
    },

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Internal error (details never sent to callers)
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Error codes for gRPC responses and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    MissingCredential,
    InvalidCredential,
    TransportSetup,
    Transport,
    Protocol,
    DataLoad,
    Config,
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "LOOKUP_NOT_FOUND",
            Self::MissingCredential => "AUTH_CREDENTIAL_MISSING",
            Self::InvalidCredential => "AUTH_CREDENTIAL_INVALID",
            Self::TransportSetup => "TRANSPORT_SETUP_FAILED",
            Self::Transport => "TRANSPORT_ERROR",
            Self::Protocol => "PROTOCOL_ERROR",
            Self::DataLoad => "DATA_LOAD_FAILED",
            Self::Config => "CONFIG_INVALID",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Get the gRPC status code for this error
    pub fn grpc_code(&self) -> Code {
        match self {
            Self::NotFound => Code::NotFound,
            Self::MissingCredential => Code::InvalidArgument,
            Self::InvalidCredential => Code::Unauthenticated,
            Self::Transport => Code::Unavailable,
            Self::Protocol => Code::DataLoss,
            Self::TransportSetup | Self::DataLoad | Self::Config | Self::Internal => {
                Code::Internal
            }
        }
    }
}

impl LookupError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::MissingCredential => ErrorCode::MissingCredential,
            Self::InvalidCredential => ErrorCode::InvalidCredential,
            Self::TransportSetup { .. } => ErrorCode::TransportSetup,
            Self::Transport { .. } => ErrorCode::Transport,
            Self::Protocol { .. } => ErrorCode::Protocol,
            Self::DataLoad { .. } => ErrorCode::DataLoad,
            Self::Config(_) => ErrorCode::Config,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Shorthand for a `TransportSetup` error.
    pub fn transport_setup(reason: impl Into<String>) -> Self {
        Self::TransportSetup {
            reason: reason.into(),
        }
    }

    /// Whether this is the expected "no such prefix" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the call was rejected by the credential check.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::MissingCredential | Self::InvalidCredential)
    }

    /// Convert to a gRPC Status.
    ///
    /// Internal details are replaced by a generic message; the credential
    /// itself never appears in any message.
    pub fn to_status(&self) -> Status {
        let message = match self {
            Self::NotFound { number } => format!("{NOT_FOUND_MESSAGE}{number}"),
            Self::MissingCredential => MISSING_CREDENTIAL_MESSAGE.to_string(),
            Self::InvalidCredential => "invalid token".to_string(),
            Self::Protocol { reason } => reason.clone(),
            _ => "internal error".to_string(),
        };
        Status::new(self.code().grpc_code(), message)
    }
}

impl From<LookupError> for Status {
    fn from(err: LookupError) -> Self {
        err.to_status()
    }
}

/// Maps a status from the lookup server back onto its error.
///
/// `INVALID_ARGUMENT` means a missing credential only when it carries this
/// server's message; from any other peer it stays a generic gRPC error.
impl From<Status> for LookupError {
    fn from(status: Status) -> Self {
        match status.code() {
            Code::NotFound => LookupError::NotFound {
                number: status
                    .message()
                    .strip_prefix(NOT_FOUND_MESSAGE)
                    .unwrap_or_default()
                    .to_string(),
            },
            Code::InvalidArgument if status.message() == MISSING_CREDENTIAL_MESSAGE => {
                LookupError::MissingCredential
            }
            Code::Unauthenticated => LookupError::InvalidCredential,
            Code::Unavailable | Code::Cancelled | Code::DeadlineExceeded | Code::Unknown => {
                LookupError::Transport {
                    reason: status.message().to_string(),
                }
            }
            Code::DataLoss => LookupError::Protocol {
                reason: status.message().to_string(),
            },
            _ => LookupError::Internal(anyhow::anyhow!("gRPC error: {}", status.message())),
        }
    }
}

impl From<tonic::transport::Error> for LookupError {
    fn from(err: tonic::transport::Error) -> Self {
        LookupError::Transport {
            reason: error_chain(&err),
        }
    }
}

/// Flattens an error and its sources into one line.
///
/// tonic hides handshake causes behind a generic top-level message.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
