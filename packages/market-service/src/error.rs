//! Error types for the marketplace service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use market_types::{CodecError, OutputRef};
use std::fmt;

/// Marketplace service error type.
#[derive(Debug)]
pub enum Error {
    /// Configuration error.
    Config(String),
    /// Key-value backend I/O failure.
    Storage(String),
    /// Persisted or collaborator-supplied data failed to decode.
    Codec(CodecError),
    /// Offer position outside `[0, len)`.
    IndexOutOfRange { index: usize, len: usize },
    /// The offer at a position no longer references the expected output.
    StaleOffer { index: usize, expected: OutputRef },
    /// No wallet connected, or the wallet refused to enable.
    WalletUnavailable(String),
    /// The user declined to sign.
    UserRejected(String),
    /// The wallet or network refused the transaction.
    SubmitRejected(String),
    /// Bridge transport failure.
    Bridge(String),
    /// Transaction assembler failure.
    Assembler(String),
    /// Caller is not allowed to perform the operation.
    Unauthorized(String),
    /// Invalid request parameters.
    InvalidInput(String),
    /// Internal invariant violation in the flow state machine.
    InvalidTransition(String),
}

impl Error {
    /// Failures raised by the signer or the network at signing/submission time.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::UserRejected(_) | Error::SubmitRejected(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Storage(msg) => write!(f, "storage error: {msg}"),
            Error::Codec(e) => write!(f, "{e}"),
            Error::IndexOutOfRange { index, len } => {
                write!(f, "offer index {index} out of range (store holds {len})")
            }
            Error::StaleOffer { index, expected } => {
                write!(f, "offer at index {index} no longer references {expected}")
            }
            Error::WalletUnavailable(msg) => write!(f, "wallet unavailable: {msg}"),
            Error::UserRejected(msg) => write!(f, "signing declined: {msg}"),
            Error::SubmitRejected(msg) => write!(f, "submission rejected: {msg}"),
            Error::Bridge(msg) => write!(f, "bridge error: {msg}"),
            Error::Assembler(msg) => write!(f, "assembler error: {msg}"),
            Error::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::InvalidTransition(msg) => write!(f, "invalid flow transition: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Error::Codec(e)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Config(_)
            | Error::Storage(_)
            | Error::InvalidTransition(_)
            | Error::Codec(CodecError::Encode(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Codec(_) | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
            Error::StaleOffer { .. } => StatusCode::CONFLICT,
            Error::WalletUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::UserRejected(_) | Error::SubmitRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Bridge(_) | Error::Assembler(_) => StatusCode::BAD_GATEWAY,
            Error::Unauthorized(_) => StatusCode::FORBIDDEN,
        };
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string()
        });
        (status, Json(body)).into_response()
    }
}
