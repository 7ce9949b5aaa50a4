//! Error types for the remote boundary and the service taxonomy.

use std::fmt;
use thiserror::Error;

/// Status codes the remote document store reports, mirroring the
/// gRPC status set the backend uses.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendCode {
    /// The operation was cancelled (usually by the caller).
    Cancelled,
    /// Unknown error.
    Unknown,
    /// Client specified an invalid argument.
    InvalidArgument,
    /// Deadline expired before the operation completed.
    DeadlineExceeded,
    /// Some requested document was not found.
    NotFound,
    /// The document being created already exists.
    AlreadyExists,
    /// Caller lacks permission.
    PermissionDenied,
    /// Quota or resource exhausted.
    ResourceExhausted,
    /// System not in a state required for the operation.
    FailedPrecondition,
    /// Aborted, typically due to a concurrency issue.
    Aborted,
    /// Operation attempted past the valid range.
    OutOfRange,
    /// Operation not implemented.
    Unimplemented,
    /// Internal backend error.
    Internal,
    /// Service currently unavailable.
    Unavailable,
    /// Unrecoverable data loss.
    DataLoss,
    /// Request lacks valid authentication.
    Unauthenticated,
}

impl BackendCode {
    /// Map a numeric status code. Unrecognized codes become `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Cancelled,
            3 => Self::InvalidArgument,
            4 => Self::DeadlineExceeded,
            5 => Self::NotFound,
            6 => Self::AlreadyExists,
            7 => Self::PermissionDenied,
            8 => Self::ResourceExhausted,
            9 => Self::FailedPrecondition,
            10 => Self::Aborted,
            11 => Self::OutOfRange,
            12 => Self::Unimplemented,
            13 => Self::Internal,
            14 => Self::Unavailable,
            15 => Self::DataLoss,
            16 => Self::Unauthenticated,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for BackendCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
            Self::InvalidArgument => "invalid-argument",
            Self::DeadlineExceeded => "deadline-exceeded",
            Self::NotFound => "not-found",
            Self::AlreadyExists => "already-exists",
            Self::PermissionDenied => "permission-denied",
            Self::ResourceExhausted => "resource-exhausted",
            Self::FailedPrecondition => "failed-precondition",
            Self::Aborted => "aborted",
            Self::OutOfRange => "out-of-range",
            Self::Unimplemented => "unimplemented",
            Self::Internal => "internal",
            Self::Unavailable => "unavailable",
            Self::DataLoss => "data-loss",
            Self::Unauthenticated => "unauthenticated",
        };
        f.write_str(name)
    }
}

/// Raw error from the remote store. Never escapes the service layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct BackendError {
    /// Backend status code.
    pub code: BackendCode,
    /// Backend-provided message.
    pub message: String,
}

impl BackendError {
    /// Create a backend error.
    pub fn new(code: BackendCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// The kind of service operation an error arose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Document creation.
    Create,
    /// Full or partial update.
    Update,
    /// Single or batched deletion.
    Delete,
    /// Any read: point lookup, query, count.
    Fetch,
}

/// Errors surfaced by the remote query service.
///
/// Backend-specific codes are classified once, at the service boundary,
/// into this closed set.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Creating a document failed.
    #[error("create failed: {0}")]
    CreateFailed(String),

    /// Updating a document failed.
    #[error("update failed: {0}")]
    UpdateFailed(String),

    /// Deleting a document failed.
    #[error("delete failed: {0}")]
    DeleteFailed(String),

    /// Reading failed.
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// The caller is not allowed to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The write conflicts with existing data or violates backend rules.
    #[error("validation conflict: {0}")]
    ValidationConflict(String),

    /// Anything the taxonomy does not recognize.
    #[error("system error: {0}")]
    SystemError(String),

    /// The enclosing task was cancelled between page requests.
    #[error("cancelled")]
    Cancelled,
}

impl StoreError {
    /// Classify a backend error raised while performing `operation`.
    pub fn classify(operation: Operation, err: BackendError) -> Self {
        let BackendError { code, message } = err;
        match code {
            BackendCode::PermissionDenied | BackendCode::Unauthenticated => {
                Self::PermissionDenied(message)
            }
            BackendCode::AlreadyExists
            | BackendCode::InvalidArgument
            | BackendCode::FailedPrecondition
            | BackendCode::OutOfRange => Self::ValidationConflict(message),
            BackendCode::NotFound
            | BackendCode::Unavailable
            | BackendCode::DeadlineExceeded
            | BackendCode::Aborted
            | BackendCode::ResourceExhausted
            | BackendCode::Cancelled => Self::failed(operation, message),
            BackendCode::Unknown
            | BackendCode::Internal
            | BackendCode::DataLoss
            | BackendCode::Unimplemented => Self::SystemError(message),
        }
    }

    /// The operation-specific failure variant.
    pub fn failed(operation: Operation, message: impl Into<String>) -> Self {
        let message = message.into();
        match operation {
            Operation::Create => Self::CreateFailed(message),
            Operation::Update => Self::UpdateFailed(message),
            Operation::Delete => Self::DeleteFailed(message),
            Operation::Fetch => Self::FetchFailed(message),
        }
    }

    /// Whether retrying the same call might succeed.
    /// The service never retries; this informs caller policy.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CreateFailed(_) | Self::UpdateFailed(_) | Self::DeleteFailed(_) | Self::FetchFailed(_)
        )
    }
}
