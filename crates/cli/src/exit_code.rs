// Process exit status for gdoc.
//
//   0  success
//   1  remote or unexpected failure
//   2  missing or expired credentials
//   3  bad invocation, or a write refused by the conflict policy

use gdoc_common::doc_id::DocIdError;
use gdoc_common::error::RemoteError;
use gdoc_core::BlockReason;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Error,
    Auth,
    Usage,
    Conflict,
}

impl ExitCode {
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Error => 1,
            Self::Auth => 2,
            Self::Usage | Self::Conflict => 3,
        }
    }

    /// Status for a failed command. The first typed error in the chain decides;
    /// anything untyped is a general failure.
    pub fn from_error(error: &anyhow::Error) -> Self {
        error
            .chain()
            .find_map(|cause| {
                if let Some(remote) = cause.downcast_ref::<RemoteError>() {
                    Some(if remote.is_auth() { Self::Auth } else { Self::Error })
                } else if cause.is::<ConflictBlocked>() {
                    Some(Self::Conflict)
                } else if cause.is::<UsageError>() || cause.is::<DocIdError>() {
                    Some(Self::Usage)
                } else {
                    None
                }
            })
            .unwrap_or(Self::Error)
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(status: ExitCode) -> Self {
        Self::from(status.code())
    }
}

/// Bad arguments or local input detected by a command handler.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct UsageError(pub String);

impl UsageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A destructive write refused by the conflict policy.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConflictBlocked(pub BlockReason);
