// Typed failures from the remote document service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{0}")]
    Auth(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Cannot export file as markdown: file is not a Google Docs editor document")]
    NotEditorDocument,
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// The message shown when stored credentials are rejected.
    pub const AUTH_EXPIRED: &'static str = "Authentication expired. Run `gdoc auth`.";

    pub fn auth_expired() -> Self {
        Self::Auth(Self::AUTH_EXPIRED.to_string())
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
