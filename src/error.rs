//! Error taxonomy for the package management pipeline.
//!
//! Resolution and fetch errors abort before any remote mutation. Upload
//! errors always arrive wrapped as [`Error::InstallationFailed`] after the
//! transaction has been rolled back. Nothing in this crate retries a remote
//! operation; that choice belongs to the caller.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed requirement or unsupported version operator. Fatal before
    /// any remote mutation.
    #[error("planning failed: {reason}")]
    Planning { reason: String },

    /// The repository client returned nothing usable. The client's error
    /// text is attached for diagnosis.
    #[error("no artifacts were downloaded, repository client reported: {stderr}")]
    NoArtifactsDownloaded { stderr: String },

    /// An upload failed mid-transaction. The transaction has already been
    /// rolled back when this surfaces; the original cause is chained.
    #[error(
        "package installation failed, previously uploaded dependencies in this \
         transaction were rolled back"
    )]
    InstallationFailed {
        #[source]
        source: anyhow::Error,
    },

    /// Rollback itself failed after an upload failure. Both errors are
    /// reported; the remote transaction state is unknown.
    #[error("rollback failed after installation error ({rollback_error}); original error: {source}")]
    RollbackFailed {
        #[source]
        source: anyhow::Error,
        rollback_error: String,
    },

    /// Contract violation on the transaction state machine, e.g. a double
    /// begin or a commit without begin. Indicates a caller bug.
    #[error("invalid transaction state: expected {expected}, was {actual}")]
    InvalidTransactionState {
        expected: &'static str,
        actual: &'static str,
    },

    /// A parameter or return type annotation has no mapping to the remote
    /// type system. Raised at build time, never at runtime.
    #[error("type `{0}` has no mapping to the remote type system")]
    UnsupportedType(String),

    /// Failure from an external collaborator (remote executor or repository
    /// client).
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn planning(reason: impl Into<String>) -> Self {
        Error::Planning {
            reason: reason.into(),
        }
    }
}
