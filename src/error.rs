//! Error types for the virt crate.

use thiserror::Error;

/// Result type alias for virt operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for virt operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An argument failed extraction: missing, wrong type, wrong
    /// resource kind, released handle, or malformed binary input.
    /// Always detected before any native call is made.
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// libvirt reported an error; the description comes from the
    /// library's last-error state at the moment of failure.
    #[error(transparent)]
    Native(#[from] NativeError),

    /// The operation is not provided by the linked libvirt version.
    #[error("operation not supported by the installed libvirt")]
    Unsupported,

    /// A local buffer allocation failed while preparing to receive a
    /// native result.
    #[error("out of memory")]
    OutOfMemory,
}

impl Error {
    pub(crate) fn bad_arg(reason: impl Into<String>) -> Self {
        Error::BadArgument(reason.into())
    }

    /// Check if this is a bad-argument error.
    pub fn is_bad_argument(&self) -> bool {
        matches!(self, Error::BadArgument(_))
    }

    /// Check if this is an error reported by libvirt itself.
    pub fn is_native(&self) -> bool {
        matches!(self, Error::Native(_))
    }

    /// Check if this is an unsupported-operation error.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported)
    }
}

/// An error reported by libvirt, captured from `virGetLastError`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct NativeError {
    /// libvirt error number (`virErrorNumber`).
    pub code: i32,
    /// Subsystem that raised the error (`virErrorDomain`).
    pub domain: i32,
    /// Severity (`virErrorLevel`).
    pub level: i32,
    /// Human-readable description.
    pub message: String,
}
