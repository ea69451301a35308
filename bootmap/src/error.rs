//! Error types for boot map operations

use alloc::format;
use alloc::string::String;
use thiserror::Error;

/// Result type for boot map operations
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur while loading a boot map
///
/// Every variant owns a human-readable message. Outer layers add their own
/// context with [`Error::context`], so the final text reads from the
/// operation that failed down to the most specific cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Opening the device or querying its type/geometry failed
    #[error("{0}")]
    Device(String),

    /// Bad magic, bad signature, invalid pointer or out-of-range value
    #[error("{0}")]
    Format(String),

    /// Disk type or IPL flavour that cannot be booted
    #[error("{0}")]
    Unsupported(String),

    /// Short or failed block read, or local file write failure
    #[error("{0}")]
    Io(String),

    /// Kernel handoff failed
    #[error("{0}")]
    Handoff(String),
}

impl Error {
    /// Get the message carried by this error
    pub fn message(&self) -> &str {
        match self {
            Self::Device(msg)
            | Self::Format(msg)
            | Self::Unsupported(msg)
            | Self::Io(msg)
            | Self::Handoff(msg) => msg,
        }
    }

    /// Take ownership of the message carried by this error
    pub fn into_message(self) -> String {
        match self {
            Self::Device(msg)
            | Self::Format(msg)
            | Self::Unsupported(msg)
            | Self::Io(msg)
            | Self::Handoff(msg) => msg,
        }
    }

    /// Prefix the message with outer context, keeping the error kind
    ///
    /// `Error::Io("short read")` with prefix `"Error loading kernel"`
    /// becomes `Error::Io("Error loading kernel - short read")`.
    pub fn context(self, prefix: &str) -> Self {
        let wrap = |msg: String| format!("{prefix} - {msg}");
        match self {
            Self::Device(msg) => Self::Device(wrap(msg)),
            Self::Format(msg) => Self::Format(wrap(msg)),
            Self::Unsupported(msg) => Self::Unsupported(wrap(msg)),
            Self::Io(msg) => Self::Io(wrap(msg)),
            Self::Handoff(msg) => Self::Handoff(wrap(msg)),
        }
    }

    pub(crate) fn format(msg: &str) -> Self {
        Self::Format(String::from(msg))
    }
}
