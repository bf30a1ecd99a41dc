use std::path::PathBuf;

use thiserror::Error;

/// Broad category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Signature mismatch, malformed directory table or inconsistent chunk sizes.
    Format,
    /// Short read, seek past end, or a failure of the underlying stream.
    Io,
    /// A logical path could not be resolved.
    NotFound,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{format}: invalid magic: expected {expected:?}, found {found:?}")]
    InvalidMagic {
        format: &'static str,
        expected: Vec<u8>,
        found: Vec<u8>,
    },

    #[error("{format}: {message}")]
    Format {
        format: &'static str,
        message: String,
    },

    #[error("offset {offset:#x} is past the end of the stream ({len} bytes)")]
    OffsetOutOfRange { offset: u64, len: u64 },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidMagic { .. } | Error::Format { .. } => ErrorKind::Format,
            Error::OffsetOutOfRange { .. } | Error::Io(_) => ErrorKind::Io,
            Error::NotFound(_) => ErrorKind::NotFound,
        }
    }

    pub(crate) fn format(format: &'static str, message: impl Into<String>) -> Self {
        Error::Format {
            format,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
