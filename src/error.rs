//! Error types for the jpeg2png-rs pipeline.

use std::fmt;

/// Result type for jpeg2png-rs operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for jpeg2png-rs operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// I/O failure opening/reading the input or writing the output.
    Io(String),
    /// The JPEG is structurally valid but uses a feature this pipeline
    /// does not support (progressive/arithmetic coding, non-3-component,
    /// subsampling ratios other than integer 1x/2x per axis).
    UnsupportedJpeg {
        /// Human-readable reason.
        reason: &'static str,
    },
    /// The JPEG bitstream itself is malformed.
    MalformedJpeg {
        /// Human-readable reason.
        reason: &'static str,
    },
    /// A plane's dimensions are not multiples of 8, or are zero.
    InvalidDimensions {
        /// Plane width.
        width: usize,
        /// Plane height.
        height: usize,
    },
    /// The chroma subsampling ratio implied by the plane dimensions doesn't
    /// match the factor-2 layout this pipeline assumes (§9 "chroma layout
    /// assertion").
    UnsupportedSubsampling,
    /// Memory allocation failed (e.g. `try_reserve` reported exhaustion).
    AllocationFailed,
    /// An internal invariant was violated; indicates a bug, not bad input.
    InternalError(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(msg) => write!(f, "I/O error: {}", msg),
            Error::UnsupportedJpeg { reason } => {
                write!(f, "unsupported JPEG: {}", reason)
            }
            Error::MalformedJpeg { reason } => {
                write!(f, "malformed JPEG: {}", reason)
            }
            Error::InvalidDimensions { width, height } => {
                write!(f, "invalid plane dimensions: {}x{}", width, height)
            }
            Error::UnsupportedSubsampling => {
                write!(f, "unsupported chroma subsampling (only 1x/2x per axis is supported)")
            }
            Error::AllocationFailed => write!(f, "memory allocation failed"),
            Error::InternalError(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::AllocationFailed
    }
}

impl From<png::EncodingError> for Error {
    fn from(e: png::EncodingError) -> Self {
        Error::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = [
            (
                Error::InvalidDimensions { width: 0, height: 100 },
                "invalid plane dimensions: 0x100",
            ),
            (
                Error::UnsupportedJpeg { reason: "progressive" },
                "unsupported JPEG: progressive",
            ),
            (Error::AllocationFailed, "memory allocation failed"),
            (
                Error::UnsupportedSubsampling,
                "unsupported chroma subsampling (only 1x/2x per axis is supported)",
            ),
        ];

        for (error, expected_msg) in errors {
            assert_eq!(error.to_string(), expected_msg);
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_clone_and_eq() {
        let a = Error::InternalError("x");
        let b = a.clone();
        assert_eq!(a, b);
    }
}
