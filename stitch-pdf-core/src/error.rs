//! Error types for PDF parsing and merging

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, PdfError>;

/// Main error type for PDF operations
#[derive(Error, Debug)]
pub enum PdfError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed syntax or an illegal value in the input
    #[error("Read error at offset {offset}: {message}")]
    Read { offset: u64, message: String },

    /// The input ended in the middle of a token or payload
    #[error("Stream truncated at offset {offset}")]
    StreamTruncated { offset: u64 },

    /// A stream object violates its own framing
    #[error("Stream format error at offset {offset}: {message}")]
    StreamFormat { offset: u64, message: String },

    /// The object graph contradicts itself
    #[error("Inconsistent document: {0}")]
    Consistency(String),

    /// The operation is not valid for this object state
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A stream filter this crate does not implement
    #[error("Unsupported filter: /{0}")]
    UnsupportedFilter(String),

    /// A destination with an unknown fit type or wrong argument count
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    /// Reference resolution exceeded the recursion limit
    #[error("Reference chain too deep resolving {0} {1} R")]
    ResolutionDepth(u64, u32),
}

impl PdfError {
    pub(crate) fn read(offset: u64, message: impl Into<String>) -> Self {
        PdfError::Read {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn stream_format(offset: u64, message: impl Into<String>) -> Self {
        PdfError::StreamFormat {
            offset,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_display() {
        let err = PdfError::read(42, "unexpected token");
        assert_eq!(err.to_string(), "Read error at offset 42: unexpected token");
    }

    #[test]
    fn test_truncated_display() {
        let err = PdfError::StreamTruncated { offset: 7 };
        assert_eq!(err.to_string(), "Stream truncated at offset 7");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: PdfError = io.into();
        assert!(matches!(err, PdfError::Io(_)));
    }

    #[test]
    fn test_filter_display() {
        let err = PdfError::UnsupportedFilter("JBIG2Decode".to_string());
        assert_eq!(err.to_string(), "Unsupported filter: /JBIG2Decode");
    }
}
