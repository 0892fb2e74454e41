//! Error types for the rlwe crate.

use thiserror::Error;

/// The errors that can occur in the rlwe crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The parameter context did not pass validation, so nothing can be
    /// bound against it.
    #[error("invalid parameter context: configuration did not validate")]
    InvalidContext,

    /// The parameter-set identifier does not resolve in the given context.
    #[error("unknown parameter set")]
    UnknownParameterSet,

    /// A size or capacity lies outside its allowed bounds.
    #[error("invalid size {0}: must lie in [{1}, {2}]")]
    InvalidSize(usize, usize, usize),

    /// A buffer-size computation exceeded the representable range.
    #[error("size arithmetic overflow")]
    Overflow,

    /// An I/O failure occurred while saving or loading.
    #[error("stream error: {0}")]
    StreamError(#[from] std::io::Error),

    /// Serialized ciphertext data is inconsistent with its declared header.
    #[error("corrupt ciphertext data")]
    CorruptData,

    /// A narrowing integer conversion was out of range.
    #[error("integer out of range for narrowing conversion")]
    RangeError,

    /// An error in the encryption parameters.
    #[error("{0}")]
    ParametersError(#[from] ParametersError),
}

/// The errors that can arise when validating encryption parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParametersError {
    /// The polynomial degree is invalid.
    #[error("invalid degree {0}: must be a power of two of at least 8")]
    InvalidDegree(usize),

    /// A coefficient modulus is invalid.
    #[error("invalid modulus {0}: must lie in [2, 2^62)")]
    InvalidModulus(u64),

    /// The modulus list is empty.
    #[error("no coefficient modulus provided")]
    NoModuli,
}

/// A convenience alias for `Result` over this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::{Error, ParametersError};

    #[test]
    fn display_messages() {
        assert_eq!(
            Error::InvalidSize(17, 1, 16).to_string(),
            "invalid size 17: must lie in [1, 16]"
        );
        assert_eq!(Error::Overflow.to_string(), "size arithmetic overflow");
        assert_eq!(
            Error::from(ParametersError::InvalidDegree(12)).to_string(),
            "invalid degree 12: must be a power of two of at least 8"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        assert!(matches!(Error::from(io), Error::StreamError(_)));
    }
}
