#![warn(missing_docs)]

//! Traits for the rlwe.rs library.

use std::sync::Arc;

/// Indicates that the object is serializable to a byte sequence.
pub trait Serialize {
    /// Serializes the object into a vector of bytes.
    fn to_bytes(&self) -> Vec<u8>;
}

/// Indicates that the object can be reconstructed from a byte sequence on
/// its own, without consulting encryption parameters.
pub trait Deserialize: Sized {
    /// The error returned when deserialization fails.
    type Error;

    /// Attempts to deserialize the object from a slice of bytes.
    fn try_deserialize(bytes: &[u8]) -> Result<Self, Self::Error>;
}

/// Indicates that the object is parametrized by a set of encryption
/// parameters.
pub trait Parametrized {
    /// The type of the parameters.
    type Parameters;
}

/// Indicates that the object can be reconstructed from a byte sequence and
/// validated against a set of encryption parameters.
pub trait DeserializeParametrized: Parametrized + Sized {
    /// The error returned when deserialization fails.
    type Error;

    /// Attempts to deserialize the object from a slice of bytes, rejecting
    /// content that is not valid under the provided parameters.
    fn from_bytes(bytes: &[u8], par: &Arc<Self::Parameters>) -> Result<Self, Self::Error>;
}
