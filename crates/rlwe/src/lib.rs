#![warn(missing_docs)]

//! In-memory container and persistence layer for RLWE ciphertexts.
//!
//! A [`Ciphertext`] is one flat array of modular coefficients shaped
//! `size × mod_count × degree`, bound to a parameter set resolved through a
//! [`ParameterContext`]. The crate covers the resource management around
//! that buffer: overflow-checked capacity arithmetic, bind-time validation,
//! two-level validity checking (structural and numeric), and a byte-exact
//! little-endian serialization format whose load path is failure-atomic.
//! Producing the coefficients (encryption, evaluation, decryption) is out
//! of scope.
//!
//! # Example
//!
//! ```rust
//! use rlwe::{Ciphertext, ParameterContext};
//!
//! # fn main() -> rlwe::Result<()> {
//! let context = ParameterContext::new_arc(&[0x3fffffff000001, 0x3ffffffef40001], 1024);
//! let mut ct = Ciphertext::new();
//! ct.resize(&context, context.first_parms_id(), 2)?;
//! assert_eq!(ct.data().len(), 2 * 2 * 1024);
//!
//! let mut bytes = Vec::new();
//! ct.save(&mut bytes)?;
//!
//! let mut restored = Ciphertext::new();
//! restored.load(&context, &mut bytes.as_slice())?;
//! assert_eq!(restored, ct);
//! # Ok(())
//! # }
//! ```

mod buffer;
mod ciphertext;
mod context;
mod errors;
mod serialization;

pub use buffer::CoeffBuffer;
pub use ciphertext::{Ciphertext, CIPHERTEXT_SIZE_MAX, CIPHERTEXT_SIZE_MIN};
pub use context::{ContextData, ParameterContext, ParmsId};
pub use errors::{Error, ParametersError, Result};
