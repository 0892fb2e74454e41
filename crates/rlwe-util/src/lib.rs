#![warn(missing_docs)]

//! Utility functions for the rlwe.rs library.

use num_traits::{NumCast, PrimInt, ToPrimitive, Unsigned};

/// Computes `a * b * c` in an unsigned integer domain, returning `None` if
/// the mathematical product exceeds the representable range of `T` instead
/// of wrapping.
///
/// Buffer sizes are products of three caller-controlled dimensions, so every
/// such computation must go through this function rather than plain `*`.
///
/// ```rust
/// assert_eq!(rlwe_util::checked_mul3(2u64, 3, 4), Some(24));
/// assert_eq!(rlwe_util::checked_mul3(1u64 << 20, 1 << 20, 1 << 30), None);
/// ```
pub fn checked_mul3<T: PrimInt + Unsigned>(a: T, b: T, c: T) -> Option<T> {
    a.checked_mul(&b)?.checked_mul(&c)
}

/// Converts `value` into the integer type `U`, returning `None` if it does
/// not fit.
///
/// ```rust
/// assert_eq!(rlwe_util::checked_cast::<u64, usize>(42), Some(42));
/// assert_eq!(rlwe_util::checked_cast::<u64, u8>(256), None);
/// ```
pub fn checked_cast<T: ToPrimitive, U: NumCast>(value: T) -> Option<U> {
    U::from(value)
}
