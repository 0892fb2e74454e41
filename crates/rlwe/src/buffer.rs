//! Owned storage for ciphertext coefficients.

use std::fmt;
use std::io::{Read, Write};

use rlwe_util::checked_cast;

use crate::serialization::{read_u64, write_u64};
use crate::{Error, Result};

// Elements moved per scratch chunk while streaming a payload.
const IO_CHUNK: usize = 512;

/// Contiguous, owned storage for modular coefficients.
///
/// The buffer distinguishes its logical length (the visible elements) from
/// its physical capacity (the backing allocation). [`reserve`] only ever
/// grows the allocation; storage shrinks only when the whole buffer is
/// replaced through [`load`] or swapped away.
///
/// [`reserve`]: CoeffBuffer::reserve
/// [`load`]: CoeffBuffer::load
#[derive(Default, PartialEq, Eq)]
pub struct CoeffBuffer {
    data: Vec<u64>,
}

impl CoeffBuffer {
    /// Creates an empty buffer without allocating.
    pub fn new() -> Self {
        CoeffBuffer { data: Vec::new() }
    }

    /// Number of visible elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the logical length is zero.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of elements the backing allocation holds without growing.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Grows the physical capacity to at least `capacity` elements.
    ///
    /// `capacity` is an absolute element count, not an increment. Existing
    /// elements keep their values and positions, and a target at or below
    /// the current capacity leaves the allocation untouched.
    pub fn reserve(&mut self, capacity: usize) {
        if capacity > self.data.capacity() {
            self.data.reserve_exact(capacity - self.data.len());
        }
    }

    /// Sets the logical length to `new_length`.
    ///
    /// Growing zero-fills the newly visible elements; shrinking discards the
    /// tail but keeps its storage allocated as spare capacity. The surviving
    /// prefix is preserved exactly.
    pub fn resize(&mut self, new_length: usize) {
        self.data.resize(new_length, 0);
    }

    /// Exchanges the storage of two buffers in constant time.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.data, &mut other.data);
    }

    /// Visible elements as a slice.
    pub fn as_slice(&self) -> &[u64] {
        &self.data
    }

    /// Visible elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [u64] {
        &mut self.data
    }

    /// Writes the element count as a u64 followed by each element, all
    /// little-endian. An empty buffer still writes its explicit zero count.
    pub fn save<W: Write>(&self, stream: &mut W) -> Result<()> {
        write_u64(stream, self.data.len() as u64)?;
        let mut chunk = [0u8; 8 * IO_CHUNK];
        for values in self.data.chunks(IO_CHUNK) {
            let bytes = &mut chunk[..8 * values.len()];
            for (le, value) in bytes.chunks_exact_mut(8).zip(values) {
                le.copy_from_slice(&value.to_le_bytes());
            }
            stream.write_all(bytes)?;
        }
        Ok(())
    }

    /// Replaces the contents with a payload written by
    /// [`save`](CoeffBuffer::save).
    ///
    /// The payload is read into staging storage and committed only once it
    /// has arrived completely, so a failing stream leaves the buffer as it
    /// was. Reads happen through a bounded scratch chunk, so a hostile
    /// length prefix cannot demand the declared allocation before the
    /// stream runs dry.
    pub fn load<R: Read>(&mut self, stream: &mut R) -> Result<()> {
        let declared = read_u64(stream)?;
        let count: usize = checked_cast(declared).ok_or(Error::RangeError)?;

        let mut staging: Vec<u64> = Vec::new();
        let mut chunk = [0u8; 8 * IO_CHUNK];
        let mut remaining = count;
        while remaining > 0 {
            let take = remaining.min(IO_CHUNK);
            let bytes = &mut chunk[..8 * take];
            stream.read_exact(bytes)?;
            staging.extend(bytes.chunks_exact(8).map(|le| {
                let mut word = [0u8; 8];
                word.copy_from_slice(le);
                u64::from_le_bytes(word)
            }));
            remaining -= take;
        }

        self.data = staging;
        Ok(())
    }
}

impl Clone for CoeffBuffer {
    fn clone(&self) -> Self {
        CoeffBuffer {
            data: self.data.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        // Vec::clone_from reuses the existing allocation when it suffices.
        self.data.clone_from(&source.data);
    }
}

impl fmt::Debug for CoeffBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoeffBuffer")
            .field("len", &self.data.len())
            .field("capacity", &self.data.capacity())
            .finish()
    }
}
