//! Ciphertext container bound to a parameter set.
//!
//! A [`Ciphertext`] owns one flat coefficient buffer shaped
//! `size × mod_count × degree` together with the metadata binding it to a
//! parameter set: the [`ParmsId`] stamp, the NTT-domain flag and the scale.
//! This module only manages that buffer; producing and consuming the
//! coefficients (encryption, evaluation, decryption) happens elsewhere.
//!
//! The mutators are failure-atomic: `reserve`, `resize` and the load paths
//! either apply completely or leave the entity exactly as it was. Every
//! buffer-size computation goes through overflow-checked arithmetic, since
//! the three factors may come straight from an untrusted stream.

use std::io::{Read, Write};
use std::sync::Arc;

use itertools::iproduct;
use ndarray::{ArrayView3, ArrayViewMut3};
use rlwe_traits::{Deserialize, DeserializeParametrized, Parametrized, Serialize};
use rlwe_util::{checked_cast, checked_mul3};

use crate::buffer::CoeffBuffer;
use crate::context::{ContextData, ParameterContext, ParmsId};
use crate::serialization::{CiphertextHeader, HEADER_BYTES};
use crate::{Error, Result};

/// Smallest number of polynomial components a bound ciphertext may hold.
pub const CIPHERTEXT_SIZE_MIN: usize = 1;

/// Largest number of polynomial components a ciphertext may hold.
pub const CIPHERTEXT_SIZE_MAX: usize = 16;

/// An RNS ciphertext: `size` polynomial components, each carrying
/// `mod_count` residue rows of `degree` coefficients, stored flat in
/// component-major order.
///
/// A fresh ciphertext is unbound and empty. [`reserve`](Self::reserve) and
/// [`resize`](Self::resize) bind it to a parameter set resolved through a
/// [`ParameterContext`] and establish the invariants that hold between all
/// calls: `size <= size_capacity` and buffer length
/// `= size * degree * mod_count`.
#[derive(Debug, PartialEq)]
pub struct Ciphertext {
    parms_id: ParmsId,
    is_ntt_form: bool,
    size: usize,
    size_capacity: usize,
    degree: usize,
    mod_count: usize,
    scale: f64,
    data: CoeffBuffer,
}

impl Ciphertext {
    /// Creates an unbound, empty ciphertext without allocating.
    pub fn new() -> Self {
        Ciphertext {
            parms_id: ParmsId::ZERO,
            is_ntt_form: false,
            size: 0,
            size_capacity: CIPHERTEXT_SIZE_MIN,
            degree: 0,
            mod_count: 0,
            scale: 1.0,
            data: CoeffBuffer::new(),
        }
    }

    /// Creates an empty ciphertext with storage reserved for
    /// `size_capacity` components under the given parameter set.
    pub fn with_capacity(
        context: &Arc<ParameterContext>,
        parms_id: ParmsId,
        size_capacity: usize,
    ) -> Result<Self> {
        let mut ct = Ciphertext::new();
        ct.reserve(context, parms_id, size_capacity)?;
        Ok(ct)
    }

    /// Resolves `parms_id` in a validated context, cloning the snapshot so
    /// the dimensions used below cannot change under us.
    fn resolve(context: &ParameterContext, parms_id: &ParmsId) -> Result<Arc<ContextData>> {
        if !context.validated() {
            return Err(Error::InvalidContext);
        }
        context
            .resolve(parms_id)
            .cloned()
            .ok_or(Error::UnknownParameterSet)
    }

    /// Rebinds the ciphertext to `parms_id` and grows its storage to hold
    /// `size_capacity` components.
    ///
    /// The logical size only changes if it exceeds the new capacity, in
    /// which case it is clamped down and the buffer truncated accordingly.
    /// On any error nothing is modified.
    pub fn reserve(
        &mut self,
        context: &Arc<ParameterContext>,
        parms_id: ParmsId,
        size_capacity: usize,
    ) -> Result<()> {
        let snapshot = Self::resolve(context, &parms_id)?;
        if !(CIPHERTEXT_SIZE_MIN..=CIPHERTEXT_SIZE_MAX).contains(&size_capacity) {
            return Err(Error::InvalidSize(
                size_capacity,
                CIPHERTEXT_SIZE_MIN,
                CIPHERTEXT_SIZE_MAX,
            ));
        }

        let degree = snapshot.degree();
        let mod_count = snapshot.mod_count();
        let capacity = checked_mul3(size_capacity, degree, mod_count).ok_or(Error::Overflow)?;
        let size = self.size.min(size_capacity);
        // Bounded by `capacity`, so this cannot overflow.
        let length = size * degree * mod_count;

        self.data.reserve(capacity);
        self.data.resize(length);
        self.parms_id = snapshot.parms_id();
        self.size = size;
        self.size_capacity = size_capacity;
        self.degree = degree;
        self.mod_count = mod_count;
        Ok(())
    }

    /// Rebinds the ciphertext to `parms_id` and sets its logical size to
    /// `size` components, zero-filling on growth and truncating on shrink.
    ///
    /// `size` must lie in `[CIPHERTEXT_SIZE_MIN, CIPHERTEXT_SIZE_MAX]` or be
    /// exactly 0 for a cleared ciphertext. On any error nothing is
    /// modified.
    pub fn resize(
        &mut self,
        context: &Arc<ParameterContext>,
        parms_id: ParmsId,
        size: usize,
    ) -> Result<()> {
        let snapshot = Self::resolve(context, &parms_id)?;
        if size != 0 && !(CIPHERTEXT_SIZE_MIN..=CIPHERTEXT_SIZE_MAX).contains(&size) {
            return Err(Error::InvalidSize(
                size,
                CIPHERTEXT_SIZE_MIN,
                CIPHERTEXT_SIZE_MAX,
            ));
        }

        let degree = snapshot.degree();
        let mod_count = snapshot.mod_count();
        let length = checked_mul3(size, degree, mod_count).ok_or(Error::Overflow)?;

        self.data.resize(length);
        self.parms_id = snapshot.parms_id();
        self.size = size;
        self.size_capacity = self.size_capacity.max(size);
        self.degree = degree;
        self.mod_count = mod_count;
        Ok(())
    }

    /// Resets to the fresh unbound state, releasing the storage.
    pub fn release(&mut self) {
        *self = Ciphertext::new();
    }

    /// Resolves this ciphertext's own stamp in `context` and checks the
    /// recorded dimensions against the resolution.
    fn conformant_context_data<'a>(
        &self,
        context: &'a ParameterContext,
    ) -> Option<&'a Arc<ContextData>> {
        if !context.validated() {
            return None;
        }
        let data = context.resolve(&self.parms_id)?;
        (data.degree() == self.degree && data.mod_count() == self.mod_count).then_some(data)
    }

    /// Structural validity: the context validated, the stamp resolves in
    /// it, and the recorded dimensions match the resolution. Cheap; does
    /// not look at coefficient values.
    pub fn is_metadata_valid_for(&self, context: &Arc<ParameterContext>) -> bool {
        self.conformant_context_data(context).is_some()
    }

    /// Full validity: [`is_metadata_valid_for`](Self::is_metadata_valid_for)
    /// plus a scan of every coefficient against the modulus of its residue
    /// row. False as soon as any coefficient reaches its modulus.
    pub fn is_valid_for(&self, context: &Arc<ParameterContext>) -> bool {
        let Some(snapshot) = self.conformant_context_data(context) else {
            return false;
        };
        let moduli = snapshot.moduli();
        let coeffs = self.data.as_slice();
        for (i, j) in iproduct!(0..self.size, 0..self.mod_count) {
            let row = (i * self.mod_count + j) * self.degree;
            let q = moduli[j];
            if coeffs[row..row + self.degree].iter().any(|coeff| *coeff >= q) {
                return false;
            }
        }
        true
    }

    fn header(&self) -> Result<CiphertextHeader> {
        Ok(CiphertextHeader {
            parms_id: self.parms_id,
            is_ntt_form: self.is_ntt_form,
            size: checked_cast(self.size).ok_or(Error::RangeError)?,
            degree: checked_cast(self.degree).ok_or(Error::RangeError)?,
            mod_count: checked_cast(self.mod_count).ok_or(Error::RangeError)?,
            scale: self.scale,
        })
    }

    /// Writes the fixed little-endian header followed by the length-prefixed
    /// coefficient payload.
    pub fn save<W: Write>(&self, stream: &mut W) -> Result<()> {
        self.header()?.write(stream)?;
        self.data.save(stream)
    }

    /// Replaces this ciphertext with one read from `stream`, without
    /// checking coefficient values against any parameter set.
    ///
    /// The header must still be structurally consistent: the payload length
    /// has to equal `size * degree * mod_count` or the call fails with
    /// [`Error::CorruptData`]. All reading and checking happens before any
    /// field is touched, so on any error the previous state survives intact.
    /// Callers that need the numeric-range guarantee follow up with
    /// [`is_valid_for`](Self::is_valid_for), or use [`load`](Self::load).
    pub fn load_unchecked<R: Read>(&mut self, stream: &mut R) -> Result<()> {
        let header = CiphertextHeader::read(stream)?;
        let mut staging = CoeffBuffer::new();
        staging.load(stream)?;

        let expected =
            checked_mul3(header.size, header.degree, header.mod_count).ok_or(Error::Overflow)?;
        if staging.len() as u64 != expected {
            return Err(Error::CorruptData);
        }
        let size: usize = checked_cast(header.size).ok_or(Error::RangeError)?;
        let degree: usize = checked_cast(header.degree).ok_or(Error::RangeError)?;
        let mod_count: usize = checked_cast(header.mod_count).ok_or(Error::RangeError)?;

        self.parms_id = header.parms_id;
        self.is_ntt_form = header.is_ntt_form;
        self.size = size;
        self.size_capacity = size.max(CIPHERTEXT_SIZE_MIN);
        self.degree = degree;
        self.mod_count = mod_count;
        self.scale = header.scale;
        self.data.swap(&mut staging);
        Ok(())
    }

    /// Replaces this ciphertext with one read from `stream`, requiring it
    /// to be fully valid under `context`.
    ///
    /// The incoming entity is staged and validated first; a stream that
    /// does not pass [`is_valid_for`](Self::is_valid_for) fails with
    /// [`Error::CorruptData`] and leaves the previous state intact.
    pub fn load<R: Read>(
        &mut self,
        context: &Arc<ParameterContext>,
        stream: &mut R,
    ) -> Result<()> {
        let mut staged = Ciphertext::new();
        staged.load_unchecked(stream)?;
        if !staged.is_valid_for(context) {
            return Err(Error::CorruptData);
        }
        *self = staged;
        Ok(())
    }

    /// Identifier of the bound parameter set, or [`ParmsId::ZERO`] when
    /// unbound.
    pub fn parms_id(&self) -> ParmsId {
        self.parms_id
    }

    /// Whether the coefficients are in NTT (evaluation) domain. Metadata
    /// only; no transform happens here.
    pub fn is_ntt_form(&self) -> bool {
        self.is_ntt_form
    }

    /// Sets the NTT-domain flag.
    pub fn set_ntt_form(&mut self, is_ntt_form: bool) {
        self.is_ntt_form = is_ntt_form;
    }

    /// Number of polynomial components.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of components the reserved storage can hold.
    pub fn size_capacity(&self) -> usize {
        self.size_capacity
    }

    /// Polynomial degree of the bound parameter set, 0 when unbound.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of coefficient moduli of the bound parameter set, 0 when
    /// unbound.
    pub fn mod_count(&self) -> usize {
        self.mod_count
    }

    /// Scale factor. Opaque here; persisted verbatim.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Sets the scale factor.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    /// All coefficients as one flat slice in component-major order.
    pub fn data(&self) -> &[u64] {
        self.data.as_slice()
    }

    /// All coefficients as one flat mutable slice.
    pub fn data_mut(&mut self) -> &mut [u64] {
        self.data.as_mut_slice()
    }

    /// Coefficients of the `i`-th component, or `None` past the size.
    pub fn get(&self, i: usize) -> Option<&[u64]> {
        if i >= self.size {
            return None;
        }
        let stride = self.mod_count * self.degree;
        Some(&self.data.as_slice()[i * stride..(i + 1) * stride])
    }

    /// Mutable coefficients of the `i`-th component, or `None` past the
    /// size.
    pub fn get_mut(&mut self, i: usize) -> Option<&mut [u64]> {
        if i >= self.size {
            return None;
        }
        let stride = self.mod_count * self.degree;
        Some(&mut self.data.as_mut_slice()[i * stride..(i + 1) * stride])
    }

    /// Coefficients as a `size × mod_count × degree` view.
    pub fn coefficients(&self) -> ArrayView3<'_, u64> {
        ArrayView3::from_shape((self.size, self.mod_count, self.degree), self.data.as_slice())
            .expect("buffer length equals size * mod_count * degree")
    }

    /// Coefficients as a mutable `size × mod_count × degree` view.
    pub fn coefficients_mut(&mut self) -> ArrayViewMut3<'_, u64> {
        ArrayViewMut3::from_shape(
            (self.size, self.mod_count, self.degree),
            self.data.as_mut_slice(),
        )
        .expect("buffer length equals size * mod_count * degree")
    }
}

impl Default for Ciphertext {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Ciphertext {
    fn clone(&self) -> Self {
        Ciphertext {
            parms_id: self.parms_id,
            is_ntt_form: self.is_ntt_form,
            size: self.size,
            size_capacity: self.size_capacity,
            degree: self.degree,
            mod_count: self.mod_count,
            scale: self.scale,
            data: self.data.clone(),
        }
    }

    /// Deep-copies `source` while reusing the existing coefficient
    /// allocation when it is large enough.
    fn clone_from(&mut self, source: &Self) {
        self.parms_id = source.parms_id;
        self.is_ntt_form = source.is_ntt_form;
        self.size = source.size;
        self.size_capacity = source.size_capacity;
        self.degree = source.degree;
        self.mod_count = source.mod_count;
        self.scale = source.scale;
        self.data.clone_from(&source.data);
    }
}

impl Parametrized for Ciphertext {
    type Parameters = ParameterContext;
}

impl Serialize for Ciphertext {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_BYTES + 8 + 8 * self.data.len());
        self.save(&mut bytes).expect("writing to a Vec cannot fail");
        bytes
    }
}

impl Deserialize for Ciphertext {
    type Error = Error;

    fn try_deserialize(bytes: &[u8]) -> Result<Self> {
        let mut stream = bytes;
        let mut ct = Ciphertext::new();
        ct.load_unchecked(&mut stream)?;
        Ok(ct)
    }
}

impl DeserializeParametrized for Ciphertext {
    type Error = Error;

    fn from_bytes(bytes: &[u8], par: &Arc<ParameterContext>) -> Result<Self> {
        let mut stream = bytes;
        let mut ct = Ciphertext::new();
        ct.load(par, &mut stream)?;
        Ok(ct)
    }
}
