//! Parameter-set resolution for ciphertext binding.
//!
//! A [`ParameterContext`] is built once from a coefficient modulus chain and
//! a polynomial degree, then consulted by ciphertexts on every bind. Each
//! chain level keeps a prefix of the moduli and is addressed by a
//! [`ParmsId`] derived from its contents, so dropping the last modulus
//! (modulus switching) moves an entity to the next level's identifier.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::errors::ParametersError;
use crate::Result;

/// Opaque identifier of one parameter set, derived from its contents.
///
/// Two identifiers are equal exactly when degree and modulus chain agree, so
/// a stamped ciphertext can be matched back to the level it was produced
/// under without carrying the parameters themselves.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ParmsId(pub(crate) [u64; 4]);

impl ParmsId {
    /// Identifier of an unbound entity; resolves in no context.
    pub const ZERO: ParmsId = ParmsId([0; 4]);

    fn derive(degree: usize, moduli: &[u64]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((degree as u64).to_le_bytes());
        hasher.update((moduli.len() as u64).to_le_bytes());
        for q in moduli {
            hasher.update(q.to_le_bytes());
        }
        let digest = hasher.finalize();
        let mut words = [0u64; 4];
        for (word, chunk) in words.iter_mut().zip(digest.chunks_exact(8)) {
            let mut le = [0u8; 8];
            le.copy_from_slice(chunk);
            *word = u64::from_le_bytes(le);
        }
        ParmsId(words)
    }
}

impl fmt::Debug for ParmsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ParmsId({:016x}{:016x}{:016x}{:016x})",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// Immutable snapshot of one resolvable parameter set.
#[derive(Debug, PartialEq, Eq)]
pub struct ContextData {
    parms_id: ParmsId,
    degree: usize,
    moduli: Box<[u64]>,
    modulus: BigUint,
    level: usize,
}

impl ContextData {
    /// Identifier of this parameter set.
    pub fn parms_id(&self) -> ParmsId {
        self.parms_id
    }

    /// Polynomial degree.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Coefficient moduli of this level.
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Number of coefficient moduli.
    pub fn mod_count(&self) -> usize {
        self.moduli.len()
    }

    /// Product of the coefficient moduli.
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Position in the chain; level 0 keeps every modulus.
    pub fn level(&self) -> usize {
        self.level
    }
}

/// Resolver from parameter-set identifiers to concrete dimensions.
///
/// Construction never fails: an invalid configuration is recorded as a
/// qualifier instead, the chain stays empty, and every binding operation
/// against the context reports it as invalid. This keeps "the context
/// exists" and "the context validated" as two distinct, queryable states.
#[derive(Debug)]
pub struct ParameterContext {
    chain: Vec<Arc<ContextData>>,
    levels: HashMap<ParmsId, usize>,
    qualifier: Option<ParametersError>,
}

impl ParameterContext {
    /// Creates a context over `moduli` at the given polynomial `degree`.
    ///
    /// The degree must be a power of two of at least 8 and each modulus
    /// must lie in `[2, 2^62)`; violations are recorded and reported
    /// through [`validated`](Self::validated) and
    /// [`validation_error`](Self::validation_error).
    pub fn new(moduli: &[u64], degree: usize) -> Self {
        if let Some(error) = Self::qualify(moduli, degree) {
            return ParameterContext {
                chain: Vec::new(),
                levels: HashMap::new(),
                qualifier: Some(error),
            };
        }

        let chain = (0..moduli.len())
            .map(|level| {
                let moduli = &moduli[..moduli.len() - level];
                Arc::new(ContextData {
                    parms_id: ParmsId::derive(degree, moduli),
                    degree,
                    moduli: moduli.into(),
                    modulus: moduli.iter().map(|q| BigUint::from(*q)).product(),
                    level,
                })
            })
            .collect_vec();
        let levels = chain
            .iter()
            .enumerate()
            .map(|(level, data)| (data.parms_id, level))
            .collect();

        ParameterContext {
            chain,
            levels,
            qualifier: None,
        }
    }

    /// Creates the context and wraps it in an [`Arc`].
    pub fn new_arc(moduli: &[u64], degree: usize) -> Arc<Self> {
        Arc::new(Self::new(moduli, degree))
    }

    fn qualify(moduli: &[u64], degree: usize) -> Option<ParametersError> {
        if degree < 8 || !degree.is_power_of_two() {
            return Some(ParametersError::InvalidDegree(degree));
        }
        if moduli.is_empty() {
            return Some(ParametersError::NoModuli);
        }
        moduli
            .iter()
            .find(|&&q| q < 2 || q >= 1 << 62)
            .map(|&q| ParametersError::InvalidModulus(q))
    }

    /// True when the configuration passed validation at construction.
    pub fn validated(&self) -> bool {
        self.qualifier.is_none()
    }

    /// The validation failure recorded at construction, if any.
    pub fn validation_error(&self) -> Option<&ParametersError> {
        self.qualifier.as_ref()
    }

    /// Returns `Ok` for a validated context and the recorded failure
    /// otherwise.
    ///
    /// The fallible spelling of the qualifier check that every ciphertext
    /// binding performs; calling it once after construction surfaces a bad
    /// configuration directly rather than as
    /// [`InvalidContext`](crate::Error::InvalidContext) on first use.
    pub fn validate(&self) -> Result<()> {
        match &self.qualifier {
            None => Ok(()),
            Some(error) => Err(error.clone().into()),
        }
    }

    /// Resolves an identifier to its parameter-set snapshot.
    pub fn resolve(&self, parms_id: &ParmsId) -> Option<&Arc<ContextData>> {
        self.levels.get(parms_id).map(|&level| &self.chain[level])
    }

    /// Snapshot at the given chain level, if it exists.
    pub fn context_data_at_level(&self, level: usize) -> Option<&Arc<ContextData>> {
        self.chain.get(level)
    }

    /// Identifier of the full modulus chain (level 0), or
    /// [`ParmsId::ZERO`] for a context that failed validation.
    pub fn first_parms_id(&self) -> ParmsId {
        self.chain.first().map_or(ParmsId::ZERO, |data| data.parms_id)
    }

    /// Identifier of the last chain level (a single modulus), or
    /// [`ParmsId::ZERO`] for a context that failed validation.
    pub fn last_parms_id(&self) -> ParmsId {
        self.chain.last().map_or(ParmsId::ZERO, |data| data.parms_id)
    }

    /// Index of the deepest chain level.
    pub fn max_level(&self) -> usize {
        self.chain.len().saturating_sub(1)
    }
}
