// Digest registry
// Maps algorithm names to constructors for resettable streaming accumulators

use super::error::ScanError;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use blake2::{Blake2b512, Blake2s256};
use md5::Md5;
use sha1::Sha1;
use sha2::digest::FixedOutputReset;
use sha2::{Digest as Sha2Digest, Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_512};

/// Output of an accumulator for one file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(Vec<u8>);

impl Digest {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex rendering, as printed by the CLI
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Stateful streaming digest computation owned by a single worker
///
/// An accumulator is reused across files, so every method that ends a file
/// (`finalize_reset`, `reset`) must leave it in its initial state.
pub trait Accumulator: Send {
    /// Feed more bytes of the current file
    fn update(&mut self, data: &[u8]);

    /// Produce the digest of everything fed so far and reset for the next file
    fn finalize_reset(&mut self) -> Digest;

    /// Discard everything fed so far
    fn reset(&mut self);

    /// Digest length in bytes
    fn output_size(&self) -> usize;
}

/// Adapter from any RustCrypto hasher to [`Accumulator`]
pub struct DigestAccumulator<D>(D);

impl<D> DigestAccumulator<D>
where
    D: Sha2Digest + FixedOutputReset + Send,
{
    pub fn new() -> Self {
        Self(<D as Sha2Digest>::new())
    }
}

impl<D> Default for DigestAccumulator<D>
where
    D: Sha2Digest + FixedOutputReset + Send,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Accumulator for DigestAccumulator<D>
where
    D: Sha2Digest + FixedOutputReset + Send,
{
    fn update(&mut self, data: &[u8]) {
        Sha2Digest::update(&mut self.0, data);
    }

    fn finalize_reset(&mut self) -> Digest {
        Digest(Sha2Digest::finalize_reset(&mut self.0).to_vec())
    }

    fn reset(&mut self) {
        Sha2Digest::reset(&mut self.0);
    }

    fn output_size(&self) -> usize {
        <D as Sha2Digest>::output_size()
    }
}

/// Constructor producing a fresh, zero-state accumulator on every call
pub type AccumulatorFactory = Arc<dyn Fn() -> Box<dyn Accumulator> + Send + Sync>;

/// A resolved algorithm: its name, output width, and accumulator constructor
#[derive(Clone)]
pub struct Algorithm {
    name: String,
    output_bits: usize,
    factory: AccumulatorFactory,
}

impl Algorithm {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output_bits(&self) -> usize {
        self.output_bits
    }

    /// Create a new accumulator for this algorithm
    pub fn accumulator(&self) -> Box<dyn Accumulator> {
        (self.factory)()
    }
}

impl fmt::Debug for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Algorithm")
            .field("name", &self.name)
            .field("output_bits", &self.output_bits)
            .finish_non_exhaustive()
    }
}

/// Immutable name -> algorithm mapping
///
/// Built once at startup and passed by reference into the scan engine.
/// Tests build their own registry with [`DigestRegistry::empty`] and
/// [`DigestRegistry::register`] to inject doubles.
#[derive(Clone, Default)]
pub struct DigestRegistry {
    algorithms: BTreeMap<String, Algorithm>,
}

impl DigestRegistry {
    /// A registry with no algorithms
    pub fn empty() -> Self {
        Self::default()
    }

    /// The algorithms the CLI supports
    pub fn builtin() -> Self {
        Self::empty()
            .with_digest::<Md5>("md5")
            .with_digest::<Sha1>("sha1")
            .with_digest::<Sha224>("sha224")
            .with_digest::<Sha256>("sha256")
            .with_digest::<Sha384>("sha384")
            .with_digest::<Sha512>("sha512")
            .with_digest::<Sha3_256>("sha3-256")
            .with_digest::<Sha3_512>("sha3-512")
            .with_digest::<Blake2b512>("blake2b")
            .with_digest::<Blake2s256>("blake2s")
    }

    /// Add an algorithm under `name` (stored lowercase)
    pub fn register<F>(mut self, name: &str, output_bits: usize, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Accumulator> + Send + Sync + 'static,
    {
        let name = name.to_lowercase();
        self.algorithms.insert(
            name.clone(),
            Algorithm {
                name,
                output_bits,
                factory: Arc::new(factory),
            },
        );
        self
    }

    fn with_digest<D>(self, name: &str) -> Self
    where
        D: Sha2Digest + FixedOutputReset + Send + 'static,
    {
        let output_bits = <D as Sha2Digest>::output_size() * 8;
        self.register(name, output_bits, || {
            Box::new(DigestAccumulator::<D>::new()) as Box<dyn Accumulator>
        })
    }

    /// Look up an algorithm by name
    ///
    /// Matching is case-insensitive and accepts dashed SHA-2 spellings
    /// such as `SHA-256`.
    pub fn resolve(&self, name: &str) -> Result<Algorithm, ScanError> {
        let key = normalize_name(name);
        self.algorithms
            .get(&key)
            .cloned()
            .ok_or_else(|| ScanError::UnsupportedAlgorithm {
                algorithm: name.to_string(),
            })
    }

    /// Registered algorithms in name order
    pub fn algorithms(&self) -> impl Iterator<Item = &Algorithm> {
        self.algorithms.values()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.algorithms.contains_key(&normalize_name(name))
    }
}

fn normalize_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_prefix("sha-") {
        Some(bits) => format!("sha{bits}"),
        None => lower,
    }
}

// Tests moved to tests/scan/registry_tests.rs
