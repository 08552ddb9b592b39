//! Fingerprinting of assembled program text.

use sieve_common::Fingerprint;
use sieve_source::ProgramText;

/// Computes the cache key of a program.
///
/// The fingerprint depends only on the assembled bytes, so the preamble
/// (library imports) participates: the same body with different imports is a
/// different program.
pub struct SourceHasher;

impl SourceHasher {
    /// Returns the fingerprint of an assembled program.
    pub fn fingerprint(program: &ProgramText) -> Fingerprint {
        Self::fingerprint_bytes(program.as_bytes())
    }

    /// Returns the fingerprint of raw program bytes.
    pub fn fingerprint_bytes(bytes: &[u8]) -> Fingerprint {
        Fingerprint::of(bytes)
    }
}
