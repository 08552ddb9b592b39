//! Shared foundational types used across the sieve workspace.
//!
//! This crate provides the program fingerprint used as the artifact cache key,
//! a fast content checksum for artifact integrity, and the escape-sequence
//! codec shared by the command line and the `tsv` query library.

#![warn(missing_docs)]

pub mod escape;
pub mod fingerprint;
pub mod hash;

pub use escape::{decode_escapes, encode_escapes};
pub use fingerprint::{Fingerprint, ParseFingerprintError};
pub use hash::ContentHash;
