//! Content-addressed cache of compiled query artifacts.
//!
//! Programs are keyed by the SHA-256 [`Fingerprint`](sieve_common::Fingerprint)
//! of their assembled text. Each compiled artifact is stored as a single
//! `<fingerprint>.sqa` file with a validated header, published by atomic
//! rename so that a crashed or concurrent writer can never leave a partially
//! written artifact under its final name.

#![warn(missing_docs)]

pub mod artifact;
pub mod cache;
pub mod error;
pub mod hasher;

pub use artifact::ARTIFACT_EXT;
pub use cache::{ArtifactCache, CacheEntry, Outcome, Resolved};
pub use error::CacheError;
pub use hasher::SourceHasher;
