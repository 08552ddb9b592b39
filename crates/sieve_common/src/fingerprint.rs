//! Content fingerprints identifying an assembled query program.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of a fingerprint digest in bytes.
const DIGEST_LEN: usize = 32;

/// A SHA-256 digest of a program's exact bytes.
///
/// Two programs with the same fingerprint are treated as the same compiled
/// artifact. The hex rendering is the artifact's file stem in the cache store,
/// so it must stay stable across processes and platforms.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint([u8; DIGEST_LEN]);

impl Fingerprint {
    /// Computes the fingerprint of a byte slice.
    pub fn of(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Returns an abbreviated hex form for log output.
    pub fn short(&self) -> String {
        self.to_string()[..12].to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

/// Error returned when a string is not a valid fingerprint rendering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid fingerprint '{0}': expected 64 hex digits")]
pub struct ParseFingerprintError(pub String);

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // `from_str_radix` alone would accept a leading `+` in a digit pair.
        if s.len() != DIGEST_LEN * 2 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseFingerprintError(s.to_string()));
        }
        let mut bytes = [0u8; DIGEST_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| ParseFingerprintError(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(Fingerprint::of(b"from l in lines select l"), Fingerprint::of(b"from l in lines select l"));
    }

    #[test]
    fn single_byte_change_differs() {
        let a = Fingerprint::of(b"select upper(l)");
        let b = Fingerprint::of(b"select upper(m)");
        assert_ne!(a, b);
    }

    #[test]
    fn known_digest() {
        // SHA-256 of the empty string.
        assert_eq!(
            Fingerprint::of(b"").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn display_parse_roundtrip() {
        let fp = Fingerprint::of(b"roundtrip");
        let parsed: Fingerprint = fp.to_string().parse().unwrap();
        assert_eq!(fp, parsed);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!("abc".parse::<Fingerprint>().is_err());
        let not_hex = "z".repeat(64);
        assert!(not_hex.parse::<Fingerprint>().is_err());
    }

    #[test]
    fn parse_rejects_sign_in_digit_pair() {
        let signed = format!("+f{}", "0".repeat(62));
        assert!(signed.parse::<Fingerprint>().is_err());
    }

    #[test]
    fn short_is_prefix() {
        let fp = Fingerprint::of(b"short");
        assert!(fp.to_string().starts_with(&fp.short()));
        assert_eq!(fp.short().len(), 12);
    }
}
