//! On-disk artifact format and atomic publication.
//!
//! An artifact file is a 4-byte little-endian header length, a bincode
//! [`ArtifactHeader`], and the bincode payload. The header carries magic
//! bytes, a format version, the producing tool version, and an XXH3 checksum
//! of the payload; any mismatch rejects the file.

use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sieve_common::ContentHash;

use crate::error::CacheError;

/// Magic bytes identifying a sieve artifact.
const ARTIFACT_MAGIC: [u8; 4] = *b"SIEV";

/// Current artifact format version. Increment on breaking changes to
/// the header or payload layout.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// File extension of stored artifacts.
pub const ARTIFACT_EXT: &str = "sqa";

/// Suffix of in-flight temporary files in the cache directory.
pub(crate) const TEMP_SUFFIX: &str = ".tmp";

/// Header prepended to every artifact for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Magic bytes: must be `b"SIEV"`.
    pub magic: [u8; 4],

    /// Artifact format version.
    pub format_version: u32,

    /// sieve version that produced this artifact.
    pub tool_version: String,

    /// Checksum of the payload bytes.
    pub checksum: ContentHash,
}

/// Serializes `value` into a complete artifact file image.
pub fn encode<T: Serialize>(value: &T, tool_version: &str) -> Result<Vec<u8>, CacheError> {
    let payload = bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

    let header = ArtifactHeader {
        magic: ARTIFACT_MAGIC,
        format_version: ARTIFACT_FORMAT_VERSION,
        tool_version: tool_version.to_string(),
        checksum: ContentHash::of(&payload),
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Validates an artifact file image read from `path` and decodes its payload.
pub fn decode<T: DeserializeOwned>(
    raw: &[u8],
    path: &Path,
    tool_version: &str,
) -> Result<T, CacheError> {
    let invalid = |reason: &str| CacheError::InvalidHeader {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if raw.len() < 4 {
        return Err(invalid("file shorter than header length prefix"));
    }
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&raw[..4]);
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    if raw.len() < 4 + header_len {
        return Err(invalid("truncated header"));
    }

    let (header, _): (ArtifactHeader, usize) =
        bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
            .map_err(|e| invalid(&e.to_string()))?;

    if header.magic != ARTIFACT_MAGIC {
        return Err(invalid("bad magic bytes"));
    }
    if header.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(CacheError::VersionMismatch {
            path: path.to_path_buf(),
            expected: ARTIFACT_FORMAT_VERSION,
            actual: header.format_version,
        });
    }
    if header.tool_version != tool_version {
        return Err(CacheError::ToolMismatch {
            path: path.to_path_buf(),
            expected: tool_version.to_string(),
            actual: header.tool_version,
        });
    }

    let payload = &raw[4 + header_len..];
    let actual = ContentHash::of(payload);
    if actual != header.checksum {
        return Err(CacheError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        });
    }

    let (value, _): (T, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard()).map_err(|e| {
            CacheError::Serialization {
                reason: e.to_string(),
            }
        })?;
    Ok(value)
}

/// Writes `bytes` to `target` via a temporary file in the same directory and
/// an atomic rename.
///
/// Readers observe either the previous file, no file, or the complete new
/// file, never a partial write.
pub fn publish(target: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let io_err = |path: &Path, source: std::io::Error| CacheError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| io_err(dir, e))?;
    tmp.write_all(bytes).map_err(|e| io_err(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| io_err(tmp.path(), e))?;
    tmp.persist(target).map_err(|e| io_err(target, e.error))?;
    Ok(())
}
