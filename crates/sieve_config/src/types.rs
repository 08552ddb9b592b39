//! Configuration types deserialized from `sieve.toml`.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use serde::Deserialize;
use sieve_common::decode_escapes;

/// Output separator used when none is configured.
pub const DEFAULT_SEPARATOR: &str = "\n";

/// The top-level configuration parsed from `sieve.toml`.
///
/// Every section is optional; an empty file is a valid configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SieveConfig {
    /// Artifact cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Query compilation settings.
    #[serde(default)]
    pub query: QueryConfig,
    /// Output formatting settings.
    #[serde(default)]
    pub output: OutputConfig,
    /// Worker pool settings.
    #[serde(default)]
    pub fanout: FanoutSettings,
}

/// The `[cache]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Cache directory. Falls back to [`default_cache_dir`](crate::default_cache_dir).
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Whether compiled artifacts are stored and reused.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            enabled: true,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// The `[query]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    /// Libraries imported in addition to the defaults.
    #[serde(default)]
    pub imports: Vec<String>,
}

/// The `[output]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Separator between output lines, with backslash escapes.
    #[serde(default)]
    pub separator: Option<String>,
}

impl OutputConfig {
    /// The separator with escapes decoded, or [`DEFAULT_SEPARATOR`].
    pub fn separator(&self) -> String {
        self.separator
            .as_deref()
            .map(decode_escapes)
            .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string())
    }
}

/// The `[fanout]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FanoutSettings {
    /// Number of worker processes.
    #[serde(default)]
    pub workers: Option<usize>,
    /// Worker program.
    #[serde(default)]
    pub command: Option<String>,
    /// Worker argument string, split like a shell would.
    #[serde(default)]
    pub args: Option<String>,
}

impl FanoutSettings {
    /// The configured worker count, or one worker.
    pub fn workers(&self) -> NonZeroUsize {
        self.workers
            .and_then(NonZeroUsize::new)
            .unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_defaults() {
        let config: SieveConfig = toml::from_str("").unwrap();
        assert!(config.cache.enabled);
        assert!(config.cache.dir.is_none());
        assert!(config.query.imports.is_empty());
        assert_eq!(config.output.separator(), "\n");
        assert_eq!(config.fanout.workers().get(), 1);
    }

    #[test]
    fn separator_escapes_decoded() {
        let config: SieveConfig = toml::from_str("[output]\nseparator = '\\t'\n").unwrap();
        assert_eq!(config.output.separator(), "\t");
    }

    #[test]
    fn cache_enabled_defaults_true_in_section() {
        let config: SieveConfig = toml::from_str("[cache]\ndir = \"/tmp/c\"\n").unwrap();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.dir, Some(PathBuf::from("/tmp/c")));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<SieveConfig>("[cache]\ndirectory = \"x\"\n").is_err());
        assert!(toml::from_str::<SieveConfig>("[nosuch]\n").is_err());
    }
}
