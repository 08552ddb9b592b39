//! Configuration file discovery, loading, and validation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::SieveConfig;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "SIEVE_CONFIG";

/// Picks the configuration file: an explicit path first, then the value of
/// [`CONFIG_ENV`]. Returns `None` when neither is set; there is no implicit
/// search.
pub fn locate_config(explicit: Option<&Path>, env_value: Option<OsString>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| env_value.filter(|v| !v.is_empty()).map(PathBuf::from))
}

/// Loads and validates a `sieve.toml` configuration from `path`.
pub fn load_config(path: &Path) -> Result<SieveConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a `sieve.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<SieveConfig, ConfigError> {
    let config: SieveConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks value ranges and name syntax.
///
/// Whether an imported library exists is left to the compiler, which reports
/// unknown libraries with the list of available ones.
fn validate_config(config: &SieveConfig) -> Result<(), ConfigError> {
    if config.fanout.workers == Some(0) {
        return Err(ConfigError::ValidationError(
            "fanout.workers must be at least 1".to_string(),
        ));
    }
    if let Some(command) = &config.fanout.command {
        if command.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "fanout.command must not be empty".to_string(),
            ));
        }
    }
    for name in &config.query.imports {
        if !is_identifier(name) {
            return Err(ConfigError::ValidationError(format!(
                "query.imports: `{name}` is not a library name"
            )));
        }
    }
    if config.output.separator.as_deref() == Some("") {
        return Err(ConfigError::ValidationError(
            "output.separator must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml = r#"
[cache]
dir = "/var/cache/sieve"
enabled = false

[query]
imports = ["tsv"]

[output]
separator = "\\r\\n"

[fanout]
workers = 4
command = "/usr/bin/tr"
args = "a-z A-Z"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.cache.dir.as_deref(), Some(Path::new("/var/cache/sieve")));
        assert!(!config.cache.enabled);
        assert_eq!(config.query.imports, vec!["tsv"]);
        assert_eq!(config.output.separator(), "\r\n");
        assert_eq!(config.fanout.workers().get(), 4);
        assert_eq!(config.fanout.command.as_deref(), Some("/usr/bin/tr"));
        assert_eq!(config.fanout.args.as_deref(), Some("a-z A-Z"));
    }

    #[test]
    fn zero_workers_errors() {
        let err = load_config_from_str("[fanout]\nworkers = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("fanout.workers"));
    }

    #[test]
    fn negative_workers_is_parse_error() {
        let err = load_config_from_str("[fanout]\nworkers = -2\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn bad_import_name_errors() {
        let err = load_config_from_str("[query]\nimports = [\"my lib\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_separator_errors() {
        let err = load_config_from_str("[output]\nseparator = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn blank_command_errors() {
        let err = load_config_from_str("[fanout]\ncommand = \"  \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let toml = "this is not valid toml {{{}}}";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sieve.toml");
        std::fs::write(&path, "[fanout]\nworkers = 2\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.fanout.workers().get(), 2);
    }

    #[test]
    fn missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }

    #[test]
    fn explicit_path_wins() {
        let found = locate_config(Some(Path::new("a.toml")), Some(OsString::from("b.toml")));
        assert_eq!(found, Some(PathBuf::from("a.toml")));
    }

    #[test]
    fn env_path_used_when_no_flag() {
        let found = locate_config(None, Some(OsString::from("b.toml")));
        assert_eq!(found, Some(PathBuf::from("b.toml")));
        assert_eq!(locate_config(None, Some(OsString::new())), None);
        assert_eq!(locate_config(None, None), None);
    }
}
