//! Cache directory resolution from flags, configuration, and environment.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::types::SieveConfig;

/// Environment variable overriding the default cache directory.
pub const CACHE_DIR_ENV: &str = "SIEVE_CACHE_DIR";

/// Fallback used when no other location can be derived.
const LOCAL_CACHE_DIR: &str = ".sieve-cache";

/// Resolves the cache directory.
///
/// Precedence: the `--cache-dir` flag, then `cache.dir` from the
/// configuration, then [`default_cache_dir`].
pub fn resolve_cache_dir(flag: Option<&Path>, config: &SieveConfig) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| config.cache.dir.clone())
        .unwrap_or_else(default_cache_dir)
}

/// The default cache directory derived from the process environment.
pub fn default_cache_dir() -> PathBuf {
    default_cache_dir_with(|name| std::env::var_os(name))
}

/// The default cache directory, reading variables through `var`.
///
/// Tries `$SIEVE_CACHE_DIR`, `$XDG_CACHE_HOME/sieve`, `$HOME/.cache/sieve`,
/// and finally `./.sieve-cache`. Empty variables count as unset.
pub fn default_cache_dir_with(var: impl Fn(&str) -> Option<OsString>) -> PathBuf {
    let var = |name: &str| var(name).filter(|v| !v.is_empty()).map(PathBuf::from);
    if let Some(dir) = var(CACHE_DIR_ENV) {
        return dir;
    }
    if let Some(xdg) = var("XDG_CACHE_HOME") {
        return xdg.join("sieve");
    }
    if let Some(home) = var("HOME") {
        return home.join(".cache").join("sieve");
    }
    PathBuf::from(LOCAL_CACHE_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    fn env<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<OsString> + 'a {
        move |name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| OsString::from(v))
        }
    }

    #[test]
    fn explicit_env_var_first() {
        let vars = [
            ("SIEVE_CACHE_DIR", "/srv/sieve"),
            ("XDG_CACHE_HOME", "/xdg"),
            ("HOME", "/home/u"),
        ];
        assert_eq!(default_cache_dir_with(env(&vars)), PathBuf::from("/srv/sieve"));
    }

    #[test]
    fn xdg_then_home() {
        let vars = [("XDG_CACHE_HOME", "/xdg"), ("HOME", "/home/u")];
        assert_eq!(default_cache_dir_with(env(&vars)), PathBuf::from("/xdg/sieve"));

        let vars = [("XDG_CACHE_HOME", ""), ("HOME", "/home/u")];
        assert_eq!(
            default_cache_dir_with(env(&vars)),
            PathBuf::from("/home/u/.cache/sieve")
        );
    }

    #[test]
    fn local_fallback() {
        assert_eq!(default_cache_dir_with(env(&[])), PathBuf::from(".sieve-cache"));
    }

    #[test]
    fn flag_beats_config() {
        let config = load_config_from_str("[cache]\ndir = \"/from/config\"\n").unwrap();
        assert_eq!(
            resolve_cache_dir(Some(Path::new("/from/flag")), &config),
            PathBuf::from("/from/flag")
        );
        assert_eq!(resolve_cache_dir(None, &config), PathBuf::from("/from/config"));
    }
}
