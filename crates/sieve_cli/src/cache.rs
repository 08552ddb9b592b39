//! `sieve cache`: show, list, or clear the artifact cache.

use crate::pipeline::{self, EXIT_OK, EXIT_USAGE};
use crate::{CacheAction, GlobalArgs};

/// Runs a `sieve cache` action.
///
/// `clear` is silent when there is nothing to delete.
pub fn run(action: CacheAction, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = match pipeline::load_config(global) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(EXIT_USAGE);
        }
    };
    let cache = pipeline::open_cache(global, &config, false);

    match action {
        CacheAction::Path => println!("{}", cache.location().display()),
        CacheAction::Clear => {
            if cache.clear()? && !global.quiet {
                eprintln!("   Removed {}", cache.location().display());
            }
        }
        CacheAction::List => {
            for entry in cache.entries()? {
                println!("{}\t{}", entry.fingerprint, entry.size);
            }
        }
    }
    Ok(EXIT_OK)
}
