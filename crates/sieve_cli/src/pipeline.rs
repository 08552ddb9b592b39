//! Shared front-end steps for `sieve run` and `sieve check`.
//!
//! 1. Load the optional `sieve.toml`
//! 2. Assemble the program from CODE values and imported files, in
//!    command-line order
//! 3. Fingerprint the program and compile it through the artifact cache
//! 4. Render diagnostics, remapped to the user's own lines

use std::io::{self, Write};
use std::path::PathBuf;

use clap::ArgMatches;
use sieve_cache::{ArtifactCache, Outcome, SourceHasher};
use sieve_config::{locate_config, resolve_cache_dir, ConfigError, SieveConfig, CONFIG_ENV};
use sieve_diagnostics::{Diagnostic, DiagnosticRenderer, JsonRenderer, TerminalRenderer};
use sieve_query::Compilation;
use sieve_source::{ProgramBuilder, ProgramText};

use crate::{GlobalArgs, ProgramArgs, ReportFormat};

/// Success.
pub const EXIT_OK: i32 = 0;
/// Runtime failure: transform error, worker spawn failure, I/O error.
pub const EXIT_RUNTIME: i32 = 1;
/// Bad usage or configuration.
pub const EXIT_USAGE: i32 = 2;
/// The query did not compile.
pub const EXIT_COMPILE: i32 = 3;

/// Version recorded in, and required of, cached artifacts.
const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One piece of program text from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramPart {
    /// A CODE value.
    Code(String),
    /// An `--import` file.
    File(PathBuf),
}

/// Orders CODE values and `--import` files as they appeared on the command
/// line. Without argument positions, code comes before files.
pub fn program_parts(args: &ProgramArgs, matches: Option<&ArgMatches>) -> Vec<ProgramPart> {
    let code = args.code.iter().cloned().map(ProgramPart::Code);
    let files = args.import.iter().cloned().map(ProgramPart::File);

    let Some(matches) = matches else {
        return code.chain(files).collect();
    };
    let mut indexed: Vec<(usize, ProgramPart)> = Vec::new();
    if let Some(indices) = matches.indices_of("code") {
        indexed.extend(indices.zip(code));
    }
    if let Some(indices) = matches.indices_of("import") {
        indexed.extend(indices.zip(files));
    }
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, part)| part).collect()
}

/// Loads the configuration named by `--config` or `$SIEVE_CONFIG`, or the
/// defaults when neither is set.
pub fn load_config(global: &GlobalArgs) -> Result<SieveConfig, ConfigError> {
    match locate_config(global.config.as_deref(), std::env::var_os(CONFIG_ENV)) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            sieve_config::load_config(&path)
        }
        None => Ok(SieveConfig::default()),
    }
}

/// Assembles the program text. Libraries come from the configuration and
/// `--use`, on top of the defaults.
pub fn assemble(
    parts: &[ProgramPart],
    uses: &[String],
    config: &SieveConfig,
) -> io::Result<ProgramText> {
    let mut builder = ProgramBuilder::new();
    for lib in config.query.imports.iter().chain(uses) {
        builder.import(lib);
    }
    for part in parts {
        match part {
            ProgramPart::Code(text) => {
                builder.push_text(text);
            }
            ProgramPart::File(path) => {
                builder.push_file(path).map_err(|e| {
                    io::Error::new(e.kind(), format!("cannot read {}: {e}", path.display()))
                })?;
            }
        }
    }
    if builder.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no query given; pass CODE or --import FILE",
        ));
    }
    Ok(builder.build())
}

/// Opens the artifact cache at the resolved location, disabled by
/// `--no-cache` or `cache.enabled = false`.
pub fn open_cache(global: &GlobalArgs, config: &SieveConfig, no_cache: bool) -> ArtifactCache {
    let root = resolve_cache_dir(global.cache_dir.as_deref(), config);
    if no_cache || !config.cache.enabled {
        ArtifactCache::disabled(root, TOOL_VERSION)
    } else {
        ArtifactCache::new(root, TOOL_VERSION)
    }
}

/// Where diagnostics are written.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// Compiles `program` through `cache`, rendering diagnostics to `dest`.
///
/// Returns `None` if compilation failed; its diagnostics have been rendered.
pub fn compile(
    program: &ProgramText,
    cache: &ArtifactCache,
    format: ReportFormat,
    global: &GlobalArgs,
    dest: Destination,
) -> io::Result<Option<Compilation>> {
    let fingerprint = SourceHasher::fingerprint(program);
    match cache.resolve(&fingerprint, |_| sieve_query::compile(program)) {
        Ok(resolved) => {
            tracing::debug!(
                fingerprint = %fingerprint.short(),
                cached = resolved.outcome == Outcome::Hit,
                "query ready"
            );
            if !global.quiet {
                render_diagnostics(&resolved.value.warnings, program, format, global.color, dest)?;
            }
            Ok(Some(resolved.value))
        }
        Err(diagnostics) => {
            render_diagnostics(&diagnostics, program, format, global.color, dest)?;
            Ok(None)
        }
    }
}

/// Renders diagnostics as text blocks or JSON lines.
pub fn render_diagnostics(
    diagnostics: &[Diagnostic],
    program: &ProgramText,
    format: ReportFormat,
    color: bool,
    dest: Destination,
) -> io::Result<()> {
    if diagnostics.is_empty() {
        return Ok(());
    }
    let mut out: Box<dyn Write> = match dest {
        Destination::Stdout => Box::new(io::stdout().lock()),
        Destination::Stderr => Box::new(io::stderr().lock()),
    };
    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(color && dest == Destination::Stderr);
            for diag in diagnostics {
                writeln!(out, "{}", renderer.render(diag, program))?;
            }
        }
        ReportFormat::Json => {
            for diag in diagnostics {
                writeln!(out, "{}", JsonRenderer.render(diag, program))?;
            }
        }
    }
    out.flush()
}
