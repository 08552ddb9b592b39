//! `sieve check`: compile a query and report diagnostics.

use sieve_query::CompiledArtifact;

use crate::pipeline::{self, Destination, ProgramPart, EXIT_COMPILE, EXIT_OK, EXIT_USAGE};
use crate::{CheckArgs, GlobalArgs, ReportFormat};

/// Runs the `sieve check` command.
///
/// Compiles through the cache, so a successful check also warms it. Text
/// diagnostics go to stderr; JSON diagnostics go to stdout, one object per
/// line. Returns 0 if the query compiles, 3 if it does not.
pub fn run(
    args: &CheckArgs,
    parts: Vec<ProgramPart>,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let config = match pipeline::load_config(global) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(EXIT_USAGE);
        }
    };
    let program = match pipeline::assemble(&parts, &args.program.uses, &config) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(EXIT_USAGE);
        }
    };

    let format = args.program.format;
    let dest = match format {
        ReportFormat::Text => Destination::Stderr,
        ReportFormat::Json => Destination::Stdout,
    };
    let cache = pipeline::open_cache(global, &config, args.program.no_cache);
    let compiled = pipeline::compile(&program, &cache, format, global, dest)?;

    if !global.quiet && format == ReportFormat::Text {
        match &compiled {
            Some(compilation) => eprintln!(
                "   Checked {}, {} warning(s)",
                describe(&compilation.artifact),
                compilation.warnings.len()
            ),
            None => eprintln!("   Result: query does not compile"),
        }
    }
    Ok(if compiled.is_some() { EXIT_OK } else { EXIT_COMPILE })
}

fn describe(artifact: &CompiledArtifact) -> String {
    let libraries = artifact.imports.join(", ");
    format!("query using {libraries}")
}
