//! The sieve query language: compiler and lazy line transform.
//!
//! A query is a LINQ-shaped pipeline over the input lines:
//!
//! ```text
//! from line at n in lines
//! where contains(line, "ERROR")
//! let cols = split_tab(line)
//! select str(n) + ": " + cols[2]
//! ```
//!
//! # Architecture
//!
//! - **Lexer** and **parser** turn the assembled [`ProgramText`] into a syntax
//!   tree, reporting problems as positioned [`Diagnostic`]s.
//! - **Resolver** binds names to row slots and functions to library builtins,
//!   producing a serializable [`CompiledArtifact`] (what the cache stores).
//! - [`TransformInvoker`] resolves the `query` entry of an artifact and
//!   applies it lazily to a line stream as a [`Transform`].

#![warn(missing_docs)]

/// Syntax tree types.
pub mod ast;
/// Library functions.
pub mod builtins;
/// Post-compile error types.
pub mod error;
mod eval;
mod expr;
mod lexer;
mod parser;
/// The compiled, serializable program form.
pub mod plan;
mod report;
mod resolve;
/// Token types.
pub mod token;
/// Lazy application of a compiled query.
pub mod transform;
/// Runtime values.
pub mod value;

pub use builtins::{Builtin, LIBRARIES};
pub use error::{ResolveError, RuntimeError};
pub use plan::{CompiledArtifact, Compilation, PLAN_FORMAT_VERSION};
pub use transform::{Transform, TransformInvoker};
pub use value::Value;

use sieve_diagnostics::{Diagnostic, DiagnosticSink};
use sieve_source::ProgramText;

/// Compiles an assembled program.
///
/// On success returns the artifact together with any warnings. If any error
/// was reported, returns every diagnostic (errors and warnings) sorted by
/// position instead.
pub fn compile(program: &ProgramText) -> Result<Compilation, Vec<Diagnostic>> {
    let source = program.as_str();
    let sink = DiagnosticSink::new();
    let report = report::Reporter::new(source, &sink);

    let tokens = lexer::lex(source, &report);
    let ast = parser::Parser::new(tokens, source, &report).parse_program();
    if report.has_errors() {
        return Err(sink.take_all());
    }

    let artifact = resolve::resolve(&ast, program, &report);
    let diagnostics = sink.take_all();
    if diagnostics.iter().any(|d| !d.is_warning()) {
        return Err(diagnostics);
    }
    tracing::debug!(
        entries = artifact.entries.len(),
        warnings = diagnostics.len(),
        "query compiled"
    );
    Ok(Compilation {
        artifact,
        warnings: diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_diagnostics::{DiagnosticCode, DiagnosticRemapper};
    use sieve_source::ProgramBuilder;
    use std::cell::Cell;
    use std::io;

    fn program(body: &[&str], imports: &[&str]) -> ProgramText {
        let mut b = ProgramBuilder::new();
        for lib in imports {
            b.import(lib);
        }
        for line in body {
            b.push_text(line);
        }
        b.build()
    }

    fn compile_ok(body: &[&str], imports: &[&str]) -> Compilation {
        match compile(&program(body, imports)) {
            Ok(c) => c,
            Err(diags) => panic!(
                "unexpected errors: {:?}",
                diags.iter().map(|d| &d.message).collect::<Vec<_>>()
            ),
        }
    }

    fn compile_err(body: &[&str], imports: &[&str]) -> Vec<Diagnostic> {
        match compile(&program(body, imports)) {
            Ok(_) => panic!("expected a compile error"),
            Err(diags) => diags,
        }
    }

    fn run(body: &[&str], imports: &[&str], input: &[&str], args: &[&str]) -> Result<Vec<String>, RuntimeError> {
        let compiled = compile_ok(body, imports);
        let invoker = TransformInvoker::resolve(&compiled.artifact).unwrap();
        let lines = input.iter().map(|l| Ok(l.to_string())).collect::<Vec<_>>();
        let args = args.iter().map(|a| a.to_string()).collect();
        invoker.invoke(lines, args).collect()
    }

    fn run_ok(body: &[&str], input: &[&str]) -> Vec<String> {
        run(body, &[], input, &[]).unwrap()
    }

    /// The user line (1-based) a diagnostic points at.
    fn user_line(program: &ProgramText, diag: &Diagnostic) -> Option<usize> {
        DiagnosticRemapper::for_program(program)
            .remap(diag.position.line)
            .map(|k| k + 1)
    }

    #[test]
    fn identity() {
        let out = run_ok(&["from l in lines select l"], &["a", "b", "c"]);
        assert_eq!(out, ["a", "b", "c"]);
    }

    #[test]
    fn where_and_projection() {
        let out = run_ok(
            &["from l in lines", "where len(l) > 1", "select upper(l) + \"!\""],
            &["a", "bb", "", "ccc"],
        );
        assert_eq!(out, ["BB!", "CCC!"]);
    }

    #[test]
    fn line_numbers_with_at() {
        let out = run_ok(&["from l at n in lines select str(n) + \":\" + l"], &["x", "y"]);
        assert_eq!(out, ["0:x", "1:y"]);
    }

    #[test]
    fn nested_from_flattens() {
        let out = run_ok(
            &["from l in lines", "from w in split(l, \" \")", "where w != \"\"", "select w"],
            &["a b", "", "c  d"],
        );
        assert_eq!(out, ["a", "b", "c", "d"]);
    }

    #[test]
    fn list_select_yields_one_line_per_element() {
        let out = run_ok(&["from l in lines select [l, l]"], &["a", "b"]);
        assert_eq!(out, ["a", "a", "b", "b"]);
    }

    #[test]
    fn let_skip_take() {
        let out = run_ok(
            &["from l in lines", "let n = int(l)", "skip 1", "take 2", "select n * 10"],
            &["1", "2", "3", "4"],
        );
        assert_eq!(out, ["20", "30"]);
    }

    #[test]
    fn extra_arguments() {
        let out = run(
            &["from l in lines select args[0] + l + get_or(args, 5, \"?\")"],
            &[],
            &["x"],
            &["pre-"],
        )
        .unwrap();
        assert_eq!(out, ["pre-x?"]);
    }

    #[test]
    fn tsv_library() {
        let out = run(
            &["from l in lines", "let cols = split_tab(l)", "select join_tab([cols[1], cols[0]])"],
            &["tsv"],
            &["a\tb\\tc"],
            &[],
        )
        .unwrap();
        assert_eq!(out, ["b\\tc\ta"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(run_ok(&["from l in lines select l"], &[]).is_empty());
    }

    #[test]
    fn take_does_not_read_past_limit() {
        let compiled = compile_ok(&["from l in lines take 2 select l"], &[]);
        let invoker = TransformInvoker::resolve(&compiled.artifact).unwrap();
        let pulled = Cell::new(0);
        let input = (0..100).map(|i| {
            pulled.set(pulled.get() + 1);
            Ok(format!("line{i}"))
        });
        let out: Vec<String> = invoker.invoke(input, Vec::new()).map(Result::unwrap).collect();
        assert_eq!(out, ["line0", "line1"]);
        assert_eq!(pulled.get(), 2);
    }

    #[test]
    fn transform_is_lazy() {
        let compiled = compile_ok(&["from l in lines select l"], &[]);
        let invoker = TransformInvoker::resolve(&compiled.artifact).unwrap();
        let pulled = Cell::new(0);
        let input = (0..10).map(|i| {
            pulled.set(pulled.get() + 1);
            Ok(i.to_string())
        });
        let mut transform = invoker.invoke(input, Vec::new());
        assert_eq!(pulled.get(), 0);
        transform.next();
        assert_eq!(pulled.get(), 1);
    }

    #[test]
    fn runtime_error_ends_sequence() {
        let out: Vec<_> = {
            let compiled = compile_ok(&["from l in lines", "select 10 / int(l)"], &[]);
            let invoker = TransformInvoker::resolve(&compiled.artifact).unwrap();
            let input = ["5", "0", "2"].map(|l| Ok(l.to_string()));
            invoker.invoke(input, Vec::new()).collect()
        };
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_ref().unwrap(), "2");
        let err = out[1].as_ref().unwrap_err();
        assert_eq!(err.to_string(), "query:2:8: division by zero");
    }

    #[test]
    fn error_function_fails_run() {
        let err = run(
            &["from l in lines", "where error(l != \"bad\", \"bad row: \" + l)", "select l"],
            &[],
            &["ok", "bad"],
            &[],
        )
        .unwrap_err();
        assert!(err.to_string().ends_with("bad row: bad"));
    }

    #[test]
    fn input_error_surfaces() {
        let compiled = compile_ok(&["from l in lines select l"], &[]);
        let invoker = TransformInvoker::resolve(&compiled.artifact).unwrap();
        let input = vec![
            Ok("a".to_string()),
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad utf-8")),
        ];
        let out: Vec<_> = invoker.invoke(input, Vec::new()).collect();
        assert!(matches!(out[1], Err(RuntimeError::Input(_))));
    }

    #[test]
    fn non_bool_where_is_runtime_error() {
        let err = run(&["from l in lines where l select l"], &[], &["x"], &[]).unwrap_err();
        assert!(err.to_string().contains("`where` expects a bool, found string"));
    }

    #[test]
    fn unknown_variable_points_at_user_line() {
        let p = program(&["from l in lines", "select x + l"], &[]);
        let diags = compile(&p).unwrap_err();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UNKNOWN_VARIABLE);
        assert_eq!(user_line(&p, &diags[0]), Some(2));
        assert_eq!(diags[0].position.column, 8);
    }

    #[test]
    fn tsv_function_requires_import() {
        let diags = compile_err(&["from l in lines select split_tab(l)[0]"], &[]);
        assert_eq!(diags[0].code, DiagnosticCode::UNKNOWN_FUNCTION);
        assert_eq!(diags[0].help, ["import it with `-u tsv`"]);
    }

    #[test]
    fn unknown_library_points_at_preamble() {
        let p = program(&["from l in lines select l"], &["nosuch"]);
        let diags = compile(&p).unwrap_err();
        assert_eq!(diags[0].code, DiagnosticCode::UNKNOWN_LIBRARY);
        assert_eq!(user_line(&p, &diags[0]), None);
    }

    #[test]
    fn wrong_arity() {
        let diags = compile_err(&["from l in lines select upper(l, l)"], &[]);
        assert_eq!(diags[0].code, DiagnosticCode::ARITY);
        assert_eq!(diags[0].message, "`upper` takes 1 argument, found 2");
        let diags = compile_err(&["from l in lines select substr(l)"], &[]);
        assert_eq!(diags[0].message, "`substr` takes 2 to 3 arguments, found 1");
    }

    #[test]
    fn case_needs_pairs_and_default() {
        for call in ["case(l, \"a\", 1)", "case(l, \"a\", 1, \"b\", 2)"] {
            let diags = compile_err(&[&format!("from l in lines select {call}")], &[]);
            assert_eq!(diags[0].code, DiagnosticCode::ARITY);
            assert!(diags[0].message.starts_with("`case` takes a value, one or more key/result pairs"));
        }
    }

    #[test]
    fn case_selects_by_value() {
        let out = run_ok(
            &["from l in lines", "select case(l, \"y\", \"yes\", \"n\", \"no\", \"?\")"],
            &["y", "n", "maybe"],
        );
        assert_eq!(out, ["yes", "no", "?"]);
    }

    #[test]
    fn case_only_evaluates_chosen_result() {
        let out = run_ok(
            &["from l in lines", "select case(starts_with(l, \"#\"), true, 0, int(l) * 2)"],
            &["#comment", "21"],
        );
        assert_eq!(out, ["0", "42"]);
    }

    #[test]
    fn lines_only_in_first_from() {
        let diags = compile_err(&["from l in lines where len(lines) > 0 select l"], &[]);
        assert_eq!(diags[0].code, DiagnosticCode::LINES_MISUSE);
        let diags = compile_err(&["from a in args select a"], &[]);
        assert_eq!(diags[0].code, DiagnosticCode::LINES_MISUSE);
    }

    #[test]
    fn duplicate_binding() {
        let diags = compile_err(&["from l in lines let l = 1 select l"], &[]);
        assert_eq!(diags[0].code, DiagnosticCode::DUPLICATE_BINDING);
    }

    #[test]
    fn unused_binding_warns() {
        let compiled = compile_ok(&["from l at i in lines", "let _x = 1", "select l"], &[]);
        assert_eq!(compiled.warnings.len(), 1);
        assert_eq!(compiled.warnings[0].code, DiagnosticCode::UNUSED_BINDING);
        assert!(compiled.warnings[0].message.contains("`i`"));
    }

    #[test]
    fn errors_include_warnings() {
        let diags = compile_err(&["from l in lines", "let u = l", "select y"], &[]);
        assert_eq!(diags.len(), 2);
        assert!(diags[0].is_warning());
        assert!(!diags[1].is_warning());
    }

    #[test]
    fn function_name_as_variable_gets_help() {
        let diags = compile_err(&["from l in lines select l + upper"], &[]);
        assert_eq!(diags[0].help.len(), 1);
        assert!(diags[0].help[0].contains("upper(...)"));
    }

    #[test]
    fn artifact_survives_bincode() {
        let compiled = compile_ok(&["from l at n in lines where n % 2 == 0 select [l, str(n)]"], &[]);
        let bytes = bincode::serde::encode_to_vec(&compiled, bincode::config::standard()).unwrap();
        let (back, _): (Compilation, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(back, compiled);
    }

    #[test]
    fn resolve_rejects_bad_artifacts() {
        let mut compiled = compile_ok(&["from l in lines select l"], &[]);
        compiled.artifact.format_version = 99;
        assert!(matches!(
            TransformInvoker::resolve(&compiled.artifact),
            Err(ResolveError::FormatVersion { found: 99, .. })
        ));

        let mut compiled = compile_ok(&["from l in lines select l"], &[]);
        compiled.artifact.entries[0].name = "other".to_string();
        assert!(matches!(
            TransformInvoker::resolve(&compiled.artifact),
            Err(ResolveError::MissingEntry { .. })
        ));

        let mut compiled = compile_ok(&["from l in lines select l"], &[]);
        compiled.artifact.entries[0].params.pop();
        assert!(matches!(
            TransformInvoker::resolve(&compiled.artifact),
            Err(ResolveError::Signature { found: 1, .. })
        ));
    }
}
