//! Name resolution: turns the syntax tree into a [`CompiledArtifact`].
//!
//! Bindings are introduced in clause order and stay visible to every later
//! clause, so a single stack of bindings is enough. Each binding owns one row
//! slot; the input stream parameter owns none and may only appear as the
//! source of the leading `from`.

use crate::ast::{self, Clause, Expr, FromClause, Ident};
use crate::builtins::{is_library, Builtin, LIBRARIES};
use crate::plan::*;
use crate::report::Reporter;
use crate::value::Value;
use sieve_diagnostics::{DiagnosticCode, DiagnosticRemapper, Position};
use sieve_source::{ProgramText, Span};

/// Resolves a parsed program. Problems are reported to `report`; the returned
/// artifact is only meaningful if no errors were emitted.
pub(crate) fn resolve(program: &ast::Program, text: &ProgramText, report: &Reporter<'_>) -> CompiledArtifact {
    let mut imports: Vec<String> = Vec::new();
    for lib in &program.uses {
        if !is_library(&lib.name) {
            report.emit(
                report
                    .error(
                        DiagnosticCode::UNKNOWN_LIBRARY,
                        format!("unknown library `{}`", lib.name),
                        lib.span,
                    )
                    .with_help(format!("available libraries: {}", LIBRARIES.join(", "))),
            );
        } else if !imports.contains(&lib.name) {
            imports.push(lib.name.clone());
        }
    }

    let remapper = DiagnosticRemapper::for_program(text);
    let entries = program
        .entries
        .iter()
        .map(|entry| {
            EntryResolver {
                report,
                remapper,
                imports: &imports,
                bindings: Vec::new(),
                slot_count: 0,
            }
            .resolve_entry(entry)
        })
        .collect();

    CompiledArtifact {
        format_version: PLAN_FORMAT_VERSION,
        imports,
        entries,
    }
}

struct Binding {
    name: String,
    span: Span,
    /// `None` for the input stream parameter.
    slot: Option<usize>,
    used: bool,
    /// Parameters are never reported as unused.
    check_unused: bool,
}

struct EntryResolver<'r> {
    report: &'r Reporter<'r>,
    remapper: DiagnosticRemapper,
    imports: &'r [String],
    bindings: Vec<Binding>,
    slot_count: usize,
}

impl EntryResolver<'_> {
    fn resolve_entry(mut self, entry: &ast::Entry) -> QueryEntry {
        let mut param_slots = Vec::new();
        for (i, param) in entry.params.iter().enumerate() {
            if i == 0 {
                self.bind_stream(param);
            } else if let Some(slot) = self.bind(param, false) {
                param_slots.push(slot);
            }
        }

        let input = self.resolve_input(&entry.query.source, entry.params.first());
        let steps = entry
            .query
            .clauses
            .iter()
            .map(|clause| self.resolve_clause(clause))
            .collect();
        let select = self.resolve_expr(&entry.query.select);
        self.report_unused();

        QueryEntry {
            name: entry.name.name.clone(),
            params: entry.params.iter().map(|p| p.name.clone()).collect(),
            plan: QueryPlan {
                slot_count: self.slot_count,
                param_slots,
                input,
                steps,
                select,
            },
        }
    }

    fn resolve_input(&mut self, from: &FromClause, stream: Option<&Ident>) -> InputStep {
        let over_stream = match (&from.source, stream) {
            (Expr::Name(name), Some(stream)) => name.name == stream.name,
            _ => false,
        };
        if over_stream {
            if let Some(binding) = self.bindings.iter_mut().find(|b| b.slot.is_none()) {
                binding.used = true;
            }
        } else if !matches!(from.source, Expr::Error(_)) {
            let stream_name = stream.map_or("lines", |s| s.name.as_str());
            self.report.emit(
                self.report
                    .error(
                        DiagnosticCode::LINES_MISUSE,
                        format!("the first `from` must range over `{stream_name}`"),
                        from.source.span(),
                    )
                    .with_help(format!("start the query with `from line in {stream_name}`")),
            );
            // Still resolve the expression for its own diagnostics.
            self.resolve_expr(&from.source);
        }

        InputStep {
            var: self.bind(&from.var, true).unwrap_or(0),
            index: from.index.as_ref().and_then(|ix| self.bind(ix, true)),
        }
    }

    fn resolve_clause(&mut self, clause: &Clause) -> Step {
        match clause {
            Clause::From(from) => {
                let source = self.resolve_expr(&from.source);
                let var = self.bind(&from.var, true).unwrap_or(0);
                let index = from.index.as_ref().and_then(|ix| self.bind(ix, true));
                Step::From { var, index, source }
            }
            Clause::Where(cond) => Step::Where(self.resolve_expr(cond)),
            Clause::Let { name, value } => {
                let value = self.resolve_expr(value);
                let slot = self.bind(name, true).unwrap_or(0);
                Step::Let { slot, value }
            }
            Clause::Skip(count) => Step::Skip(self.resolve_expr(count)),
            Clause::Take(count) => Step::Take(self.resolve_expr(count)),
        }
    }

    /// Position in the user's text, for runtime error messages.
    fn user_position(&self, span: Span) -> Position {
        let pos = self.report.position(span);
        let line = self.remapper.remap(pos.line).map_or(0, |k| k as u32 + 1);
        Position::new(line, pos.column)
    }

    fn node(&self, kind: NodeKind, span: Span) -> Node {
        Node {
            kind,
            at: self.user_position(span),
        }
    }

    fn resolve_expr(&mut self, expr: &Expr) -> Node {
        let span = expr.span();
        let kind = match expr {
            Expr::Int { value, .. } => NodeKind::Const(Value::Int(*value)),
            Expr::Str { value, .. } => NodeKind::Const(Value::Str(value.clone())),
            Expr::Bool { value, .. } => NodeKind::Const(Value::Bool(*value)),
            Expr::Name(ident) => NodeKind::Slot(self.lookup(ident)),
            Expr::List { items, .. } => {
                NodeKind::List(items.iter().map(|item| self.resolve_expr(item)).collect())
            }
            Expr::Unary { op, operand, .. } => {
                NodeKind::Unary(*op, Box::new(self.resolve_expr(operand)))
            }
            Expr::Binary {
                left, op, right, ..
            } => NodeKind::Binary(
                *op,
                Box::new(self.resolve_expr(left)),
                Box::new(self.resolve_expr(right)),
            ),
            Expr::Index { base, index, .. } => NodeKind::Index(
                Box::new(self.resolve_expr(base)),
                Box::new(self.resolve_expr(index)),
            ),
            Expr::Call { name, args, .. } => {
                let args = args.iter().map(|arg| self.resolve_expr(arg)).collect::<Vec<_>>();
                match self.lookup_function(name, args.len()) {
                    Some(builtin) => NodeKind::Call(builtin, args),
                    None => NodeKind::Const(Value::Bool(false)),
                }
            }
            Expr::Error(_) => NodeKind::Const(Value::Bool(false)),
        };
        self.node(kind, span)
    }

    fn lookup(&mut self, ident: &Ident) -> usize {
        let Some(binding) = self.bindings.iter_mut().rev().find(|b| b.name == ident.name) else {
            let mut diag = self.report.error(
                DiagnosticCode::UNKNOWN_VARIABLE,
                format!("unknown variable `{}`", ident.name),
                ident.span,
            );
            if Builtin::lookup(&ident.name).is_some() {
                diag = diag.with_help(format!("`{0}` is a function; call it as `{0}(...)`", ident.name));
            }
            self.report.emit(diag);
            return 0;
        };
        binding.used = true;
        match binding.slot {
            Some(slot) => slot,
            None => {
                self.report.emit(self.report.error(
                    DiagnosticCode::LINES_MISUSE,
                    format!(
                        "`{}` is the input stream and can only be the source of the first `from`",
                        ident.name
                    ),
                    ident.span,
                ));
                0
            }
        }
    }

    fn lookup_function(&self, name: &Ident, argc: usize) -> Option<Builtin> {
        let Some(builtin) = Builtin::lookup(&name.name) else {
            self.report.emit(self.report.error(
                DiagnosticCode::UNKNOWN_FUNCTION,
                format!("unknown function `{}`", name.name),
                name.span,
            ));
            return None;
        };
        let library = builtin.library();
        if !self.imports.iter().any(|lib| lib == library) {
            self.report.emit(
                self.report
                    .error(
                        DiagnosticCode::UNKNOWN_FUNCTION,
                        format!("function `{}` is provided by library `{library}`, which is not imported", name.name),
                        name.span,
                    )
                    .with_help(format!("import it with `-u {library}`")),
            );
            return None;
        }
        if !builtin.accepts(argc) {
            let (min, max) = builtin.arity();
            let expected = if builtin == Builtin::Case {
                "a value, one or more key/result pairs and a default".to_string()
            } else if min == max {
                format!("{min} argument{}", if min == 1 { "" } else { "s" })
            } else {
                format!("{min} to {max} arguments")
            };
            self.report.emit(self.report.error(
                DiagnosticCode::ARITY,
                format!("`{}` takes {expected}, found {argc}", name.name),
                name.span,
            ));
            return None;
        }
        Some(builtin)
    }

    fn bind_stream(&mut self, param: &Ident) {
        self.bindings.push(Binding {
            name: param.name.clone(),
            span: param.span,
            slot: None,
            used: false,
            check_unused: false,
        });
    }

    /// Binds `ident` to a fresh slot. Returns `None` if the name is taken.
    fn bind(&mut self, ident: &Ident, check_unused: bool) -> Option<usize> {
        if ident.name == "<missing>" {
            return None;
        }
        if self.bindings.iter().any(|b| b.name == ident.name) {
            self.report.emit(self.report.error(
                DiagnosticCode::DUPLICATE_BINDING,
                format!("`{}` is already bound", ident.name),
                ident.span,
            ));
            return None;
        }
        let slot = self.slot_count;
        self.slot_count += 1;
        self.bindings.push(Binding {
            name: ident.name.clone(),
            span: ident.span,
            slot: Some(slot),
            used: false,
            check_unused,
        });
        Some(slot)
    }

    fn report_unused(&self) {
        for binding in &self.bindings {
            if binding.check_unused && !binding.used && !binding.name.starts_with('_') {
                self.report.emit(
                    self.report
                        .warning(
                            DiagnosticCode::UNUSED_BINDING,
                            format!("unused binding `{}`", binding.name),
                            binding.span,
                        )
                        .with_help(format!("rename it to `_{}` to silence this warning", binding.name)),
                );
            }
        }
    }
}
