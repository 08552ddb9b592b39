//! Recursive descent parser for query programs.
//!
//! [`Parser`] provides the primitive operations (advance, eat, expect) and the
//! program, entry, and clause rules. Expressions live in `expr.rs`. Errors are
//! reported as `E002` diagnostics and the parser recovers at the next clause
//! keyword, so one mistake does not produce a cascade.

use crate::ast::*;
use crate::report::Reporter;
use crate::token::{Token, TokenKind};
use sieve_diagnostics::DiagnosticCode;
use sieve_source::Span;

/// Parses the token stream of one assembled program.
pub(crate) struct Parser<'src> {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    pub(crate) source: &'src str,
    pub(crate) report: &'src Reporter<'src>,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(tokens: Vec<Token>, source: &'src str, report: &'src Reporter<'src>) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            report,
        }
    }

    // ========================================================================
    // Primitive operations
    // ========================================================================

    pub(crate) fn current(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    pub(crate) fn current_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    pub(crate) fn current_text(&self) -> &'src str {
        let span = self.current_span();
        &self.source[span.start as usize..span.end as usize]
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.current() == TokenKind::Eof
    }

    pub(crate) fn prev_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            self.current_span()
        }
    }

    pub(crate) fn advance(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.expected(kind.describe());
        false
    }

    /// Expects an identifier; on failure returns a placeholder named `<missing>`.
    pub(crate) fn expect_ident(&mut self) -> Ident {
        let span = self.current_span();
        if self.at(TokenKind::Ident) {
            let name = self.current_text().to_string();
            self.advance();
            Ident { name, span }
        } else {
            self.expected("identifier");
            Ident {
                name: "<missing>".to_string(),
                span,
            }
        }
    }

    // ========================================================================
    // Error handling and recovery
    // ========================================================================

    pub(crate) fn error(&self, msg: impl Into<String>, span: Span) {
        self.report
            .emit(self.report.error(DiagnosticCode::SYNTAX, msg, span));
    }

    /// Emits "expected X, found Y" at the current token.
    ///
    /// Error tokens were already diagnosed by the lexer and are not reported twice.
    pub(crate) fn expected(&self, what: &str) {
        if self.at(TokenKind::Error) {
            return;
        }
        self.error(
            format!("expected {what}, found {}", self.current().describe()),
            self.current_span(),
        );
    }

    /// Skips tokens up to the next clause keyword, `}`, or end of input.
    fn recover_to_clause(&mut self) {
        while !self.at_eof() && !self.at(TokenKind::RightBrace) && !self.current().starts_clause() {
            self.advance();
        }
    }

    // ========================================================================
    // Program structure
    // ========================================================================

    /// Parses a whole program.
    pub(crate) fn parse_program(&mut self) -> Program {
        let mut uses = Vec::new();
        let mut entries = Vec::new();
        while !self.at_eof() {
            match self.current() {
                TokenKind::Use => {
                    self.advance();
                    uses.push(self.expect_ident());
                    self.expect(TokenKind::Semicolon);
                }
                TokenKind::Ident => entries.push(self.parse_entry()),
                _ => {
                    self.expected("`use` or an entry definition");
                    self.advance();
                }
            }
        }
        Program { uses, entries }
    }

    fn parse_entry(&mut self) -> Entry {
        let name = self.expect_ident();
        let mut params = Vec::new();
        self.expect(TokenKind::LeftParen);
        if !self.at(TokenKind::RightParen) {
            loop {
                params.push(self.expect_ident());
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen);
        self.expect(TokenKind::LeftBrace);
        let query = self.parse_query();

        if !self.eat(TokenKind::RightBrace) {
            if self.current().starts_clause() {
                self.error("`select` must be the last clause of a query", self.current_span());
            } else {
                self.expected("`}`");
            }
            while !self.at_eof() && !self.at(TokenKind::RightBrace) {
                self.advance();
            }
            self.eat(TokenKind::RightBrace);
        }
        Entry {
            name,
            params,
            query,
        }
    }

    fn parse_query(&mut self) -> Query {
        let source = if self.at(TokenKind::From) {
            self.parse_from()
        } else {
            let span = self.current_span();
            self.error(
                format!("a query must start with `from`, found {}", self.current().describe()),
                span,
            );
            self.recover_to_clause();
            FromClause {
                var: Ident {
                    name: "<missing>".to_string(),
                    span,
                },
                index: None,
                source: Expr::Error(span),
                span,
            }
        };

        let mut clauses = Vec::new();
        loop {
            match self.current() {
                TokenKind::From => clauses.push(Clause::From(self.parse_from())),
                TokenKind::Where => {
                    self.advance();
                    clauses.push(Clause::Where(self.parse_expr()));
                }
                TokenKind::Let => {
                    self.advance();
                    let name = self.expect_ident();
                    self.expect(TokenKind::Assign);
                    let value = self.parse_expr();
                    clauses.push(Clause::Let { name, value });
                }
                TokenKind::Skip => {
                    self.advance();
                    clauses.push(Clause::Skip(self.parse_expr()));
                }
                TokenKind::Take => {
                    self.advance();
                    clauses.push(Clause::Take(self.parse_expr()));
                }
                TokenKind::Select => break,
                TokenKind::RightBrace | TokenKind::Eof => {
                    let span = self.current_span();
                    self.error("a query must end with a `select` clause", span);
                    return Query {
                        source,
                        clauses,
                        select: Expr::Error(span),
                    };
                }
                _ => {
                    self.expected("a query clause");
                    self.advance();
                    self.recover_to_clause();
                }
            }
        }

        self.advance();
        let select = self.parse_expr();
        Query {
            source,
            clauses,
            select,
        }
    }

    fn parse_from(&mut self) -> FromClause {
        let span = self.current_span();
        self.expect(TokenKind::From);
        let var = self.expect_ident();
        let index = if self.eat(TokenKind::At) {
            Some(self.expect_ident())
        } else {
            None
        };
        let source = if self.expect(TokenKind::In) {
            self.parse_expr()
        } else {
            let span = self.current_span();
            self.recover_to_clause();
            Expr::Error(span)
        };
        FromClause {
            var,
            index,
            source,
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use sieve_diagnostics::{Diagnostic, DiagnosticSink};

    fn parse(source: &str) -> (Program, Vec<Diagnostic>) {
        let sink = DiagnosticSink::new();
        let report = Reporter::new(source, &sink);
        let tokens = lex(source, &report);
        let program = Parser::new(tokens, source, &report).parse_program();
        (program, sink.take_all())
    }

    fn parse_ok(source: &str) -> Program {
        let (program, diags) = parse(source);
        assert!(
            diags.is_empty(),
            "unexpected errors: {:?}",
            diags.iter().map(|d| &d.message).collect::<Vec<_>>()
        );
        program
    }

    fn wrap(body: &str) -> String {
        format!("use core;\nquery(lines, args) {{\n{body}\n}}\n")
    }

    #[test]
    fn minimal_query() {
        let program = parse_ok(&wrap("from l in lines select l"));
        assert_eq!(program.uses.len(), 1);
        assert_eq!(program.uses[0].name, "core");
        assert_eq!(program.entries.len(), 1);
        let entry = &program.entries[0];
        assert_eq!(entry.name.name, "query");
        assert_eq!(entry.params.len(), 2);
        assert_eq!(entry.query.source.var.name, "l");
        assert!(entry.query.clauses.is_empty());
    }

    #[test]
    fn all_clause_kinds() {
        let program = parse_ok(&wrap(
            "from l at i in lines\n\
             where l != \"\"\n\
             let parts = split(l, \",\")\n\
             from p in parts\n\
             skip 1\n\
             take 10\n\
             select p + \":\" + str(i)",
        ));
        let query = &program.entries[0].query;
        assert_eq!(query.source.index.as_ref().map(|i| i.name.as_str()), Some("i"));
        assert_eq!(query.clauses.len(), 5);
        assert!(matches!(query.clauses[0], Clause::Where(_)));
        assert!(matches!(query.clauses[1], Clause::Let { .. }));
        assert!(matches!(query.clauses[2], Clause::From(_)));
        assert!(matches!(query.clauses[3], Clause::Skip(_)));
        assert!(matches!(query.clauses[4], Clause::Take(_)));
    }

    #[test]
    fn missing_from() {
        let (_, diags) = parse(&wrap("select 1"));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("must start with `from`"));
        assert_eq!(diags[0].position.line, 3);
    }

    #[test]
    fn missing_select() {
        let (_, diags) = parse(&wrap("from l in lines where true"));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("`select`"));
    }

    #[test]
    fn select_must_be_last() {
        let (_, diags) = parse(&wrap("from l in lines select l where true"));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("must be the last clause"));
    }

    #[test]
    fn recovers_at_next_clause() {
        let (program, diags) = parse(&wrap("from l in lines\nlet = 3\nwhere true\nselect l"));
        assert!(!diags.is_empty());
        assert_eq!(diags[0].position.line, 4);
        assert!(matches!(program.entries[0].query.select, Expr::Name(_)));
    }

    #[test]
    fn lexer_error_not_reported_twice() {
        let (_, diags) = parse(&wrap("from l in lines select ?"));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::LEXICAL);
    }

    #[test]
    fn missing_in() {
        let (_, diags) = parse(&wrap("from l lines select l"));
        assert!(diags[0].message.contains("expected `in`"));
    }

    #[test]
    fn stray_token_at_top_level() {
        let (_, diags) = parse("; query(lines, args) { from l in lines select l }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("`use` or an entry definition"));
    }
}
