//! Pratt expression parser.
//!
//! | BP (L,R) | Operators |
//! |----------|-----------|
//! | (1,2)    | `\|\|` |
//! | (3,4)    | `&&` |
//! | (5,6)    | `==` `!=` |
//! | (7,8)    | `<` `<=` `>` `>=` |
//! | (9,10)   | `+` `-` |
//! | (11,12)  | `*` `/` `%` |
//! | prefix 13 | `!` `-` |
//!
//! Indexing `a[i]` binds tighter than any operator.

use crate::ast::*;
use crate::parser::Parser;
use crate::token::TokenKind;
use sieve_common::decode_escapes;
use sieve_diagnostics::DiagnosticCode;

const PREFIX_BP: u8 = 13;

/// Binding power for binary operators. Returns (left_bp, right_bp).
fn infix_binding_power(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::Or => (1, 2),
        BinaryOp::And => (3, 4),
        BinaryOp::Eq | BinaryOp::Ne => (5, 6),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => (7, 8),
        BinaryOp::Add | BinaryOp::Sub => (9, 10),
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => (11, 12),
    }
}

impl Parser<'_> {
    /// Parses an expression.
    pub(crate) fn parse_expr(&mut self) -> Expr {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Expr {
        let mut lhs = self.parse_prefix_expr();

        loop {
            if self.at(TokenKind::LeftBracket) {
                lhs = self.parse_postfix_index(lhs);
                continue;
            }

            let op = match self.current_as_binary_op() {
                Some(op) => op,
                None => break,
            };
            let (l_bp, r_bp) = infix_binding_power(op);
            if l_bp < min_bp {
                break;
            }
            self.advance();

            let rhs = self.parse_expr_bp(r_bp);
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                left: Box::new(lhs),
                op,
                right: Box::new(rhs),
                span,
            };
        }

        lhs
    }

    fn parse_prefix_expr(&mut self) -> Expr {
        let start = self.current_span();

        if let Some(op) = self.current_as_unary_op() {
            self.advance();
            let operand = self.parse_expr_bp(PREFIX_BP);
            let span = start.merge(operand.span());
            return Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            };
        }

        match self.current() {
            TokenKind::Int => {
                let text = self.current_text();
                self.advance();
                match text.parse::<i64>() {
                    Ok(value) => Expr::Int { value, span: start },
                    Err(_) => {
                        self.report.emit(self.report.error(
                            DiagnosticCode::LEXICAL,
                            format!("integer literal `{text}` is too large"),
                            start,
                        ));
                        Expr::Error(start)
                    }
                }
            }
            TokenKind::Str => {
                let text = self.current_text();
                self.advance();
                let inner = &text[1..text.len() - 1];
                Expr::Str {
                    value: decode_escapes(inner),
                    span: start,
                }
            }
            TokenKind::True | TokenKind::False => {
                let value = self.at(TokenKind::True);
                self.advance();
                Expr::Bool { value, span: start }
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr();
                self.expect(TokenKind::RightParen);
                inner
            }
            TokenKind::LeftBracket => {
                self.advance();
                let items = self.parse_comma_list(TokenKind::RightBracket);
                Expr::List {
                    items,
                    span: start.merge(self.prev_span()),
                }
            }
            TokenKind::Ident => {
                let name = self.expect_ident();
                if self.at(TokenKind::LeftParen) {
                    self.advance();
                    let args = self.parse_comma_list(TokenKind::RightParen);
                    let span = start.merge(self.prev_span());
                    Expr::Call { name, args, span }
                } else {
                    Expr::Name(name)
                }
            }
            TokenKind::Error => {
                self.advance();
                Expr::Error(start)
            }
            kind => {
                self.expected("expression");
                if !kind.starts_clause()
                    && !matches!(kind, TokenKind::RightBrace | TokenKind::Eof)
                {
                    self.advance();
                }
                Expr::Error(start)
            }
        }
    }

    /// Parses `a, b, ...` up to and including `close`. The opening token has
    /// already been consumed.
    fn parse_comma_list(&mut self, close: TokenKind) -> Vec<Expr> {
        let mut items = Vec::new();
        if self.eat(close) {
            return items;
        }
        loop {
            items.push(self.parse_expr());
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(close);
        items
    }

    fn parse_postfix_index(&mut self, base: Expr) -> Expr {
        self.advance();
        let index = self.parse_expr();
        self.expect(TokenKind::RightBracket);
        let span = base.span().merge(self.prev_span());
        Expr::Index {
            base: Box::new(base),
            index: Box::new(index),
            span,
        }
    }

    fn current_as_binary_op(&self) -> Option<BinaryOp> {
        Some(match self.current() {
            TokenKind::OrOr => BinaryOp::Or,
            TokenKind::AndAnd => BinaryOp::And,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Rem,
            _ => return None,
        })
    }

    fn current_as_unary_op(&self) -> Option<UnaryOp> {
        match self.current() {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::report::Reporter;
    use sieve_diagnostics::DiagnosticSink;

    fn parse_expr_str(source: &str) -> Expr {
        let sink = DiagnosticSink::new();
        let report = Reporter::new(source, &sink);
        let tokens = lex(source, &report);
        let mut parser = Parser::new(tokens, source, &report);
        let expr = parser.parse_expr();
        let diags = sink.take_all();
        assert!(diags.is_empty(), "unexpected errors: {diags:?}");
        expr
    }

    fn binary_op(expr: &Expr) -> BinaryOp {
        match expr {
            Expr::Binary { op, .. } => *op,
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn literals() {
        assert!(matches!(parse_expr_str("42"), Expr::Int { value: 42, .. }));
        assert!(matches!(parse_expr_str("true"), Expr::Bool { value: true, .. }));
        match parse_expr_str(r#""a\tb""#) {
            Expr::Str { value, .. } => assert_eq!(value, "a\tb"),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn precedence_mul_over_add() {
        let expr = parse_expr_str("a + b * c");
        assert_eq!(binary_op(&expr), BinaryOp::Add);
        if let Expr::Binary { right, .. } = &expr {
            assert_eq!(binary_op(right), BinaryOp::Mul);
        }
    }

    #[test]
    fn precedence_comparison_over_logical() {
        let expr = parse_expr_str("len(l) > 0 && l != \"x\" || false");
        assert_eq!(binary_op(&expr), BinaryOp::Or);
        if let Expr::Binary { left, .. } = &expr {
            assert_eq!(binary_op(left), BinaryOp::And);
        }
    }

    #[test]
    fn left_associative_subtraction() {
        let expr = parse_expr_str("a - b - c");
        if let Expr::Binary { left, right, .. } = &expr {
            assert_eq!(binary_op(left), BinaryOp::Sub);
            assert!(matches!(**right, Expr::Name(_)));
        } else {
            panic!("expected binary");
        }
    }

    #[test]
    fn unary_binds_tighter_than_binary() {
        let expr = parse_expr_str("-a + b");
        assert_eq!(binary_op(&expr), BinaryOp::Add);
        let expr = parse_expr_str("!a && b");
        assert_eq!(binary_op(&expr), BinaryOp::And);
    }

    #[test]
    fn call_with_arguments() {
        match parse_expr_str("replace(l, \"a\", \"b\")") {
            Expr::Call { name, args, .. } => {
                assert_eq!(name.name, "replace");
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected call, got {other:?}"),
        }
        assert!(matches!(parse_expr_str("f()"), Expr::Call { ref args, .. } if args.is_empty()));
    }

    #[test]
    fn index_and_list() {
        assert!(matches!(parse_expr_str("split_tab(l)[2]"), Expr::Index { .. }));
        match parse_expr_str("[a, \"b\", 3]") {
            Expr::List { items, .. } => assert_eq!(items.len(), 3),
            other => panic!("expected list, got {other:?}"),
        }
        assert!(matches!(parse_expr_str("[]"), Expr::List { ref items, .. } if items.is_empty()));
    }

    #[test]
    fn parentheses_override_precedence() {
        let expr = parse_expr_str("(a + b) * c");
        assert_eq!(binary_op(&expr), BinaryOp::Mul);
    }

    #[test]
    fn span_covers_whole_expression() {
        let expr = parse_expr_str("upper(l) + \"!\"");
        assert_eq!(expr.span().start, 0);
        assert_eq!(expr.span().end, 14);
    }

    #[test]
    fn oversized_integer() {
        let source = "99999999999999999999";
        let sink = DiagnosticSink::new();
        let report = Reporter::new(source, &sink);
        let mut parser = Parser::new(lex(source, &report), source, &report);
        assert!(matches!(parser.parse_expr(), Expr::Error(_)));
        assert_eq!(sink.take_all()[0].code, DiagnosticCode::LEXICAL);
    }
}
