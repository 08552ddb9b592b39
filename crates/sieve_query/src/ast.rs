//! Syntax tree for query programs.
//!
//! Every node carries its [`Span`] in the assembled program. Nodes that could
//! not be parsed are represented by `Error` variants so later passes can skip
//! them without emitting cascading diagnostics.

use sieve_source::Span;

/// A parsed program: library imports followed by entry definitions.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    /// `use <lib>;` declarations in source order.
    pub uses: Vec<Ident>,
    /// Entry definitions, normally exactly one named `query`.
    pub entries: Vec<Entry>,
}

/// A name with its location.
#[derive(Clone, Debug, PartialEq)]
pub struct Ident {
    /// The identifier text.
    pub name: String,
    /// Where it appears.
    pub span: Span,
}

/// `name(param, ...) { query }`
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// Entry name.
    pub name: Ident,
    /// Parameter names; the first is the input stream.
    pub params: Vec<Ident>,
    /// The query body.
    pub query: Query,
}

/// `from ... clause* select expr`
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    /// The leading `from` over the input stream.
    pub source: FromClause,
    /// Intermediate clauses in order.
    pub clauses: Vec<Clause>,
    /// The projection.
    pub select: Expr,
}

/// `from var [at index] in expr`
#[derive(Clone, Debug, PartialEq)]
pub struct FromClause {
    /// The range variable.
    pub var: Ident,
    /// Optional 0-based position variable.
    pub index: Option<Ident>,
    /// The sequence ranged over.
    pub source: Expr,
    /// Span of the `from` keyword.
    pub span: Span,
}

/// An intermediate query clause.
#[derive(Clone, Debug, PartialEq)]
pub enum Clause {
    /// A nested `from` that flat-maps over a list.
    From(FromClause),
    /// `where cond`
    Where(Expr),
    /// `let name = value`
    Let {
        /// The bound name.
        name: Ident,
        /// The bound value.
        value: Expr,
    },
    /// `skip count`
    Skip(Expr),
    /// `take count`
    Take(Expr),
}

/// Binary operators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub enum BinaryOp {
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

/// Prefix operators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
}

/// An expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Integer literal.
    Int {
        /// The value.
        value: i64,
        /// Location.
        span: Span,
    },
    /// String literal with escapes decoded.
    Str {
        /// The value.
        value: String,
        /// Location.
        span: Span,
    },
    /// `true` or `false`.
    Bool {
        /// The value.
        value: bool,
        /// Location.
        span: Span,
    },
    /// A variable reference.
    Name(Ident),
    /// `[a, b, ...]`
    List {
        /// Element expressions.
        items: Vec<Expr>,
        /// Location.
        span: Span,
    },
    /// A prefix operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
        /// Location.
        span: Span,
    },
    /// A binary operation.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// The operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
        /// Location.
        span: Span,
    },
    /// `base[index]`
    Index {
        /// The indexed value.
        base: Box<Expr>,
        /// The index.
        index: Box<Expr>,
        /// Location.
        span: Span,
    },
    /// `name(args)`
    Call {
        /// Function name.
        name: Ident,
        /// Arguments.
        args: Vec<Expr>,
        /// Location.
        span: Span,
    },
    /// An unparseable expression; already diagnosed.
    Error(Span),
}

impl Expr {
    /// Returns the source span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Expr::Int { span, .. }
            | Expr::Str { span, .. }
            | Expr::Bool { span, .. }
            | Expr::List { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Index { span, .. }
            | Expr::Call { span, .. } => *span,
            Expr::Name(ident) => ident.span,
            Expr::Error(span) => *span,
        }
    }
}
