//! The compiled, serializable form of a query program.
//!
//! A [`CompiledArtifact`] is what the artifact cache stores. Names have been
//! resolved to row slots and functions to [`Builtin`]s, so evaluating a plan
//! needs neither the source text nor a symbol table.

use crate::ast::{BinaryOp, UnaryOp};
use crate::builtins::Builtin;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use sieve_diagnostics::{Diagnostic, Position};

/// Current plan format version. Increment on breaking changes to the plan types.
pub const PLAN_FORMAT_VERSION: u32 = 1;

/// A compiled program: its imports and named entry points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledArtifact {
    /// Plan format version this artifact was produced with.
    pub format_version: u32,
    /// Libraries the program imported.
    pub imports: Vec<String>,
    /// Entry points in definition order.
    pub entries: Vec<QueryEntry>,
}

impl CompiledArtifact {
    /// Finds an entry by name.
    pub fn entry(&self, name: &str) -> Option<&QueryEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// The result of a successful compile.
///
/// Warnings travel with the artifact so that a cache hit reports the same
/// warnings as the build that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Compilation {
    /// The compiled program.
    pub artifact: CompiledArtifact,
    /// Warning diagnostics, positioned in the assembled program.
    pub warnings: Vec<Diagnostic>,
}

/// One named entry point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryEntry {
    /// Entry name.
    pub name: String,
    /// Parameter names; the first is the input stream.
    pub params: Vec<String>,
    /// The executable plan.
    pub plan: QueryPlan,
}

/// A resolved query: a row layout, an input step, clause steps, and a projection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    /// Number of value slots in a row.
    pub slot_count: usize,
    /// Slots receiving the non-stream parameters, in parameter order.
    pub param_slots: Vec<usize>,
    /// The leading `from` over the input stream.
    pub input: InputStep,
    /// Remaining clauses in order.
    pub steps: Vec<Step>,
    /// The `select` expression.
    pub select: Node,
}

/// Slot assignment for the leading `from`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputStep {
    /// Slot of the range variable (the line text).
    pub var: usize,
    /// Slot of the 0-based line number, if `at` was given.
    pub index: Option<usize>,
}

/// A clause after the leading `from`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Nested `from`: one output row per list element.
    From {
        /// Slot of the element.
        var: usize,
        /// Slot of the element position.
        index: Option<usize>,
        /// The list expression.
        source: Node,
    },
    /// `where`: keep rows whose condition is `true`.
    Where(Node),
    /// `let`: compute a slot.
    Let {
        /// Target slot.
        slot: usize,
        /// The value.
        value: Node,
    },
    /// `skip`: drop the first n rows.
    Skip(Node),
    /// `take`: stop after n rows.
    Take(Node),
}

/// A resolved expression and the user position it came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// What the expression computes.
    pub kind: NodeKind,
    /// 1-based position in the user's query text; line 0 if outside it.
    pub at: Position,
}

/// Resolved expression forms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A literal.
    Const(Value),
    /// A row slot.
    Slot(usize),
    /// A list literal.
    List(Vec<Node>),
    /// A prefix operation.
    Unary(UnaryOp, Box<Node>),
    /// A binary operation.
    Binary(BinaryOp, Box<Node>, Box<Node>),
    /// Indexing.
    Index(Box<Node>, Box<Node>),
    /// A library call.
    Call(Builtin, Vec<Node>),
}
