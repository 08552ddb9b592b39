//! Lazy application of a compiled query to a line stream.
//!
//! [`TransformInvoker::invoke`] builds a chain of boxed row iterators, one
//! per clause, and returns it as a [`Transform`]. Nothing is read from the
//! input until the first output line is requested, and each request pulls
//! only as much input as it needs.

use std::collections::VecDeque;
use std::io;

use crate::error::{ResolveError, RuntimeError};
use crate::eval::eval;
use crate::plan::{CompiledArtifact, Node, QueryPlan, Step, PLAN_FORMAT_VERSION};
use crate::value::Value;
use sieve_source::ENTRY_NAME;

type Row = Vec<Value>;
type Rows<'a> = Box<dyn Iterator<Item = Result<Row, RuntimeError>> + 'a>;

/// Number of parameters the entry point must declare: the input stream and
/// the extra argument list.
const ENTRY_PARAMS: usize = 2;

/// A resolved entry point, ready to be applied to input streams.
#[derive(Debug, Clone, Copy)]
pub struct TransformInvoker<'a> {
    plan: &'a QueryPlan,
}

impl<'a> TransformInvoker<'a> {
    /// Finds the `query` entry of `artifact` and checks its signature.
    pub fn resolve(artifact: &'a CompiledArtifact) -> Result<Self, ResolveError> {
        if artifact.format_version != PLAN_FORMAT_VERSION {
            return Err(ResolveError::FormatVersion {
                expected: PLAN_FORMAT_VERSION,
                found: artifact.format_version,
            });
        }
        let entry = artifact
            .entry(ENTRY_NAME)
            .ok_or_else(|| ResolveError::MissingEntry {
                name: ENTRY_NAME.to_string(),
            })?;
        if entry.params.len() != ENTRY_PARAMS || entry.plan.param_slots.len() != ENTRY_PARAMS - 1 {
            return Err(ResolveError::Signature {
                name: entry.name.clone(),
                expected: ENTRY_PARAMS,
                found: entry.params.len(),
            });
        }
        Ok(Self { plan: &entry.plan })
    }

    /// Applies the query to `lines`, with `args` bound to the second parameter.
    ///
    /// The returned sequence is lazy and single-pass. It ends after the first
    /// `Err` item.
    pub fn invoke<I>(&self, lines: I, args: Vec<String>) -> Transform<'a>
    where
        I: IntoIterator<Item = io::Result<String>>,
        I::IntoIter: 'a,
    {
        let plan = self.plan;
        let mut template = vec![Value::Bool(false); plan.slot_count];
        for &slot in &plan.param_slots {
            template[slot] = Value::strings(args.iter().cloned());
        }

        let input = plan.input;
        let source: Rows<'a> = Box::new(lines.into_iter().enumerate().map(move |(i, line)| -> Result<Row, RuntimeError> {
            let mut row = template.clone();
            row[input.var] = Value::Str(line?);
            if let Some(index) = input.index {
                row[index] = Value::Int(i as i64);
            }
            Ok(row)
        }));
        let rows = plan.steps.iter().fold(source, |rows, step| apply(step, rows));

        Transform {
            rows,
            select: &plan.select,
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

fn apply<'a>(step: &'a Step, rows: Rows<'a>) -> Rows<'a> {
    match step {
        Step::From { var, index, source } => {
            let (var, index) = (*var, *index);
            Box::new(rows.flat_map(move |row| -> Rows<'a> {
                let row = match row {
                    Ok(row) => row,
                    Err(e) => return Box::new(std::iter::once(Err(e))),
                };
                match eval(source, &row) {
                    Ok(Value::List(items)) => {
                        Box::new(items.into_iter().enumerate().map(move |(i, item)| -> Result<Row, RuntimeError> {
                            let mut next = row.clone();
                            next[var] = item;
                            if let Some(index) = index {
                                next[index] = Value::Int(i as i64);
                            }
                            Ok(next)
                        }))
                    }
                    Ok(other) => Box::new(std::iter::once(Err(RuntimeError::eval(
                        format!("`from` expects a list, found {}", other.type_name()),
                        source.at,
                    )))),
                    Err(e) => Box::new(std::iter::once(Err(e))),
                }
            }))
        }
        Step::Where(cond) => Box::new(rows.filter_map(move |row| {
            let row = match row {
                Ok(row) => row,
                Err(e) => return Some(Err(e)),
            };
            match eval(cond, &row) {
                Ok(Value::Bool(true)) => Some(Ok(row)),
                Ok(Value::Bool(false)) => None,
                Ok(other) => Some(Err(RuntimeError::eval(
                    format!("`where` expects a bool, found {}", other.type_name()),
                    cond.at,
                ))),
                Err(e) => Some(Err(e)),
            }
        })),
        Step::Let { slot, value } => {
            let slot = *slot;
            Box::new(rows.map(move |row| -> Result<Row, RuntimeError> {
                let mut row = row?;
                row[slot] = eval(value, &row)?;
                Ok(row)
            }))
        }
        Step::Skip(count) => Box::new(SkipRows {
            inner: rows,
            count,
            remaining: None,
        }),
        Step::Take(count) => Box::new(TakeRows {
            inner: rows,
            count,
            remaining: None,
        }),
    }
}

/// Evaluates a `skip`/`take` count on the first row that reaches the clause.
fn eval_count(clause: &str, count: &Node, row: &[Value]) -> Result<u64, RuntimeError> {
    match eval(count, row)? {
        Value::Int(n) if n >= 0 => Ok(n as u64),
        other => Err(RuntimeError::eval(
            format!("`{clause}` expects a non-negative int, found {other}"),
            count.at,
        )),
    }
}

struct SkipRows<'a> {
    inner: Rows<'a>,
    count: &'a Node,
    remaining: Option<u64>,
}

impl Iterator for SkipRows<'_> {
    type Item = Result<Row, RuntimeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match self.inner.next()? {
                Ok(row) => row,
                Err(e) => return Some(Err(e)),
            };
            let remaining = match self.remaining {
                Some(n) => n,
                None => match eval_count("skip", self.count, &row) {
                    Ok(n) => n,
                    Err(e) => return Some(Err(e)),
                },
            };
            if remaining == 0 {
                self.remaining = Some(0);
                return Some(Ok(row));
            }
            self.remaining = Some(remaining - 1);
        }
    }
}

/// Passes through at most `count` rows and never pulls the row after the last.
struct TakeRows<'a> {
    inner: Rows<'a>,
    count: &'a Node,
    remaining: Option<u64>,
}

impl Iterator for TakeRows<'_> {
    type Item = Result<Row, RuntimeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }
        let row = match self.inner.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        let remaining = match self.remaining {
            Some(n) => n,
            None => match eval_count("take", self.count, &row) {
                Ok(n) => n,
                Err(e) => return Some(Err(e)),
            },
        };
        if remaining == 0 {
            self.remaining = Some(0);
            return None;
        }
        self.remaining = Some(remaining - 1);
        Some(Ok(row))
    }
}

/// The lazily evaluated output of a query: a single-pass sequence of lines.
///
/// Yields `Err` at most once; the sequence ends after it.
pub struct Transform<'a> {
    rows: Rows<'a>,
    select: &'a Node,
    /// Remaining elements of a list-valued `select`.
    pending: VecDeque<String>,
    finished: bool,
}

impl Iterator for Transform<'_> {
    type Item = Result<String, RuntimeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(Ok(line));
            }
            if self.finished {
                return None;
            }
            let row = match self.rows.next() {
                Some(Ok(row)) => row,
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    return None;
                }
            };
            match eval(self.select, &row) {
                Ok(Value::List(items)) => self.pending.extend(items.iter().map(Value::to_string)),
                Ok(value) => return Some(Ok(value.to_string())),
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
