//! Expression evaluation against a row of slot values.

use crate::ast::{BinaryOp, UnaryOp};
use crate::builtins::Builtin;
use crate::error::RuntimeError;
use crate::plan::{Node, NodeKind};
use crate::value::Value;
use std::cmp::Ordering;

/// Evaluates `node` with `row` supplying slot values.
pub(crate) fn eval(node: &Node, row: &[Value]) -> Result<Value, RuntimeError> {
    match &node.kind {
        NodeKind::Const(value) => Ok(value.clone()),
        NodeKind::Slot(slot) => Ok(row[*slot].clone()),
        NodeKind::List(items) => Ok(Value::List(
            items
                .iter()
                .map(|item| eval(item, row))
                .collect::<Result<_, _>>()?,
        )),
        NodeKind::Unary(op, operand) => {
            let value = eval(operand, row)?;
            match (op, value) {
                (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                (UnaryOp::Neg, Value::Int(n)) => n
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| RuntimeError::eval("integer overflow", node.at)),
                (UnaryOp::Not, other) => Err(RuntimeError::eval(
                    format!("`!` expects a bool, found {}", other.type_name()),
                    node.at,
                )),
                (UnaryOp::Neg, other) => Err(RuntimeError::eval(
                    format!("`-` expects an int, found {}", other.type_name()),
                    node.at,
                )),
            }
        }
        NodeKind::Binary(op, left, right) => eval_binary(node, *op, left, right, row),
        NodeKind::Index(base, index) => {
            let base = eval(base, row)?;
            let index = match eval(index, row)? {
                Value::Int(n) => n,
                other => {
                    return Err(RuntimeError::eval(
                        format!("index must be an int, found {}", other.type_name()),
                        node.at,
                    ))
                }
            };
            let out_of_range =
                |len: usize| RuntimeError::eval(format!("index {index} out of range for length {len}"), node.at);
            match base {
                Value::List(items) => {
                    let len = items.len();
                    usize::try_from(index)
                        .ok()
                        .and_then(|i| items.into_iter().nth(i))
                        .ok_or_else(|| out_of_range(len))
                }
                Value::Str(s) => {
                    let len = s.chars().count();
                    usize::try_from(index)
                        .ok()
                        .and_then(|i| s.chars().nth(i))
                        .map(|c| Value::Str(c.to_string()))
                        .ok_or_else(|| out_of_range(len))
                }
                other => Err(RuntimeError::eval(
                    format!("cannot index into {}", other.type_name()),
                    node.at,
                )),
            }
        }
        NodeKind::Call(Builtin::Case, args) => eval_case(node, args, row),
        NodeKind::Call(builtin, args) => {
            let args = args
                .iter()
                .map(|arg| eval(arg, row))
                .collect::<Result<Vec<_>, _>>()?;
            builtin
                .call(args)
                .map_err(|message| RuntimeError::eval(message, node.at))
        }
    }
}

/// `case` evaluates keys in order and only the result it selects.
fn eval_case(node: &Node, args: &[Node], row: &[Value]) -> Result<Value, RuntimeError> {
    let malformed = || RuntimeError::eval("`case` needs a value and a default", node.at);
    let (value, rest) = args.split_first().ok_or_else(malformed)?;
    let (default, pairs) = rest.split_last().ok_or_else(malformed)?;
    let value = eval(value, row)?;
    for pair in pairs.chunks_exact(2) {
        if eval(&pair[0], row)? == value {
            return eval(&pair[1], row);
        }
    }
    eval(default, row)
}

fn eval_binary(node: &Node, op: BinaryOp, left: &Node, right: &Node, row: &[Value]) -> Result<Value, RuntimeError> {
    let type_error = |l: &Value, r: &Value| {
        RuntimeError::eval(
            format!(
                "operator `{}` cannot be applied to {} and {}",
                symbol(op),
                l.type_name(),
                r.type_name()
            ),
            node.at,
        )
    };

    // Logical operators short-circuit.
    if matches!(op, BinaryOp::And | BinaryOp::Or) {
        let lhs = eval(left, row)?;
        let Value::Bool(l) = lhs else {
            return Err(type_error(&lhs, &Value::Bool(false)));
        };
        if (op == BinaryOp::And && !l) || (op == BinaryOp::Or && l) {
            return Ok(Value::Bool(l));
        }
        return match eval(right, row)? {
            Value::Bool(r) => Ok(Value::Bool(r)),
            other => Err(type_error(&lhs, &other)),
        };
    }

    let lhs = eval(left, row)?;
    let rhs = eval(right, row)?;
    let overflow = || RuntimeError::eval("integer overflow", node.at);

    match op {
        BinaryOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinaryOp::Ne => Ok(Value::Bool(lhs != rhs)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (&lhs, &rhs) {
                (Value::Int(a), Value::Int(b)) => a.cmp(b),
                (Value::Str(a), Value::Str(b)) => a.cmp(b),
                _ => return Err(type_error(&lhs, &rhs)),
            };
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::Add => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
            (Value::List(mut a), Value::List(b)) => {
                a.extend(b);
                Ok(Value::List(a))
            }
            (l @ Value::Str(_), r) | (l, r @ Value::Str(_)) => Ok(Value::Str(format!("{l}{r}"))),
            (l, r) => Err(type_error(&l, &r)),
        },
        _ => {
            let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) else {
                return Err(type_error(&lhs, &rhs));
            };
            let (a, b) = (*a, *b);
            if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0 {
                return Err(RuntimeError::eval("division by zero", node.at));
            }
            let result = match op {
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div => a.checked_div(b),
                _ => a.checked_rem(b),
            };
            result.map(Value::Int).ok_or_else(overflow)
        }
    }
}

fn symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Or => "||",
        BinaryOp::And => "&&",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_diagnostics::Position;

    fn node(kind: NodeKind) -> Node {
        Node {
            kind,
            at: Position::new(1, 1),
        }
    }

    fn int(n: i64) -> Node {
        node(NodeKind::Const(Value::Int(n)))
    }

    fn str(s: &str) -> Node {
        node(NodeKind::Const(Value::Str(s.to_string())))
    }

    fn bin(op: BinaryOp, l: Node, r: Node) -> Node {
        node(NodeKind::Binary(op, Box::new(l), Box::new(r)))
    }

    #[test]
    fn arithmetic() {
        let expr = bin(BinaryOp::Add, int(2), bin(BinaryOp::Mul, int(3), int(4)));
        assert_eq!(eval(&expr, &[]).unwrap(), Value::Int(14));
        assert_eq!(eval(&bin(BinaryOp::Rem, int(7), int(3)), &[]).unwrap(), Value::Int(1));
    }

    #[test]
    fn division_by_zero() {
        let err = eval(&bin(BinaryOp::Div, int(1), int(0)), &[]).unwrap_err();
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn overflow_is_an_error() {
        let err = eval(&bin(BinaryOp::Add, int(i64::MAX), int(1)), &[]).unwrap_err();
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn string_concatenation_with_int() {
        let expr = bin(BinaryOp::Add, str("n="), int(3));
        assert_eq!(eval(&expr, &[]).unwrap(), Value::Str("n=3".into()));
        let expr = bin(BinaryOp::Add, int(3), str("!"));
        assert_eq!(eval(&expr, &[]).unwrap(), Value::Str("3!".into()));
    }

    #[test]
    fn comparison_type_error() {
        let err = eval(&bin(BinaryOp::Lt, int(1), str("a")), &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "query:1:1: operator `<` cannot be applied to int and string"
        );
    }

    #[test]
    fn logical_short_circuit() {
        // The right side would fail if evaluated.
        let failing = bin(BinaryOp::Div, int(1), int(0));
        let or = bin(
            BinaryOp::Or,
            node(NodeKind::Const(Value::Bool(true))),
            bin(BinaryOp::Eq, failing.clone(), int(0)),
        );
        assert_eq!(eval(&or, &[]).unwrap(), Value::Bool(true));
        let and = bin(
            BinaryOp::And,
            node(NodeKind::Const(Value::Bool(false))),
            bin(BinaryOp::Eq, failing, int(0)),
        );
        assert_eq!(eval(&and, &[]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn slots_and_indexing() {
        let row = vec![Value::strings(["a", "b"]), Value::Str("xyz".into())];
        let first = node(NodeKind::Index(Box::new(node(NodeKind::Slot(0))), Box::new(int(1))));
        assert_eq!(eval(&first, &row).unwrap(), Value::Str("b".into()));
        let ch = node(NodeKind::Index(Box::new(node(NodeKind::Slot(1))), Box::new(int(2))));
        assert_eq!(eval(&ch, &row).unwrap(), Value::Str("z".into()));
        let oob = node(NodeKind::Index(Box::new(node(NodeKind::Slot(0))), Box::new(int(5))));
        assert!(eval(&oob, &row).unwrap_err().to_string().contains("out of range"));
    }
}
