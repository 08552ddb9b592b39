//! Library functions callable from queries.
//!
//! Functions are grouped into libraries that a program imports with `use`.
//! `core` and `text` are imported by default; `tsv` must be requested.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use sieve_common::{decode_escapes, encode_escapes};

/// Names of all libraries a program may import.
pub const LIBRARIES: [&str; 3] = ["core", "text", "tsv"];

/// Returns `true` if `name` is an importable library.
pub fn is_library(name: &str) -> bool {
    LIBRARIES.contains(&name)
}

/// A library function.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Builtin {
    // core
    /// `str(x)`: display form of any value.
    Str,
    /// `int(s)`: parse a decimal integer.
    Int,
    /// `len(x)`: characters in a string or items in a list.
    Len,
    /// `error(cond, msg)`: fail the run with `msg` unless `cond` holds.
    Error,
    /// `warn(cond, msg)`: print `msg` to stderr unless `cond` holds.
    Warn,
    /// `single(x)`: a one-element list.
    Single,
    /// `get_or(list, i, default)`: element `i`, or `default` when out of range.
    GetOr,
    /// `case(value, k1, r1, ..., default)`: the result paired with the first
    /// key equal to `value`, else `default`. Only the chosen result is
    /// evaluated.
    Case,
    // text
    /// `upper(s)`
    Upper,
    /// `lower(s)`
    Lower,
    /// `trim(s)`
    Trim,
    /// `split(s, sep)`
    Split,
    /// `join(list, sep)`
    Join,
    /// `replace(s, from, to)`
    Replace,
    /// `contains(s, sub)`
    Contains,
    /// `starts_with(s, prefix)`
    StartsWith,
    /// `ends_with(s, suffix)`
    EndsWith,
    /// `substr(s, start[, len])`, in characters.
    Substr,
    // tsv
    /// `split_tab(line)`: tab-separated columns with escapes decoded.
    SplitTab,
    /// `decode_tab(s)`
    DecodeTab,
    /// `encode_tab(s)`
    EncodeTab,
    /// `join_tab(list)`: escape each column and join with tabs.
    JoinTab,
}

const ALL: [Builtin; 22] = [
    Builtin::Str,
    Builtin::Int,
    Builtin::Len,
    Builtin::Error,
    Builtin::Warn,
    Builtin::Single,
    Builtin::GetOr,
    Builtin::Case,
    Builtin::Upper,
    Builtin::Lower,
    Builtin::Trim,
    Builtin::Split,
    Builtin::Join,
    Builtin::Replace,
    Builtin::Contains,
    Builtin::StartsWith,
    Builtin::EndsWith,
    Builtin::Substr,
    Builtin::SplitTab,
    Builtin::DecodeTab,
    Builtin::EncodeTab,
    Builtin::JoinTab,
];

impl Builtin {
    /// Finds a function by name regardless of which libraries are imported.
    pub fn lookup(name: &str) -> Option<Builtin> {
        ALL.into_iter().find(|b| b.name() == name)
    }

    /// The name the function is called by.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Len => "len",
            Builtin::Error => "error",
            Builtin::Warn => "warn",
            Builtin::Single => "single",
            Builtin::GetOr => "get_or",
            Builtin::Case => "case",
            Builtin::Upper => "upper",
            Builtin::Lower => "lower",
            Builtin::Trim => "trim",
            Builtin::Split => "split",
            Builtin::Join => "join",
            Builtin::Replace => "replace",
            Builtin::Contains => "contains",
            Builtin::StartsWith => "starts_with",
            Builtin::EndsWith => "ends_with",
            Builtin::Substr => "substr",
            Builtin::SplitTab => "split_tab",
            Builtin::DecodeTab => "decode_tab",
            Builtin::EncodeTab => "encode_tab",
            Builtin::JoinTab => "join_tab",
        }
    }

    /// The library that provides the function.
    pub fn library(self) -> &'static str {
        match self {
            Builtin::Str
            | Builtin::Int
            | Builtin::Len
            | Builtin::Error
            | Builtin::Warn
            | Builtin::Single
            | Builtin::GetOr
            | Builtin::Case => "core",
            Builtin::SplitTab | Builtin::DecodeTab | Builtin::EncodeTab | Builtin::JoinTab => {
                "tsv"
            }
            _ => "text",
        }
    }

    /// Accepted argument counts, inclusive. `usize::MAX` means unbounded.
    pub fn arity(self) -> (usize, usize) {
        match self {
            Builtin::Str
            | Builtin::Int
            | Builtin::Len
            | Builtin::Single
            | Builtin::Upper
            | Builtin::Lower
            | Builtin::Trim
            | Builtin::SplitTab
            | Builtin::DecodeTab
            | Builtin::EncodeTab
            | Builtin::JoinTab => (1, 1),
            Builtin::Error
            | Builtin::Warn
            | Builtin::Split
            | Builtin::Join
            | Builtin::Contains
            | Builtin::StartsWith
            | Builtin::EndsWith => (2, 2),
            Builtin::GetOr | Builtin::Replace => (3, 3),
            Builtin::Substr => (2, 3),
            Builtin::Case => (4, usize::MAX),
        }
    }

    /// Whether `argc` arguments form a valid call.
    pub fn accepts(self, argc: usize) -> bool {
        let (min, max) = self.arity();
        let paired = self != Builtin::Case || argc % 2 == 0;
        (min..=max).contains(&argc) && paired
    }

    /// Applies the function. The argument count has been checked at compile time.
    ///
    /// Errors are plain messages; the evaluator attaches the call position.
    pub fn call(self, args: Vec<Value>) -> Result<Value, String> {
        let name = self.name();
        let str_arg = |i| str_arg(name, &args, i);
        let int_arg = |i| int_arg(name, &args, i);
        let bool_arg = |i| bool_arg(name, &args, i);
        let list_arg = |i| list_arg(name, &args, i);

        match self {
            Builtin::Str => Ok(Value::Str(args[0].to_string())),
            Builtin::Int => match &args[0] {
                Value::Int(n) => Ok(Value::Int(*n)),
                Value::Str(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| format!("cannot convert \"{s}\" to int")),
                other => Err(format!("cannot convert {} to int", other.type_name())),
            },
            Builtin::Len => match &args[0] {
                Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                Value::List(items) => Ok(Value::Int(items.len() as i64)),
                other => Err(format!("`len` expects a string or list, found {}", other.type_name())),
            },
            Builtin::Error => {
                let (cond, msg) = (bool_arg(0)?, str_arg(1)?);
                if cond {
                    Ok(Value::Bool(true))
                } else {
                    Err(msg.to_string())
                }
            }
            Builtin::Warn => {
                let (cond, msg) = (bool_arg(0)?, str_arg(1)?);
                if !cond {
                    tracing::debug!(message = msg, "query warning");
                    eprintln!("{msg}");
                }
                Ok(Value::Bool(cond))
            }
            Builtin::Single => Ok(Value::List(vec![args[0].clone()])),
            Builtin::Case => {
                let (value, rest) = args.split_first().ok_or_else(|| mismatch(name, "a value", &args, 0))?;
                let (default, pairs) = rest.split_last().ok_or_else(|| mismatch(name, "a default", &args, 1))?;
                let chosen = pairs
                    .chunks_exact(2)
                    .find(|pair| pair[0] == *value)
                    .map_or(default, |pair| &pair[1]);
                Ok(chosen.clone())
            }
            Builtin::GetOr => {
                let (items, index) = (list_arg(0)?, int_arg(1)?);
                let found = usize::try_from(index).ok().and_then(|i| items.get(i));
                Ok(found.cloned().unwrap_or_else(|| args[2].clone()))
            }
            Builtin::Upper => Ok(Value::Str(str_arg(0)?.to_uppercase())),
            Builtin::Lower => Ok(Value::Str(str_arg(0)?.to_lowercase())),
            Builtin::Trim => Ok(Value::Str(str_arg(0)?.trim().to_string())),
            Builtin::Split => {
                let (s, sep) = (str_arg(0)?, str_arg(1)?);
                if sep.is_empty() {
                    return Err("`split` separator must not be empty".to_string());
                }
                Ok(Value::strings(s.split(sep)))
            }
            Builtin::Join => {
                let (items, sep) = (list_arg(0)?, str_arg(1)?);
                let parts: Vec<String> = items.iter().map(Value::to_string).collect();
                Ok(Value::Str(parts.join(sep)))
            }
            Builtin::Replace => {
                let (s, from, to) = (str_arg(0)?, str_arg(1)?, str_arg(2)?);
                if from.is_empty() {
                    return Err("`replace` pattern must not be empty".to_string());
                }
                Ok(Value::Str(s.replace(from, to)))
            }
            Builtin::Contains => Ok(Value::Bool(str_arg(0)?.contains(str_arg(1)?))),
            Builtin::StartsWith => Ok(Value::Bool(str_arg(0)?.starts_with(str_arg(1)?))),
            Builtin::EndsWith => Ok(Value::Bool(str_arg(0)?.ends_with(str_arg(1)?))),
            Builtin::Substr => {
                let s = str_arg(0)?;
                let start = int_arg(1)?;
                let count = s.chars().count() as i64;
                if start < 0 || start > count {
                    return Err(format!(
                        "`substr` start {start} is outside a string of length {count}"
                    ));
                }
                let len = if args.len() > 2 { int_arg(2)? } else { count - start };
                if len < 0 || len > count - start {
                    return Err(format!(
                        "`substr` length {len} from {start} runs past a string of length {count}"
                    ));
                }
                Ok(Value::Str(
                    s.chars().skip(start as usize).take(len as usize).collect(),
                ))
            }
            Builtin::SplitTab => Ok(Value::strings(str_arg(0)?.split('\t').map(decode_escapes))),
            Builtin::DecodeTab => Ok(Value::Str(decode_escapes(str_arg(0)?))),
            Builtin::EncodeTab => Ok(Value::Str(encode_escapes(str_arg(0)?))),
            Builtin::JoinTab => {
                let cols: Vec<String> = list_arg(0)?
                    .iter()
                    .map(|v| encode_escapes(&v.to_string()))
                    .collect();
                Ok(Value::Str(cols.join("\t")))
            }
        }
    }
}

fn mismatch(name: &str, expected: &str, args: &[Value], i: usize) -> String {
    match args.get(i) {
        Some(found) => format!(
            "`{name}` expects {expected} as argument {}, found {}",
            i + 1,
            found.type_name()
        ),
        None => format!("`{name}` is missing argument {}", i + 1),
    }
}

fn str_arg<'v>(name: &str, args: &'v [Value], i: usize) -> Result<&'v str, String> {
    match args.get(i) {
        Some(Value::Str(s)) => Ok(s),
        _ => Err(mismatch(name, "a string", args, i)),
    }
}

fn int_arg(name: &str, args: &[Value], i: usize) -> Result<i64, String> {
    match args.get(i) {
        Some(Value::Int(n)) => Ok(*n),
        _ => Err(mismatch(name, "an int", args, i)),
    }
}

fn bool_arg(name: &str, args: &[Value], i: usize) -> Result<bool, String> {
    match args.get(i) {
        Some(Value::Bool(b)) => Ok(*b),
        _ => Err(mismatch(name, "a bool", args, i)),
    }
}

fn list_arg<'v>(name: &str, args: &'v [Value], i: usize) -> Result<&'v [Value], String> {
    match args.get(i) {
        Some(Value::List(items)) => Ok(items),
        _ => Err(mismatch(name, "a list", args, i)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(Builtin::lookup("starts_with"), Some(Builtin::StartsWith));
        assert_eq!(Builtin::lookup("frob"), None);
        for b in ALL {
            assert_eq!(Builtin::lookup(b.name()), Some(b));
            assert!(is_library(b.library()));
        }
    }

    #[test]
    fn library_membership() {
        assert_eq!(Builtin::Upper.library(), "text");
        assert_eq!(Builtin::Warn.library(), "core");
        assert_eq!(Builtin::Case.library(), "core");
        assert_eq!(Builtin::SplitTab.library(), "tsv");
    }

    #[test]
    fn string_functions() {
        assert_eq!(Builtin::Upper.call(vec![s("abc")]).unwrap(), s("ABC"));
        assert_eq!(Builtin::Trim.call(vec![s("  x ")]).unwrap(), s("x"));
        assert_eq!(
            Builtin::Replace.call(vec![s("a-b-c"), s("-"), s("+")]).unwrap(),
            s("a+b+c")
        );
        assert_eq!(
            Builtin::Contains.call(vec![s("haystack"), s("st")]).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn split_and_join() {
        let parts = Builtin::Split.call(vec![s("a,b,,c"), s(",")]).unwrap();
        assert_eq!(parts, Value::strings(["a", "b", "", "c"]));
        assert_eq!(Builtin::Join.call(vec![parts, s("|")]).unwrap(), s("a|b||c"));
        assert!(Builtin::Split.call(vec![s("a"), s("")]).is_err());
    }

    #[test]
    fn substr_bounds() {
        assert_eq!(Builtin::Substr.call(vec![s("héllo"), Value::Int(1)]).unwrap(), s("éllo"));
        assert_eq!(
            Builtin::Substr.call(vec![s("hello"), Value::Int(1), Value::Int(3)]).unwrap(),
            s("ell")
        );
        assert_eq!(Builtin::Substr.call(vec![s("abc"), Value::Int(3)]).unwrap(), s(""));
        assert!(Builtin::Substr.call(vec![s("abc"), Value::Int(4)]).is_err());
        assert!(Builtin::Substr.call(vec![s("abc"), Value::Int(1), Value::Int(5)]).is_err());
    }

    #[test]
    fn substr_huge_length_is_an_error() {
        let err = Builtin::Substr
            .call(vec![s("abc"), Value::Int(1), Value::Int(i64::MAX)])
            .unwrap_err();
        assert!(err.contains("runs past"));
        assert!(Builtin::Substr.call(vec![s("abc"), Value::Int(i64::MAX)]).is_err());
    }

    #[test]
    fn case_picks_first_match_or_default() {
        let args = |v: &str| vec![s(v), s("a"), Value::Int(1), s("b"), Value::Int(2), s("a"), Value::Int(3), Value::Int(0)];
        assert_eq!(Builtin::Case.call(args("a")).unwrap(), Value::Int(1));
        assert_eq!(Builtin::Case.call(args("b")).unwrap(), Value::Int(2));
        assert_eq!(Builtin::Case.call(args("z")).unwrap(), Value::Int(0));
    }

    #[test]
    fn case_argument_counts() {
        assert!(!Builtin::Case.accepts(3));
        assert!(Builtin::Case.accepts(4));
        assert!(!Builtin::Case.accepts(5));
        assert!(Builtin::Case.accepts(6));
        assert!(Builtin::Substr.accepts(3));
        assert!(!Builtin::Substr.accepts(4));
    }

    #[test]
    fn int_conversion() {
        assert_eq!(Builtin::Int.call(vec![s(" 42 ")]).unwrap(), Value::Int(42));
        let err = Builtin::Int.call(vec![s("4x")]).unwrap_err();
        assert!(err.contains("\"4x\""));
        assert_eq!(Builtin::Len.call(vec![s("né")]).unwrap(), Value::Int(2));
    }

    #[test]
    fn error_and_warn() {
        assert_eq!(
            Builtin::Error.call(vec![Value::Bool(true), s("bad")]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            Builtin::Error.call(vec![Value::Bool(false), s("bad row")]).unwrap_err(),
            "bad row"
        );
        assert_eq!(
            Builtin::Warn.call(vec![Value::Bool(false), s("odd row")]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn wrong_argument_type() {
        let err = Builtin::Upper.call(vec![Value::Int(3)]).unwrap_err();
        assert_eq!(err, "`upper` expects a string as argument 1, found int");
    }

    #[test]
    fn tab_helpers() {
        let cols = Builtin::SplitTab.call(vec![s("a\\tb\tc\\\\d")]).unwrap();
        assert_eq!(cols, Value::strings(["a\tb", "c\\d"]));
        assert_eq!(Builtin::JoinTab.call(vec![cols]).unwrap(), s("a\\tb\tc\\\\d"));
        assert_eq!(Builtin::EncodeTab.call(vec![s("x\ny")]).unwrap(), s("x\\ny"));
        assert_eq!(Builtin::DecodeTab.call(vec![s("x\\ny")]).unwrap(), s("x\ny"));
    }

    #[test]
    fn single_and_get_or() {
        assert_eq!(Builtin::Single.call(vec![s("x")]).unwrap(), Value::strings(["x"]));
        let list = Value::strings(["a", "b"]);
        assert_eq!(
            Builtin::GetOr.call(vec![list.clone(), Value::Int(1), s("-")]).unwrap(),
            s("b")
        );
        assert_eq!(
            Builtin::GetOr.call(vec![list.clone(), Value::Int(5), s("-")]).unwrap(),
            s("-")
        );
        assert_eq!(Builtin::GetOr.call(vec![list, Value::Int(-1), s("-")]).unwrap(), s("-"));
    }
}
