//! The worker program and its argument list.

use std::process::{Command, Stdio};

/// A malformed worker argument string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// No program was named.
    #[error("worker program must not be empty")]
    EmptyProgram,

    /// A quote was opened and never closed.
    #[error("unterminated {quote} quote in worker arguments")]
    UnterminatedQuote {
        /// The opening quote character.
        quote: char,
    },

    /// The argument string ends in a lone backslash.
    #[error("worker arguments end with a dangling `\\`")]
    DanglingEscape,
}

/// The program every worker slot runs, with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    program: String,
    args: Vec<String>,
}

impl WorkerCommand {
    /// Creates a command with no arguments.
    pub fn new(program: impl Into<String>) -> Result<Self, CommandError> {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(CommandError::EmptyProgram);
        }
        Ok(Self {
            program,
            args: Vec::new(),
        })
    }

    /// Creates a command from a program and a single argument string.
    ///
    /// The string is split on whitespace. Single quotes take their contents
    /// literally; inside double quotes `\"` and `\\` are escapes; outside
    /// quotes a backslash escapes the next character.
    pub fn parse(program: &str, arg_string: &str) -> Result<Self, CommandError> {
        let mut command = Self::new(program)?;
        command.args = split_args(arg_string)?;
        Ok(command)
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The program path or name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Builds a process command with all three standard streams piped.
    pub(crate) fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

fn split_args(input: &str) -> Result<Vec<String>, CommandError> {
    let mut args = Vec::new();
    let mut current = String::new();
    // Distinguishes `""` (an empty argument) from no argument at all.
    let mut in_arg = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            '\'' => {
                in_arg = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(CommandError::UnterminatedQuote { quote: '\'' }),
                    }
                }
            }
            '"' => {
                in_arg = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(CommandError::UnterminatedQuote { quote: '"' }),
                        },
                        Some(c) => current.push(c),
                        None => return Err(CommandError::UnterminatedQuote { quote: '"' }),
                    }
                }
            }
            '\\' => {
                in_arg = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => return Err(CommandError::DanglingEscape),
                }
            }
            c => {
                in_arg = true;
                current.push(c);
            }
        }
    }
    if in_arg {
        args.push(current);
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(input: &str) -> Vec<String> {
        split_args(input).unwrap()
    }

    #[test]
    fn whitespace_separated() {
        assert_eq!(split("  a-z   A-Z "), ["a-z", "A-Z"]);
        assert!(split("").is_empty());
        assert!(split("   ").is_empty());
    }

    #[test]
    fn quoted_arguments() {
        assert_eq!(split(r#"-c 'echo $1; exit' "two words""#), ["-c", "echo $1; exit", "two words"]);
        assert_eq!(split(r#"a"b c"d"#), ["ab cd"]);
        assert_eq!(split(r#"'' """#), ["", ""]);
    }

    #[test]
    fn escapes() {
        assert_eq!(split(r"a\ b"), ["a b"]);
        assert_eq!(split(r#""say \"hi\" \n""#), [r#"say "hi" \n"#]);
        assert_eq!(split(r"'\t'"), [r"\t"]);
    }

    #[test]
    fn unterminated_quotes() {
        assert_eq!(split_args("'abc"), Err(CommandError::UnterminatedQuote { quote: '\'' }));
        assert_eq!(split_args("\"abc"), Err(CommandError::UnterminatedQuote { quote: '"' }));
        assert_eq!(split_args("abc\\"), Err(CommandError::DanglingEscape));
    }

    #[test]
    fn parse_builds_command() {
        let cmd = WorkerCommand::parse("tr", "a-z A-Z").unwrap();
        assert_eq!(cmd.program(), "tr");
        assert_eq!(cmd.args(), ["a-z", "A-Z"]);
        assert_eq!(WorkerCommand::new(" "), Err(CommandError::EmptyProgram));
        assert_eq!(WorkerCommand::new("cat").unwrap().arg("-u").args(), ["-u"]);
    }
}
