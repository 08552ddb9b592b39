//! Assembly of the final program text from user-supplied parts.
//!
//! The assembled layout is fixed:
//!
//! ```text
//! use core;                  <- one line per imported library, sorted
//! use text;
//! query(lines, args) {       <- entry scaffolding
//! ...user body lines...
//! }
//! ```
//!
//! The number of lines before the user body is the *preamble length*; the
//! diagnostic remapper uses it to translate compiler positions back into the
//! user's buffer.

use std::collections::BTreeSet;
use std::path::Path;

/// Libraries imported by every program.
pub const DEFAULT_IMPORTS: [&str; 2] = ["core", "text"];

/// Name of the entry point wrapped around the user body.
pub const ENTRY_NAME: &str = "query";

/// Incrementally collects imports and body lines, in command-line order.
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    imports: BTreeSet<String>,
    body: Vec<String>,
}

impl ProgramBuilder {
    /// Creates a builder with the default imports and an empty body.
    pub fn new() -> Self {
        Self {
            imports: DEFAULT_IMPORTS.iter().map(|s| s.to_string()).collect(),
            body: Vec::new(),
        }
    }

    /// Adds a library import. Duplicates are ignored.
    pub fn import(&mut self, library: &str) -> &mut Self {
        self.imports.insert(library.to_string());
        self
    }

    /// Appends text to the body; multi-line text becomes several body lines.
    pub fn push_text(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            self.body.push(String::new());
        } else {
            self.body.extend(text.lines().map(str::to_string));
        }
        self
    }

    /// Appends the contents of a file to the body.
    pub fn push_file(&mut self, path: &Path) -> std::io::Result<&mut Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.push_text(&content))
    }

    /// Returns `true` if no body text has been added.
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(|l| l.trim().is_empty())
    }

    /// Assembles the final program text.
    pub fn build(&self) -> ProgramText {
        let imports: Vec<String> = self.imports.iter().cloned().collect();
        let mut text = String::new();
        for lib in &imports {
            text.push_str("use ");
            text.push_str(lib);
            text.push_str(";\n");
        }
        text.push_str(ENTRY_NAME);
        text.push_str("(lines, args) {\n");
        for line in &self.body {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str("}\n");

        ProgramText {
            preamble_lines: imports.len() + 1,
            text,
            imports,
            body: self.body.clone(),
        }
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully assembled program buffer. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramText {
    text: String,
    imports: Vec<String>,
    body: Vec<String>,
    preamble_lines: usize,
}

impl ProgramText {
    /// Returns the assembled source text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the assembled source bytes (the fingerprint input).
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Returns the sorted, deduplicated library imports.
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// Returns the user-visible body lines.
    pub fn body(&self) -> &[String] {
        &self.body
    }

    /// Returns the number of injected lines preceding the user body.
    pub fn preamble_lines(&self) -> usize {
        self.preamble_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let mut b = ProgramBuilder::new();
        b.push_text("from l in lines").push_text("select l");
        let p = b.build();
        assert_eq!(
            p.as_str(),
            "use core;\nuse text;\nquery(lines, args) {\nfrom l in lines\nselect l\n}\n"
        );
        assert_eq!(p.preamble_lines(), 3);
        assert_eq!(p.body().len(), 2);
    }

    #[test]
    fn imports_sorted_and_deduplicated() {
        let mut b = ProgramBuilder::new();
        b.import("tsv").import("core").push_text("select 1");
        let p = b.build();
        assert_eq!(p.imports(), ["core", "text", "tsv"]);
        assert_eq!(p.preamble_lines(), 4);
        assert!(p.as_str().starts_with("use core;\nuse text;\nuse tsv;\n"));
    }

    #[test]
    fn body_line_position_matches_preamble() {
        let mut b = ProgramBuilder::new();
        b.push_text("first").push_text("second");
        let p = b.build();
        let lines: Vec<&str> = p.as_str().lines().collect();
        assert_eq!(lines[p.preamble_lines()], "first");
        assert_eq!(lines[p.preamble_lines() + 1], "second");
    }

    #[test]
    fn multi_line_text_splits() {
        let mut b = ProgramBuilder::new();
        b.push_text("a\nb\r\nc");
        assert_eq!(b.build().body(), ["a", "b", "c"]);
    }

    #[test]
    fn push_file_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.sq");
        std::fs::write(&path, "where len(l) > 0\n").unwrap();

        let mut b = ProgramBuilder::new();
        b.push_text("from l in lines");
        b.push_file(&path).unwrap();
        b.push_text("select l");
        assert_eq!(b.build().body(), ["from l in lines", "where len(l) > 0", "select l"]);
    }

    #[test]
    fn push_missing_file_errors() {
        let mut b = ProgramBuilder::new();
        assert!(b.push_file(Path::new("/nonexistent/part.sq")).is_err());
    }

    #[test]
    fn empty_builder() {
        let mut b = ProgramBuilder::new();
        assert!(b.is_empty());
        b.push_text("  ");
        assert!(b.is_empty());
        b.push_text("select 1");
        assert!(!b.is_empty());
    }
}
