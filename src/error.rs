use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::analyzer::ParseError;
use crate::compiler::CompileError;
use crate::config::ConfigError;
use crate::tokenizer::LexError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}

/// Three lines of source around a failing line, rendered with a numbered
/// gutter and the failing line marked:
///
/// ```text
///   1 │ String name {
/// ✕ 2 │   lte
///   3 │ }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceSnippet {
    line: usize,
    before: Option<String>,
    at: String,
    after: Option<String>,
}

impl SourceSnippet {
    /// `line` is 1-based; lines outside the source render empty.
    pub fn new(source: &str, line: usize) -> Self {
        let lines: Vec<&str> = source.lines().collect();
        let get = |no: usize| -> Option<String> {
            no.checked_sub(1)
                .and_then(|idx| lines.get(idx))
                .map(|l| l.to_string())
        };
        Self {
            line,
            before: line.checked_sub(1).filter(|no| *no > 0).and_then(get),
            at: get(line).unwrap_or_default(),
            after: get(line + 1),
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

impl std::fmt::Display for SourceSnippet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = (self.line + 1).to_string().len();
        if let Some(before) = &self.before {
            writeln!(f, "  {:>width$} │ {}", self.line - 1, before)?;
        }
        write!(f, "✕ {:>width$} │ {}", self.line, self.at)?;
        if let Some(after) = &self.after {
            write!(f, "\n  {:>width$} │ {}", self.line + 1, after)?;
        }
        Ok(())
    }
}

/// Where in which source an error was found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub file: Option<PathBuf>,
    pub line: usize,
    pub column: usize,
    pub snippet: SourceSnippet,
}

impl Location {
    pub fn new(source: &str, line: usize, column: usize) -> Self {
        Self {
            file: None,
            line,
            column,
            snippet: SourceSnippet::new(source, line),
        }
    }

    pub fn in_file(mut self, file: Option<&Path>) -> Self {
        self.file = file.map(Path::to_path_buf);
        self
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file.display(), self.line, self.column)?,
            None => write!(f, "line #{}, column {}", self.line, self.column)?,
        }
        write!(f, "\n{}", self.snippet)
    }
}
