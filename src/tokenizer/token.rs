use nom::{error::VerboseError, IResult};
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

use super::{
    comment::{parse_block_comment, parse_comment, parse_line_comment},
    literal::{parse_nonwhitespace, parse_regex, parse_string, parse_word},
    symbol::{parse_close_brace, parse_directive, parse_open_brace},
    whitespace::{parse_anyspace, parse_newline, parse_whitespace},
};

pub const DEFAULT_DIRECTIVE_PREFIX: char = '@';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum TokenKind {
    Whitespace,
    Newline,
    OpenBrace,
    CloseBrace,
    String,
    Regex,
    Word,
    Text,
    Comment,
    Directive,
}

/// A lexeme together with the position of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

pub type LexResult<T> = Result<T, LexError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("missing end of {construct} at {line}:{column}")]
    Unterminated {
        construct: &'static str,
        line: usize,
        column: usize,
    },
    #[error("unexpected input {found:?} at {line}:{column}")]
    Unexpected {
        found: String,
        line: usize,
        column: usize,
    },
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            LexError::Unterminated { line, .. } | LexError::Unexpected { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            LexError::Unterminated { column, .. } | LexError::Unexpected { column, .. } => *column,
        }
    }
}

/// Stateful reader over a DSL source.
///
/// Every matcher either consumes a prefix of the remaining input and returns
/// the matching [`Token`], returns `Ok(None)` leaving the input untouched, or
/// fails with a [`LexError`] when a construct was opened but never closed.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    remaining: &'a str,
    line: usize,
    column: usize,
    directive_prefix: char,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            remaining: source,
            line: 1,   // 1-based
            column: 1, // 1-based
            directive_prefix: DEFAULT_DIRECTIVE_PREFIX,
        }
    }

    pub fn with_directive_prefix(mut self, prefix: char) -> Self {
        self.directive_prefix = prefix;
        self
    }

    pub fn remaining(&self) -> &'a str {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    pub fn whitespace(&mut self) -> LexResult<Option<Token>> {
        self.run(TokenKind::Whitespace, "whitespace", parse_whitespace)
    }

    pub fn anyspace(&mut self) -> LexResult<Option<Token>> {
        self.run(TokenKind::Whitespace, "whitespace", parse_anyspace)
    }

    pub fn newline(&mut self) -> LexResult<Option<Token>> {
        self.run(TokenKind::Newline, "newline", parse_newline)
    }

    pub fn open(&mut self) -> LexResult<Option<Token>> {
        self.run(TokenKind::OpenBrace, "brace", parse_open_brace)
    }

    pub fn close(&mut self) -> LexResult<Option<Token>> {
        self.run(TokenKind::CloseBrace, "brace", parse_close_brace)
    }

    pub fn string(&mut self) -> LexResult<Option<Token>> {
        self.run(TokenKind::String, "string", parse_string)
    }

    pub fn word(&mut self) -> LexResult<Option<Token>> {
        self.run(TokenKind::Word, "word", parse_word)
    }

    pub fn nonwhitespace(&mut self) -> LexResult<Option<Token>> {
        self.run(TokenKind::Text, "text", parse_nonwhitespace)
    }

    pub fn comment(&mut self) -> LexResult<Option<Token>> {
        self.run(TokenKind::Comment, "comment", parse_comment)
    }

    pub fn line_comment(&mut self) -> LexResult<Option<Token>> {
        self.run(TokenKind::Comment, "comment", parse_line_comment)
    }

    pub fn block_comment(&mut self) -> LexResult<Option<Token>> {
        self.run(TokenKind::Comment, "comment", parse_block_comment)
    }

    pub fn regex(&mut self) -> LexResult<Option<Token>> {
        self.run(TokenKind::Regex, "regular expression", parse_regex)
    }

    pub fn directive(&mut self) -> LexResult<Option<Token>> {
        let prefix = self.directive_prefix;
        self.run(TokenKind::Directive, "directive", |input| {
            parse_directive(prefix, input)
        })
    }

    /// Skips whitespace, newlines and comments. Returns true if anything was consumed.
    pub fn skip_trivia(&mut self) -> LexResult<bool> {
        let mut skipped = false;
        loop {
            let space = self.anyspace()?.is_some();
            let comment = self.comment()?.is_some();
            if !space && !comment {
                return Ok(skipped);
            }
            skipped = true;
        }
    }

    /// Error for input that no matcher accepts at the current position.
    pub fn unexpected(&self) -> LexError {
        LexError::Unexpected {
            found: self.remaining.chars().take(20).collect(),
            line: self.line,
            column: self.column,
        }
    }

    /// Splits the whole source into tokens, trivia included.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn tokenize(&mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while !self.is_empty() {
            let token = match self.newline()? {
                Some(token) => token,
                None => match self.whitespace()? {
                    Some(token) => token,
                    None => match self.comment()? {
                        Some(token) => token,
                        None => self.significant()?.ok_or_else(|| self.unexpected())?,
                    },
                },
            };
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn significant(&mut self) -> LexResult<Option<Token>> {
        if let Some(token) = self.regex()? {
            return Ok(Some(token));
        }
        if let Some(token) = self.string()? {
            return Ok(Some(token));
        }
        if let Some(token) = self.open()? {
            return Ok(Some(token));
        }
        if let Some(token) = self.close()? {
            return Ok(Some(token));
        }
        if let Some(token) = self.directive()? {
            return Ok(Some(token));
        }
        if let Some(token) = self.word()? {
            return Ok(Some(token));
        }
        self.nonwhitespace()
    }

    fn run<F>(
        &mut self,
        kind: TokenKind,
        construct: &'static str,
        mut parser: F,
    ) -> LexResult<Option<Token>>
    where
        F: FnMut(&'a str) -> ParserResult<'a, String>,
    {
        match parser(self.remaining) {
            Ok((rest, value)) => {
                let consumed = &self.remaining[..self.remaining.len() - rest.len()];
                if consumed.is_empty() {
                    return Ok(None);
                }
                let token = Token {
                    kind,
                    value,
                    line: self.line,
                    column: self.column,
                };
                self.update_position(consumed);
                self.remaining = rest;
                Ok(Some(token))
            }
            Err(nom::Err::Error(_)) => Ok(None),
            Err(nom::Err::Failure(_)) | Err(nom::Err::Incomplete(_)) => {
                let error = LexError::Unterminated {
                    construct,
                    line: self.line,
                    column: self.column,
                };
                tracing::error!("{}", error);
                Err(error)
            }
        }
    }

    fn update_position(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else if c != '\r' {
                self.column += 1;
            }
        }
    }
}
