//! # Parse Errors
//!
//! Every parse failure carries the [`Location`] it was detected at, including
//! a three-line source snippet, so callers can print the failing line with
//! its neighbours without keeping the source around.

use thiserror::Error;

use crate::error::Location;
use crate::tokenizer::LexError;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The lexer hit an unterminated string, comment or regex literal.
    #[error("{source} at {location}")]
    Lexical { source: LexError, location: Location },
    /// Well-formed tokens in a place the grammar does not allow them.
    #[error("{message} at {location}")]
    Syntax { message: String, location: Location },
}

impl ParseError {
    pub fn location(&self) -> &Location {
        match self {
            ParseError::Lexical { location, .. } | ParseError::Syntax { location, .. } => location,
        }
    }

    pub fn line(&self) -> usize {
        self.location().line
    }

    pub fn column(&self) -> usize {
        self.location().column
    }

    pub fn reason(&self) -> String {
        match self {
            ParseError::Lexical { source, .. } => source.to_string(),
            ParseError::Syntax { message, .. } => message.clone(),
        }
    }
}
