//! # Tokenizer Component
//!
//! Lexical analysis for the model DSL. The [`Lexer`](token::Lexer) keeps the
//! unread input together with a 1-based line/column position and exposes one
//! method per primitive matcher, so the parser can ask for exactly the token it
//! expects next (a path after a type word, a message after a path, ...).
//!
//! ## Component Structure
//!
//! * [`token`]: [`Token`](token::Token), [`Lexer`](token::Lexer) and [`LexError`](token::LexError)
//! * [`whitespace`]: whitespace, any-whitespace and newline runs
//! * [`comment`]: `//` line comments and `/* */` block comments
//! * [`literal`]: quoted strings, regex literals, words, non-whitespace runs
//! * [`symbol`]: braces and directives
//!
//! ## Position Tracking
//!
//! Consuming a newline increments the line and resets the column to 1; any
//! other consumed character advances the column. Tokens report the position of
//! their first character. Unterminated strings, block comments and regex
//! literals fail with the position at which the construct was opened.
//!
//! ## Usage Example
//!
//! ```rust
//! use modelang::tokenizer::token::{Lexer, TokenKind};
//!
//! let mut lexer = Lexer::new("String name \"A name is required\"");
//! let ty = lexer.word().unwrap().unwrap();
//! lexer.whitespace().unwrap();
//! let path = lexer.word().unwrap().unwrap();
//! lexer.whitespace().unwrap();
//! let message = lexer.string().unwrap().unwrap();
//!
//! assert_eq!(ty.value, "String");
//! assert_eq!(path.value, "name");
//! assert_eq!(message.kind, TokenKind::String);
//! assert_eq!(message.column, 13);
//! ```

pub mod comment;
pub mod literal;
pub mod symbol;
pub mod token;
pub mod whitespace;

pub use token::{LexError, LexResult, Lexer, Position, Token, TokenKind};
