//! # Analyzer
//!
//! Turns DSL source into a [`ModelTree`](crate::ast::ModelTree).
//!
//! ```
//! use modelang::analyzer::parse;
//!
//! let tree = parse("@clean\nString name { required }").unwrap();
//! assert!(tree.rules["name"].required);
//! ```
pub mod core;
pub mod parser;

pub use core::ParseError;
pub use core::ParseResult;
pub use parser::{parse, Parser};
