//! # modelang: declarative validation models
//!
//! modelang is a small DSL for describing the shape of form and API payloads,
//! together with a compiler and a validation engine.
//!
//! ```text
//! @clean
//! @import ./shared/types.model
//!
//! def Username {
//!   type String
//!   gte 3
//!   lte 15 "Usernames are at most 15 characters"
//! }
//!
//! Username user.name { required }
//! Date user.born "Invalid date of birth" { lte now }
//! String bio { escape }
//! ```
//!
//! ## Processing Pipeline
//!
//! ```text
//! Source → Tokenizer → Parser → Compiler (imports, merge, types) → Model → Engine(Model, data) → ValidationResult
//! ```
//!
//! - [`tokenizer`]: primitive matchers over the source, tracking line and column
//! - [`analyzer`]: builds a [`ModelTree`](ast::ModelTree) from one source
//! - [`compiler`]: resolves imports through a [`SourceLoader`](compiler::SourceLoader),
//!   merges trees and flattens custom types ([`type_registry`])
//! - [`eval`]: the [`Engine`](eval::Engine) validating data against a [`Model`](ast::Model)
//!
//! Compilation errors abort with a line, a column and a source snippet.
//! Validation never fails; it reports [`Violation`](eval::Violation)s.
//!
//! ## Quick Start
//!
//! ```
//! use serde_json::json;
//!
//! let model = modelang::compile(r#"
//!     String name { required }
//!     Number age { gte 18 "Adults only" }
//! "#).unwrap();
//!
//! let result = modelang::validate(&json!({ "age": 12 }), &model);
//! assert_eq!(result.count, 2);
//! assert_eq!(result.violations["age"][0].message, "Adults only");
//! ```
//!
//! The free functions use a shared default [`Engine`](eval::Engine) and a
//! filesystem-backed [`Compiler`](compiler::Compiler). Build your own to change
//! configuration, register operators or load sources from elsewhere.

use std::path::Path;

use lazy_static::lazy_static;
use serde_json::Value;

pub mod analyzer;
pub mod ast;
pub mod compiler;
pub mod config;
pub mod error;
pub mod eval;
pub mod tokenizer;
pub mod type_registry;

// Re-exports
pub use ast::{Model, Rule, ValidatorSpec};
pub use compiler::Compiler;
pub use error::*;
pub use eval::{Engine, ValidationResult, Violation};

lazy_static! {
    static ref DEFAULT_ENGINE: Engine = Engine::default();
    static ref DEFAULT_COMPILER: Compiler = Compiler::default();
}

/// Compiles `source` with the default compiler; imports resolve against the
/// current directory.
pub fn compile(source: &str) -> Result<Model> {
    Ok(DEFAULT_COMPILER.compile(source, Path::new("."))?)
}

/// Compiles the model file at `path` with the default compiler.
pub fn compile_file(path: impl AsRef<Path>) -> Result<Model> {
    Ok(DEFAULT_COMPILER.compile_file(path.as_ref())?)
}

/// Validates `data` with the default engine.
pub fn validate(data: &Value, model: &Model) -> ValidationResult {
    DEFAULT_ENGINE.validate(data, model)
}
