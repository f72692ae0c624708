//! # Compiler
//!
//! Turns DSL source into a resolved, immutable [`Model`](crate::ast::Model):
//!
//! 1. parse the source into a [`ModelTree`](crate::ast::ModelTree);
//! 2. compile every `@import` relative to the importing file's directory,
//!    through a [`SourceLoader`], refusing import cycles;
//! 3. merge imported rules and types under the local ones;
//! 4. check every spec against the operator registry and flatten custom types
//!    into the rules that use them.
//!
//! Any failure aborts the whole compilation; there is no partially usable
//! model.
//!
//! ```
//! use std::path::Path;
//! use modelang::compiler::{Compiler, MemoryLoader};
//!
//! let loader = MemoryLoader::new().with_file("/models/shared.model", "def Name { type String }");
//! let compiler = Compiler::new(Box::new(loader));
//! let model = compiler
//!     .compile("@import shared.model\nName first { required }", Path::new("/models"))
//!     .unwrap();
//! assert!(model.rule("first").unwrap().required);
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::analyzer::ParseError;
use crate::error::Location;

pub mod loader;
pub mod resolve;

pub use loader::{FsLoader, MemoryLoader, MockSourceLoader, SourceLoader};
pub use resolve::Compiler;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Unable to read the file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Unable to read the file {}: {source} at {location}", .path.display())]
    ImportFailed {
        path: PathBuf,
        source: io::Error,
        location: Location,
    },

    #[error("Import cycle {chain} at {location}")]
    ImportCycle { chain: String, location: Location },

    #[error("Imports nested deeper than {limit} levels at {location}")]
    ImportTooDeep { limit: usize, location: Location },

    #[error("{source}\nin {} imported at {location}", .path.display())]
    InImport {
        path: PathBuf,
        location: Location,
        source: Box<CompileError>,
    },

    #[error("Unknown type `{name}` at {location}")]
    UnknownType { name: String, location: Location },

    #[error("Unknown operator `{name}` at {location}")]
    UnknownOperator { name: String, location: Location },

    #[error("Invalid argument for `{operator}`: {message} at {location}")]
    InvalidArgument {
        operator: String,
        message: String,
        location: Location,
    },

    #[error("Type definition cycle {chain} at {location}")]
    TypeCycle { chain: String, location: Location },

    #[error("Type `{name}` does not declare a base type at {location}")]
    MissingBaseType { name: String, location: Location },
}

impl CompileError {
    /// Where the error was detected; for errors inside imports, the import line.
    pub fn location(&self) -> Option<&Location> {
        match self {
            CompileError::Parse(error) => Some(error.location()),
            CompileError::Read { .. } => None,
            CompileError::ImportFailed { location, .. }
            | CompileError::ImportCycle { location, .. }
            | CompileError::ImportTooDeep { location, .. }
            | CompileError::InImport { location, .. }
            | CompileError::UnknownType { location, .. }
            | CompileError::UnknownOperator { location, .. }
            | CompileError::InvalidArgument { location, .. }
            | CompileError::TypeCycle { location, .. }
            | CompileError::MissingBaseType { location, .. } => Some(location),
        }
    }

    pub fn line(&self) -> Option<usize> {
        self.location().map(|location| location.line)
    }

    /// The innermost error, following imports down.
    pub fn root_cause(&self) -> &CompileError {
        match self {
            CompileError::InImport { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
