//! # Validator Engine
//!
//! [`Engine::validate`] checks input data against a compiled model, rule by
//! rule in declaration order:
//!
//! 1. look the value up at the rule's dotted path ([`path`]);
//! 2. report a missing required value and move on to the next rule;
//! 3. skip absent optional values;
//! 4. cast the value to the rule's kind ([`cast`]), reporting a `type`
//!    violation on failure;
//! 5. run every remaining spec through its [`Operator`].
//!
//! Validation never fails. Every problem becomes a [`Violation`] in the
//! returned [`ValidationResult`].

pub mod cast;
pub mod date_math;
pub mod engine;
pub mod escape;
pub mod operators;
pub mod path;
pub mod result;

pub use date_math::{DateMathError, DateResolver, FixedClock, SystemClock};
pub use engine::Engine;
pub use escape::{Escaper, HtmlEscaper};
pub use operators::{Context, Operator, OperatorRegistry};
pub use result::{ValidationResult, Violation};
