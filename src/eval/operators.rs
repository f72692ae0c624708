//! # Operators
//!
//! Every validator spec names an operator. Operators are looked up by name in
//! an [`OperatorRegistry`] owned by the engine; the compiler consults the same
//! registry to reject unknown names and malformed arguments up front.
//!
//! Custom operators implement [`Operator`] and are added with
//! [`Engine::register`](super::Engine::register).

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::ast::{Argument, Model, Rule, ValidatorSpec};
use crate::type_registry::Kind;

use super::cast::{display_raw, parse_date, Typed};
use super::date_math::{self, DateResolver};

/// Everything an operator may look at while checking one value.
pub struct Context<'a> {
    pub rule: &'a Rule,
    pub spec: &'a ValidatorSpec,
    /// The value as found in the input.
    pub raw: &'a Value,
    /// The value cast to the rule's kind; `None` when the cast failed.
    pub value: Option<&'a Typed<'a>>,
    pub model: &'a Model,
    pub dates: &'a dyn DateResolver,
}

pub trait Operator: Send + Sync {
    /// Validates the spec's argument for a rule of `kind` at compile time.
    fn check(&self, _kind: Kind, _spec: &ValidatorSpec) -> Result<(), String> {
        Ok(())
    }

    /// A regular expression the compiler should compile and cache.
    fn pattern<'s>(&self, _spec: &'s ValidatorSpec) -> Option<&'s str> {
        None
    }

    /// Tag reported on violations.
    fn tag<'s>(&self, spec: &'s ValidatorSpec) -> &'s str {
        &spec.operator
    }

    /// Whether the operator reads [`Context::value`]. Operators that only look
    /// at the raw value still run after a failed cast.
    fn needs_typed_value(&self) -> bool {
        true
    }

    /// Returns a failure message, or `None` when the value passes.
    fn evaluate(&self, ctx: &Context<'_>) -> Option<String>;
}

/// Specs that only set rule flags (`required`, `optional`, `escape`, `type`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Flag;

impl Operator for Flag {
    fn check(&self, _kind: Kind, spec: &ValidatorSpec) -> Result<(), String> {
        match spec.argument {
            Argument::Regex(_) => Err(format!(
                "`{}` takes a flag, got a regular expression",
                spec.operator
            )),
            _ => Ok(()),
        }
    }

    fn evaluate(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

/// `match /pattern/`: tests the raw value, rendered as text, against a pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct Match;

pub const MATCH_TAG: &str = "match";

impl Operator for Match {
    fn pattern<'s>(&self, spec: &'s ValidatorSpec) -> Option<&'s str> {
        Some(spec.argument.as_str())
    }

    fn tag<'s>(&self, _spec: &'s ValidatorSpec) -> &'s str {
        MATCH_TAG
    }

    fn needs_typed_value(&self) -> bool {
        false
    }

    fn evaluate(&self, ctx: &Context<'_>) -> Option<String> {
        let pattern = ctx.spec.argument.as_str();
        let haystack = display_raw(ctx.raw);
        let matched = match ctx.model.pattern(pattern) {
            Some(regex) => regex.is_match(&haystack),
            None => Regex::new(pattern)
                .map(|regex| regex.is_match(&haystack))
                .unwrap_or(false),
        };
        (!matched).then(|| format!("[{}] does not match /{}/", haystack, pattern))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Relation {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
}

impl Relation {
    pub fn phrase(self) -> &'static str {
        match self {
            Relation::Lt => "less than",
            Relation::Lte => "at most",
            Relation::Gt => "greater than",
            Relation::Gte => "at least",
            Relation::Eq => "equal to",
        }
    }

    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Relation::Lt => ordering == Ordering::Less,
            Relation::Lte => ordering != Ordering::Greater,
            Relation::Gt => ordering == Ordering::Greater,
            Relation::Gte => ordering != Ordering::Less,
            Relation::Eq => ordering == Ordering::Equal,
        }
    }
}

/// The right-hand side of a relational spec, interpreted for the rule's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Text(String),
    Boolean(bool),
    Date(DateTime<Utc>),
    /// Resolved against the engine's clock at validation time.
    DateExpression(String),
}

impl Operand {
    pub fn interpret(kind: Kind, argument: &Argument) -> Result<Operand, String> {
        let literal = match argument {
            Argument::Regex(pattern) => {
                return Err(format!("expected a literal, got /{}/", pattern));
            }
            other => other.as_str(),
        };
        let number = literal.parse::<f64>().ok().filter(|n| n.is_finite());
        match kind {
            Kind::Number | Kind::Array => number
                .map(Operand::Number)
                .ok_or_else(|| format!("expected a number, got `{}`", literal)),
            Kind::String => Ok(number
                .map(Operand::Number)
                .unwrap_or_else(|| Operand::Text(literal.to_string()))),
            Kind::Boolean => match literal {
                "true" => Ok(Operand::Boolean(true)),
                "false" => Ok(Operand::Boolean(false)),
                _ => Err(format!("expected `true` or `false`, got `{}`", literal)),
            },
            Kind::Date => {
                if date_math::is_expression(literal) {
                    Ok(Operand::DateExpression(literal.trim().to_string()))
                } else {
                    parse_date(literal).map(Operand::Date).ok_or_else(|| {
                        format!("expected a date or date expression, got `{}`", literal)
                    })
                }
            }
            Kind::Object | Kind::RegExp => Err(format!("cannot compare values of kind {}", kind)),
        }
    }
}

/// `lt`, `lte`, `gt`, `gte`, `eq`.
///
/// Numbers compare numerically and dates chronologically. Strings compare
/// their length when the argument is numeric and lexically otherwise;
/// arrays compare their length.
#[derive(Debug, Clone, Copy)]
pub struct Compare(pub Relation);

impl Compare {
    fn ordering(
        &self,
        ctx: &Context<'_>,
        value: &Typed<'_>,
        operand: &Operand,
    ) -> Result<Option<Ordering>, String> {
        let ordering = match (value, operand) {
            (Typed::Number(value), Operand::Number(expected)) => value.partial_cmp(expected),
            (Typed::String(value), Operand::Number(expected)) => {
                (value.chars().count() as f64).partial_cmp(expected)
            }
            (Typed::String(value), Operand::Text(expected)) => Some((*value).cmp(expected.as_str())),
            (Typed::Array(items), Operand::Number(expected)) => {
                (items.len() as f64).partial_cmp(expected)
            }
            (Typed::Boolean(value), Operand::Boolean(expected)) => Some(value.cmp(expected)),
            (Typed::Date(value), Operand::Date(expected)) => Some(value.cmp(expected)),
            (Typed::Date(value), Operand::DateExpression(expression)) => {
                let expected = ctx
                    .dates
                    .resolve(expression)
                    .map_err(|error| error.to_string())?;
                Some(value.cmp(&expected))
            }
            (value, operand) => {
                tracing::warn!(
                    kind = %value.kind(),
                    ?operand,
                    path = %ctx.rule.path,
                    "operand does not fit value"
                );
                None
            }
        };
        Ok(ordering)
    }
}

impl Operator for Compare {
    fn check(&self, kind: Kind, spec: &ValidatorSpec) -> Result<(), String> {
        Operand::interpret(kind, &spec.argument).map(|_| ())
    }

    fn evaluate(&self, ctx: &Context<'_>) -> Option<String> {
        let failure = || {
            format!(
                "{} must be {} {}",
                ctx.rule.path,
                self.0.phrase(),
                ctx.spec.argument.as_str()
            )
        };
        let value = ctx.value?;
        let operand = match Operand::interpret(value.kind(), &ctx.spec.argument) {
            Ok(operand) => operand,
            Err(reason) => return Some(reason),
        };
        match self.ordering(ctx, value, &operand) {
            Ok(Some(ordering)) => (!self.0.holds(ordering)).then(failure),
            Ok(None) => None,
            Err(reason) => Some(reason),
        }
    }
}

/// Operators by name.
#[derive(Clone)]
pub struct OperatorRegistry {
    operators: HashMap<String, Arc<dyn Operator>>,
}

impl OperatorRegistry {
    pub fn empty() -> Self {
        Self {
            operators: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for name in ["type", "required", "require", "optional", "escape"] {
            registry.register(name, Arc::new(Flag));
        }
        for name in ["match", "regexp", "regex"] {
            registry.register(name, Arc::new(Match));
        }
        for relation in Relation::iter() {
            registry.register(relation.as_ref(), Arc::new(Compare(relation)));
        }
        registry.register("equal", Arc::new(Compare(Relation::Eq)));
        registry
    }

    /// Adds `operator` under `name`, replacing any operator already registered there.
    pub fn register(&mut self, name: impl Into<String>, operator: Arc<dyn Operator>) {
        self.operators.insert(name.into(), operator);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Operator>> {
        self.operators.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("operators", &self.names())
            .finish()
    }
}
