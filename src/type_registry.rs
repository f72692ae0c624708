//! Built-in kinds and user-defined type templates.
//!
//! Every rule's declared type is either one of the closed set of built-in
//! [`Kind`]s or the name of a [`TypeDefinition`]. Definitions may build on each
//! other (`def Slug { type Name }`), so resolution walks the chain down to a
//! built-in kind, refusing cycles.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

use crate::ast::{Argument, Rule, TypeDefinition, ValidatorSpec, TYPE_OPERATOR};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, EnumIter, Serialize,
)]
pub enum Kind {
    Boolean,
    Number,
    String,
    Date,
    RegExp,
    Object,
    Array,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("unknown type `{0}`")]
    Unknown(String),
    #[error("type definition cycle: {0}")]
    Cycle(String),
    #[error("type definition `{0}` does not declare a base type")]
    MissingBase(String),
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeDefinition>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a definition.
    pub fn define(&mut self, def: TypeDefinition) {
        crate::ast::insert_last(&mut self.types, def.name.clone(), def);
    }

    pub fn extend(&mut self, defs: impl IntoIterator<Item = TypeDefinition>) {
        for def in defs {
            self.define(def);
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn is_known(&self, name: &str) -> bool {
        Kind::from_str(name).is_ok() || self.types.contains_key(name)
    }

    pub fn into_types(self) -> IndexMap<String, TypeDefinition> {
        self.types
    }

    /// Follows `name` through custom definitions down to a built-in kind.
    pub fn resolve_kind(&self, name: &str) -> Result<Kind, ResolveError> {
        Ok(self.chain(name)?.0)
    }

    /// Returns the kind and the definitions walked, outermost first.
    fn chain<'a>(
        &'a self,
        name: &str,
    ) -> Result<(Kind, Vec<&'a TypeDefinition>), ResolveError> {
        let mut walked: Vec<&TypeDefinition> = Vec::new();
        let mut current = name;
        loop {
            if let Ok(kind) = Kind::from_str(current) {
                return Ok((kind, walked));
            }
            let def = self
                .types
                .get(current)
                .ok_or_else(|| ResolveError::Unknown(current.to_string()))?;
            if walked.iter().any(|seen| seen.name == def.name) {
                let mut names: Vec<&str> = walked.iter().map(|d| d.name.as_str()).collect();
                names.push(&def.name);
                return Err(ResolveError::Cycle(names.join(" -> ")));
            }
            walked.push(def);
            current = def
                .base_type()
                .map(|spec| spec.argument.as_str())
                .ok_or_else(|| ResolveError::MissingBase(def.name.clone()))?;
        }
    }

    /// Extends `rule` with the template specs of its declared type.
    ///
    /// Specs are laid out innermost template first; a spec declared closer to
    /// the rule (or on the rule itself) replaces same-named specs further out.
    #[tracing::instrument(level = "debug", skip(self, rule), fields(path = %rule.path))]
    pub fn flatten(&self, mut rule: Rule) -> Result<Rule, ResolveError> {
        let (kind, walked) = self.chain(&rule.declared_type)?;
        rule.kind = Some(kind);
        if walked.is_empty() {
            return Ok(rule);
        }

        let mut specs: Vec<ValidatorSpec> = Vec::new();
        let mut type_message = None;
        for def in walked.iter().rev() {
            let layer: Vec<ValidatorSpec> = def
                .validators
                .iter()
                .filter(|spec| !spec.is(TYPE_OPERATOR))
                .cloned()
                .collect();
            specs = overlay(specs, layer);
            if let Some(message) = def.base_type().and_then(|spec| spec.message.clone()) {
                type_message = Some(message);
            }
        }
        let local = rule.explicit_specs().to_vec();
        specs = overlay(specs, local);

        let mut type_spec = rule.type_spec().cloned().unwrap_or_else(|| {
            ValidatorSpec::new(
                TYPE_OPERATOR,
                Argument::Word(rule.declared_type.clone()),
                rule.position.line,
            )
        });
        if type_spec.message.is_none() {
            type_spec.message = type_message;
        }

        rule.validators = std::iter::once(type_spec).chain(specs).collect();
        rule.refresh_flags();
        tracing::trace!(kind = %kind, specs = rule.validators.len(), "flattened custom type");
        Ok(rule)
    }
}

fn overlay(base: Vec<ValidatorSpec>, overrides: Vec<ValidatorSpec>) -> Vec<ValidatorSpec> {
    let overridden: Vec<String> = overrides.iter().map(|o| o.operator.clone()).collect();
    base.into_iter()
        .filter(|spec| !overridden.contains(&spec.operator))
        .chain(overrides)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Position;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    fn spec(op: &str, arg: &str) -> ValidatorSpec {
        ValidatorSpec::new(op, Argument::Word(arg.to_string()), 1)
    }

    fn def(name: &str, specs: Vec<ValidatorSpec>) -> TypeDefinition {
        TypeDefinition {
            name: name.to_string(),
            validators: specs,
            position: Position::default(),
        }
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.define(def(
            "Name",
            vec![spec("type", "String"), spec("gt", "2"), spec("lte", "256")],
        ));
        registry.define(def("Username", vec![spec("type", "Name"), spec("lte", "15")]));
        registry
    }

    #[test]
    fn test_all_builtin_kinds_round_trip() {
        for kind in Kind::iter() {
            assert_eq!(Kind::from_str(&kind.to_string()).unwrap(), kind);
        }
        assert!(Kind::from_str("string").is_err());
    }

    #[test]
    fn test_resolve_chain() {
        let registry = registry();
        assert_eq!(registry.resolve_kind("Number").unwrap(), Kind::Number);
        assert_eq!(registry.resolve_kind("Name").unwrap(), Kind::String);
        assert_eq!(registry.resolve_kind("Username").unwrap(), Kind::String);
        assert_eq!(
            registry.resolve_kind("Nope"),
            Err(ResolveError::Unknown("Nope".into()))
        );
    }

    #[test]
    fn test_resolve_cycle_and_missing_base() {
        let mut registry = TypeRegistry::new();
        registry.define(def("A", vec![spec("type", "B")]));
        registry.define(def("B", vec![spec("type", "A")]));
        registry.define(def("Bare", vec![spec("gt", "1")]));
        assert_eq!(
            registry.resolve_kind("A"),
            Err(ResolveError::Cycle("A -> B -> A".into()))
        );
        assert_eq!(
            registry.resolve_kind("Bare"),
            Err(ResolveError::MissingBase("Bare".into()))
        );
    }

    #[test]
    fn test_flatten_local_spec_wins() {
        let registry = registry();
        let mut rule = Rule::new("Name", "username", Position { line: 3, column: 1 });
        rule.push(spec("lte", "15"));
        rule.push(spec("required", "true"));

        let rule = registry.flatten(rule).unwrap();
        let ops: Vec<(&str, &str)> = rule
            .validators
            .iter()
            .map(|s| (s.operator.as_str(), s.argument.as_str()))
            .collect();
        assert_eq!(
            ops,
            vec![
                ("type", "Name"),
                ("gt", "2"),
                ("lte", "15"),
                ("required", "true")
            ]
        );
        assert_eq!(rule.kind, Some(Kind::String));
        assert!(rule.required);
    }

    #[test]
    fn test_flatten_nested_templates() {
        let registry = registry();
        let rule = Rule::new("Username", "login", Position::default());
        let rule = registry.flatten(rule).unwrap();
        let ops: Vec<(&str, &str)> = rule
            .explicit_specs()
            .iter()
            .map(|s| (s.operator.as_str(), s.argument.as_str()))
            .collect();
        assert_eq!(ops, vec![("gt", "2"), ("lte", "15")]);
    }

    #[test]
    fn test_template_required_is_inherited() {
        let mut registry = TypeRegistry::new();
        registry.define(def(
            "Email",
            vec![
                spec("type", "String").with_message(Some("not an email".into())),
                spec("required", "true"),
            ],
        ));
        let rule = registry
            .flatten(Rule::new("Email", "contact", Position::default()))
            .unwrap();
        assert!(rule.required);
        assert_eq!(rule.validators[0].message.as_deref(), Some("not an email"));
    }
}
