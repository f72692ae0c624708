//! # Model Tree
//!
//! Data structures produced by the parser ([`ModelTree`]) and by the compiler
//! ([`Model`]). Rules are keyed by their dotted path and kept in declaration
//! order; a later declaration at the same path replaces the earlier one.

use std::collections::HashMap;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::eval::path;
use crate::tokenizer::Position;
use crate::type_registry::Kind;

pub const TYPE_OPERATOR: &str = "type";
pub const REQUIRED_OPERATORS: [&str; 2] = ["required", "require"];
pub const OPTIONAL_OPERATOR: &str = "optional";
pub const IMPORT_DIRECTIVE: &str = "import";
pub const CLEAN_DIRECTIVE: &str = "clean";
pub const ESCAPE_DIRECTIVE: &str = "escape";

/// The single literal argument of a validator spec.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Argument {
    Word(String),
    String(String),
    Regex(String),
}

impl Argument {
    pub fn as_str(&self) -> &str {
        match self {
            Argument::Word(s) | Argument::String(s) | Argument::Regex(s) => s,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Argument::Regex(_) => true,
            Argument::Word(s) | Argument::String(s) => {
                !matches!(s.as_str(), "" | "false" | "0" | "no" | "off")
            }
        }
    }
}

impl std::fmt::Display for Argument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Argument::Word(s) => write!(f, "{}", s),
            Argument::String(s) => write!(f, "\"{}\"", s),
            Argument::Regex(s) => write!(f, "/{}/", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatorSpec {
    pub operator: String,
    pub argument: Argument,
    pub message: Option<String>,
    pub line: usize,
}

impl ValidatorSpec {
    pub fn new(operator: impl Into<String>, argument: Argument, line: usize) -> Self {
        Self {
            operator: operator.into(),
            argument,
            message: None,
            line,
        }
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    pub fn is(&self, operator: &str) -> bool {
        self.operator == operator
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub path: String,
    pub declared_type: String,
    /// Primitive kind backing `declared_type`; `None` until a custom type has been resolved.
    pub kind: Option<Kind>,
    pub message: Option<String>,
    pub required: bool,
    pub validators: Vec<ValidatorSpec>,
    #[serde(skip)]
    pub position: Position,
}

impl Rule {
    /// A rule carrying only its implicit `type` spec.
    pub fn new(declared_type: &str, path: &str, position: Position) -> Self {
        Self {
            path: path.to_string(),
            declared_type: declared_type.to_string(),
            kind: declared_type.parse().ok(),
            message: None,
            required: false,
            validators: vec![ValidatorSpec::new(
                TYPE_OPERATOR,
                Argument::Word(declared_type.to_string()),
                position.line,
            )],
            position,
        }
    }

    pub fn type_spec(&self) -> Option<&ValidatorSpec> {
        self.validators.first().filter(|spec| spec.is(TYPE_OPERATOR))
    }

    /// Specs written in the source, i.e. everything but the implicit `type` spec.
    pub fn explicit_specs(&self) -> &[ValidatorSpec] {
        match self.type_spec() {
            Some(_) => &self.validators[1..],
            None => &self.validators,
        }
    }

    /// True when a spec named `operator` with a truthy argument is present.
    pub fn flag(&self, operator: &str) -> bool {
        self.validators
            .iter()
            .any(|spec| spec.is(operator) && spec.argument.is_truthy())
    }

    pub fn push(&mut self, spec: ValidatorSpec) {
        if spec.is(TYPE_OPERATOR) && !self.validators.is_empty() {
            self.declared_type = spec.argument.as_str().to_string();
            self.kind = self.declared_type.parse().ok();
            self.validators[0] = spec;
        } else {
            self.validators.push(spec);
        }
        self.refresh_flags();
    }

    /// Recomputes `required` from the `required`/`require`/`optional` specs.
    pub fn refresh_flags(&mut self) {
        let required = REQUIRED_OPERATORS.iter().any(|op| self.flag(op));
        self.required = required && !self.flag(OPTIONAL_OPERATOR);
    }
}

/// `def Name { ... }`: a reusable bundle of validator specs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDefinition {
    pub name: String,
    pub validators: Vec<ValidatorSpec>,
    #[serde(skip)]
    pub position: Position,
}

impl TypeDefinition {
    pub fn new(name: &str, position: Position) -> Self {
        Self {
            name: name.to_string(),
            validators: Vec::new(),
            position,
        }
    }

    pub fn base_type(&self) -> Option<&ValidatorSpec> {
        self.validators.iter().find(|spec| spec.is(TYPE_OPERATOR))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Directive {
    pub name: String,
    pub value: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Import {
    pub path: String,
    pub line: usize,
}

/// Parser output for a single source, before imports and custom types are resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelTree {
    pub directives: Vec<Directive>,
    pub imports: Vec<Import>,
    pub rules: IndexMap<String, Rule>,
    pub types: IndexMap<String, TypeDefinition>,
}

impl ModelTree {
    /// Inserts `rule`, dropping any earlier rule at the same path.
    pub fn insert_rule(&mut self, rule: Rule) {
        insert_last(&mut self.rules, rule.path.clone(), rule);
    }

    pub fn insert_type(&mut self, def: TypeDefinition) {
        insert_last(&mut self.types, def.name.clone(), def);
    }
}

pub(crate) fn insert_last<V>(map: &mut IndexMap<String, V>, key: String, value: V) {
    map.shift_remove(&key);
    map.insert(key, value);
}

/// A compiled model: directives, flattened rules and type templates.
///
/// Immutable once built; validation only reads it, so a `Model` can be shared
/// between threads and reused for any number of validations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Model {
    pub directives: Vec<Directive>,
    pub rules: IndexMap<String, Rule>,
    pub types: IndexMap<String, TypeDefinition>,
    #[serde(skip)]
    pub(crate) patterns: HashMap<String, Regex>,
}

impl Model {
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().rev().find(|d| d.name == name)
    }

    pub fn has_directive(&self, name: &str) -> bool {
        self.directive(name).is_some()
    }

    pub fn is_clean(&self) -> bool {
        self.has_directive(CLEAN_DIRECTIVE)
    }

    pub fn escapes_all(&self) -> bool {
        self.has_directive(ESCAPE_DIRECTIVE)
    }

    pub fn rule(&self, path: &str) -> Option<&Rule> {
        self.rules.get(path)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn pattern(&self, source: &str) -> Option<&Regex> {
        self.patterns.get(source)
    }

    /// Combines two models; `other` is the later source.
    ///
    /// Directives are replaced wholesale, rules and types merge key by key
    /// with `other` winning on collisions.
    pub fn merge(mut self, other: Model) -> Model {
        self.directives = other.directives;
        for (path, rule) in other.rules {
            insert_last(&mut self.rules, path, rule);
        }
        for (name, def) in other.types {
            insert_last(&mut self.types, name, def);
        }
        self.patterns.extend(other.patterns);
        self
    }

    /// An object holding a default value at every modeled path:
    /// `false` for Boolean, `0` for Number, `""` for String and `null` otherwise.
    pub fn skeleton(&self) -> Value {
        let mut data = Value::Object(Default::default());
        for rule in self.rules.values() {
            let value = match rule.kind {
                Some(Kind::Boolean) => Value::Bool(false),
                Some(Kind::Number) => Value::from(0),
                Some(Kind::String) => Value::String(String::new()),
                _ => Value::Null,
            };
            path::set(&mut data, &rule.path, value);
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rule(ty: &str, path: &str) -> Rule {
        Rule::new(ty, path, Position { line: 1, column: 1 })
    }

    #[test]
    fn test_rule_has_implicit_type_spec() {
        let r = rule("Boolean", "x");
        assert_eq!(r.kind, Some(Kind::Boolean));
        assert_eq!(r.validators.len(), 1);
        assert_eq!(r.validators[0].operator, "type");
        assert_eq!(r.validators[0].argument, Argument::Word("Boolean".into()));
        assert!(r.explicit_specs().is_empty());
        assert!(!r.required);
    }

    #[test]
    fn test_custom_type_has_no_kind_yet() {
        assert_eq!(rule("Password", "pwd").kind, None);
    }

    #[test]
    fn test_required_and_optional_flags() {
        let mut r = rule("String", "x");
        r.push(ValidatorSpec::new("require", Argument::Word("true".into()), 2));
        assert!(r.required);
        r.push(ValidatorSpec::new("optional", Argument::Word("true".into()), 3));
        assert!(!r.required);

        let mut r = rule("String", "y");
        r.push(ValidatorSpec::new("required", Argument::Word("false".into()), 2));
        assert!(!r.required);
    }

    #[test]
    fn test_explicit_type_spec_replaces_implicit() {
        let mut r = rule("Number", "n");
        r.push(
            ValidatorSpec::new("type", Argument::Word("String".into()), 2)
                .with_message(Some("text please".into())),
        );
        assert_eq!(r.validators.len(), 1);
        assert_eq!(r.declared_type, "String");
        assert_eq!(r.kind, Some(Kind::String));
        assert_eq!(r.validators[0].message.as_deref(), Some("text please"));
    }

    #[test]
    fn test_tree_redeclaration_keeps_last() {
        let mut tree = ModelTree::default();
        tree.insert_rule(rule("String", "a"));
        tree.insert_rule(rule("String", "b"));
        tree.insert_rule(rule("Number", "a"));
        let keys: Vec<_> = tree.rules.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(tree.rules["a"].declared_type, "Number");
    }

    #[test]
    fn test_merge_directives_last_wins() {
        let first = Model {
            directives: vec![Directive {
                name: "clean".into(),
                value: None,
                line: 1,
            }],
            rules: [("a".to_string(), rule("String", "a"))].into_iter().collect(),
            ..Default::default()
        };
        let second = Model {
            rules: [("b".to_string(), rule("Number", "b"))].into_iter().collect(),
            ..Default::default()
        };
        let merged = first.merge(second);
        assert!(!merged.is_clean());
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_skeleton() {
        let mut model = Model::default();
        for (ty, path) in [
            ("Boolean", "x"),
            ("String", "str"),
            ("Number", "quxx.bazz"),
            ("Date", "created"),
        ] {
            model.rules.insert(path.to_string(), rule(ty, path));
        }
        assert_eq!(
            model.skeleton(),
            json!({ "x": false, "str": "", "quxx": { "bazz": 0 }, "created": null })
        );
    }
}
