use std::sync::Arc;

use serde_json::{Map, Value};

use crate::ast::{Model, Rule, ESCAPE_DIRECTIVE, REQUIRED_OPERATORS, TYPE_OPERATOR};
use crate::compiler::{Compiler, SourceLoader};
use crate::config::EngineConfig;
use crate::type_registry::Kind;

use super::cast::{cast, display_raw, kind_name, CastFailure};
use super::date_math::{DateResolver, SystemClock};
use super::escape::{Escaper, HtmlEscaper};
use super::operators::{Context, Operator, OperatorRegistry};
use super::path;
use super::result::{ValidationResult, Violation};

pub const REQUIRED_TAG: &str = "required";

/// Validates data against compiled [`Model`]s.
///
/// An engine owns the operator registry and the date and escaping
/// collaborators. It holds no per-call state, so one engine can validate any
/// number of models concurrently.
pub struct Engine {
    operators: OperatorRegistry,
    dates: Arc<dyn DateResolver>,
    escaper: Arc<dyn Escaper>,
    config: EngineConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            operators: OperatorRegistry::with_builtins(),
            dates: Arc::new(SystemClock),
            escaper: Arc::new(HtmlEscaper),
            config,
        }
    }

    pub fn with_date_resolver(mut self, dates: Arc<dyn DateResolver>) -> Self {
        self.dates = dates;
        self
    }

    pub fn with_escaper(mut self, escaper: Arc<dyn Escaper>) -> Self {
        self.escaper = escaper;
        self
    }

    /// Adds a named operator. Models must be compiled with [`Engine::compiler`]
    /// (or a compiler given [`Engine::operators`]) to accept the new name.
    pub fn register(&mut self, name: impl Into<String>, operator: Arc<dyn Operator>) -> &mut Self {
        self.operators.register(name, operator);
        self
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A compiler that knows every operator registered on this engine.
    pub fn compiler(&self, loader: Box<dyn SourceLoader>) -> Compiler {
        Compiler::new(loader).with_operators(self.operators.clone())
    }

    /// Checks `data` against every rule of `model`, in declaration order.
    ///
    /// Never fails: problems with the data are reported as violations. When
    /// the model carries `@clean`, the returned data holds only modeled paths.
    #[tracing::instrument(level = "debug", skip_all, fields(rules = model.len()))]
    pub fn validate(&self, data: &Value, model: &Model) -> ValidationResult {
        if !data.is_object() {
            let mut result = ValidationResult::new(data.clone());
            result.push(
                "",
                Violation::new(
                    TYPE_OPERATOR,
                    format!("Expected {}, got {}", Kind::Object, kind_name(data)),
                ),
            );
            return result;
        }

        let clean = model.is_clean();
        let escape_all = self.config.escape_all || model.escapes_all();
        let mut result = ValidationResult::new(if clean {
            Value::Object(Map::new())
        } else {
            data.clone()
        });

        for rule in model.rules.values() {
            let raw = path::get(data, &rule.path);
            self.check_rule(rule, raw, model, &mut result);

            if let (true, Some(raw)) = (clean, raw) {
                let value = match raw {
                    Value::String(s)
                        if rule.kind == Some(Kind::String)
                            && (escape_all || rule.flag(ESCAPE_DIRECTIVE)) =>
                    {
                        Value::String(self.escaper.escape(s))
                    }
                    other => other.clone(),
                };
                path::set(&mut result.data, &rule.path, value);
            }
        }

        tracing::debug!(violations = result.count, clean, "validated");
        result
    }

    fn check_rule(&self, rule: &Rule, raw: Option<&Value>, model: &Model, result: &mut ValidationResult) {
        let missing = match raw {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        if missing && rule.required {
            let spec_message = rule
                .validators
                .iter()
                .find(|spec| {
                    REQUIRED_OPERATORS.contains(&spec.operator.as_str()) && spec.argument.is_truthy()
                })
                .and_then(|spec| spec.message.as_deref());
            let message = choose(spec_message, rule, || self.config.required_message.clone());
            result.push(&rule.path, Violation::new(REQUIRED_TAG, message));
            return;
        }

        let raw = match raw {
            None | Some(Value::Null) => return,
            Some(raw) => raw,
        };
        let Some(kind) = rule.kind else {
            tracing::warn!(path = %rule.path, ty = %rule.declared_type, "rule without resolved kind skipped");
            return;
        };

        // A failed cast still lets raw-value operators such as `match` run.
        let value = match cast(kind, raw) {
            Ok(value) => Some(value),
            Err(failure) => {
                let spec_message = rule.type_spec().and_then(|spec| spec.message.as_deref());
                let message = choose(spec_message, rule, || match failure {
                    CastFailure::Invalid => format!("[{}] is an invalid {}", display_raw(raw), kind),
                    CastFailure::Mismatch(actual) => format!("Expected {}, got {}", kind, actual),
                });
                result.push(&rule.path, Violation::new(TYPE_OPERATOR, message));
                None
            }
        };

        for spec in rule.explicit_specs() {
            let Some(operator) = self.operators.get(&spec.operator) else {
                tracing::warn!(operator = %spec.operator, path = %rule.path, "unknown operator skipped");
                continue;
            };
            if value.is_none() && operator.needs_typed_value() {
                continue;
            }
            let ctx = Context {
                rule,
                spec,
                raw,
                value: value.as_ref(),
                model,
                dates: self.dates.as_ref(),
            };
            if let Some(template) = operator.evaluate(&ctx) {
                tracing::trace!(path = %rule.path, operator = %spec.operator, "violation");
                let message = choose(spec.message.as_deref(), rule, || template);
                result.push(&rule.path, Violation::new(operator.tag(spec), message));
            }
        }
    }
}

/// Spec message, then the rule's default message, then the template.
fn choose(spec_message: Option<&str>, rule: &Rule, template: impl FnOnce() -> String) -> String {
    spec_message
        .or(rule.message.as_deref())
        .map(str::to_string)
        .unwrap_or_else(template)
}
