use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// One failed check on one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub operator: String,
    pub message: String,
}

impl Violation {
    pub fn new(operator: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            message: message.into(),
        }
    }
}

/// Outcome of one validation: the (possibly cleaned) data and every violation
/// keyed by rule path, in rule declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub data: Value,
    pub violations: IndexMap<String, Vec<Violation>>,
    pub count: usize,
}

impl ValidationResult {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            violations: IndexMap::new(),
            count: 0,
        }
    }

    pub fn push(&mut self, path: &str, violation: Violation) {
        self.violations
            .entry(path.to_string())
            .or_default()
            .push(violation);
        self.count += 1;
    }

    pub fn is_valid(&self) -> bool {
        self.count == 0
    }

    pub fn violations_at(&self, path: &str) -> &[Violation] {
        self.violations.get(path).map(Vec::as_slice).unwrap_or_default()
    }

    /// Operator tags reported at `path`.
    pub fn operators_at(&self, path: &str) -> Vec<&str> {
        self.violations_at(path)
            .iter()
            .map(|violation| violation.operator.as_str())
            .collect()
    }
}
