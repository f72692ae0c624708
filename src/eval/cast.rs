//! Casting raw JSON values to the primitive [`Kind`] a rule declares.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::{Map, Value};

use crate::type_registry::Kind;

/// A raw value seen through its declared kind.
#[derive(Debug, Clone)]
pub enum Typed<'a> {
    Boolean(bool),
    Number(f64),
    String(&'a str),
    Date(DateTime<Utc>),
    RegExp(Regex),
    Object(&'a Map<String, Value>),
    Array(&'a [Value]),
}

impl Typed<'_> {
    pub fn kind(&self) -> Kind {
        match self {
            Typed::Boolean(_) => Kind::Boolean,
            Typed::Number(_) => Kind::Number,
            Typed::String(_) => Kind::String,
            Typed::Date(_) => Kind::Date,
            Typed::RegExp(_) => Kind::RegExp,
            Typed::Object(_) => Kind::Object,
            Typed::Array(_) => Kind::Array,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastFailure {
    /// The value has the right shape but cannot be read as the kind.
    Invalid,
    /// The value is of another kind entirely; carries its kind name.
    Mismatch(&'static str),
}

pub fn cast(kind: Kind, raw: &Value) -> Result<Typed<'_>, CastFailure> {
    match (kind, raw) {
        (Kind::String, Value::String(s)) => Ok(Typed::String(s)),

        (Kind::Number, Value::Number(n)) => n.as_f64().map(Typed::Number).ok_or(CastFailure::Invalid),
        (Kind::Number, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(|n| Typed::Number(n as f64))
            .map_err(|_| CastFailure::Invalid),

        (Kind::Boolean, Value::String(s)) if s == "true" => Ok(Typed::Boolean(true)),
        (Kind::Boolean, Value::String(s)) if s == "false" => Ok(Typed::Boolean(false)),
        (Kind::Boolean, value) => Ok(Typed::Boolean(truthy(value))),

        (Kind::Date, Value::String(s)) => parse_date(s).map(Typed::Date).ok_or(CastFailure::Invalid),
        (Kind::Date, Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(Typed::Date)
            .ok_or(CastFailure::Invalid),

        (Kind::RegExp, Value::String(s)) => Regex::new(s)
            .map(Typed::RegExp)
            .map_err(|_| CastFailure::Invalid),

        (Kind::Object, Value::Object(map)) => Ok(Typed::Object(map)),
        (Kind::Array, Value::Array(items)) => Ok(Typed::Array(items)),

        (_, value) => Err(CastFailure::Mismatch(kind_name(value))),
    }
}

/// JavaScript-style truthiness.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Kind name of a raw JSON value as shown in mismatch messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Boolean",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

/// A value as it appears between the brackets of a violation message.
pub fn display_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`; naive forms are read as UTC.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_string_does_not_coerce() {
        assert!(matches!(cast(Kind::String, &json!("abc")), Ok(Typed::String("abc"))));
        assert_eq!(
            cast(Kind::String, &json!(5)).unwrap_err(),
            CastFailure::Mismatch("Number")
        );
    }

    #[test]
    fn test_number() {
        assert!(matches!(cast(Kind::Number, &json!(1.5)), Ok(Typed::Number(n)) if n == 1.5));
        assert!(matches!(cast(Kind::Number, &json!("42")), Ok(Typed::Number(n)) if n == 42.0));
        assert_eq!(cast(Kind::Number, &json!("abc")).unwrap_err(), CastFailure::Invalid);
        assert_eq!(
            cast(Kind::Number, &json!(true)).unwrap_err(),
            CastFailure::Mismatch("Boolean")
        );
    }

    #[test]
    fn test_boolean() {
        for (raw, expected) in [
            (json!("true"), true),
            (json!("false"), false),
            (json!(true), true),
            (json!(0), false),
            (json!("yes"), true),
            (json!(""), false),
        ] {
            assert!(
                matches!(cast(Kind::Boolean, &raw), Ok(Typed::Boolean(b)) if b == expected),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_date() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        for raw in [
            json!("2020-01-02T03:04:05Z"),
            json!("2020-01-02T05:04:05+02:00"),
            json!("2020-01-02 03:04:05"),
            json!(expected.timestamp_millis()),
        ] {
            assert!(
                matches!(cast(Kind::Date, &raw), Ok(Typed::Date(d)) if d == expected),
                "{raw}"
            );
        }
        assert!(matches!(cast(Kind::Date, &json!("2020-01-02")), Ok(Typed::Date(_))));
        assert_eq!(
            cast(Kind::Date, &json!("It's Always Sunny")).unwrap_err(),
            CastFailure::Invalid
        );
    }

    #[test]
    fn test_regexp() {
        assert!(matches!(cast(Kind::RegExp, &json!("^a+$")), Ok(Typed::RegExp(_))));
        assert_eq!(cast(Kind::RegExp, &json!("(")).unwrap_err(), CastFailure::Invalid);
    }

    #[test]
    fn test_object_and_array() {
        assert_eq!(cast(Kind::Object, &json!({})).unwrap().kind(), Kind::Object);
        assert_eq!(cast(Kind::Array, &json!([1])).unwrap().kind(), Kind::Array);
        assert_eq!(
            cast(Kind::Object, &json!([1])).unwrap_err(),
            CastFailure::Mismatch("Array")
        );
        assert_eq!(
            cast(Kind::Array, &Value::Null).unwrap_err(),
            CastFailure::Mismatch("Null")
        );
    }

    #[test]
    fn test_display_raw() {
        assert_eq!(display_raw(&json!("abc")), "abc");
        assert_eq!(display_raw(&json!(5)), "5");
        assert_eq!(display_raw(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
