//! Dotted-path access into JSON values.
//!
//! `user.address.zip` walks object keys; a numeric segment also indexes into
//! arrays (`tags.0`).

use serde_json::{Map, Value};

pub fn get<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Stores `value` at `path`, creating intermediate objects as needed.
/// Non-object values met on the way are replaced by objects.
pub fn set(data: &mut Value, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = data;
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}
