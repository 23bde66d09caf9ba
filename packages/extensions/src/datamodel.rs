//! A minimal in-memory data model for the reference host.
//!
//! Expressions are literals or variable references, nothing more:
//!
//! | Expression              | Value                         |
//! |-------------------------|-------------------------------|
//! | `'text'` / `"text"`     | string                        |
//! | `null`, `true`, `false` | null / boolean                |
//! | `42`, `-1.5`            | integer / float               |
//! | `[...]`, `{...}`        | JSON array / object           |
//! | `user.name`             | variable lookup (dotted path) |

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::is_valid_location;
use crate::error::BoxError;
use crate::interpreter::DataModel;
use crate::value::Value;

/// Variables keyed by top-level name.
#[derive(Debug, Default)]
pub struct MemoryDataModel {
    variables: Mutex<BTreeMap<String, Value>>,
}

impl MemoryDataModel {
    /// Create an empty data model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
        self.variables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Value at a dotted location, `None` if any segment is missing.
    #[must_use]
    pub fn get(&self, location: &str) -> Option<Value> {
        let variables = self.lock();
        let mut segments = location.split('.');
        let mut current = variables.get(segments.next()?)?;
        for segment in segments {
            match current {
                Value::Object(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current.clone())
    }

    /// Copy of every variable.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.lock().clone()
    }
}

fn parse_literal(expression: &str) -> Option<Value> {
    let quoted = |q: char| {
        expression
            .strip_prefix(q)
            .and_then(|rest| rest.strip_suffix(q))
            .map(|inner| Value::String(inner.to_string()))
    };
    if expression.len() >= 2 {
        if let Some(value) = quoted('\'').or_else(|| quoted('"')) {
            return Some(value);
        }
    }
    match expression {
        "null" | "undefined" => return Some(Value::Null),
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {}
    }
    if let Ok(i) = expression.parse::<i64>() {
        return Some(Value::Int(i));
    }
    if expression.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        if let Ok(x) = expression.parse::<f64>() {
            return Some(Value::Float(x));
        }
    }
    if expression.starts_with(['[', '{']) {
        return serde_json::from_str(expression).ok();
    }
    None
}

impl DataModel for MemoryDataModel {
    fn evaluate_value(&self, expression: &str) -> Result<Value, BoxError> {
        let expression = expression.trim();
        if let Some(value) = parse_literal(expression) {
            return Ok(value);
        }
        if !is_valid_location(expression) {
            return Err(format!("unsupported expression: {expression}").into());
        }
        self.get(expression)
            .ok_or_else(|| format!("{expression} is not defined").into())
    }

    fn set_variable(&self, location: &str, value: Value) -> Result<(), BoxError> {
        if !is_valid_location(location) {
            return Err(format!("invalid location: {location}").into());
        }
        let mut variables = self.lock();
        let mut segments: Vec<&str> = location.split('.').collect();
        let last = segments.pop().unwrap_or(location);

        let mut map = &mut *variables;
        for segment in segments {
            let slot = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(BTreeMap::new()));
            match slot {
                Value::Object(inner) => map = inner,
                other => {
                    return Err(format!(
                        "cannot assign into {segment}: it is a {}",
                        other.type_name()
                    )
                    .into())
                }
            }
        }
        map.insert(last.to_string(), value);
        Ok(())
    }
}
