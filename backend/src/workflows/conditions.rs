// Workflow Conditions - Evaluates rule conditions against trigger documents
//
// Evaluation never fails: a missing field, a value of the wrong shape or a
// malformed condition simply makes that condition false, so one bad rule
// cannot abort the dispatch of the others.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tally_shared::{Condition, ConditionOperator};

/// Literal accepted by date operators for the evaluator's reference instant
pub const NOW_LITERAL: &str = "now";

/// Walk a dot-separated path through nested maps.
///
/// Returns `None` when a segment is missing, a non-map container is reached
/// before the path ends, or the path has an empty segment.
pub fn resolve_field<'a>(path: &str, data: &'a Value) -> Option<&'a Value> {
    let mut current = data;
    for segment in path.split('.') {
        if segment.is_empty() {
            return None;
        }
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Decides whether trigger data satisfies a rule's conditions.
///
/// The evaluator carries the instant that `"now"` refers to so evaluation is
/// deterministic for a given document.
#[derive(Debug, Clone, Copy)]
pub struct ConditionEvaluator {
    now: DateTime<Utc>,
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

impl ConditionEvaluator {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// All conditions must hold. An empty condition list matches everything.
    pub fn matches(&self, conditions: &[Condition], data: &Value) -> bool {
        conditions.iter().all(|c| self.evaluate(c, data))
    }

    pub fn evaluate(&self, condition: &Condition, data: &Value) -> bool {
        let Some(field_value) = resolve_field(&condition.field, data) else {
            return false;
        };
        let expected = &condition.value;

        match condition.operator {
            ConditionOperator::Equals => strict_equals(field_value, expected),
            ConditionOperator::Contains => {
                coerce_string(field_value).contains(&coerce_string(expected))
            }
            ConditionOperator::GreaterThan => match (coerce_number(field_value), coerce_number(expected)) {
                (Some(v), Some(c)) => v > c,
                _ => false,
            },
            ConditionOperator::LessThan => match (coerce_number(field_value), coerce_number(expected)) {
                (Some(v), Some(c)) => v < c,
                _ => false,
            },
            ConditionOperator::In => match expected.as_array() {
                Some(list) => list.iter().any(|item| strict_equals(field_value, item)),
                None => false,
            },
            ConditionOperator::NotIn => match expected.as_array() {
                Some(list) => !list.iter().any(|item| strict_equals(field_value, item)),
                None => false,
            },
            ConditionOperator::DateBefore => {
                match (coerce_instant(field_value), self.condition_instant(expected)) {
                    (Some(v), Some(c)) => v < c,
                    _ => false,
                }
            }
            ConditionOperator::DateAfter => {
                match (coerce_instant(field_value), self.condition_instant(expected)) {
                    (Some(v), Some(c)) => v > c,
                    _ => false,
                }
            }
        }
    }

    /// A condition-side instant; only here does `"now"` mean the reference instant
    fn condition_instant(&self, value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::String(s) if s.trim().eq_ignore_ascii_case(NOW_LITERAL) => Some(self.now),
            other => coerce_instant(other),
        }
    }
}

/// RFC 3339 timestamps, `YYYY-MM-DD` dates (midnight UTC) or integer epoch
/// milliseconds.
pub fn coerce_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Type-and-value equality. Numbers compare by value regardless of their
/// integer/float representation; lists and maps compare element-wise.
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| strict_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| strict_equals(x, y)))
        }
        _ => left == right,
    }
}

pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(coerce_string)
            .collect::<Vec<_>>()
            .join(","),
        // numbers, booleans, null and maps use their compact JSON form
        other => other.to_string(),
    }
}

pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    // "inf", "NaN" and overflowing text like "1e400" are not numbers
    number.filter(|n| n.is_finite())
}
