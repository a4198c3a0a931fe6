use crate::text_diff::{diff_words, WordDifferences};
use chrono::{NaiveDateTime, TimeDelta};
use graphdiff_common::{ScalarKind, Value};
use std::fmt;

/// Right-minus-left change attached to a difference
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    Integer(i128),
    Float(f64),
    Duration(TimeDelta),
    Words(WordDifferences),
    /// The present side of a string compared against null
    Text(String),
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delta::Integer(v) => write!(f, "{:+}", v),
            Delta::Float(v) => write!(f, "{:+}", v),
            Delta::Duration(v) => write!(f, "{}", v),
            Delta::Words(words) => {
                let parts: Vec<String> = words
                    .additions
                    .iter()
                    .map(|w| format!("+{}", w))
                    .chain(words.deletions.iter().map(|w| format!("-{}", w)))
                    .collect();
                f.write_str(&parts.join(" "))
            }
            Delta::Text(text) => f.write_str(text),
        }
    }
}

type Resolver = fn(&Value, &Value) -> Option<Delta>;

const RESOLVERS: &[(ScalarKind, Resolver)] = &[
    (ScalarKind::I8, integer_delta),
    (ScalarKind::I16, integer_delta),
    (ScalarKind::I32, integer_delta),
    (ScalarKind::I64, integer_delta),
    (ScalarKind::I128, integer_delta),
    (ScalarKind::U8, integer_delta),
    (ScalarKind::U16, integer_delta),
    (ScalarKind::U32, integer_delta),
    (ScalarKind::U64, integer_delta),
    (ScalarKind::U128, integer_delta),
    (ScalarKind::F32, float_delta),
    (ScalarKind::F64, float_delta),
    (ScalarKind::TimeSpan, time_span_delta),
    (ScalarKind::DateTime, date_time_delta),
    (ScalarKind::String, word_delta),
    (ScalarKind::Guid, word_delta),
];

/// Kinds that carry a delta
pub fn supported_kinds() -> Vec<ScalarKind> {
    RESOLVERS.iter().map(|(kind, _)| *kind).collect()
}

/// Compute `right - left` for two scalars of `kind`. A null operand counts as
/// the kind's zero value; strings and guids produce a word diff instead.
pub fn resolve_delta(kind: ScalarKind, left: &Value, right: &Value) -> Option<Delta> {
    if left.is_null() && right.is_null() {
        return None;
    }

    // Mixed numeric kinds can only meet when different types are allowed
    if let (Some(l), Some(r)) = (left.scalar_kind(), right.scalar_kind()) {
        if l != r {
            return mixed_numeric_delta(left, right);
        }
    }

    RESOLVERS
        .iter()
        .find(|(k, _)| *k == kind)
        .and_then(|(_, resolve)| resolve(left, right))
}

fn integer_delta(left: &Value, right: &Value) -> Option<Delta> {
    let l = if left.is_null() { 0 } else { left.as_i128()? };
    let r = if right.is_null() { 0 } else { right.as_i128()? };
    r.checked_sub(l).map(Delta::Integer)
}

fn float_delta(left: &Value, right: &Value) -> Option<Delta> {
    let l = if left.is_null() { 0.0 } else { left.as_f64()? };
    let r = if right.is_null() { 0.0 } else { right.as_f64()? };
    Some(Delta::Float(r - l))
}

fn time_span_delta(left: &Value, right: &Value) -> Option<Delta> {
    let as_span = |value: &Value| match value {
        Value::Null => Some(TimeDelta::zero()),
        Value::TimeSpan(span) => Some(*span),
        _ => None,
    };
    as_span(right)?
        .checked_sub(&as_span(left)?)
        .map(Delta::Duration)
}

fn date_time_delta(left: &Value, right: &Value) -> Option<Delta> {
    let as_date = |value: &Value| match value {
        Value::Null => Some(NaiveDateTime::default()),
        Value::DateTime(date) => Some(*date),
        _ => None,
    };
    Some(Delta::Duration(
        as_date(right)?.signed_duration_since(as_date(left)?),
    ))
}

fn word_delta(left: &Value, right: &Value) -> Option<Delta> {
    let as_text = |value: &Value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Guid(g) => Some(g.to_string()),
        _ => None,
    };
    match (as_text(left), as_text(right)) {
        (Some(l), Some(r)) => Some(Delta::Words(diff_words(&l, &r, false))),
        (Some(present), None) | (None, Some(present)) => Some(Delta::Text(present)),
        (None, None) => None,
    }
}

fn mixed_numeric_delta(left: &Value, right: &Value) -> Option<Delta> {
    if let (Some(l), Some(r)) = (left.as_i128(), right.as_i128()) {
        return r.checked_sub(l).map(Delta::Integer);
    }
    let as_float = |value: &Value| value.as_f64().or_else(|| value.as_i128().map(|v| v as f64));
    Some(Delta::Float(as_float(right)? - as_float(left)?))
}
