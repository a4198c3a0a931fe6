use crate::delta::{resolve_delta, Delta};
use graphdiff_common::{ScalarKind, TypeInfo, Value};
use std::fmt;

/// One divergence between the two compared graphs
#[derive(Debug, Clone)]
pub struct Difference {
    /// Dotted path from the root, e.g. `.Children[2].Name`
    pub path: String,
    /// Bare member name
    pub property: String,
    /// Set for collection elements only
    pub array_index: Option<usize>,
    pub property_type: TypeInfo,
    /// `None` when the left side is null or absent
    pub left_value: Option<Value>,
    /// `None` when the right side is null or absent
    pub right_value: Option<Value>,
    pub delta: Option<Delta>,
}

impl Difference {
    /// Difference of a member value; the delta is computed from both sides
    pub fn new(
        property_type: TypeInfo,
        property: impl Into<String>,
        path: impl Into<String>,
        left: Value,
        right: Value,
    ) -> Self {
        let delta = delta_for(&property_type, &left, &right);
        Self::build(property_type, property.into(), path.into(), None, left, right, delta)
    }

    /// Difference of one collection element. String elements carry no word delta.
    pub fn element(
        property_type: TypeInfo,
        property: impl Into<String>,
        path: impl Into<String>,
        index: usize,
        left: Value,
        right: Value,
    ) -> Self {
        let is_text = matches!(
            value_kind(&property_type, &left, &right),
            Some(ScalarKind::String) | Some(ScalarKind::Guid)
        );
        let delta = if is_text {
            None
        } else {
            delta_for(&property_type, &left, &right)
        };
        Self::build(
            property_type,
            property.into(),
            path.into(),
            Some(index),
            left,
            right,
            delta,
        )
    }

    /// Difference for a whole object judged unequal by its own equality
    pub fn opaque(
        property_type: TypeInfo,
        property: impl Into<String>,
        path: impl Into<String>,
        left: Value,
        right: Value,
    ) -> Self {
        Self::build(property_type, property.into(), path.into(), None, left, right, None)
    }

    fn build(
        property_type: TypeInfo,
        property: String,
        path: String,
        array_index: Option<usize>,
        left: Value,
        right: Value,
        delta: Option<Delta>,
    ) -> Self {
        let property_type = if left.is_null() || right.is_null() {
            property_type.to_nullable()
        } else {
            property_type
        };
        Self {
            path,
            property,
            array_index,
            property_type,
            left_value: (!left.is_null()).then_some(left),
            right_value: (!right.is_null()).then_some(right),
            delta,
        }
    }

    /// Present only on the right
    pub fn is_addition(&self) -> bool {
        self.left_value.is_none() && self.right_value.is_some()
    }

    /// Present only on the left
    pub fn is_removal(&self) -> bool {
        self.left_value.is_some() && self.right_value.is_none()
    }
}

fn value_kind(property_type: &TypeInfo, left: &Value, right: &Value) -> Option<ScalarKind> {
    left.scalar_kind()
        .or_else(|| right.scalar_kind())
        .or_else(|| property_type.scalar_kind())
}

fn delta_for(property_type: &TypeInfo, left: &Value, right: &Value) -> Option<Delta> {
    value_kind(property_type, left, right).and_then(|kind| resolve_delta(kind, left, right))
}

impl fmt::Display for Difference {
    /// The path; the alternate form adds the two values and the delta
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "." } else { &self.path };
        if !f.alternate() {
            return f.write_str(path);
        }

        let show = |value: &Option<Value>| match value {
            Some(v) => v.to_string(),
            None => "null".to_string(),
        };
        write!(
            f,
            "{}: {} -> {}",
            path,
            show(&self.left_value),
            show(&self.right_value)
        )?;
        if let Some(delta) = &self.delta {
            write!(f, " ({})", delta)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_side_makes_value_type_nullable() {
        let diff = Difference::new(
            TypeInfo::scalar(ScalarKind::I32),
            "Id",
            ".Id",
            Value::Null,
            Value::I32(3),
        );
        assert!(diff.property_type.is_nullable());
        assert!(diff.left_value.is_none());
        assert!(diff.is_addition());
        assert_eq!(diff.delta, Some(Delta::Integer(3)));
    }

    #[test]
    fn test_string_member_gets_word_delta() {
        let diff = Difference::new(
            TypeInfo::scalar(ScalarKind::String),
            "Name",
            ".Name",
            Value::String("little boy".to_string()),
            Value::String("little girl".to_string()),
        );
        assert!(matches!(diff.delta, Some(Delta::Words(_))));
        assert!(!diff.property_type.is_nullable());
    }

    #[test]
    fn test_string_element_has_no_delta() {
        let diff = Difference::element(
            TypeInfo::scalar(ScalarKind::String),
            "Tags",
            ".Tags[1]",
            1,
            Value::String("a".to_string()),
            Value::String("b".to_string()),
        );
        assert_eq!(diff.array_index, Some(1));
        assert!(diff.delta.is_none());

        let numeric = Difference::element(
            TypeInfo::scalar(ScalarKind::I32),
            "Values",
            ".Values[2]",
            2,
            Value::I32(5),
            Value::I32(2),
        );
        assert_eq!(numeric.delta, Some(Delta::Integer(-3)));
    }

    #[test]
    fn test_display_forms() {
        let diff = Difference::new(
            TypeInfo::scalar(ScalarKind::I32),
            "Age",
            ".Author.Age",
            Value::I32(40),
            Value::I32(41),
        );
        assert_eq!(diff.to_string(), ".Author.Age");
        assert_eq!(format!("{:#}", diff), ".Author.Age: 40 -> 41 (+1)");
    }
}
