use graphdiff_common::ObjectRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualityOutcome {
    /// The type declared its own equality and it produced this answer
    Custom(bool),
    NotDefined,
}

/// Decides whether two same-type objects are equal without member comparison
pub trait EqualityPolicy {
    fn compare(&self, left: &ObjectRef, right: &ObjectRef) -> EqualityOutcome;
}

/// Uses the comparators a type declares on its descriptor, in order:
/// equatable, equals override, equality operator
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredEquality;

impl EqualityPolicy for DeclaredEquality {
    fn compare(&self, left: &ObjectRef, right: &ObjectRef) -> EqualityOutcome {
        let equality = left.descriptor().equality();
        let comparator = equality
            .equatable
            .as_ref()
            .or(equality.equals_override.as_ref())
            .or(equality.eq_operator.as_ref());

        match comparator {
            Some(eq) => EqualityOutcome::Custom((**eq)(left, right)),
            None => EqualityOutcome::NotDefined,
        }
    }
}
