use graphdiff_common::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct TrackedElement<'v> {
    pub index: usize,
    pub value: &'v Value,
    pub matches: usize,
}

/// Pairs up elements of two collections compared without regard to order.
/// Entries are keyed by their original index so leftovers come out in index order.
#[derive(Debug, Default)]
pub struct MatchTracker<'v> {
    left: BTreeMap<usize, TrackedElement<'v>>,
    right: BTreeMap<usize, TrackedElement<'v>>,
}

impl<'v> MatchTracker<'v> {
    pub fn new() -> Self {
        Self {
            left: BTreeMap::new(),
            right: BTreeMap::new(),
        }
    }

    pub fn add_left(&mut self, index: usize, value: &'v Value) {
        Self::add(&mut self.left, index, value);
    }

    pub fn add_right(&mut self, index: usize, value: &'v Value) {
        Self::add(&mut self.right, index, value);
    }

    fn add(side: &mut BTreeMap<usize, TrackedElement<'v>>, index: usize, value: &'v Value) {
        side.entry(index).or_insert(TrackedElement {
            index,
            value,
            matches: 0,
        });
    }

    /// Record that left element `left` and right element `right` are equal
    pub fn record_match(&mut self, left: usize, right: usize) {
        if let Some(element) = self.left.get_mut(&left) {
            element.matches += 1;
        }
        if let Some(element) = self.right.get_mut(&right) {
            element.matches += 1;
        }
    }

    pub fn is_right_matched(&self, index: usize) -> bool {
        self.right
            .get(&index)
            .map_or(false, |element| element.matches > 0)
    }

    /// Right elements still available for matching, in index order
    pub fn right_candidates(&self) -> impl Iterator<Item = &TrackedElement<'v>> {
        self.right.values().filter(|element| element.matches == 0)
    }

    pub fn left_unmatched(&self) -> impl Iterator<Item = &TrackedElement<'v>> {
        self.left.values().filter(|element| element.matches == 0)
    }

    pub fn right_unmatched(&self) -> impl Iterator<Item = &TrackedElement<'v>> {
        self.right_candidates()
    }
}

/// Stable bucket key for scalar values: blake3 over a kind tag and the
/// canonical text of the value. Equal scalars always share a bucket.
pub fn structural_hash(value: &Value) -> Option<blake3::Hash> {
    let kind = match value.scalar_kind() {
        Some(kind) => kind.type_name(),
        None if value.is_null() => "null",
        None => return None,
    };

    let text = match value {
        // -0.0 == 0.0, so both must land in one bucket
        Value::F32(v) if *v == 0.0 => "0".to_string(),
        Value::F64(v) if *v == 0.0 => "0".to_string(),
        Value::Enum(e) => format!("{}::{}", e.type_name, e.variant),
        other => other.to_string(),
    };

    let mut hasher = blake3::Hasher::new();
    hasher.update(kind.as_bytes());
    hasher.update(&[0]);
    hasher.update(text.as_bytes());
    Some(hasher.finalize())
}
