use crate::difference::Difference;
use crate::engine::{same_shape, type_mismatch, Visited, Walker};
use crate::match_tracker::{structural_hash, MatchTracker};
use crate::path::indexed_path;
use graphdiff_common::{Collection, ComparisonOptions, Result, TypeInfo, Value};
use std::collections::HashMap;
use tracing::trace;

impl Walker<'_> {
    /// Reconcile two collections element by element, or by matching when
    /// order does not matter
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn compare_collections(
        &self,
        name: &str,
        left: &Collection,
        right: &Collection,
        path: &str,
        depth: usize,
        visited: &mut Visited,
        out: &mut Vec<Difference>,
    ) -> Result<()> {
        if self
            .options
            .contains(ComparisonOptions::ALLOW_COLLECTIONS_OUT_OF_ORDER)
        {
            self.compare_unordered(name, left, right, path, depth, visited, out)
        } else {
            self.compare_ordered(name, left, right, path, depth, visited, out)
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn compare_ordered(
        &self,
        name: &str,
        left: &Collection,
        right: &Collection,
        path: &str,
        depth: usize,
        visited: &mut Visited,
        out: &mut Vec<Difference>,
    ) -> Result<()> {
        let len = left.len().max(right.len());
        for index in 0..len {
            let element_path = indexed_path(path, index);
            match (left.items.get(index), right.items.get(index)) {
                (Some(l), Some(r)) => {
                    self.compare_element(name, index, l, r, &element_path, depth, visited, out)?
                }
                (Some(l), None) => out.push(one_sided(name, &element_path, index, l.clone(), Value::Null)),
                (None, Some(r)) => out.push(one_sided(name, &element_path, index, Value::Null, r.clone())),
                (None, None) => {}
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn compare_unordered(
        &self,
        name: &str,
        left: &Collection,
        right: &Collection,
        path: &str,
        depth: usize,
        visited: &mut Visited,
        out: &mut Vec<Difference>,
    ) -> Result<()> {
        let mut tracker = MatchTracker::new();
        let mut buckets: HashMap<blake3::Hash, Vec<usize>> = HashMap::new();
        for (index, value) in left.items.iter().enumerate() {
            tracker.add_left(index, value);
        }
        for (index, value) in right.items.iter().enumerate() {
            tracker.add_right(index, value);
            if let Some(hash) = structural_hash(value) {
                buckets.entry(hash).or_default().push(index);
            }
        }

        for (left_index, value) in left.items.iter().enumerate() {
            let matched = match structural_hash(value) {
                Some(hash) => {
                    trace!(
                        "Matching {} in bucket {}",
                        indexed_path(path, left_index),
                        hex::encode(&hash.as_bytes()[..8])
                    );
                    buckets.get(&hash).and_then(|candidates| {
                        candidates.iter().copied().find(|&right_index| {
                            !tracker.is_right_matched(right_index)
                                && right.items[right_index] == *value
                        })
                    })
                }
                None => {
                    let candidates: Vec<usize> = tracker
                        .right_candidates()
                        .filter(|candidate| !candidate.value.is_scalar() && !candidate.value.is_null())
                        .map(|candidate| candidate.index)
                        .collect();
                    let mut found = None;
                    for right_index in candidates {
                        let element_path = indexed_path(path, left_index);
                        if self.elements_match(
                            name,
                            value,
                            &right.items[right_index],
                            &element_path,
                            depth,
                            visited,
                        )? {
                            found = Some(right_index);
                            break;
                        }
                    }
                    found
                }
            };

            if let Some(right_index) = matched {
                tracker.record_match(left_index, right_index);
            }
        }

        for element in tracker.left_unmatched() {
            let element_path = indexed_path(path, element.index);
            out.push(one_sided(name, &element_path, element.index, element.value.clone(), Value::Null));
        }
        for element in tracker.right_unmatched() {
            let element_path = indexed_path(path, element.index);
            out.push(one_sided(name, &element_path, element.index, Value::Null, element.value.clone()));
        }
        Ok(())
    }

    /// Two composite elements match when comparing them yields no differences.
    /// Runs against a copy of the visited set so a trial leaves no trace.
    fn elements_match(
        &self,
        name: &str,
        left: &Value,
        right: &Value,
        path: &str,
        depth: usize,
        visited: &Visited,
    ) -> Result<bool> {
        if !same_shape(left, right) {
            return Ok(false);
        }
        let mut trial_visited = visited.clone();
        let mut trial = Vec::new();
        self.compare_element(name, 0, left, right, path, depth, &mut trial_visited, &mut trial)?;
        Ok(trial.is_empty())
    }

    #[allow(clippy::too_many_arguments)]
    fn compare_element(
        &self,
        name: &str,
        index: usize,
        left: &Value,
        right: &Value,
        path: &str,
        depth: usize,
        visited: &mut Visited,
        out: &mut Vec<Difference>,
    ) -> Result<()> {
        match (left, right) {
            (Value::Null, Value::Null) => Ok(()),
            (Value::Null, _) | (_, Value::Null) => {
                out.push(one_sided(name, path, index, left.clone(), right.clone()));
                Ok(())
            }
            (Value::Object(_), Value::Object(_)) => {
                self.recurse_object(name, left, right, path, depth, visited, out)
            }
            (Value::Collection(l), Value::Collection(r)) => {
                if self.options.contains(ComparisonOptions::COMPARE_COLLECTIONS) {
                    self.compare_collections(name, l, r, path, depth, visited, out)
                } else {
                    Ok(())
                }
            }
            (Value::KeyValue(l), Value::KeyValue(r)) => {
                self.compare_key_value(l, r, path, depth, visited, out)
            }
            _ => {
                if !same_shape(left, right) && !self.allows_different_types() {
                    return Err(type_mismatch(path, left, right));
                }
                if left != right {
                    out.push(Difference::element(
                        element_type(left, right),
                        name,
                        path,
                        index,
                        left.clone(),
                        right.clone(),
                    ));
                }
                Ok(())
            }
        }
    }
}

fn element_type(left: &Value, right: &Value) -> TypeInfo {
    left.type_info()
        .or_else(|| right.type_info())
        .unwrap_or_else(|| TypeInfo::object("null"))
}

/// Element present on one side only
fn one_sided(name: &str, path: &str, index: usize, left: Value, right: Value) -> Difference {
    Difference::element(element_type(&left, &right), name, path, index, left, right)
}
