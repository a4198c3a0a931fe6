use crate::difference::Difference;
use crate::equality::{DeclaredEquality, EqualityOutcome, EqualityPolicy};
use crate::filter::{ignored_by_attribute, FilterMode, MemberFilter};
use crate::introspect::{DescriptorIntrospector, Introspector};
use crate::path::child_path;
use graphdiff_common::{
    Collection, ComparisonOptions, DiffDefaults, DiffOptions, Diffable, GraphDiffError,
    MemberAccess, MemberInfo, MemberKind, ObjectId, ObjectRef, Result, TypeInfo, Value,
};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// Objects already entered during one comparison, keyed by the left object
pub(crate) type Visited = HashSet<(ObjectId, String)>;

/// Structural diff of two object graphs
pub struct DiffProvider {
    introspector: Box<dyn Introspector>,
    equality: Box<dyn EqualityPolicy>,
}

impl Default for DiffProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffProvider {
    pub fn new() -> Self {
        Self {
            introspector: Box::new(DescriptorIntrospector),
            equality: Box::new(DeclaredEquality),
        }
    }

    pub fn with_introspector(mut self, introspector: impl Introspector + 'static) -> Self {
        self.introspector = Box::new(introspector);
        self
    }

    pub fn with_equality_policy(mut self, equality: impl EqualityPolicy + 'static) -> Self {
        self.equality = Box::new(equality);
        self
    }

    /// Compare with the default options: properties, fields and collections
    pub fn compute_diff<L, R>(&self, left: &L, right: &R) -> Result<Vec<Difference>>
    where
        L: Diffable + ?Sized,
        R: Diffable + ?Sized,
    {
        self.compute_diff_with(left, right, ComparisonOptions::ALL)
    }

    pub fn compute_diff_with<L, R>(
        &self,
        left: &L,
        right: &R,
        options: ComparisonOptions,
    ) -> Result<Vec<Difference>>
    where
        L: Diffable + ?Sized,
        R: Diffable + ?Sized,
    {
        let no_filter: [&str; 0] = [];
        self.compute_diff_filtered(left, right, options, &no_filter)
    }

    /// Compare using an exclude list, or an include list when the options ask for one.
    /// Include-list results come out in the order the entries are listed.
    pub fn compute_diff_filtered<L, R, S>(
        &self,
        left: &L,
        right: &R,
        options: ComparisonOptions,
        filter_list: &[S],
    ) -> Result<Vec<Difference>>
    where
        L: Diffable + ?Sized,
        R: Diffable + ?Sized,
        S: AsRef<str>,
    {
        self.compute_diff_full(
            left,
            right,
            DiffDefaults::get().max_depth,
            options,
            &DiffOptions::default(),
            filter_list,
        )
    }

    pub fn compute_diff_full<L, R, S>(
        &self,
        left: &L,
        right: &R,
        max_depth: Option<usize>,
        options: ComparisonOptions,
        diff_options: &DiffOptions,
        filter_list: &[S],
    ) -> Result<Vec<Difference>>
    where
        L: Diffable + ?Sized,
        R: Diffable + ?Sized,
        S: AsRef<str>,
    {
        let filter = MemberFilter::new(options, filter_list);
        self.diff_values(
            &left.to_value(),
            &right.to_value(),
            max_depth,
            options,
            diff_options,
            &filter,
        )
    }

    /// Compare two already converted values. `max_depth` of `None` or 0 is unlimited.
    pub fn diff_values(
        &self,
        left: &Value,
        right: &Value,
        max_depth: Option<usize>,
        options: ComparisonOptions,
        diff_options: &DiffOptions,
        filter: &MemberFilter,
    ) -> Result<Vec<Difference>> {
        debug!("Computing diff with options {}", options);

        let walker = Walker {
            max_depth: max_depth.unwrap_or(0),
            options,
            diff_options,
            filter,
            introspector: self.introspector.as_ref(),
            equality: self.equality.as_ref(),
        };
        let mut visited = Visited::new();
        let mut differences = Vec::new();
        walker.compare_root(left, right, &mut visited, &mut differences)?;

        // stable: members matched by the same entry keep declaration order
        if matches!(filter.mode(), FilterMode::Include { .. }) {
            differences.sort_by_key(|d| filter.request_rank(&d.property, &d.path));
        }

        debug!("Found {} differences", differences.len());
        Ok(differences)
    }
}

/// Compare two values with the default options
pub fn diff<L, R>(left: &L, right: &R) -> Result<Vec<Difference>>
where
    L: Diffable + ?Sized,
    R: Diffable + ?Sized,
{
    DiffProvider::new().compute_diff(left, right)
}

pub fn diff_with<L, R>(left: &L, right: &R, options: ComparisonOptions) -> Result<Vec<Difference>>
where
    L: Diffable + ?Sized,
    R: Diffable + ?Sized,
{
    DiffProvider::new().compute_diff_with(left, right, options)
}

/// `a.diff_against(&b)` for any diffable value
pub trait DiffExt: Diffable {
    fn diff_against(&self, other: &Self) -> Result<Vec<Difference>> {
        diff(self, other)
    }
}

impl<T: Diffable + ?Sized> DiffExt for T {}

/// Settings and strategies shared by one traversal
pub(crate) struct Walker<'a> {
    pub(crate) max_depth: usize,
    pub(crate) options: ComparisonOptions,
    pub(crate) diff_options: &'a DiffOptions,
    pub(crate) filter: &'a MemberFilter,
    pub(crate) introspector: &'a dyn Introspector,
    pub(crate) equality: &'a dyn EqualityPolicy,
}

impl Walker<'_> {
    pub(crate) fn allows_different_types(&self) -> bool {
        self.options
            .contains(ComparisonOptions::ALLOW_COMPARE_DIFFERENT_OBJECTS)
    }

    fn compare_root(
        &self,
        left: &Value,
        right: &Value,
        visited: &mut Visited,
        out: &mut Vec<Difference>,
    ) -> Result<()> {
        match (left, right) {
            (Value::Null, Value::Null) => Ok(()),
            (Value::Object(_), Value::Null)
            | (Value::Null, Value::Object(_))
            | (Value::Object(_), Value::Object(_)) => {
                self.recurse_object("", left, right, "", 0, visited, out)
            }
            (Value::Collection(_), Value::Null) | (Value::Null, Value::Collection(_))
                if !self.options.contains(ComparisonOptions::COMPARE_COLLECTIONS) =>
            {
                Ok(())
            }
            // a missing root collection reconciles as an empty one
            (Value::Collection(c), Value::Null) => {
                let empty = Collection::new(c.info.clone(), Vec::new());
                self.compare_collections("", c, &empty, "", 0, visited, out)
            }
            (Value::Null, Value::Collection(c)) => {
                let empty = Collection::new(c.info.clone(), Vec::new());
                self.compare_collections("", &empty, c, "", 0, visited, out)
            }
            _ => {
                let declared = left
                    .type_info()
                    .or_else(|| right.type_info())
                    .unwrap_or_else(|| TypeInfo::object("null"));
                self.compare_member("", &declared, left, right, "", 0, visited, out)
            }
        }
    }

    /// Compare the members of two objects of which at least one is present
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn recurse_object(
        &self,
        property: &str,
        left: &Value,
        right: &Value,
        path: &str,
        depth: usize,
        visited: &mut Visited,
        out: &mut Vec<Difference>,
    ) -> Result<()> {
        let left_object = left.as_object();
        let right_object = right.as_object();

        if let (Some(l), Some(r)) = (left_object, right_object) {
            if !self.allows_different_types() && !l.type_info().same_type(r.type_info()) {
                return Err(type_mismatch(path, left, right));
            }
        }

        if self.max_depth > 0 && depth >= self.max_depth {
            trace!("Max depth {} reached at {}", self.max_depth, display_path(path));
            return Ok(());
        }

        let Some(subject) = left_object.or(right_object) else {
            return Ok(());
        };

        if ignored_by_attribute(
            subject.descriptor().attributes(),
            self.options,
            self.diff_options,
        ) {
            trace!("Skipping ignored type {} at {}", subject.type_info(), display_path(path));
            return Ok(());
        }

        if let (Some(l), Some(r)) = (left_object, right_object) {
            if self.options.contains(ComparisonOptions::ALLOW_EQUALS_OVERRIDE)
                && l.type_info().same_type(r.type_info())
            {
                match self.equality.compare(l, r) {
                    EqualityOutcome::Custom(true) => return Ok(()),
                    EqualityOutcome::Custom(false) => {
                        out.push(Difference::opaque(
                            l.type_info().clone(),
                            property,
                            path,
                            left.clone(),
                            right.clone(),
                        ));
                        return Ok(());
                    }
                    EqualityOutcome::NotDefined => {}
                }
            }
        }

        if let Some(l) = left_object {
            if !visited.insert((l.id(), l.type_info().name().to_string())) {
                trace!("Already visited {} at {}", l.id(), display_path(path));
                return Ok(());
            }
        }

        let depth = depth + 1;
        if self.options.contains(ComparisonOptions::COMPARE_PROPERTIES) {
            for member in self.members(left_object, right_object, MemberKind::Property) {
                self.compare_object_member(&member, left_object, right_object, path, depth, visited, out)?;
            }
        }
        if self.options.contains(ComparisonOptions::COMPARE_FIELDS) {
            for member in self.members(left_object, right_object, MemberKind::Field) {
                if member.is_backing_field {
                    continue;
                }
                self.compare_object_member(&member, left_object, right_object, path, depth, visited, out)?;
            }
        }
        Ok(())
    }

    fn members(
        &self,
        left: Option<&ObjectRef>,
        right: Option<&ObjectRef>,
        kind: MemberKind,
    ) -> Vec<MemberInfo> {
        let list = |object: &ObjectRef| match kind {
            MemberKind::Property => self.introspector.properties(object),
            MemberKind::Field => self.introspector.fields(object),
        };

        match (left, right) {
            (Some(l), Some(r)) if l.descriptor().is_open() || r.descriptor().is_open() => {
                let mut members = list(l);
                for member in list(r) {
                    match members.iter_mut().find(|m| m.name == member.name) {
                        // a null on the left says nothing about the member's type
                        Some(existing) if existing.declared_type.name() == "null" => {
                            existing.declared_type = member.declared_type;
                        }
                        Some(_) => {}
                        None => members.push(member),
                    }
                }
                members
            }
            (Some(l), _) => list(l),
            (None, Some(r)) => list(r),
            (None, None) => Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn compare_object_member(
        &self,
        member: &MemberInfo,
        left: Option<&ObjectRef>,
        right: Option<&ObjectRef>,
        path: &str,
        depth: usize,
        visited: &mut Visited,
        out: &mut Vec<Difference>,
    ) -> Result<()> {
        let member_path = child_path(path, &member.name);

        if ignored_by_attribute(&member.attributes, self.options, self.diff_options) {
            trace!("Skipping ignored member {}", member_path);
            return Ok(());
        }
        if !self.filter.allows(&member.name, &member_path) {
            trace!("Filtered out {}", member_path);
            return Ok(());
        }

        let left_value = match left {
            Some(object) => self.read_member(object, member, &member_path)?,
            None => Value::Null,
        };
        let right_value = match right {
            Some(object) => {
                let differs = left.map_or(false, |l| !l.type_info().same_type(object.type_info()));
                if differs {
                    match self.introspector.find_member(object, &member.name) {
                        Some(found) => self.read_member(object, &found, &member_path)?,
                        None => Value::Null,
                    }
                } else {
                    self.read_member(object, member, &member_path)?
                }
            }
            None => Value::Null,
        };

        self.compare_member(
            &member.name,
            &member.declared_type,
            &left_value,
            &right_value,
            &member_path,
            depth,
            visited,
            out,
        )
    }

    /// A failed property read counts as absent; a failed field read aborts
    fn read_member(&self, object: &ObjectRef, member: &MemberInfo, path: &str) -> Result<Value> {
        match self.introspector.read(object, member) {
            MemberAccess::Value(value) => Ok(value),
            MemberAccess::Failed(reason) => match member.kind {
                MemberKind::Property => {
                    warn!("Failed to read property {}: {}", path, reason);
                    Ok(Value::Null)
                }
                MemberKind::Field => Err(GraphDiffError::FieldAccess {
                    path: path.to_string(),
                    reason,
                }),
            },
        }
    }

    /// Compare two member values of declared type `declared`
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn compare_member(
        &self,
        name: &str,
        declared: &TypeInfo,
        left: &Value,
        right: &Value,
        path: &str,
        depth: usize,
        visited: &mut Visited,
        out: &mut Vec<Difference>,
    ) -> Result<()> {
        if self
            .options
            .contains(ComparisonOptions::TREAT_EMPTY_AND_NULL_COLLECTIONS_EQUAL)
            && is_empty_or_null(left)
            && is_empty_or_null(right)
        {
            return Ok(());
        }

        match (left, right) {
            (Value::Null, Value::Null) => Ok(()),
            (Value::Null, present) | (present, Value::Null) => {
                if matches!(present, Value::Collection(_))
                    && !self.options.contains(ComparisonOptions::COMPARE_COLLECTIONS)
                {
                    return Ok(());
                }
                // an unlisted ancestor of an included path: report the listed members below it
                if self.filter.passes_only_on_the_way(name, path) {
                    return match present {
                        Value::Object(_) => {
                            self.recurse_object(name, left, right, path, depth, visited, out)
                        }
                        _ => Ok(()),
                    };
                }
                out.push(Difference::new(
                    effective_type(declared, present),
                    name,
                    path,
                    left.clone(),
                    right.clone(),
                ));
                Ok(())
            }
            (Value::Collection(l), Value::Collection(r)) => {
                if self.options.contains(ComparisonOptions::COMPARE_COLLECTIONS) {
                    self.compare_collections(name, l, r, path, depth, visited, out)
                } else {
                    Ok(())
                }
            }
            (Value::Object(_), Value::Object(_)) => {
                self.recurse_object(name, left, right, path, depth, visited, out)
            }
            (Value::KeyValue(l), Value::KeyValue(r)) => {
                self.compare_key_value(l, r, path, depth, visited, out)
            }
            _ if same_shape(left, right) => {
                if left != right {
                    out.push(Difference::new(
                        effective_type(declared, left),
                        name,
                        path,
                        left.clone(),
                        right.clone(),
                    ));
                }
                Ok(())
            }
            _ => {
                if !self.allows_different_types() {
                    return Err(type_mismatch(path, left, right));
                }
                out.push(Difference::new(
                    effective_type(declared, left),
                    name,
                    path,
                    left.clone(),
                    right.clone(),
                ));
                Ok(())
            }
        }
    }

    /// `Key` and `Value` of a pair compared as two members
    pub(crate) fn compare_key_value(
        &self,
        left: &graphdiff_common::KeyValue,
        right: &graphdiff_common::KeyValue,
        path: &str,
        depth: usize,
        visited: &mut Visited,
        out: &mut Vec<Difference>,
    ) -> Result<()> {
        for (name, l, r) in [("Key", &left.key, &right.key), ("Value", &left.value, &right.value)] {
            let declared = l
                .type_info()
                .or_else(|| r.type_info())
                .unwrap_or_else(|| TypeInfo::object("null"));
            self.compare_member(name, &declared, l, r, &child_path(path, name), depth, visited, out)?;
        }
        Ok(())
    }
}

fn is_empty_or_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Collection(c) => c.is_empty(),
        _ => false,
    }
}

/// Whether two non-null values can be compared without a type mismatch
pub(crate) fn same_shape(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => l.type_info().same_type(r.type_info()),
        (Value::Collection(_), Value::Collection(_)) => true,
        (Value::KeyValue(_), Value::KeyValue(_)) => true,
        (Value::Enum(l), Value::Enum(r)) => l.type_name == r.type_name,
        _ => match (left.scalar_kind(), right.scalar_kind()) {
            (Some(l), Some(r)) => l == r,
            _ => false,
        },
    }
}

/// The declared type unless the value shows it is something else
pub(crate) fn effective_type(declared: &TypeInfo, value: &Value) -> TypeInfo {
    match value.type_info() {
        Some(runtime) if runtime.kind() != declared.kind() || declared.name() == "null" => runtime,
        _ => declared.clone(),
    }
}

pub(crate) fn type_mismatch(path: &str, left: &Value, right: &Value) -> GraphDiffError {
    let name = |value: &Value| {
        value
            .type_info()
            .map_or_else(|| "null".to_string(), |info| info.to_string())
    };
    GraphDiffError::TypeMismatch {
        path: display_path(path).to_string(),
        left: name(left),
        right: name(right),
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "."
    } else {
        path
    }
}
