use crate::types::{short_type_name, ScalarKind, TypeDescriptor, TypeInfo};
use chrono::{NaiveDateTime, TimeDelta};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use uuid::Uuid;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an object instance, stable for its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of reading a member slot
#[derive(Debug, Clone)]
pub enum MemberAccess {
    Value(Value),
    Failed(String),
}

struct ObjectInner {
    id: ObjectId,
    descriptor: Arc<TypeDescriptor>,
    slots: RefCell<Vec<(String, MemberAccess)>>,
}

/// Shared handle to an object in a graph. Clones alias the same instance,
/// so graphs may contain cycles.
#[derive(Clone)]
pub struct ObjectRef(Rc<ObjectInner>);

impl ObjectRef {
    pub fn new(descriptor: Arc<TypeDescriptor>) -> Self {
        let id = ObjectId(NEXT_OBJECT_ID.fetch_add(1, AtomicOrdering::Relaxed));
        Self(Rc::new(ObjectInner {
            id,
            descriptor,
            slots: RefCell::new(Vec::new()),
        }))
    }

    /// Builder-style slot assignment
    pub fn with(self, name: impl Into<String>, value: impl Diffable) -> Self {
        self.set(name, value.to_value());
        self
    }

    /// Builder-style slot whose read always fails
    pub fn with_failure(self, name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.set_access(name.into(), MemberAccess::Failed(reason.into()));
        self
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.set_access(name.into(), MemberAccess::Value(value));
    }

    fn set_access(&self, name: String, access: MemberAccess) {
        let mut slots = self.0.slots.borrow_mut();
        match slots.iter_mut().find(|(slot, _)| *slot == name) {
            Some((_, existing)) => *existing = access,
            None => slots.push((name, access)),
        }
    }

    /// Read a slot. Unset slots read as `None`.
    pub fn get(&self, name: &str) -> Option<MemberAccess> {
        self.0
            .slots
            .borrow()
            .iter()
            .find(|(slot, _)| slot == name)
            .map(|(_, access)| access.clone())
    }

    /// Slot names in assignment order
    pub fn slot_names(&self) -> Vec<String> {
        self.0
            .slots
            .borrow()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.0.descriptor
    }

    pub fn type_info(&self) -> &TypeInfo {
        self.0.descriptor.info()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("id", &self.0.id)
            .field("type", &self.0.descriptor.name())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub type_name: String,
    pub variant: String,
}

impl EnumValue {
    pub fn new(type_name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            variant: variant.into(),
        }
    }
}

/// Ordered sequence of element values
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub info: TypeInfo,
    pub items: Vec<Value>,
}

impl Collection {
    pub fn new(info: TypeInfo, items: Vec<Value>) -> Self {
        Self { info, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A dictionary entry, compared part by part
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: Value,
    pub value: Value,
}

/// Dynamic value of anything the engine can compare
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    F32(f32),
    F64(f64),
    String(String),
    Guid(Uuid),
    DateTime(NaiveDateTime),
    TimeSpan(TimeDelta),
    Enum(EnumValue),
    Collection(Collection),
    KeyValue(Box<KeyValue>),
    Object(ObjectRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        let kind = match self {
            Value::Bool(_) => ScalarKind::Bool,
            Value::Char(_) => ScalarKind::Char,
            Value::I8(_) => ScalarKind::I8,
            Value::I16(_) => ScalarKind::I16,
            Value::I32(_) => ScalarKind::I32,
            Value::I64(_) => ScalarKind::I64,
            Value::I128(_) => ScalarKind::I128,
            Value::U8(_) => ScalarKind::U8,
            Value::U16(_) => ScalarKind::U16,
            Value::U32(_) => ScalarKind::U32,
            Value::U64(_) => ScalarKind::U64,
            Value::U128(_) => ScalarKind::U128,
            Value::F32(_) => ScalarKind::F32,
            Value::F64(_) => ScalarKind::F64,
            Value::String(_) => ScalarKind::String,
            Value::Guid(_) => ScalarKind::Guid,
            Value::DateTime(_) => ScalarKind::DateTime,
            Value::TimeSpan(_) => ScalarKind::TimeSpan,
            Value::Enum(_) => ScalarKind::Enum,
            Value::Null | Value::Collection(_) | Value::KeyValue(_) | Value::Object(_) => {
                return None
            }
        };
        Some(kind)
    }

    pub fn is_scalar(&self) -> bool {
        self.scalar_kind().is_some()
    }

    /// Runtime type of the value; `None` for null
    pub fn type_info(&self) -> Option<TypeInfo> {
        match self {
            Value::Null => None,
            Value::Enum(e) => Some(TypeInfo::enumeration(e.type_name.clone())),
            Value::Collection(c) => Some(c.info.clone()),
            Value::KeyValue(_) => Some(TypeInfo::key_value()),
            Value::Object(o) => Some(o.type_info().clone()),
            other => other.scalar_kind().map(TypeInfo::scalar),
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Value::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Signed integer view of any integer value that fits in `i128`
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::I8(v) => Some(v as i128),
            Value::I16(v) => Some(v as i128),
            Value::I32(v) => Some(v as i128),
            Value::I64(v) => Some(v as i128),
            Value::I128(v) => Some(v),
            Value::U8(v) => Some(v as i128),
            Value::U16(v) => Some(v as i128),
            Value::U32(v) => Some(v as i128),
            Value::U64(v) => Some(v as i128),
            Value::U128(v) => i128::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v as f64),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn collection(info: TypeInfo, items: Vec<Value>) -> Self {
        Value::Collection(Collection::new(info, items))
    }

    pub fn key_value(key: Value, value: Value) -> Self {
        Value::KeyValue(Box::new(KeyValue { key, value }))
    }

    /// Total order used to canonicalise unordered containers
    pub fn canonical_cmp(&self, other: &Value) -> Ordering {
        if let (Some(a), Some(b)) = (self.as_i128(), other.as_i128()) {
            return a.cmp(&b);
        }
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a.total_cmp(&b);
        }
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::Guid(a), Value::Guid(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::TimeSpan(a), Value::TimeSpan(b)) => a.cmp(b),
            (Value::Object(a), Value::Object(b)) => a.id().cmp(&b.id()),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl PartialEq for Value {
    /// Scalars compare by value (NaN equals NaN), objects by identity,
    /// containers element-wise
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::I128(a), Value::I128(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::U128(a), Value::U128(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::F64(a), Value::F64(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Guid(a), Value::Guid(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::TimeSpan(a), Value::TimeSpan(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Collection(a), Value::Collection(b)) => a.items == b.items,
            (Value::KeyValue(a), Value::KeyValue(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "'{}'", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::I128(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::U128(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "\"{}\"", v),
            Value::Guid(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v),
            Value::TimeSpan(v) => write!(f, "{}", v),
            Value::Enum(v) => write!(f, "{}::{}", v.type_name, v.variant),
            Value::Collection(c) => write!(f, "{} [{} items]", c.info.name(), c.items.len()),
            Value::KeyValue(kv) => write!(f, "{}: {}", kv.key, kv.value),
            Value::Object(o) => write!(f, "{} {{..}}", o.type_info().name()),
        }
    }
}

/// Conversion of native Rust values into the engine's value model
pub trait Diffable {
    /// Declared type of `Self`, used as the member type in descriptors
    fn static_type() -> TypeInfo;

    fn to_value(&self) -> Value;
}

/// Declared type of an expression, for use inside `diffable_struct!`
pub fn type_of<T: Diffable>(_: &T) -> TypeInfo {
    T::static_type()
}

macro_rules! impl_scalar_diffable {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Diffable for $ty {
                fn static_type() -> TypeInfo {
                    TypeInfo::scalar(ScalarKind::$variant)
                }

                fn to_value(&self) -> Value {
                    Value::$variant(self.clone())
                }
            }
        )*
    };
}

impl_scalar_diffable! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    f32 => F32,
    f64 => F64,
    String => String,
    Uuid => Guid,
    NaiveDateTime => DateTime,
    TimeDelta => TimeSpan,
}

impl Diffable for isize {
    fn static_type() -> TypeInfo {
        TypeInfo::scalar(ScalarKind::I64)
    }

    fn to_value(&self) -> Value {
        Value::I64(*self as i64)
    }
}

impl Diffable for usize {
    fn static_type() -> TypeInfo {
        TypeInfo::scalar(ScalarKind::U64)
    }

    fn to_value(&self) -> Value {
        Value::U64(*self as u64)
    }
}

impl Diffable for str {
    fn static_type() -> TypeInfo {
        TypeInfo::scalar(ScalarKind::String)
    }

    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl Diffable for Value {
    fn static_type() -> TypeInfo {
        TypeInfo::object("Value")
    }

    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl Diffable for ObjectRef {
    fn static_type() -> TypeInfo {
        TypeInfo::object("Object")
    }

    fn to_value(&self) -> Value {
        Value::Object(self.clone())
    }
}

impl<T: Diffable + ?Sized> Diffable for &T {
    fn static_type() -> TypeInfo {
        T::static_type()
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: Diffable> Diffable for Box<T> {
    fn static_type() -> TypeInfo {
        T::static_type()
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: Diffable> Diffable for Option<T> {
    fn static_type() -> TypeInfo {
        T::static_type().to_nullable()
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

fn collection_of<'a, C, T, I>(items: I) -> Value
where
    C: ?Sized,
    T: Diffable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let info = TypeInfo::collection(short_type_name(std::any::type_name::<C>()));
    Value::collection(info, items.into_iter().map(Diffable::to_value).collect())
}

fn sorted_collection(info: TypeInfo, mut items: Vec<Value>) -> Value {
    items.sort_by(|a, b| a.canonical_cmp(b));
    Value::collection(info, items)
}

impl<T: Diffable> Diffable for Vec<T> {
    fn static_type() -> TypeInfo {
        TypeInfo::collection(short_type_name(std::any::type_name::<Self>()))
    }

    fn to_value(&self) -> Value {
        collection_of::<Self, T, _>(self.iter())
    }
}

impl<T: Diffable> Diffable for [T] {
    fn static_type() -> TypeInfo {
        TypeInfo::collection(short_type_name(std::any::type_name::<Self>()))
    }

    fn to_value(&self) -> Value {
        collection_of::<Self, T, _>(self.iter())
    }
}

impl<T: Diffable, const N: usize> Diffable for [T; N] {
    fn static_type() -> TypeInfo {
        TypeInfo::collection(short_type_name(std::any::type_name::<Self>()))
    }

    fn to_value(&self) -> Value {
        collection_of::<Self, T, _>(self.iter())
    }
}

impl<T: Diffable> Diffable for VecDeque<T> {
    fn static_type() -> TypeInfo {
        TypeInfo::collection(short_type_name(std::any::type_name::<Self>()))
    }

    fn to_value(&self) -> Value {
        collection_of::<Self, T, _>(self.iter())
    }
}

impl<T: Diffable> Diffable for BTreeSet<T> {
    fn static_type() -> TypeInfo {
        TypeInfo::collection(short_type_name(std::any::type_name::<Self>()))
    }

    fn to_value(&self) -> Value {
        collection_of::<Self, T, _>(self.iter())
    }
}

impl<T: Diffable, S> Diffable for HashSet<T, S> {
    fn static_type() -> TypeInfo {
        TypeInfo::collection(short_type_name(std::any::type_name::<HashSet<T>>()))
    }

    /// Elements are sorted so equal sets produce equal sequences
    fn to_value(&self) -> Value {
        sorted_collection(
            Self::static_type(),
            self.iter().map(Diffable::to_value).collect(),
        )
    }
}

impl<K: Diffable, V: Diffable> Diffable for BTreeMap<K, V> {
    fn static_type() -> TypeInfo {
        TypeInfo::collection(short_type_name(std::any::type_name::<Self>()))
    }

    fn to_value(&self) -> Value {
        let entries = self
            .iter()
            .map(|(k, v)| Value::key_value(k.to_value(), v.to_value()))
            .collect();
        Value::collection(Self::static_type(), entries)
    }
}

impl<K: Diffable, V: Diffable, S> Diffable for HashMap<K, V, S> {
    fn static_type() -> TypeInfo {
        TypeInfo::collection(short_type_name(std::any::type_name::<HashMap<K, V>>()))
    }

    /// Entries are sorted by key so equal maps produce equal sequences
    fn to_value(&self) -> Value {
        let mut entries: Vec<(Value, Value)> = self
            .iter()
            .map(|(k, v)| (k.to_value(), v.to_value()))
            .collect();
        entries.sort_by(|a, b| a.0.canonical_cmp(&b.0));
        let items = entries
            .into_iter()
            .map(|(k, v)| Value::key_value(k, v))
            .collect();
        Value::collection(Self::static_type(), items)
    }
}

/// Implement [`Diffable`] for a plain struct by listing its members.
///
/// ```ignore
/// diffable_struct!(Book { title, author });
/// diffable_struct!(Counter { label } fields { count });
/// ```
#[macro_export]
macro_rules! diffable_struct {
    ($ty:ident { $($prop:ident),* $(,)? } $(fields { $($field:ident),* $(,)? })?) => {
        impl $crate::Diffable for $ty {
            fn static_type() -> $crate::TypeInfo {
                $crate::TypeInfo::object(stringify!($ty))
            }

            fn to_value(&self) -> $crate::Value {
                static DESCRIPTOR: ::std::sync::OnceLock<::std::sync::Arc<$crate::TypeDescriptor>> =
                    ::std::sync::OnceLock::new();
                let descriptor = DESCRIPTOR.get_or_init(|| {
                    $crate::TypeDescriptor::builder(stringify!($ty))
                        $(.property(stringify!($prop), $crate::value::type_of(&self.$prop)))*
                        $($(.field(stringify!($field), $crate::value::type_of(&self.$field)))*)?
                        .build()
                });
                let object = $crate::ObjectRef::new(::std::sync::Arc::clone(descriptor));
                $(object.set(stringify!($prop), $crate::Diffable::to_value(&self.$prop));)*
                $($(object.set(stringify!($field), $crate::Diffable::to_value(&self.$field));)*)?
                $crate::Value::Object(object)
            }
        }
    };
}
