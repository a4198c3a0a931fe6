use crate::value::ObjectRef;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// Closed set of leaf value kinds understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
    U128,
    F32,
    F64,
    String,
    Guid,
    DateTime,
    TimeSpan,
    Enum,
}

impl ScalarKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Char => "char",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::I128 => "i128",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::U128 => "u128",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::String => "String",
            ScalarKind::Guid => "Uuid",
            ScalarKind::DateTime => "NaiveDateTime",
            ScalarKind::TimeSpan => "TimeDelta",
            ScalarKind::Enum => "enum",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ScalarKind::I8
                | ScalarKind::I16
                | ScalarKind::I32
                | ScalarKind::I64
                | ScalarKind::I128
                | ScalarKind::U8
                | ScalarKind::U16
                | ScalarKind::U32
                | ScalarKind::U64
                | ScalarKind::U128
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ScalarKind::F32 | ScalarKind::F64)
    }

    /// Every scalar except `String` has value semantics
    pub fn is_value_type(&self) -> bool {
        !matches!(self, ScalarKind::String)
    }
}

/// Structural category of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar(ScalarKind),
    Collection,
    KeyValue,
    Object,
}

/// Declared or runtime type of a compared value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    name: String,
    kind: TypeKind,
    nullable: bool,
}

impl TypeInfo {
    pub fn scalar(kind: ScalarKind) -> Self {
        Self {
            name: kind.type_name().to_string(),
            kind: TypeKind::Scalar(kind),
            nullable: false,
        }
    }

    /// A user-defined enum type
    pub fn enumeration(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Scalar(ScalarKind::Enum),
            nullable: false,
        }
    }

    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Collection,
            nullable: false,
        }
    }

    pub fn key_value() -> Self {
        Self {
            name: "KeyValue".to_string(),
            kind: TypeKind::KeyValue,
            nullable: false,
        }
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Object,
            nullable: false,
        }
    }

    /// Name of the underlying type, without any nullable wrapper
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.kind {
            TypeKind::Scalar(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_value_type(&self) -> bool {
        self.scalar_kind().map_or(false, |kind| kind.is_value_type())
    }

    pub fn is_collection(&self) -> bool {
        self.kind == TypeKind::Collection
    }

    pub fn is_object(&self) -> bool {
        self.kind == TypeKind::Object
    }

    /// Wrap value types in a nullable marker; reference-like types are already nullable
    pub fn to_nullable(&self) -> Self {
        let mut info = self.clone();
        if info.is_value_type() {
            info.nullable = true;
        }
        info
    }

    /// Same underlying type, ignoring the nullable marker
    pub fn same_type(&self, other: &TypeInfo) -> bool {
        self.kind == other.kind && self.name == other.name
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "Option<{}>", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Marker attached to a member or a type, matched against the ignore list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    name: String,
    type_id: Option<TypeId>,
}

impl Attribute {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: None,
        }
    }

    /// Attribute backed by a Rust marker type
    pub fn of<T: 'static>() -> Self {
        Self {
            name: short_type_name(std::any::type_name::<T>()),
            type_id: Some(TypeId::of::<T>()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Property,
    Field,
}

/// One comparable member of a type
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub name: String,
    pub kind: MemberKind,
    pub declared_type: TypeInfo,
    pub attributes: Vec<Attribute>,
    /// Compiler-generated storage behind a property; never compared directly
    pub is_backing_field: bool,
}

impl MemberInfo {
    pub fn property(name: impl Into<String>, declared_type: TypeInfo) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Property,
            declared_type,
            attributes: Vec::new(),
            is_backing_field: false,
        }
    }

    pub fn field(name: impl Into<String>, declared_type: TypeInfo) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Field,
            declared_type,
            attributes: Vec::new(),
            is_backing_field: false,
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn backing_field(mut self) -> Self {
        self.is_backing_field = true;
        self
    }
}

/// Equality check a type declares about itself
pub type Comparator = Arc<dyn Fn(&ObjectRef, &ObjectRef) -> bool + Send + Sync>;

/// Self-declared equality of a type, consulted in precedence order:
/// equatable, then equals override, then equality operator
#[derive(Clone, Default)]
pub struct EqualityCapabilities {
    pub equatable: Option<Comparator>,
    pub equals_override: Option<Comparator>,
    pub eq_operator: Option<Comparator>,
}

impl EqualityCapabilities {
    pub fn is_empty(&self) -> bool {
        self.equatable.is_none() && self.equals_override.is_none() && self.eq_operator.is_none()
    }
}

impl fmt::Debug for EqualityCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EqualityCapabilities")
            .field("equatable", &self.equatable.is_some())
            .field("equals_override", &self.equals_override.is_some())
            .field("eq_operator", &self.eq_operator.is_some())
            .finish()
    }
}

/// Member layout and capabilities of an object type
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    info: TypeInfo,
    attributes: Vec<Attribute>,
    properties: Vec<MemberInfo>,
    fields: Vec<MemberInfo>,
    open: bool,
    equality: EqualityCapabilities,
}

impl TypeDescriptor {
    pub fn builder(name: impl Into<String>) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder {
            descriptor: TypeDescriptor {
                info: TypeInfo::object(name),
                attributes: Vec::new(),
                properties: Vec::new(),
                fields: Vec::new(),
                open: false,
                equality: EqualityCapabilities::default(),
            },
        }
    }

    /// Descriptor for ad-hoc shapes whose members come from each instance
    pub fn open(name: impl Into<String>) -> Arc<Self> {
        Self::builder(name).open().build()
    }

    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        self.info.name()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn properties(&self) -> &[MemberInfo] {
        &self.properties
    }

    pub fn fields(&self) -> &[MemberInfo] {
        &self.fields
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn equality(&self) -> &EqualityCapabilities {
        &self.equality
    }

    /// Find a declared member by name, properties first
    pub fn member(&self, name: &str) -> Option<&MemberInfo> {
        self.properties
            .iter()
            .chain(self.fields.iter())
            .find(|m| m.name == name)
    }
}

pub struct TypeDescriptorBuilder {
    descriptor: TypeDescriptor,
}

impl TypeDescriptorBuilder {
    pub fn property(mut self, name: impl Into<String>, declared_type: TypeInfo) -> Self {
        self.descriptor
            .properties
            .push(MemberInfo::property(name, declared_type));
        self
    }

    pub fn field(mut self, name: impl Into<String>, declared_type: TypeInfo) -> Self {
        self.descriptor
            .fields
            .push(MemberInfo::field(name, declared_type));
        self
    }

    /// Add a fully specified member; its kind decides the list it lands in
    pub fn member(mut self, member: MemberInfo) -> Self {
        match member.kind {
            MemberKind::Property => self.descriptor.properties.push(member),
            MemberKind::Field => self.descriptor.fields.push(member),
        }
        self
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.descriptor.attributes.push(attribute);
        self
    }

    pub fn open(mut self) -> Self {
        self.descriptor.open = true;
        self
    }

    pub fn equatable<F>(mut self, f: F) -> Self
    where
        F: Fn(&ObjectRef, &ObjectRef) -> bool + Send + Sync + 'static,
    {
        self.descriptor.equality.equatable = Some(Arc::new(f));
        self
    }

    pub fn equals_override<F>(mut self, f: F) -> Self
    where
        F: Fn(&ObjectRef, &ObjectRef) -> bool + Send + Sync + 'static,
    {
        self.descriptor.equality.equals_override = Some(Arc::new(f));
        self
    }

    pub fn eq_operator<F>(mut self, f: F) -> Self
    where
        F: Fn(&ObjectRef, &ObjectRef) -> bool + Send + Sync + 'static,
    {
        self.descriptor.equality.eq_operator = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Arc<TypeDescriptor> {
        Arc::new(self.descriptor)
    }
}

/// Strip module paths from a `std::any::type_name` string
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    let mut chars = full.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            segment.clear();
        } else if c.is_alphanumeric() || c == '_' {
            segment.push(c);
        } else {
            out.push_str(&segment);
            segment.clear();
            out.push(c);
        }
    }
    out.push_str(&segment);
    out
}
