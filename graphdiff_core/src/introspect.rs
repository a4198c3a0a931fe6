use graphdiff_common::{MemberAccess, MemberInfo, ObjectRef, TypeInfo, Value};

/// How the engine enumerates and reads the members of an object.
///
/// The engine never looks at descriptors directly, so alternative member
/// sources (computed members, proxies) can be plugged in here.
pub trait Introspector {
    fn properties(&self, object: &ObjectRef) -> Vec<MemberInfo>;

    fn fields(&self, object: &ObjectRef) -> Vec<MemberInfo>;

    fn read(&self, object: &ObjectRef, member: &MemberInfo) -> MemberAccess;

    /// Look a member up by name, used when the two sides have different types
    fn find_member(&self, object: &ObjectRef, name: &str) -> Option<MemberInfo>;
}

/// Reads members from the object's `TypeDescriptor`. Open descriptors take
/// their members from the instance's slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorIntrospector;

impl DescriptorIntrospector {
    fn slot_members(object: &ObjectRef) -> Vec<MemberInfo> {
        object
            .slot_names()
            .into_iter()
            .map(|name| {
                let declared = match object.get(&name) {
                    Some(MemberAccess::Value(value)) => slot_type(&value),
                    _ => TypeInfo::object("null"),
                };
                MemberInfo::property(name, declared)
            })
            .collect()
    }
}

fn slot_type(value: &Value) -> TypeInfo {
    value
        .type_info()
        .unwrap_or_else(|| TypeInfo::object("null"))
}

impl Introspector for DescriptorIntrospector {
    fn properties(&self, object: &ObjectRef) -> Vec<MemberInfo> {
        let descriptor = object.descriptor();
        if descriptor.is_open() {
            Self::slot_members(object)
        } else {
            descriptor.properties().to_vec()
        }
    }

    fn fields(&self, object: &ObjectRef) -> Vec<MemberInfo> {
        let descriptor = object.descriptor();
        if descriptor.is_open() {
            Vec::new()
        } else {
            descriptor.fields().to_vec()
        }
    }

    fn read(&self, object: &ObjectRef, member: &MemberInfo) -> MemberAccess {
        object
            .get(&member.name)
            .unwrap_or(MemberAccess::Value(Value::Null))
    }

    fn find_member(&self, object: &ObjectRef, name: &str) -> Option<MemberInfo> {
        let descriptor = object.descriptor();
        if descriptor.is_open() {
            return Self::slot_members(object)
                .into_iter()
                .find(|member| member.name == name);
        }
        descriptor.member(name).cloned()
    }
}
