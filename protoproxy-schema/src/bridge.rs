//! Descriptor lookup by name or by type handle.

use prost_reflect::{DescriptorPool, EnumDescriptor, FieldDescriptor, MessageDescriptor};
use prost_types::FileDescriptorSet;

use crate::error::{LookupError, SchemaError};
use crate::kind::FieldKind;

/// Something that identifies a message type: a fully-qualified name or an
/// existing descriptor handle.
#[derive(Debug, Clone, Copy)]
pub enum MessageRef<'a> {
    Name(&'a str),
    Type(&'a MessageDescriptor),
}

impl<'a> From<&'a str> for MessageRef<'a> {
    fn from(name: &'a str) -> Self {
        MessageRef::Name(name)
    }
}

impl<'a> From<&'a String> for MessageRef<'a> {
    fn from(name: &'a String) -> Self {
        MessageRef::Name(name)
    }
}

impl<'a> From<&'a MessageDescriptor> for MessageRef<'a> {
    fn from(desc: &'a MessageDescriptor) -> Self {
        MessageRef::Type(desc)
    }
}

/// A field descriptor together with its classified shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub descriptor: FieldDescriptor,
    pub kind: FieldKind,
}

impl ResolvedField {
    pub fn new(descriptor: FieldDescriptor) -> Self {
        let kind = FieldKind::of(&descriptor);
        Self { descriptor, kind }
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }
}

/// Resolve `name` to a declared field of `message`.
pub fn resolve_field(message: &MessageDescriptor, name: &str) -> Result<ResolvedField, LookupError> {
    message
        .get_field_by_name(name)
        .map(ResolvedField::new)
        .ok_or_else(|| LookupError::FieldNotFound {
            message: message.full_name().to_owned(),
            field: name.to_owned(),
        })
}

/// Read-only view of a descriptor pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DescriptorBridge {
    pool: DescriptorPool,
}

impl DescriptorBridge {
    pub fn new(pool: DescriptorPool) -> Self {
        Self { pool }
    }

    /// Bridge over the process-wide pool that generated code registers into.
    pub fn global() -> Self {
        Self::new(DescriptorPool::global())
    }

    /// Load a serialized `google.protobuf.FileDescriptorSet`.
    pub fn decode(bytes: &[u8]) -> Result<Self, SchemaError> {
        let pool = DescriptorPool::decode(bytes)?;
        log::debug!("loaded descriptor set with {} files", pool.files().count());
        Ok(Self::new(pool))
    }

    pub fn from_file_descriptor_set(set: FileDescriptorSet) -> Result<Self, SchemaError> {
        Ok(Self::new(DescriptorPool::from_file_descriptor_set(set)?))
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// Look up a message type.
    ///
    /// Names may carry a leading `.` or a type URL prefix
    /// (`type.googleapis.com/pkg.Msg`). A descriptor handle is resolved to the
    /// pool's own descriptor of the same name when there is one, and is
    /// otherwise returned as-is.
    pub fn resolve_message<'a>(
        &self,
        target: impl Into<MessageRef<'a>>,
    ) -> Result<MessageDescriptor, LookupError> {
        match target.into() {
            MessageRef::Name(name) => {
                let normalized = normalize_type_name(name);
                self.pool
                    .get_message_by_name(normalized)
                    .ok_or_else(|| LookupError::MessageNotFound(name.to_owned()))
            }
            MessageRef::Type(desc) => Ok(self
                .pool
                .get_message_by_name(desc.full_name())
                .unwrap_or_else(|| desc.clone())),
        }
    }

    pub fn resolve_enum(&self, name: &str) -> Result<EnumDescriptor, LookupError> {
        self.pool
            .get_enum_by_name(normalize_type_name(name))
            .ok_or_else(|| LookupError::EnumNotFound(name.to_owned()))
    }

    /// Resolve `field` on the message type named `message`.
    pub fn resolve_field(&self, message: &str, field: &str) -> Result<ResolvedField, LookupError> {
        resolve_field(&self.resolve_message(message)?, field)
    }

    /// Fully-qualified names of every message type in the pool, sorted.
    /// Synthesized map entry types are skipped.
    pub fn message_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .pool
            .all_messages()
            .filter(|desc| !desc.is_map_entry())
            .map(|desc| desc.full_name().to_owned())
            .collect();
        names.sort();
        names
    }
}

fn normalize_type_name(name: &str) -> &str {
    let name = name.rsplit('/').next().unwrap_or(name);
    name.strip_prefix('.').unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::normalize_type_name;

    #[test]
    fn normalize_strips_prefixes() {
        assert_eq!(normalize_type_name("pkg.Msg"), "pkg.Msg");
        assert_eq!(normalize_type_name(".pkg.Msg"), "pkg.Msg");
        assert_eq!(
            normalize_type_name("type.googleapis.com/pkg.Msg"),
            "pkg.Msg"
        );
    }
}
