//! Field shape classification.

use std::fmt;

use prost_reflect::{EnumDescriptor, FieldDescriptor, Kind, MessageDescriptor};

/// Storage type of a scalar field, collapsed over wire encodings
/// (`sint32`, `sfixed32` and `int32` all store an `Int32`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float,
    Double,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    /// Scalar storage type for `kind`, or `None` for enum and message kinds.
    pub fn of(kind: &Kind) -> Option<Self> {
        match kind {
            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => Some(Self::Int32),
            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Some(Self::Int64),
            Kind::Uint32 | Kind::Fixed32 => Some(Self::UInt32),
            Kind::Uint64 | Kind::Fixed64 => Some(Self::UInt64),
            Kind::Float => Some(Self::Float),
            Kind::Double => Some(Self::Double),
            Kind::Bool => Some(Self::Bool),
            Kind::String => Some(Self::String),
            Kind::Bytes => Some(Self::Bytes),
            Kind::Message(_) | Kind::Enum(_) => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type of a single value stored in a field: the field itself when singular,
/// each element when repeated, each value when a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    Scalar(ScalarType),
    Enum(EnumDescriptor),
    Message(MessageDescriptor),
}

impl ElementType {
    pub fn of(kind: Kind) -> Self {
        match kind {
            Kind::Enum(desc) => Self::Enum(desc),
            Kind::Message(desc) => Self::Message(desc),
            other => match ScalarType::of(&other) {
                Some(scalar) => Self::Scalar(scalar),
                None => unreachable!("every non-composite kind has a scalar type"),
            },
        }
    }

    /// Human-readable type name used in error messages.
    pub fn name(&self) -> String {
        match self {
            Self::Scalar(scalar) => scalar.name().to_owned(),
            Self::Enum(desc) => desc.full_name().to_owned(),
            Self::Message(desc) => desc.full_name().to_owned(),
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self, Self::Message(_))
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(scalar) => write!(f, "{scalar}"),
            Self::Enum(desc) => write!(f, "enum {}", desc.full_name()),
            Self::Message(desc) => write!(f, "message {}", desc.full_name()),
        }
    }
}

/// The shape of a declared field.
///
/// Together with [`ElementType`] this distinguishes singular scalar, enum and
/// message fields, repeated scalar, enum and message fields, and maps with a
/// scalar key and a scalar, enum or message value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Singular(ElementType),
    Repeated(ElementType),
    Map {
        key: ScalarType,
        value: ElementType,
    },
}

impl FieldKind {
    pub fn of(field: &FieldDescriptor) -> Self {
        match field.kind() {
            Kind::Message(entry) if field.is_map() => {
                let key = match ScalarType::of(&entry.map_entry_key_field().kind()) {
                    Some(key) => key,
                    None => unreachable!("map keys are always scalar"),
                };
                Self::Map {
                    key,
                    value: ElementType::of(entry.map_entry_value_field().kind()),
                }
            }
            kind if field.is_list() => Self::Repeated(ElementType::of(kind)),
            kind => Self::Singular(ElementType::of(kind)),
        }
    }

    /// Fields that are mutated in place rather than assigned: sub-messages,
    /// repeated fields and maps.
    pub fn is_composite(&self) -> bool {
        !matches!(
            self,
            Self::Singular(ElementType::Scalar(_)) | Self::Singular(ElementType::Enum(_))
        )
    }

    /// The element type: the field type for singular fields, the element type
    /// for repeated fields and the value type for maps.
    pub fn element(&self) -> &ElementType {
        match self {
            Self::Singular(element) | Self::Repeated(element) => element,
            Self::Map { value, .. } => value,
        }
    }

    /// Short category name ("scalar", "enum", "message", "repeated", "map").
    pub fn category(&self) -> &'static str {
        match self {
            Self::Singular(ElementType::Scalar(_)) => "scalar",
            Self::Singular(ElementType::Enum(_)) => "enum",
            Self::Singular(ElementType::Message(_)) => "message",
            Self::Repeated(_) => "repeated",
            Self::Map { .. } => "map",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singular(element) => write!(f, "{element}"),
            Self::Repeated(element) => write!(f, "repeated {element}"),
            Self::Map { key, value } => write!(f, "map<{key}, {value}>"),
        }
    }
}
