//! Host-side values.

use std::fmt;

use prost_reflect::{DynamicMessage, EnumValueDescriptor, MessageDescriptor, ReflectMessage};

use crate::error::{Error, Result};
use crate::map::MapFieldProxy;
use crate::message::MessageProxy;
use crate::repeated::RepeatedFieldProxy;
use crate::text;

/// A value as seen by the dynamic host caller.
///
/// Scalars are plain values. `Message`, `Repeated` and `Map` are proxies that
/// forward to storage owned by the message graph; `Native` is a message the
/// host owns outright and that is only ever copied across the boundary.
#[derive(Debug, Clone)]
pub enum HostValue {
    None,
    Bool(bool),
    Int(i64),
    /// Unsigned integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// A symbolic enum value.
    Enum(EnumValueDescriptor),
    List(Vec<HostValue>),
    Dict(Vec<(HostValue, HostValue)>),
    /// A wrapped (proxy-backed) message.
    Message(MessageProxy),
    /// A native message instance.
    Native(DynamicMessage),
    /// A native message type.
    NativeType(MessageDescriptor),
    Repeated(RepeatedFieldProxy),
    Map(MapFieldProxy),
}

impl HostValue {
    /// Name of the value's kind, for error messages.
    pub fn type_name(&self) -> String {
        match self {
            HostValue::None => "None".into(),
            HostValue::Bool(_) => "bool".into(),
            HostValue::Int(_) | HostValue::UInt(_) => "int".into(),
            HostValue::Float(_) => "float".into(),
            HostValue::Str(_) => "str".into(),
            HostValue::Bytes(_) => "bytes".into(),
            HostValue::Enum(v) => format!("enum {}", v.parent_enum().full_name()),
            HostValue::List(_) => "list".into(),
            HostValue::Dict(_) => "dict".into(),
            HostValue::Message(p) => format!("wrapped message {}", p.full_name()),
            HostValue::Native(m) => format!("native message {}", m.descriptor().full_name()),
            HostValue::NativeType(d) => format!("message type {}", d.full_name()),
            HostValue::Repeated(_) => "repeated field".into(),
            HostValue::Map(_) => "map field".into(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, HostValue::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HostValue::Int(i) => Some(*i),
            HostValue::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            HostValue::Int(i) => u64::try_from(*i).ok(),
            HostValue::UInt(u) => Some(*u),
            _ => None,
        }
    }

    /// Any numeric value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Float(f) => Some(*f),
            HostValue::Int(i) => Some(*i as f64),
            HostValue::UInt(u) => Some(*u as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            HostValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&MessageProxy> {
        match self {
            HostValue::Message(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_repeated(&self) -> Option<&RepeatedFieldProxy> {
        match self {
            HostValue::Repeated(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapFieldProxy> {
        match self {
            HostValue::Map(p) => Some(p),
            _ => None,
        }
    }
}

fn integer(value: &HostValue) -> Option<i128> {
    match value {
        HostValue::Int(i) => Some(*i as i128),
        HostValue::UInt(u) => Some(*u as i128),
        _ => None,
    }
}

fn message_content(value: &HostValue) -> Option<DynamicMessage> {
    match value {
        HostValue::Message(p) => p.snapshot().ok(),
        HostValue::Native(m) => Some(m.clone()),
        _ => None,
    }
}

/// Numbers compare by value across `Int`, `UInt` and `Float`; enum symbols
/// compare equal to their number; wrapped and native messages compare by
/// content.
impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        use HostValue::*;
        match (self, other) {
            (None, None) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(_) | UInt(_), Int(_) | UInt(_)) => integer(self) == integer(other),
            (Float(a), Float(b)) => a == b,
            (Float(a), Int(_) | UInt(_)) | (Int(_) | UInt(_), Float(a)) => {
                let i = integer(self).or(integer(other));
                i.is_some_and(|i| i as f64 == *a)
            }
            (Enum(a), Enum(b)) => {
                a.number() == b.number() && a.parent_enum().full_name() == b.parent_enum().full_name()
            }
            (Enum(e), Int(_) | UInt(_)) | (Int(_) | UInt(_), Enum(e)) => {
                integer(self).or(integer(other)) == Some(e.number() as i128)
            }
            (Str(a), Str(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Dict(a), Dict(b)) => a == b,
            (NativeType(a), NativeType(b)) => a.full_name() == b.full_name(),
            (Message(_) | Native(_), Message(_) | Native(_)) => {
                match (message_content(self), message_content(other)) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            (Repeated(a), Repeated(b)) => match (a.to_vec(), b.to_vec()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            },
            (Map(a), Map(b)) => match (a.items(), b.items()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            },
            _ => false,
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::None => f.write_str("None"),
            HostValue::Bool(b) => write!(f, "{b}"),
            HostValue::Int(i) => write!(f, "{i}"),
            HostValue::UInt(u) => write!(f, "{u}"),
            HostValue::Float(v) => write!(f, "{v}"),
            HostValue::Str(s) => f.write_str(&text::quote_str(s)),
            HostValue::Bytes(b) => f.write_str(&text::quote_bytes(b)),
            HostValue::Enum(v) => f.write_str(v.name()),
            HostValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            HostValue::Dict(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            HostValue::Message(p) => write!(f, "{p}"),
            HostValue::Native(m) => f.write_str(&m.to_text_format()),
            HostValue::NativeType(d) => write!(f, "<message type {}>", d.full_name()),
            HostValue::Repeated(p) => write!(f, "{p}"),
            HostValue::Map(p) => write!(f, "{p}"),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for HostValue {
                fn from(v: $ty) -> Self {
                    HostValue::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Str,
    &str => Str,
    Vec<u8> => Bytes,
    &[u8] => Bytes,
    EnumValueDescriptor => Enum,
    Vec<HostValue> => List,
    MessageProxy => Message,
    DynamicMessage => Native,
    MessageDescriptor => NativeType,
    RepeatedFieldProxy => Repeated,
    MapFieldProxy => Map,
}

impl From<u64> for HostValue {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => HostValue::Int(i),
            Err(_) => HostValue::UInt(v),
        }
    }
}

/// Conversion out of a [`HostValue`], used by the typed getters.
pub trait FromHost: Sized {
    fn from_host(value: HostValue) -> Result<Self>;
}

impl FromHost for HostValue {
    fn from_host(value: HostValue) -> Result<Self> {
        Ok(value)
    }
}

macro_rules! impl_from_host_int {
    ($($ty:ty),*) => {
        $(
            impl FromHost for $ty {
                fn from_host(value: HostValue) -> Result<Self> {
                    integer(&value)
                        .and_then(|i| <$ty>::try_from(i).ok())
                        .ok_or_else(|| Error::type_mismatch(stringify!($ty), value.type_name()))
                }
            }
        )*
    };
}

impl_from_host_int!(i32, i64, u32, u64);

impl FromHost for f64 {
    fn from_host(value: HostValue) -> Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| Error::type_mismatch("f64", value.type_name()))
    }
}

impl FromHost for f32 {
    fn from_host(value: HostValue) -> Result<Self> {
        f64::from_host(value).map(|v| v as f32)
    }
}

impl FromHost for bool {
    fn from_host(value: HostValue) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| Error::type_mismatch("bool", value.type_name()))
    }
}

impl FromHost for String {
    fn from_host(value: HostValue) -> Result<Self> {
        match value {
            HostValue::Str(s) => Ok(s),
            other => Err(Error::type_mismatch("str", other.type_name())),
        }
    }
}

impl FromHost for Vec<u8> {
    fn from_host(value: HostValue) -> Result<Self> {
        match value {
            HostValue::Bytes(b) => Ok(b),
            other => Err(Error::type_mismatch("bytes", other.type_name())),
        }
    }
}

impl FromHost for MessageProxy {
    fn from_host(value: HostValue) -> Result<Self> {
        match value {
            HostValue::Message(p) => Ok(p),
            other => Err(Error::type_mismatch("wrapped message", other.type_name())),
        }
    }
}

impl FromHost for RepeatedFieldProxy {
    fn from_host(value: HostValue) -> Result<Self> {
        match value {
            HostValue::Repeated(p) => Ok(p),
            other => Err(Error::type_mismatch("repeated field", other.type_name())),
        }
    }
}

impl FromHost for MapFieldProxy {
    fn from_host(value: HostValue) -> Result<Self> {
        match value {
            HostValue::Map(p) => Ok(p),
            other => Err(Error::type_mismatch("map field", other.type_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HostValue;

    #[test]
    fn numeric_equality_crosses_kinds() {
        assert_eq!(HostValue::Int(5), HostValue::UInt(5));
        assert_eq!(HostValue::Int(2), HostValue::Float(2.0));
        assert_ne!(HostValue::Int(2), HostValue::Float(2.5));
        assert_ne!(HostValue::Int(1), HostValue::Bool(true));
    }

    #[test]
    fn large_unsigned_stays_unsigned() {
        assert_eq!(HostValue::from(u64::MAX), HostValue::UInt(u64::MAX));
        assert_eq!(HostValue::from(7u64), HostValue::Int(7));
    }

    #[test]
    fn display_scalars() {
        assert_eq!(HostValue::from("k1").to_string(), "'k1'");
        assert_eq!(
            HostValue::List(vec![1.into(), 2.into()]).to_string(),
            "[1, 2]"
        );
    }
}
