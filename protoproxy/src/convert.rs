//! Conversion between host values and the runtime's typed field storage.

use prost::bytes::Bytes;
use prost_reflect::{DynamicMessage, EnumDescriptor, MapKey, MessageDescriptor, ReflectMessage, Value};
use protoproxy_schema::{ElementType, ScalarType};

use crate::error::{Error, Result};
use crate::value::HostValue;

fn integer(value: &HostValue) -> Option<i128> {
    match value {
        HostValue::Int(i) => Some(*i as i128),
        HostValue::UInt(u) => Some(*u as i128),
        _ => None,
    }
}

fn out_of_range(ty: ScalarType, value: i128) -> Error {
    Error::type_mismatch(ty.name(), format!("int {value} (out of range)"))
}

fn int_as<T: TryFrom<i128>>(ty: ScalarType, value: &HostValue) -> Result<T> {
    let i = integer(value).ok_or_else(|| Error::type_mismatch(ty.name(), value.type_name()))?;
    T::try_from(i).map_err(|_| out_of_range(ty, i))
}

// Infinities and NaN carry over; finite values must fit.
fn float_as_f32(value: &HostValue) -> Result<f32> {
    let f = value
        .as_f64()
        .ok_or_else(|| Error::type_mismatch(ScalarType::Float.name(), value.type_name()))?;
    if f.is_finite() && f.abs() > f64::from(f32::MAX) {
        return Err(Error::type_mismatch(
            ScalarType::Float.name(),
            format!("float {f} (out of range)"),
        ));
    }
    Ok(f as f32)
}

/// Convert `value` for a scalar slot of type `ty`.
///
/// Numbers must fit the slot; float slots also take integers. Bool, string
/// and bytes slots take only their own kind.
pub fn scalar_to_native(ty: ScalarType, value: &HostValue) -> Result<Value> {
    let mismatch = || Error::type_mismatch(ty.name(), value.type_name());
    Ok(match ty {
        ScalarType::Int32 => Value::I32(int_as(ty, value)?),
        ScalarType::Int64 => Value::I64(int_as(ty, value)?),
        ScalarType::UInt32 => Value::U32(int_as(ty, value)?),
        ScalarType::UInt64 => Value::U64(int_as(ty, value)?),
        ScalarType::Float => Value::F32(float_as_f32(value)?),
        ScalarType::Double => Value::F64(value.as_f64().ok_or_else(mismatch)?),
        ScalarType::Bool => Value::Bool(value.as_bool().ok_or_else(mismatch)?),
        ScalarType::String => match value {
            HostValue::Str(s) => Value::String(s.clone()),
            _ => return Err(mismatch()),
        },
        ScalarType::Bytes => match value {
            HostValue::Bytes(b) => Value::Bytes(Bytes::from(b.clone())),
            _ => return Err(mismatch()),
        },
    })
}

/// Convert `value` for an enum slot. Accepts a declared number or a symbolic
/// value of the same enum type.
pub fn enum_to_native(desc: &EnumDescriptor, value: &HostValue) -> Result<Value> {
    let expected = || format!("enum {}", desc.full_name());
    match value {
        HostValue::Enum(symbol) if symbol.parent_enum().full_name() == desc.full_name() => {
            Ok(Value::EnumNumber(symbol.number()))
        }
        HostValue::Int(_) | HostValue::UInt(_) => {
            let declared = integer(value)
                .and_then(|i| i32::try_from(i).ok())
                .filter(|n| desc.get_value(*n).is_some());
            match declared {
                Some(n) => Ok(Value::EnumNumber(n)),
                None => Err(Error::type_mismatch(
                    expected(),
                    format!("undeclared value {value}"),
                )),
            }
        }
        other => Err(Error::type_mismatch(expected(), other.type_name())),
    }
}

/// Copy a wrapped or native message out of `value`.
///
/// With `expected` set the message must be of exactly that type; without it
/// any message type is accepted.
pub fn message_to_native(
    value: &HostValue,
    expected: Option<&MessageDescriptor>,
) -> Result<DynamicMessage> {
    let message = match value {
        HostValue::Message(proxy) => proxy.snapshot()?,
        HostValue::Native(message) => message.clone(),
        other => {
            let expected = match expected {
                Some(desc) => format!("message {}", desc.full_name()),
                None => "message".to_owned(),
            };
            return Err(Error::type_mismatch(expected, other.type_name()));
        }
    };
    if let Some(desc) = expected {
        if message.descriptor().full_name() != desc.full_name() {
            return Err(Error::type_mismatch(
                format!("message {}", desc.full_name()),
                value.type_name(),
            ));
        }
    }
    Ok(message)
}

/// Convert `value` for a slot holding `element`.
pub fn to_native(element: &ElementType, value: &HostValue) -> Result<Value> {
    match element {
        ElementType::Scalar(ty) => scalar_to_native(*ty, value),
        ElementType::Enum(desc) => enum_to_native(desc, value),
        ElementType::Message(desc) => message_to_native(value, Some(desc)).map(Value::Message),
    }
}

/// Convert `value` to a map key of type `ty`.
pub fn map_key(ty: ScalarType, value: &HostValue) -> Result<MapKey> {
    match scalar_to_native(ty, value)? {
        Value::Bool(b) => Ok(MapKey::Bool(b)),
        Value::I32(i) => Ok(MapKey::I32(i)),
        Value::I64(i) => Ok(MapKey::I64(i)),
        Value::U32(u) => Ok(MapKey::U32(u)),
        Value::U64(u) => Ok(MapKey::U64(u)),
        Value::String(s) => Ok(MapKey::String(s)),
        _ => Err(Error::Unsupported(format!("{ty} map keys"))),
    }
}

/// Convert a stored value to its host form. Enum numbers come back as plain
/// integers and messages as native copies.
pub fn to_host(value: &Value) -> HostValue {
    match value {
        Value::Bool(b) => HostValue::Bool(*b),
        Value::I32(i) => HostValue::Int(i64::from(*i)),
        Value::I64(i) => HostValue::Int(*i),
        Value::U32(u) => HostValue::Int(i64::from(*u)),
        Value::U64(u) => HostValue::from(*u),
        Value::F32(f) => HostValue::Float(f64::from(*f)),
        Value::F64(f) => HostValue::Float(*f),
        Value::String(s) => HostValue::Str(s.clone()),
        Value::Bytes(b) => HostValue::Bytes(b.to_vec()),
        Value::EnumNumber(n) => HostValue::Int(i64::from(*n)),
        Value::Message(m) => HostValue::Native(m.clone()),
        Value::List(items) => HostValue::List(items.iter().map(to_host).collect()),
        Value::Map(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            HostValue::Dict(
                entries
                    .into_iter()
                    .map(|(k, v)| (key_to_host(k), to_host(v)))
                    .collect(),
            )
        }
    }
}

pub fn key_to_host(key: &MapKey) -> HostValue {
    match key {
        MapKey::Bool(b) => HostValue::Bool(*b),
        MapKey::I32(i) => HostValue::Int(i64::from(*i)),
        MapKey::I64(i) => HostValue::Int(*i),
        MapKey::U32(u) => HostValue::Int(i64::from(*u)),
        MapKey::U64(u) => HostValue::from(*u),
        MapKey::String(s) => HostValue::Str(s.clone()),
    }
}
