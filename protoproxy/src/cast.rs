//! Conversion between wrapped and native message representations.

use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor, ReflectMessage};
use prost_types::Any;
use protoproxy_schema::DescriptorBridge;

use crate::convert;
use crate::error::{Error, Result};
use crate::message::MessageProxy;
use crate::value::HostValue;

const TYPE_URL_PREFIX: &str = "type.googleapis.com/";

/// What a host value is, as far as messages are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    WrappedMessage,
    NativeMessageInstance,
    NativeMessageType,
    TypeNameString,
    NotAProto,
}

pub fn classify(value: &HostValue) -> Classification {
    match value {
        HostValue::Message(_) => Classification::WrappedMessage,
        HostValue::Native(_) => Classification::NativeMessageInstance,
        HostValue::NativeType(_) => Classification::NativeMessageType,
        HostValue::Str(_) => Classification::TypeNameString,
        _ => Classification::NotAProto,
    }
}

/// True only for proxy-backed messages.
pub fn is_wrapped(value: &HostValue) -> bool {
    classify(value) == Classification::WrappedMessage
}

/// Turn `value` into a wrapped message.
///
/// Wrapped messages are returned as-is; native instances are copied into a
/// new owning proxy; types and type names produce an empty message.
pub fn make_wrapped(bridge: &DescriptorBridge, value: HostValue) -> Result<MessageProxy> {
    match value {
        HostValue::Message(proxy) => Ok(proxy),
        HostValue::Native(message) => Ok(wrap_native(message)),
        HostValue::NativeType(desc) => wrap_type(bridge, &desc),
        HostValue::Str(name) => wrap_type_name(bridge, &name),
        other => Err(Error::type_mismatch(
            "protobuf message, message type or type name",
            other.type_name(),
        )),
    }
}

fn wrap_native(message: DynamicMessage) -> MessageProxy {
    log::debug!("copying native {} into a wrapped message", message.descriptor().full_name());
    MessageProxy::from_message(message)
}

fn wrap_type(bridge: &DescriptorBridge, desc: &MessageDescriptor) -> Result<MessageProxy> {
    Ok(MessageProxy::new(bridge.resolve_message(desc)?))
}

fn wrap_type_name(bridge: &DescriptorBridge, name: &str) -> Result<MessageProxy> {
    Ok(MessageProxy::new(bridge.resolve_message(name)?))
}

/// Type name of a wrapped or native message instance.
pub fn full_name(value: &HostValue) -> Option<String> {
    match value {
        HostValue::Message(proxy) => Some(proxy.full_name().to_owned()),
        HostValue::Native(message) => Some(message.descriptor().full_name().to_owned()),
        _ => None,
    }
}

/// Whether `value` is a message instance of type `expected`.
pub fn check_type(value: &HostValue, expected: &str) -> bool {
    full_name(value).is_some_and(|name| name == expected)
}

/// Wire encoding of a wrapped or native message.
pub fn serialize(value: &HostValue) -> Result<Vec<u8>> {
    match value {
        HostValue::Message(proxy) => proxy.serialize(),
        HostValue::Native(message) => Ok(message.encode_to_vec()),
        other => Err(Error::NotAMessage(other.type_name())),
    }
}

/// A native copy of a wrapped or native message, optionally required to be
/// of type `expected`.
pub fn allocate_and_copy(
    value: &HostValue,
    expected: Option<&MessageDescriptor>,
) -> Result<DynamicMessage> {
    if full_name(value).is_none() {
        return Err(Error::NotAMessage(value.type_name()));
    }
    convert::message_to_native(value, expected)
}

/// Pack a wrapped or native message into `google.protobuf.Any`.
pub fn pack_any(value: &HostValue) -> Result<Any> {
    let name = full_name(value).ok_or_else(|| Error::NotAMessage(value.type_name()))?;
    Ok(Any {
        type_url: format!("{TYPE_URL_PREFIX}{name}"),
        value: serialize(value)?,
    })
}
