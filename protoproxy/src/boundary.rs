//! Call-boundary conventions for functions that return or take messages.

use prost_reflect::{DynamicMessage, MessageDescriptor, ReflectMessage};

use crate::error::{Error, Result};
use crate::handle::SharedMessage;
use crate::message::MessageProxy;
use crate::value::HostValue;

/// A message handed back by a native function.
pub enum NativeReturn {
    /// Returned by value; the caller gets an owning proxy.
    Value(DynamicMessage),
    /// A reference to a long-lived message; the caller gets an aliasing proxy.
    Reference(SharedMessage),
    /// Same as `Reference` for ownership purposes.
    Pointer(SharedMessage),
    /// An exclusive handle whose ownership moves into the proxy.
    Unique(Box<DynamicMessage>),
}

impl NativeReturn {
    pub fn into_proxy(self) -> MessageProxy {
        match self {
            NativeReturn::Value(message) => MessageProxy::from_message(message),
            NativeReturn::Reference(shared) | NativeReturn::Pointer(shared) => {
                MessageProxy::alias(shared)
            }
            NativeReturn::Unique(boxed) => MessageProxy::from_message(*boxed),
        }
    }
}

/// The message type a parameter accepts.
#[derive(Debug, Clone)]
pub enum Expected {
    Exact(MessageDescriptor),
    /// Any message type.
    Abstract,
}

impl Expected {
    fn check(&self, name: &str, value: &HostValue) -> Result<()> {
        match self {
            Expected::Exact(desc) if desc.full_name() != name => Err(Error::type_mismatch(
                format!("message {}", desc.full_name()),
                value.type_name(),
            )),
            _ => Ok(()),
        }
    }
}

/// Whether a parameter may receive a copy of a native message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Native messages are copied in; the callee's changes are not seen by
    /// the caller.
    Convert,
    /// Only wrapped messages are accepted, so the callee mutates the
    /// caller's message in place.
    NoConvert,
}

/// A message argument bound for a call.
#[derive(Debug)]
pub enum MessageArg {
    Wrapped(MessageProxy),
    Copied(DynamicMessage),
}

impl MessageArg {
    /// A proxy the callee can read and mutate. For copied arguments this
    /// owns the copy.
    pub fn into_proxy(self) -> MessageProxy {
        match self {
            MessageArg::Wrapped(proxy) => proxy,
            MessageArg::Copied(message) => MessageProxy::from_message(message),
        }
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self, MessageArg::Wrapped(_))
    }
}

/// Bind `value` to a message parameter.
pub fn bind_message(value: &HostValue, expected: &Expected, conversion: Conversion) -> Result<MessageArg> {
    match value {
        HostValue::Message(proxy) => {
            expected.check(proxy.full_name(), value)?;
            Ok(MessageArg::Wrapped(proxy.clone()))
        }
        HostValue::Native(message) => {
            if conversion == Conversion::NoConvert {
                return Err(Error::type_mismatch("wrapped message", value.type_name()));
            }
            expected.check(message.descriptor().full_name(), value)?;
            log::debug!("copying native {} in", message.descriptor().full_name());
            Ok(MessageArg::Copied(message.clone()))
        }
        other => Err(Error::NotAMessage(other.type_name())),
    }
}
