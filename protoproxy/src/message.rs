//! Message proxies.

use std::fmt;
use std::rc::Rc;

use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor, ReflectMessage};
use protoproxy_schema::{ElementType, FieldKind, ResolvedField, resolve_field};

use crate::convert;
use crate::error::{Error, Result};
use crate::handle::{Backing, ProxyInner, SharedMessage, Slot};
use crate::map::MapFieldProxy;
use crate::repeated::RepeatedFieldProxy;
use crate::value::{FromHost, HostValue};

/// A view over a native message.
///
/// Cloning a proxy clones the view, not the message: both clones read and
/// write the same storage. Sub-message, repeated and map views obtained from
/// a proxy keep it alive.
#[derive(Clone)]
pub struct MessageProxy {
    pub(crate) inner: Rc<ProxyInner>,
}

impl MessageProxy {
    /// Wrap a fresh, empty message of type `descriptor`.
    pub fn new(descriptor: MessageDescriptor) -> Self {
        Self::from_message(DynamicMessage::new(descriptor))
    }

    /// Take ownership of `message`.
    pub fn from_message(message: DynamicMessage) -> Self {
        let descriptor = message.descriptor();
        Self::with_backing(descriptor, Backing::Owned(SharedMessage::new(message)))
    }

    /// View a message owned elsewhere, such as a process-wide singleton.
    /// Writes through the proxy are visible to every other holder.
    pub fn alias(shared: SharedMessage) -> Self {
        let descriptor = shared.borrow().descriptor();
        Self::with_backing(descriptor, Backing::Aliased(shared))
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.inner.descriptor
    }

    /// Fully-qualified type name of the viewed message.
    pub fn full_name(&self) -> &str {
        self.inner.descriptor.full_name()
    }

    /// Whether both proxies are the same view.
    pub fn ptr_eq(&self, other: &MessageProxy) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Declared field names in field-number order.
    pub fn field_names(&self) -> Vec<String> {
        let mut fields: Vec<_> = self.inner.descriptor.fields().collect();
        fields.sort_by_key(|f| f.number());
        fields.into_iter().map(|f| f.name().to_owned()).collect()
    }

    fn field(&self, name: &str) -> Result<ResolvedField> {
        Ok(resolve_field(&self.inner.descriptor, name)?)
    }

    /// Read field `name`.
    ///
    /// Scalar and enum fields return their value (enums as integers).
    /// Message, repeated and map fields return a view bound to this proxy;
    /// reading a message field marks it present.
    pub fn get_field(&self, name: &str) -> Result<HostValue> {
        let field = self.field(name)?;
        match &field.kind {
            FieldKind::Singular(ElementType::Message(desc)) => {
                let desc = desc.clone();
                self.with_message_mut(|m| {
                    m.get_field_mut(&field.descriptor);
                    Ok(())
                })?;
                Ok(HostValue::Message(MessageProxy::borrowed(
                    self,
                    Slot::Field(field.descriptor),
                    desc,
                )))
            }
            FieldKind::Singular(_) => {
                self.with_message(|m| Ok(convert::to_host(&m.get_field(&field.descriptor))))
            }
            FieldKind::Repeated(_) => Ok(HostValue::Repeated(RepeatedFieldProxy::new(self, field))),
            FieldKind::Map { .. } => Ok(HostValue::Map(MapFieldProxy::new(self, field)?)),
        }
    }

    /// Read field `name` as `T`.
    pub fn get<T: FromHost>(&self, name: &str) -> Result<T> {
        T::from_host(self.get_field(name)?)
    }

    /// The sub-message view of message field `name`.
    pub fn message(&self, name: &str) -> Result<MessageProxy> {
        self.get(name)
    }

    /// The view of repeated field `name`.
    pub fn repeated(&self, name: &str) -> Result<RepeatedFieldProxy> {
        self.get(name)
    }

    /// The view of map field `name`.
    pub fn map(&self, name: &str) -> Result<MapFieldProxy> {
        self.get(name)
    }

    /// Assign a singular scalar or enum field.
    ///
    /// Message, repeated and map fields cannot be assigned; mutate them
    /// through their views instead. A rejected value leaves the field
    /// unchanged.
    pub fn set_field(&self, name: &str, value: impl Into<HostValue>) -> Result<()> {
        let field = self.field(name)?;
        if field.kind.is_composite() {
            return Err(Error::InvalidFieldAssignment {
                message: self.full_name().to_owned(),
                field: name.to_owned(),
                category: field.kind.category(),
            });
        }
        let value = convert::to_native(field.kind.element(), &value.into())?;
        self.with_message_mut(|m| {
            m.try_set_field(&field.descriptor, value)
                .map_err(|e| Error::type_mismatch(field.kind.to_string(), e.to_string()))
        })
    }

    pub fn has_field(&self, name: &str) -> Result<bool> {
        let field = self.field(name)?;
        self.with_message(|m| Ok(m.has_field(&field.descriptor)))
    }

    /// Reset field `name` to its default. Views into the field stay bound and
    /// see the cleared state; element views into a cleared repeated message
    /// field go stale.
    pub fn clear_field(&self, name: &str) -> Result<()> {
        let field = self.field(name)?;
        self.with_message_mut(|m| {
            m.clear_field(&field.descriptor);
            Ok(())
        })?;
        if field.kind.element().is_message() {
            self.root().bump_generation();
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.with_message_mut(|m| {
            m.clear();
            Ok(())
        })?;
        self.root().bump_generation();
        Ok(())
    }

    /// Replace the content of this message with a copy of `source`, which
    /// must be a wrapped or native message of exactly this type.
    pub fn copy_from(&self, source: &HostValue) -> Result<()> {
        let copy = convert::message_to_native(source, Some(&self.inner.descriptor))?;
        self.with_message_mut(|m| {
            *m = copy;
            Ok(())
        })?;
        self.root().bump_generation();
        Ok(())
    }

    /// Wire encoding of the viewed message.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        self.with_message(|m| Ok(m.encode_to_vec()))
    }

    /// Merge the encoded message in `bytes` into this one. On failure the
    /// message is left unchanged.
    pub fn merge_from_bytes(&self, bytes: &[u8]) -> Result<()> {
        let type_name = self.full_name().to_owned();
        self.with_message_mut(|m| {
            let mut merged = m.clone();
            merged.merge(bytes).map_err(|e| Error::Decode {
                type_name,
                reason: e.to_string(),
            })?;
            *m = merged;
            Ok(())
        })
    }

    /// Replace this message with the encoded message in `bytes`.
    pub fn parse_from_bytes(&self, bytes: &[u8]) -> Result<()> {
        let parsed = DynamicMessage::decode(self.inner.descriptor.clone(), bytes).map_err(|e| {
            Error::Decode {
                type_name: self.full_name().to_owned(),
                reason: e.to_string(),
            }
        })?;
        self.with_message_mut(|m| {
            *m = parsed;
            Ok(())
        })?;
        self.root().bump_generation();
        Ok(())
    }

    /// A native copy of the viewed message.
    pub fn snapshot(&self) -> Result<DynamicMessage> {
        self.with_message(|m| Ok(m.clone()))
    }
}

impl fmt::Display for MessageProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.with_message(|m| Ok(m.to_text_format())) {
            Ok(s) => f.write_str(&s),
            Err(e) => write!(f, "<{}: {e}>", self.full_name()),
        }
    }
}

impl fmt::Debug for MessageProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageProxy")
            .field("type", &self.full_name())
            .field("ownership", &self.ownership())
            .finish()
    }
}
