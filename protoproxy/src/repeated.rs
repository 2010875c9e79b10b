//! Repeated field proxies.

use std::fmt;

use prost_reflect::{DynamicMessage, Value};
use protoproxy_schema::{ElementType, ResolvedField};

use crate::convert;
use crate::error::{Error, Result};
use crate::handle::Slot;
use crate::message::MessageProxy;
use crate::text;
use crate::value::HostValue;

/// A sequence view over one repeated field of a message.
///
/// The view holds no elements of its own; every call reads or writes the
/// parent message.
#[derive(Clone)]
pub struct RepeatedFieldProxy {
    parent: MessageProxy,
    field: ResolvedField,
}

impl RepeatedFieldProxy {
    pub(crate) fn new(parent: &MessageProxy, field: ResolvedField) -> Self {
        Self {
            parent: parent.clone(),
            field,
        }
    }

    pub fn parent(&self) -> &MessageProxy {
        &self.parent
    }

    pub fn field_name(&self) -> &str {
        self.field.name()
    }

    pub fn element_type(&self) -> &ElementType {
        self.field.kind.element()
    }

    fn read_list<R>(&self, f: impl FnOnce(&[Value]) -> Result<R>) -> Result<R> {
        let field = &self.field.descriptor;
        self.parent.with_message(|m| {
            let value = m.get_field(field);
            match value.as_list() {
                Some(list) => f(list),
                None => Err(Error::type_mismatch("repeated field", field.full_name())),
            }
        })
    }

    fn with_list<R>(&self, f: impl FnOnce(&mut Vec<Value>) -> Result<R>) -> Result<R> {
        let field = &self.field.descriptor;
        self.parent.with_message_mut(|m| match m.get_field_mut(field).as_list_mut() {
            Some(list) => f(list),
            None => Err(Error::type_mismatch("repeated field", field.full_name())),
        })
    }

    fn element_view(&self, index: usize, value: &Value, generation: u64) -> HostValue {
        match (self.element_type(), value) {
            (ElementType::Message(desc), Value::Message(_)) => HostValue::Message(MessageProxy::borrowed(
                &self.parent,
                Slot::Element(self.field.descriptor.clone(), index, generation),
                desc.clone(),
            )),
            _ => convert::to_host(value),
        }
    }

    /// Message element views taken before this call go stale.
    fn restructured(&self) {
        if self.element_type().is_message() {
            self.parent.root().bump_generation();
        }
    }

    fn convert(&self, value: &HostValue) -> Result<Value> {
        convert::to_native(self.element_type(), value)
    }

    pub fn len(&self) -> Result<usize> {
        self.read_list(|list| Ok(list.len()))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Element `index`. Message elements come back as views into the slot,
    /// valid until the list is restructured by `insert`, `delete` or `clear`.
    pub fn get(&self, index: usize) -> Result<HostValue> {
        let generation = self.parent.root().generation();
        self.read_list(|list| {
            let len = list.len();
            list.get(index)
                .map(|value| self.element_view(index, value, generation))
                .ok_or(Error::IndexOutOfRange { index, len })
        })
    }

    /// Overwrite element `index`. Messages are copied into the slot.
    pub fn set(&self, index: usize, value: impl Into<HostValue>) -> Result<()> {
        let value = self.convert(&value.into())?;
        self.with_list(|list| {
            let len = list.len();
            match list.get_mut(index) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(Error::IndexOutOfRange { index, len }),
            }
        })
    }

    pub fn append(&self, value: impl Into<HostValue>) -> Result<()> {
        let value = self.convert(&value.into())?;
        self.with_list(|list| {
            list.push(value);
            Ok(())
        })
    }

    /// Insert before `index`; `index == len` appends.
    pub fn insert(&self, index: usize, value: impl Into<HostValue>) -> Result<()> {
        let value = self.convert(&value.into())?;
        let shifted = self.with_list(|list| {
            let len = list.len();
            if index > len {
                return Err(Error::IndexOutOfRange { index, len });
            }
            list.insert(index, value);
            Ok(index < len)
        })?;
        if shifted {
            self.restructured();
        }
        Ok(())
    }

    /// Append every value in order. Nothing is appended if any value is
    /// rejected.
    pub fn extend<I>(&self, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<HostValue>,
    {
        let converted = values
            .into_iter()
            .map(|v| self.convert(&v.into()))
            .collect::<Result<Vec<_>>>()?;
        self.with_list(|list| {
            list.extend(converted);
            Ok(())
        })
    }

    /// Append the elements of a host list or of another repeated field.
    pub fn extend_from(&self, values: &HostValue) -> Result<()> {
        match values {
            HostValue::List(items) => self.extend(items.iter().cloned()),
            HostValue::Repeated(other) => self.extend(other.to_vec()?),
            other => Err(Error::type_mismatch("sequence", other.type_name())),
        }
    }

    /// Remove element `index`, shifting later elements down. Outstanding
    /// message element views go stale.
    pub fn delete(&self, index: usize) -> Result<()> {
        let is_message = self.element_type().is_message();
        self.with_list(|list| {
            let len = list.len();
            if index >= len {
                return Err(Error::IndexOutOfRange { index, len });
            }
            if is_message {
                log::debug!(
                    "removing message element {index} of {}, shifting {} trailing elements",
                    self.field.descriptor.full_name(),
                    len - index - 1
                );
            }
            list.remove(index);
            Ok(())
        })?;
        self.restructured();
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.with_list(|list| {
            list.clear();
            Ok(())
        })?;
        self.restructured();
        Ok(())
    }

    /// Append an empty message element and return a view of it.
    pub fn add_default(&self) -> Result<MessageProxy> {
        let ElementType::Message(desc) = self.element_type() else {
            return Err(Error::Unsupported(format!(
                "add_default on {} elements",
                self.element_type()
            )));
        };
        let index = self.with_list(|list| {
            list.push(Value::Message(DynamicMessage::new(desc.clone())));
            Ok(list.len() - 1)
        })?;
        Ok(MessageProxy::borrowed(
            &self.parent,
            Slot::Element(
                self.field.descriptor.clone(),
                index,
                self.parent.root().generation(),
            ),
            desc.clone(),
        ))
    }

    /// All elements, in order.
    pub fn to_vec(&self) -> Result<Vec<HostValue>> {
        let generation = self.parent.root().generation();
        self.read_list(|list| {
            Ok(list
                .iter()
                .enumerate()
                .map(|(i, v)| self.element_view(i, v, generation))
                .collect())
        })
    }

    /// A lazy iterator reading one element per step. Each call starts over.
    pub fn iter(&self) -> Iter {
        Iter {
            proxy: self.clone(),
            next: 0,
        }
    }
}

pub struct Iter {
    proxy: RepeatedFieldProxy,
    next: usize,
}

impl Iterator for Iter {
    type Item = Result<HostValue>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.proxy.len() {
            Ok(len) if self.next < len => {
                let item = self.proxy.get(self.next);
                self.next += 1;
                Some(item)
            }
            Ok(_) => None,
            Err(e) => {
                self.next = usize::MAX;
                Some(Err(e))
            }
        }
    }
}

impl<'a> IntoIterator for &'a RepeatedFieldProxy {
    type Item = Result<HostValue>;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        self.iter()
    }
}

impl fmt::Display for RepeatedFieldProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.read_list(|list| Ok(text::list_repr(list, self.element_type()))) {
            Ok(s) => f.write_str(&s),
            Err(e) => write!(f, "<{}: {e}>", self.field_name()),
        }
    }
}

impl fmt::Debug for RepeatedFieldProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepeatedFieldProxy")
            .field("message", &self.parent.full_name())
            .field("field", &self.field_name())
            .finish()
    }
}
