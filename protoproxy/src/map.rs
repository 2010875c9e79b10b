//! Map field proxies.

use std::collections::HashMap;
use std::fmt;

use prost_reflect::{MapKey, Value};
use protoproxy_schema::{ElementType, FieldKind, ResolvedField, ScalarType};

use crate::convert;
use crate::error::{Error, Result};
use crate::handle::{Slot, map_value_default};
use crate::message::MessageProxy;
use crate::text;
use crate::value::HostValue;

/// A mapping view over one map field of a message.
#[derive(Clone)]
pub struct MapFieldProxy {
    parent: MessageProxy,
    field: ResolvedField,
    key_type: ScalarType,
    value_type: ElementType,
    default: Value,
}

impl MapFieldProxy {
    pub(crate) fn new(parent: &MessageProxy, field: ResolvedField) -> Result<Self> {
        let (key_type, value_type) = match &field.kind {
            FieldKind::Map { key, value } => (*key, value.clone()),
            kind => return Err(Error::type_mismatch("map field", kind.to_string())),
        };
        let default = map_value_default(&field.descriptor)
            .ok_or_else(|| Error::type_mismatch("map field", field.kind.to_string()))?;
        Ok(Self {
            parent: parent.clone(),
            field,
            key_type,
            value_type,
            default,
        })
    }

    pub fn parent(&self) -> &MessageProxy {
        &self.parent
    }

    pub fn field_name(&self) -> &str {
        self.field.name()
    }

    pub fn key_type(&self) -> ScalarType {
        self.key_type
    }

    pub fn value_type(&self) -> &ElementType {
        &self.value_type
    }

    fn read_map<R>(&self, f: impl FnOnce(&HashMap<MapKey, Value>) -> Result<R>) -> Result<R> {
        let field = &self.field.descriptor;
        self.parent.with_message(|m| {
            let value = m.get_field(field);
            match value.as_map() {
                Some(map) => f(map),
                None => Err(Error::type_mismatch("map field", field.full_name())),
            }
        })
    }

    fn with_map<R>(&self, f: impl FnOnce(&mut HashMap<MapKey, Value>) -> Result<R>) -> Result<R> {
        let field = &self.field.descriptor;
        self.parent.with_message_mut(|m| match m.get_field_mut(field).as_map_mut() {
            Some(map) => f(map),
            None => Err(Error::type_mismatch("map field", field.full_name())),
        })
    }

    fn key(&self, key: impl Into<HostValue>) -> Result<MapKey> {
        convert::map_key(self.key_type, &key.into())
    }

    fn value_view(&self, key: &MapKey, value: &Value) -> HostValue {
        match &self.value_type {
            ElementType::Message(desc) => HostValue::Message(MessageProxy::borrowed(
                &self.parent,
                Slot::MapValue(self.field.descriptor.clone(), key.clone()),
                desc.clone(),
            )),
            _ => convert::to_host(value),
        }
    }

    /// The value under `key`, inserting the default value first if the key
    /// is absent. Message values come back as views into the entry.
    pub fn get_or_create(&self, key: impl Into<HostValue>) -> Result<HostValue> {
        let key = self.key(key)?;
        self.with_map(|map| {
            let value = map.entry(key.clone()).or_insert_with(|| {
                log::debug!(
                    "creating entry {} in {}",
                    convert::key_to_host(&key),
                    self.field.descriptor.full_name()
                );
                self.default.clone()
            });
            Ok(self.value_view(&key, value))
        })
    }

    /// The value under `key` without creating it.
    pub fn get(&self, key: impl Into<HostValue>) -> Result<Option<HostValue>> {
        let key = self.key(key)?;
        self.read_map(|map| Ok(map.get(&key).map(|value| self.value_view(&key, value))))
    }

    /// Store `value` under `key`. Only scalar- and enum-valued maps can be
    /// assigned; message values are mutated through [`get_or_create`].
    ///
    /// [`get_or_create`]: Self::get_or_create
    pub fn set(&self, key: impl Into<HostValue>, value: impl Into<HostValue>) -> Result<()> {
        if self.value_type.is_message() {
            return Err(Error::InvalidFieldAssignment {
                message: self.parent.full_name().to_owned(),
                field: self.field_name().to_owned(),
                category: "message-valued map",
            });
        }
        let key = self.key(key)?;
        let value = convert::to_native(&self.value_type, &value.into())?;
        self.with_map(|map| {
            map.insert(key, value);
            Ok(())
        })
    }

    pub fn contains(&self, key: impl Into<HostValue>) -> Result<bool> {
        let key = self.key(key)?;
        self.read_map(|map| Ok(map.contains_key(&key)))
    }

    pub fn delete(&self, key: impl Into<HostValue>) -> Result<()> {
        let key = self.key(key)?;
        self.with_map(|map| match map.remove(&key) {
            Some(_) => Ok(()),
            None => Err(Error::KeyNotFound(convert::key_to_host(&key).to_string())),
        })
    }

    pub fn clear(&self) -> Result<()> {
        self.with_map(|map| {
            map.clear();
            Ok(())
        })
    }

    pub fn len(&self) -> Result<usize> {
        self.read_map(|map| Ok(map.len()))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Keys in key order.
    pub fn keys(&self) -> Result<Vec<HostValue>> {
        self.read_map(|map| {
            let mut keys: Vec<&MapKey> = map.keys().collect();
            keys.sort();
            Ok(keys.into_iter().map(convert::key_to_host).collect())
        })
    }

    /// Key/value pairs in key order.
    pub fn items(&self) -> Result<Vec<(HostValue, HostValue)>> {
        self.read_map(|map| {
            let mut entries: Vec<(&MapKey, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Ok(entries
                .into_iter()
                .map(|(k, v)| (convert::key_to_host(k), self.value_view(k, v)))
                .collect())
        })
    }
}

impl fmt::Display for MapFieldProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.read_map(|map| {
            let mut entries: Vec<(&MapKey, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Ok(text::map_repr(entries, &self.value_type))
        });
        match rendered {
            Ok(s) => f.write_str(&s),
            Err(e) => write!(f, "<{}: {e}>", self.field_name()),
        }
    }
}

impl fmt::Debug for MapFieldProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapFieldProxy")
            .field("message", &self.parent.full_name())
            .field("field", &self.field_name())
            .finish()
    }
}
