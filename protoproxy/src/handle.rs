//! Backing storage of message proxies and the keep-alive tree.
//!
//! A proxy either holds a root message (`Owned` or `Aliased`) or borrows a
//! slot inside its parent. Borrowing proxies keep a strong reference to the
//! parent proxy, so the chain up to the root stays alive for as long as any
//! child view is reachable. Every access walks the chain to the root, borrows
//! it once, and descends through the recorded slots.
//!
//! Reads descend without creating anything: an unset sub-message reads as
//! its default, a missing map entry as [`Error::KeyNotFound`]. Writes create
//! unset sub-messages and map entries on the way down.
//!
//! Element views are stamped with the root's layout generation, which moves
//! whenever message elements shift position. A view stamped with an older
//! generation fails with [`Error::StaleElement`].

use std::borrow::Cow;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use prost_reflect::{DynamicMessage, FieldDescriptor, MapKey, MessageDescriptor, Value};

use crate::convert;
use crate::error::{Error, Result};
use crate::message::MessageProxy;

struct Root {
    message: RefCell<DynamicMessage>,
    generation: Cell<u64>,
}

/// A native message shared between a root proxy and whoever else holds it.
///
/// Clones share the message.
#[derive(Clone)]
pub struct SharedMessage(Rc<Root>);

impl SharedMessage {
    pub fn new(message: DynamicMessage) -> Self {
        SharedMessage(Rc::new(Root {
            message: RefCell::new(message),
            generation: Cell::new(0),
        }))
    }

    /// Borrow the message.
    ///
    /// # Panics
    ///
    /// Panics if the message is mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, DynamicMessage> {
        self.0.message.borrow()
    }

    /// Borrow the message mutably. Changes made here do not invalidate
    /// element views; use proxies to restructure repeated fields.
    ///
    /// # Panics
    ///
    /// Panics if the message is already borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, DynamicMessage> {
        self.0.message.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &SharedMessage) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn generation(&self) -> u64 {
        self.0.generation.get()
    }

    pub(crate) fn bump_generation(&self) {
        self.0.generation.set(self.0.generation.get() + 1);
    }

    fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

/// How a proxy relates to the memory it views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The proxy allocated the message; it is released with the last view.
    Owned,
    /// The proxy views a long-lived message owned elsewhere.
    Aliased,
    /// The proxy views a slot inside its parent.
    Borrowed,
}

/// Location of a sub-message inside its parent message.
#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Field(FieldDescriptor),
    /// Element index and the layout generation the view was taken at.
    Element(FieldDescriptor, usize, u64),
    MapValue(FieldDescriptor, MapKey),
}

impl Slot {
    /// Step from `msg` into this slot for reading.
    fn get<'a>(&self, msg: &'a DynamicMessage) -> Result<Cow<'a, DynamicMessage>> {
        match self {
            Slot::Field(field) => match msg.get_field(field) {
                Cow::Borrowed(Value::Message(sub)) => Ok(Cow::Borrowed(sub)),
                Cow::Owned(Value::Message(sub)) => Ok(Cow::Owned(sub)),
                _ => Err(not_a_message_slot(field)),
            },
            Slot::Element(field, index, _) => match msg.get_field(field) {
                Cow::Borrowed(Value::List(list)) => match list.get(*index) {
                    Some(Value::Message(sub)) => Ok(Cow::Borrowed(sub)),
                    Some(_) => Err(not_a_message_slot(field)),
                    None => Err(Error::IndexOutOfRange {
                        index: *index,
                        len: list.len(),
                    }),
                },
                // unset
                Cow::Owned(Value::List(_)) => Err(Error::IndexOutOfRange {
                    index: *index,
                    len: 0,
                }),
                _ => Err(not_a_message_slot(field)),
            },
            Slot::MapValue(field, key) => match msg.get_field(field) {
                Cow::Borrowed(Value::Map(map)) => match map.get(key) {
                    Some(Value::Message(sub)) => Ok(Cow::Borrowed(sub)),
                    Some(_) => Err(not_a_message_slot(field)),
                    None => Err(missing_key(key)),
                },
                Cow::Owned(Value::Map(_)) => Err(missing_key(key)),
                _ => Err(not_a_message_slot(field)),
            },
        }
    }

    /// Step from `msg` into this slot for writing. Singular fields and map
    /// values are created on demand; elements must already exist.
    fn get_mut<'a>(&self, msg: &'a mut DynamicMessage) -> Result<&'a mut DynamicMessage> {
        match self {
            Slot::Field(field) => match msg.get_field_mut(field) {
                Value::Message(sub) => Ok(sub),
                _ => Err(not_a_message_slot(field)),
            },
            Slot::Element(field, index, _) => {
                let list = msg
                    .get_field_mut(field)
                    .as_list_mut()
                    .ok_or_else(|| not_a_message_slot(field))?;
                let len = list.len();
                match list.get_mut(*index) {
                    Some(Value::Message(sub)) => Ok(sub),
                    Some(_) => Err(not_a_message_slot(field)),
                    None => Err(Error::IndexOutOfRange { index: *index, len }),
                }
            }
            Slot::MapValue(field, key) => {
                let default = map_value_default(field).ok_or_else(|| not_a_message_slot(field))?;
                let map = msg
                    .get_field_mut(field)
                    .as_map_mut()
                    .ok_or_else(|| not_a_message_slot(field))?;
                match map.entry(key.clone()).or_insert(default) {
                    Value::Message(sub) => Ok(sub),
                    _ => Err(not_a_message_slot(field)),
                }
            }
        }
    }

    fn check_generation(&self, current: u64) -> Result<()> {
        match self {
            Slot::Element(field, index, generation) if *generation != current => {
                Err(Error::StaleElement {
                    field: field.full_name().to_owned(),
                    index: *index,
                })
            }
            _ => Ok(()),
        }
    }
}

fn not_a_message_slot(field: &FieldDescriptor) -> Error {
    Error::type_mismatch("message slot", format!("field {}", field.full_name()))
}

fn missing_key(key: &MapKey) -> Error {
    Error::KeyNotFound(convert::key_to_host(key).to_string())
}

/// Default value of a map field's value type, if the field is a map.
pub(crate) fn map_value_default(field: &FieldDescriptor) -> Option<Value> {
    match field.kind() {
        prost_reflect::Kind::Message(entry) if field.is_map() => Some(
            Value::default_value_for_field(&entry.map_entry_value_field()),
        ),
        _ => None,
    }
}

pub(crate) enum Backing {
    Owned(SharedMessage),
    Aliased(SharedMessage),
    Borrowed { parent: MessageProxy, slot: Slot },
}

pub(crate) struct ProxyInner {
    pub(crate) descriptor: MessageDescriptor,
    pub(crate) backing: Backing,
}

impl Drop for ProxyInner {
    fn drop(&mut self) {
        if let Backing::Owned(shared) = &self.backing {
            if shared.strong_count() == 1 {
                log::trace!("last view of owned {} dropped", self.descriptor.full_name());
            }
        }
    }
}

impl MessageProxy {
    pub(crate) fn with_backing(descriptor: MessageDescriptor, backing: Backing) -> Self {
        MessageProxy {
            inner: Rc::new(ProxyInner {
                descriptor,
                backing,
            }),
        }
    }

    /// A proxy over the message stored at `slot` of `parent`.
    pub(crate) fn borrowed(parent: &MessageProxy, slot: Slot, descriptor: MessageDescriptor) -> Self {
        Self::with_backing(
            descriptor,
            Backing::Borrowed {
                parent: parent.clone(),
                slot,
            },
        )
    }

    pub fn ownership(&self) -> Ownership {
        match self.inner.backing {
            Backing::Owned(_) => Ownership::Owned,
            Backing::Aliased(_) => Ownership::Aliased,
            Backing::Borrowed { .. } => Ownership::Borrowed,
        }
    }

    /// The proxy this one borrows from, if any.
    pub fn parent(&self) -> Option<&MessageProxy> {
        match &self.inner.backing {
            Backing::Borrowed { parent, .. } => Some(parent),
            _ => None,
        }
    }

    /// The root storage and the slots leading from it to this proxy,
    /// outermost first.
    fn path(&self) -> (&MessageProxy, &SharedMessage, Vec<&Slot>) {
        let mut path = Vec::new();
        let mut node = self;
        loop {
            match &node.inner.backing {
                Backing::Owned(shared) | Backing::Aliased(shared) => {
                    path.reverse();
                    return (node, shared, path);
                }
                Backing::Borrowed { parent, slot } => {
                    path.push(slot);
                    node = parent;
                }
            }
        }
    }

    pub(crate) fn root(&self) -> &SharedMessage {
        self.path().1
    }

    /// Run `f` on the native message this proxy views, without creating
    /// anything along the way.
    ///
    /// Fails with [`Error::Reentrant`] if the root is mutably borrowed by an
    /// operation in progress on the same message graph.
    pub(crate) fn with_message<R>(&self, f: impl FnOnce(&DynamicMessage) -> Result<R>) -> Result<R> {
        let (root, shared, path) = self.path();
        let current = shared.generation();
        for slot in &path {
            slot.check_generation(current)?;
        }
        let guard = shared
            .0
            .message
            .try_borrow()
            .map_err(|_| Error::Reentrant(root.full_name().to_owned()))?;
        let mut msg: Cow<'_, DynamicMessage> = Cow::Borrowed(&*guard);
        for slot in path {
            msg = match msg {
                Cow::Borrowed(m) => slot.get(m)?,
                Cow::Owned(m) => Cow::Owned(slot.get(&m)?.into_owned()),
            };
        }
        f(&*msg)
    }

    /// Run `f` on the native message this proxy views, creating unset
    /// sub-messages and map entries on the way.
    ///
    /// Fails with [`Error::Reentrant`] if the root is already borrowed by an
    /// operation in progress on the same message graph.
    pub(crate) fn with_message_mut<R>(
        &self,
        f: impl FnOnce(&mut DynamicMessage) -> Result<R>,
    ) -> Result<R> {
        let (root, shared, path) = self.path();
        let current = shared.generation();
        for slot in &path {
            slot.check_generation(current)?;
        }
        let mut guard = shared
            .0
            .message
            .try_borrow_mut()
            .map_err(|_| Error::Reentrant(root.full_name().to_owned()))?;
        let mut msg: &mut DynamicMessage = &mut guard;
        for slot in path {
            msg = slot.get_mut(msg)?;
        }
        f(msg)
    }
}
