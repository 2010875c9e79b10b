//! Descriptor lookup and field classification for reflective protobuf proxies.
//!
//! This crate is the schema side of `protoproxy`: it resolves message, enum
//! and field descriptors by name (or by descriptor handle) from a
//! [`prost_reflect::DescriptorPool`], and classifies every field into one of
//! the shapes the proxy layer dispatches on (see [`FieldKind`]).

pub mod bridge;
pub mod error;
pub mod fixtures;
pub mod kind;

pub use bridge::{DescriptorBridge, MessageRef, ResolvedField, resolve_field};
pub use error::{LookupError, SchemaError};
pub use kind::{ElementType, FieldKind, ScalarType};

pub use prost_reflect;
