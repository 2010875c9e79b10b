use thiserror::Error;

/// A failed name lookup in a descriptor pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("message type {0:?} not found")]
    MessageNotFound(String),

    #[error("enum type {0:?} not found")]
    EnumNotFound(String),

    #[error("{message} has no field named {field:?}")]
    FieldNotFound { message: String, field: String },
}

/// Errors from loading a descriptor set.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid descriptor set: {0}")]
    Descriptor(#[from] prost_reflect::DescriptorError),
}
