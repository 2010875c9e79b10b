use protoproxy_schema::LookupError;
use thiserror::Error;

/// The host exception family an [`Error`] maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown attribute or forbidden attribute assignment.
    Attribute,
    /// Wrong value kind, wrong message type or not a message at all.
    Type,
    Index,
    Key,
    /// Unknown type name.
    Lookup,
    Unsupported,
    /// Malformed input bytes.
    Value,
    Runtime,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("{message} has no field named {field:?}")]
    FieldNotFound { message: String, field: String },

    #[error("cannot assign to {category} field {field:?} of {message}; mutate it in place")]
    InvalidFieldAssignment {
        message: String,
        field: String,
        category: &'static str,
    },

    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("expected a protobuf message, got {0}")]
    NotAMessage(String),

    #[error("type {0:?} not found")]
    TypeNotFound(String),

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("key {0} not found")]
    KeyNotFound(String),

    #[error("failed to decode {type_name}: {reason}")]
    Decode { type_name: String, reason: String },

    #[error("message {0} is already borrowed by an operation in progress")]
    Reentrant(String),

    #[error("view of element {index} of {field} is stale; the list was restructured")]
    StaleElement { field: String, index: usize },
}

impl Error {
    pub(crate) fn type_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FieldNotFound { .. } | Error::InvalidFieldAssignment { .. } => {
                ErrorKind::Attribute
            }
            Error::TypeMismatch { .. } | Error::NotAMessage(_) => ErrorKind::Type,
            Error::Unsupported(_) => ErrorKind::Unsupported,
            Error::TypeNotFound(_) => ErrorKind::Lookup,
            Error::IndexOutOfRange { .. } => ErrorKind::Index,
            Error::KeyNotFound(_) => ErrorKind::Key,
            Error::Decode { .. } => ErrorKind::Value,
            Error::Reentrant(_) | Error::StaleElement { .. } => ErrorKind::Runtime,
        }
    }
}

impl From<LookupError> for Error {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::MessageNotFound(name) | LookupError::EnumNotFound(name) => {
                Error::TypeNotFound(name)
            }
            LookupError::FieldNotFound { message, field } => Error::FieldNotFound { message, field },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
