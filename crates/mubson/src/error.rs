//! Error types for document operations.

use std::fmt;

/// Error type for document operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    // Buffer validation errors
    /// Buffer is too small to contain a document (`int32` size + terminator).
    DocumentTooSmall,
    /// Declared document size does not match the available bytes.
    SizeMismatch { declared: i32, available: usize },
    /// Document region does not end with the 0x00 terminator.
    MissingTerminator,
    /// Element data runs past the end of its document region.
    TruncatedElement,
    /// Unknown element type byte.
    InvalidTypeByte(u8),
    /// Field name has no NUL terminator inside its document region.
    UnterminatedName,
    /// Field name is not valid UTF-8.
    InvalidFieldName,
    /// String payload has a bad length or is not NUL-terminated UTF-8.
    InvalidString,
    /// Documents are nested deeper than the supported limit.
    NestingTooDeep,

    // Topology errors
    /// Attempted to attach an element that still has a left sibling.
    DanglingLeftSibling,
    /// Attempted to attach an element that still has a right sibling.
    DanglingRightSibling,
    /// Attempted to attach an element that still has a parent.
    DanglingParent,
    /// Attempted to attach the root as a child.
    CannotAttachRoot,
    /// Attempted to add a sibling to an element without a parent.
    SiblingOfParentless,
    /// Attempted to remove an element without a parent.
    RemoveParentless,
    /// Attempted to rename the root.
    RenameRoot,
    /// Attempted to add a child to a non-container element.
    AddChildToLeaf,
    /// Attempted to replace the root's value.
    SetValueRoot,
    /// Attempted to set a value from the document terminator byte.
    SetTerminator,

    // JSON bridge errors
    /// Failed to parse JSON input.
    JsonParse(String),
    /// Failed to serialize to JSON.
    JsonSerialize(String),
    /// f64 is NaN or Infinity (not representable in JSON).
    NonFiniteFloat(f64),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DocumentTooSmall => write!(f, "buffer too small for a document"),
            Error::SizeMismatch {
                declared,
                available,
            } => {
                write!(
                    f,
                    "declared document size {declared} does not fit in {available} bytes"
                )
            }
            Error::MissingTerminator => write!(f, "document region missing terminator"),
            Error::TruncatedElement => write!(f, "element data truncated"),
            Error::InvalidTypeByte(b) => write!(f, "invalid element type byte {b:#04x}"),
            Error::UnterminatedName => write!(f, "field name missing NUL terminator"),
            Error::InvalidFieldName => write!(f, "field name is not valid UTF-8"),
            Error::InvalidString => write!(f, "invalid string payload"),
            Error::NestingTooDeep => write!(f, "document nesting too deep"),
            Error::DanglingLeftSibling => write!(f, "dangling left sibling"),
            Error::DanglingRightSibling => write!(f, "dangling right sibling"),
            Error::DanglingParent => write!(f, "dangling parent"),
            Error::CannotAttachRoot => write!(f, "cannot add the root as a child"),
            Error::SiblingOfParentless => {
                write!(f, "attempt to add a sibling to an element without a parent")
            }
            Error::RemoveParentless => write!(f, "trying to remove a parentless element"),
            Error::RenameRoot => write!(f, "invalid attempt to rename the root element"),
            Error::AddChildToLeaf => {
                write!(f, "attempt to add a child to a non-container element")
            }
            Error::SetValueRoot => write!(f, "cannot set a value on the root element"),
            Error::SetTerminator => write!(f, "cannot set a value to the terminator byte"),
            Error::JsonParse(msg) => write!(f, "JSON parse error: {msg}"),
            Error::JsonSerialize(msg) => write!(f, "JSON serialize error: {msg}"),
            Error::NonFiniteFloat(n) => {
                write!(f, "cannot encode non-finite float {n} as JSON")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, Error>;
