//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`uepak_archive::error::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    Archive(#[from] uepak_archive::error::Error),

    /// a name reference points past the end of the name table
    #[error("name index {0} outside of the name table")]
    InvalidNameIndex(u32),

    /// a stored count or offset that cannot be valid
    #[error("invalid {context}: {value}")]
    InvalidLength { context: &'static str, value: i64 },

    /// a property value ran past its declared size
    #[error("property {name} consumed {consumed} bytes but declared {declared}")]
    #[diagnostic(help("the stream is no longer aligned to property boundaries"))]
    Overconsumed {
        name: String,
        declared: i32,
        consumed: u64,
    },

    /// a float property holds NaN or infinity
    #[error("float value {0} is not finite")]
    NonFiniteFloat(f32),

    /// array element type without a decoder
    #[error("unsupported array element type {0}")]
    UnsupportedArrayElement(String),

    /// map with a struct key and no override naming the key layout
    #[error("map {property} has struct keys of unknown layout")]
    UnsupportedMapKey { property: String },

    /// map or set serialized as a delta against defaults
    #[error("container serialized with {0} removed keys")]
    UnsupportedMapRemoval(u32),

    /// struct that is known but cannot be decoded
    #[error("unsupported struct {0}")]
    UnsupportedStruct(String),

    /// property type without a decoder
    #[error("unsupported property type {0}")]
    UnsupportedProperty(String),

    /// a struct array without its element tag
    #[error("struct array {0} has no element tag")]
    MissingTemplateTag(String),
}

impl Error {
    /// Whether decoding can carry on by skipping the enclosing property's declared size
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InvalidLength { .. }
                | Error::NonFiniteFloat(_)
                | Error::UnsupportedArrayElement(_)
                | Error::UnsupportedMapKey { .. }
                | Error::UnsupportedMapRemoval(_)
                | Error::UnsupportedStruct(_)
                | Error::UnsupportedProperty(_)
                | Error::MissingTemplateTag(_)
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Archive(value.into())
    }
}

impl From<binrw::Error> for Error {
    fn from(value: binrw::Error) -> Self {
        if let Some(Error::InvalidNameIndex(index)) = value.custom_err::<Error>() {
            return Error::InvalidNameIndex(*index);
        }
        Error::Archive(value.into())
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
