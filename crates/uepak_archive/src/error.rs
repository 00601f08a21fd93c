//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(binrw::Error),

    /// no footer magic was found near the end of the file
    #[error("pak footer magic not found in the last {window} bytes")]
    #[diagnostic(help("the file is either not a pak archive or its footer is corrupted"))]
    MagicNotFound { window: u64 },

    /// a read ran past the end of the underlying stream
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// compression method id that cannot be decoded
    #[error("unsupported compression method {0}")]
    UnsupportedCompression(u32),

    /// operation not allowed in the current cursor state
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// the index is encrypted and cannot be read without a key
    #[error("pak index is encrypted")]
    EncryptedIndex,

    /// index data that cannot be interpreted
    #[error("invalid index: {0}")]
    InvalidIndex(String),

    /// unable to find requested file
    #[error("unable to find requested file")]
    FileNotFound(#[from] FileNotFoundError),
}

/// Error type to provide further information when a file has not been found
#[derive(Error, Diagnostic, Debug)]
#[error("unable to find requested file")]
pub enum FileNotFoundError {
    /// at index {0}
    #[error("at index {0}")]
    Index(usize),

    /// by name {0}
    #[error("by name {0}")]
    Name(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        match value.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::UnexpectedEof,
            _ => Error::IOError(value),
        }
    }
}

impl From<binrw::Error> for Error {
    fn from(value: binrw::Error) -> Self {
        if value.is_eof() {
            return Error::UnexpectedEof;
        }
        match value {
            binrw::Error::Io(e) => Error::from(e),
            e => Error::BinRWError(e),
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
