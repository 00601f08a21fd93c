//! Decompression handling for record data.

use std::io::{self, Read};

use flate2::read::ZlibDecoder;
use tracing::instrument;

use crate::{
    cursor::ReadSeek,
    error::{Error, Result},
};

/// Identifies the storage format used for a record inside the pak file
///
/// Records store the method as a small integer. Only zlib is understood, every other
/// id fails with [`Error::UnsupportedCompression`] rather than being misread as raw data.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CompressionMethod {
    /// Stores the data as it is
    #[default]
    None,

    /// Data is compressed using Zlib
    Zlib,
}

impl TryFrom<u32> for CompressionMethod {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(CompressionMethod::None),
            1 => Ok(CompressionMethod::Zlib),
            n => Err(Error::UnsupportedCompression(n)),
        }
    }
}

/// The byte source beneath a [`crate::cursor::PakCursor`]
pub(crate) enum StreamSource {
    Raw(Box<dyn ReadSeek>),
    Inflate(Box<ZlibDecoder<Box<dyn ReadSeek>>>),
    /// Only observed while switching between the other two states
    Detached,
}

impl StreamSource {
    #[instrument(skip(self), err)]
    pub fn engage(&mut self, method: CompressionMethod) -> Result<()> {
        match std::mem::replace(self, StreamSource::Detached) {
            StreamSource::Raw(reader) => {
                *self = match method {
                    CompressionMethod::None => StreamSource::Raw(reader),
                    CompressionMethod::Zlib => {
                        StreamSource::Inflate(Box::new(ZlibDecoder::new(reader)))
                    }
                };
                Ok(())
            }
            other => {
                *self = other;
                Err(Error::UnsupportedOperation(
                    "a decompression filter is already active",
                ))
            }
        }
    }

    #[instrument(skip(self), err)]
    pub fn disengage(&mut self) -> Result<()> {
        match std::mem::replace(self, StreamSource::Detached) {
            StreamSource::Inflate(decoder) => {
                *self = StreamSource::Raw(decoder.into_inner());
                Ok(())
            }
            other => {
                *self = other;
                Ok(())
            }
        }
    }

    pub fn is_inflating(&self) -> bool {
        matches!(self, StreamSource::Inflate(_))
    }

    pub fn raw_mut(&mut self) -> Option<&mut Box<dyn ReadSeek>> {
        match self {
            StreamSource::Raw(r) => Some(r),
            _ => None,
        }
    }
}

impl Read for StreamSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            StreamSource::Raw(r) => r.read(buf),
            StreamSource::Inflate(r) => r.read(buf),
            StreamSource::Detached => Err(io::Error::other("stream source is detached")),
        }
    }
}

/// Inflate a complete zlib stream held in memory
#[instrument(skip(data), fields(len = data.len()), err)]
pub fn inflate(data: &[u8], size_hint: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(size_hint);
    ZlibDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::compression::{inflate, CompressionMethod};
    use crate::error::{Error, Result};

    #[test]
    fn method_ids() {
        assert_eq!(CompressionMethod::try_from(0).ok(), Some(CompressionMethod::None));
        assert_eq!(CompressionMethod::try_from(1).ok(), Some(CompressionMethod::Zlib));
        assert!(matches!(
            CompressionMethod::try_from(4),
            Err(Error::UnsupportedCompression(4))
        ));
    }

    #[test]
    fn inflate_hello_world() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x78, 0x9C, 0xF3, 0x48, 0xCD, 0xC9, 0xC9, 0x57,
            0x08, 0xCF, 0x2F, 0xCA, 0x49, 0x01, 0x00, 0x18,
            0x0B, 0x04, 0x1D,
        ];

        assert_eq!(inflate(&input, 11)?, b"Hello World".to_vec());

        Ok(())
    }
}
