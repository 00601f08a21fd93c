//! A positioned byte reader with preloading, read accounting and an optional inflate filter.

use std::{
    fmt,
    io::{self, Read, Seek, SeekFrom},
};

use tracing::{instrument, trace};

use crate::{
    compression::{CompressionMethod, StreamSource},
    error::{Error, Result},
    string::read_fstring,
};

/// Any seekable byte source a cursor can be built on
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Marker returned by [`PakCursor::track`]
///
/// Checkpoints are plain counters, so any number of them can be live at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(u64);

/// Cursor used by every decoder in this workspace
///
/// All bytes handed out by the cursor pass through its counters, whether they come from the
/// preload buffer, the raw stream, or the inflate filter. That is what makes
/// [`PakCursor::consumed_since`] reliable across nested decoders.
///
/// ```no_run
/// use std::io::SeekFrom;
/// use uepak_archive::PakCursor;
///
/// fn read_header(file: std::fs::File) -> uepak_archive::error::Result<String> {
///     let mut cursor = PakCursor::new(file);
///     cursor.seek(SeekFrom::Start(16))?;
///
///     let start = cursor.track();
///     let name = cursor.read_fstring()?;
///     println!("{name} took {} bytes", cursor.untrack(start));
///
///     Ok(name)
/// }
/// ```
pub struct PakCursor {
    source: StreamSource,
    buffer: Vec<u8>,
    buffer_pos: usize,
    position: u64,
    consumed: u64,
    preload_enabled: bool,
}

impl fmt::Debug for PakCursor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PakCursor")
            .field("position", &self.position)
            .field("consumed", &self.consumed)
            .field("buffered", &self.buffered())
            .field("inflating", &self.source.is_inflating())
            .finish()
    }
}

impl PakCursor {
    /// Create a cursor with preloading enabled
    pub fn new(reader: impl ReadSeek + 'static) -> PakCursor {
        Self::with_preload(reader, true)
    }

    /// Create a cursor, choosing whether [`PakCursor::preload`] buffers anything
    pub fn with_preload(reader: impl ReadSeek + 'static, preload_enabled: bool) -> PakCursor {
        PakCursor {
            source: StreamSource::Raw(Box::new(reader)),
            buffer: Vec::new(),
            buffer_pos: 0,
            position: 0,
            consumed: 0,
            preload_enabled,
        }
    }

    /// Logical position of the next byte to be read
    ///
    /// While a decompression filter is active this is the offset in the decompressed stream.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether preload requests are honoured
    pub fn preload_enabled(&self) -> bool {
        self.preload_enabled
    }

    /// Whether a decompression filter is active
    pub fn is_compressed(&self) -> bool {
        self.source.is_inflating()
    }

    /// Move to an absolute or relative position, discarding any preloaded bytes
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let Some(raw) = self.source.raw_mut() else {
            return Err(Error::UnsupportedOperation(
                "seek while a decompression filter is active",
            ));
        };
        let position = raw.seek(pos)?;

        self.clear_preload();
        self.position = position;
        Ok(position)
    }

    /// Make sure at least `n` bytes are buffered ahead of the current position
    ///
    /// Only the shortfall is read from the source. Does nothing when preloading is disabled.
    pub fn preload(&mut self, n: usize) -> Result<()> {
        if !self.preload_enabled {
            return Ok(());
        }

        let buffered = self.buffered();
        if buffered >= n {
            return Ok(());
        }

        if self.buffer_pos > 0 {
            self.buffer.drain(..self.buffer_pos);
            self.buffer_pos = 0;
        }

        let wanted = (n - buffered) as u64;
        let read = (&mut self.source)
            .take(wanted)
            .read_to_end(&mut self.buffer)?;
        trace!(requested = n, read, "preloaded");

        if (read as u64) < wanted {
            return Err(Error::UnexpectedEof);
        }
        Ok(())
    }

    /// Read exactly `n` bytes
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.by_ref().take(n as u64).read_to_end(&mut out)?;
        if out.len() < n {
            return Err(Error::UnexpectedEof);
        }
        Ok(out)
    }

    /// Fill `buf` completely
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        self.read_exact(buf)?;
        Ok(())
    }

    /// Consume `n` bytes without looking at them
    ///
    /// Skipped bytes count towards every live checkpoint.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        let skipped = io::copy(&mut self.by_ref().take(n), &mut io::sink())?;
        if skipped < n {
            return Err(Error::UnexpectedEof);
        }
        Ok(())
    }

    /// Start counting consumed bytes
    pub fn track(&self) -> Checkpoint {
        Checkpoint(self.consumed)
    }

    /// Bytes consumed since `checkpoint` was taken
    pub fn consumed_since(&self, checkpoint: &Checkpoint) -> u64 {
        self.consumed - checkpoint.0
    }

    /// Close a tracking scope, returning the bytes consumed inside it
    pub fn untrack(&self, checkpoint: Checkpoint) -> u64 {
        self.consumed_since(&checkpoint)
    }

    /// Route subsequent reads through a decompression filter
    ///
    /// Method `0` leaves the stream untouched. Positions reported afterwards are offsets into
    /// the decompressed data, starting at zero.
    #[instrument(skip(self), err)]
    pub fn start_compression(&mut self, method: u32) -> Result<()> {
        let method = CompressionMethod::try_from(method)?;
        if method == CompressionMethod::None {
            return Ok(());
        }
        if self.buffered() > 0 {
            return Err(Error::UnsupportedOperation(
                "decompression requested with preloaded bytes pending",
            ));
        }

        self.clear_preload();
        self.source.engage(method)?;
        self.position = 0;
        Ok(())
    }

    /// Remove the decompression filter and return to the raw stream
    ///
    /// Anything preloaded from the decompressed stream is dropped. The raw position is wherever
    /// the filter stopped pulling input.
    #[instrument(skip(self), err)]
    pub fn stop_compression(&mut self) -> Result<()> {
        if !self.source.is_inflating() {
            return Ok(());
        }

        self.source.disengage()?;
        self.clear_preload();
        if let Some(raw) = self.source.raw_mut() {
            self.position = raw.stream_position()?;
        }
        Ok(())
    }

    /// Read a length-prefixed string
    pub fn read_fstring(&mut self) -> Result<String> {
        read_fstring(self)
    }

    fn buffered(&self) -> usize {
        self.buffer.len() - self.buffer_pos
    }

    fn clear_preload(&mut self) {
        self.buffer.clear();
        self.buffer_pos = 0;
    }
}

impl Read for PakCursor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let buffered = self.buffered();
        let n = if buffered > 0 {
            let n = buf.len().min(buffered);
            buf[..n].copy_from_slice(&self.buffer[self.buffer_pos..self.buffer_pos + n]);
            self.buffer_pos += n;
            if self.buffer_pos == self.buffer.len() {
                self.clear_preload();
            }
            n
        } else {
            self.source.read(buf)?
        };

        self.position += n as u64;
        self.consumed += n as u64;
        Ok(n)
    }
}

impl Seek for PakCursor {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match pos {
            SeekFrom::Current(0) => Ok(self.position),
            SeekFrom::Start(p) if p == self.position => Ok(p),
            _ => PakCursor::seek(self, pos).map_err(|e| match e {
                Error::IOError(e) => e,
                e => io::Error::new(io::ErrorKind::Unsupported, e.to_string()),
            }),
        }
    }
}
