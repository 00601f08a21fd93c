//! Types for reading pak archives
//!

use binrw::BinRead;
use bon::Builder;
use byteorder::ReadBytesExt;
use indexmap::IndexMap;
use std::{
    fmt::{self, Debug},
    fs::File,
    io::{self, SeekFrom},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, instrument};

use crate::{
    compression::{inflate, CompressionMethod},
    cursor::{PakCursor, ReadSeek},
    error::{Error, FileNotFoundError, Result},
    index::{read_encoded_index, read_legacy_index},
    types::{
        IndexLayout, PakEntry, PakFile, PakIndex, PakInfo, DEFAULT_FOOTER_WINDOW, FOOTER_SIZE,
        PAK_MAGIC, VERSION_FNAME_COMPRESSION, VERSION_FROZEN_INDEX, VERSION_PATH_HASH_INDEX,
        VERSION_RELATIVE_CHUNK_OFFSETS,
    },
};

/// Size of a compression method name slot after a version 8+ footer
const COMPRESSION_NAME_SIZE: u64 = 32;

/// Options for how archives are read
#[derive(Debug, Clone, Copy, Builder)]
pub struct ReadOptions {
    /// Buffer declared regions ahead of decoding them
    #[builder(default = true)]
    pub preload: bool,

    /// How many trailing bytes are searched for the footer magic
    #[builder(default = DEFAULT_FOOTER_WINDOW)]
    pub footer_search_window: u64,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions::builder().build()
    }
}

/// Where archive bytes come from
///
/// Opening a source again yields an independent reader, which is what concurrent decoding
/// needs.
#[derive(Debug, Clone)]
pub enum ArchiveSource {
    /// A file on disk
    Path(PathBuf),
    /// An archive already held in memory
    Bytes(Arc<[u8]>),
}

impl ArchiveSource {
    /// Open a fresh reader positioned at the start of the archive
    pub fn open(&self) -> Result<Box<dyn ReadSeek>> {
        Ok(match self {
            ArchiveSource::Path(path) => Box::new(File::open(path)?),
            ArchiveSource::Bytes(bytes) => Box::new(io::Cursor::new(bytes.clone())),
        })
    }
}

impl From<&Path> for ArchiveSource {
    fn from(value: &Path) -> Self {
        ArchiveSource::Path(value.to_owned())
    }
}

impl From<PathBuf> for ArchiveSource {
    fn from(value: PathBuf) -> Self {
        ArchiveSource::Path(value)
    }
}

impl From<Vec<u8>> for ArchiveSource {
    fn from(value: Vec<u8>) -> Self {
        ArchiveSource::Bytes(value.into())
    }
}

/// pak archive reader
///
/// ```no_run
/// use uepak_archive::{ArchiveSource, PakArchive};
///
/// fn list_pak_contents(path: &std::path::Path) -> uepak_archive::error::Result<()> {
///     let mut pak = PakArchive::open(&ArchiveSource::from(path))?;
///
///     for i in 0..pak.len() {
///         let data = pak.read_entry(i)?;
///         println!("{}: {} bytes", pak.name_for_index(i).unwrap_or_default(), data.len());
///     }
///
///     Ok(())
/// }
/// ```
pub struct PakArchive {
    cursor: PakCursor,
    shared: Arc<PakFile>,
    names: IndexMap<String, usize>,
}

impl Debug for PakArchive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PakArchive({:#?})", self.shared.footer)
    }
}

impl PakArchive {
    /// Read a pak archive collecting the records it contains.
    pub fn new(reader: impl ReadSeek + 'static) -> Result<PakArchive> {
        Self::with_options(reader, ReadOptions::default())
    }

    /// Read a pak archive with explicit options
    #[instrument(skip(reader), err)]
    pub fn with_options(reader: impl ReadSeek + 'static, options: ReadOptions) -> Result<PakArchive> {
        let mut cursor = PakCursor::with_preload(reader, options.preload);
        let shared = Self::get_metadata(&mut cursor, &options)?;

        let mut names = IndexMap::with_capacity(shared.index.records.len());
        for (i, record) in shared.index.records.iter().enumerate() {
            names.entry(record.file_name.clone()).or_insert(i);
        }

        info!(
            version = shared.footer.version,
            records = shared.index.records.len(),
            mount_point = %shared.index.mount_point,
            "opened pak"
        );

        Ok(PakArchive {
            cursor,
            shared: shared.into(),
            names,
        })
    }

    /// Open an archive from a source with default options
    pub fn open(source: &ArchiveSource) -> Result<PakArchive> {
        Self::with_options(source.open()?, ReadOptions::default())
    }

    /// Footer and index of the archive
    pub fn pak(&self) -> &PakFile {
        &self.shared
    }

    /// Shared handle to the footer and index
    pub fn shared(&self) -> Arc<PakFile> {
        self.shared.clone()
    }

    /// The cursor positioned over the archive bytes
    pub fn cursor_mut(&mut self) -> &mut PakCursor {
        &mut self.cursor
    }

    /// Number of records contained in this pak.
    pub fn len(&self) -> usize {
        self.shared.index.records.len()
    }

    /// Whether this pak archive contains no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over all the record names in this archive.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.shared
            .index
            .records
            .iter()
            .map(|r| r.file_name.as_str())
    }

    /// Get the index of a record by name, if it's present.
    #[inline(always)]
    pub fn index_for_name(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// Get the name of a record, if it's present.
    #[inline(always)]
    pub fn name_for_index(&self, index: usize) -> Option<&str> {
        self.shared
            .index
            .records
            .get(index)
            .map(|r| r.file_name.as_str())
    }

    /// Search for a record by name
    pub fn by_name(&self, name: &str) -> Result<&PakEntry> {
        let Some(index) = self.index_for_name(name) else {
            return Err(Error::FileNotFound(FileNotFoundError::Name(
                name.to_owned(),
            )));
        };
        self.by_index(index)
    }

    /// Get a record by index
    pub fn by_index(&self, index: usize) -> Result<&PakEntry> {
        self.shared
            .index
            .records
            .get(index)
            .ok_or(Error::FileNotFound(FileNotFoundError::Index(index)))
    }

    /// Read the data of a record, decompressing it when needed
    #[instrument(skip(self), err)]
    pub fn read_entry(&mut self, index: usize) -> Result<Vec<u8>> {
        let shared = self.shared.clone();
        let record = shared
            .index
            .records
            .get(index)
            .ok_or(Error::FileNotFound(FileNotFoundError::Index(index)))?;
        read_record_data(&mut self.cursor, &shared.footer, record)
    }

    /// Unwrap and return the cursor and the decoded metadata
    ///
    /// The position of the cursor is undefined.
    pub fn into_parts(self) -> (PakCursor, Arc<PakFile>) {
        (self.cursor, self.shared)
    }

    fn get_metadata(cursor: &mut PakCursor, options: &ReadOptions) -> Result<PakFile> {
        let footer = read_footer(cursor, options.footer_search_window)?;
        let index = read_index(cursor, &footer)?;
        Ok(PakFile { footer, index })
    }
}

/// Find and decode the footer by scanning backward from the end of the stream
///
/// The scan starts [`FOOTER_SIZE`] bytes before the end and moves back one byte at a time
/// until `window` bytes from the end.
#[instrument(skip(cursor), err)]
pub fn read_footer(cursor: &mut PakCursor, window: u64) -> Result<PakInfo> {
    let len = cursor.seek(SeekFrom::End(0))?;

    let mut back = FOOTER_SIZE;
    let magic_pos = loop {
        if back > window || back > len {
            return Err(Error::MagicNotFound { window });
        }
        let pos = len - back;
        cursor.seek(SeekFrom::Start(pos))?;
        let mut magic = [0u8; 4];
        cursor.read_into(&mut magic)?;
        if u32::from_le_bytes(magic) == PAK_MAGIC {
            break pos;
        }
        back += 1;
    };
    debug!(magic_pos, "found pak footer");

    cursor.seek(SeekFrom::Start(magic_pos))?;
    let mut footer = PakInfo::read(cursor)?;

    if footer.version >= VERSION_FNAME_COMPRESSION {
        if footer.version == VERSION_FROZEN_INDEX {
            cursor.skip(1)?;
        }
        let trailing = len.saturating_sub(cursor.position());
        for _ in 0..trailing / COMPRESSION_NAME_SIZE {
            let raw = cursor.read_bytes(COMPRESSION_NAME_SIZE as usize)?;
            let name = String::from_utf8_lossy(&raw)
                .trim_end_matches('\0')
                .to_owned();
            if !name.is_empty() {
                footer.compression_methods.push(name);
            }
        }
    }

    // Version 4+ keep an encrypted index flag in front of the magic, outside the index itself
    let index_end = footer.index_offset.saturating_add(footer.index_size);
    if footer.version >= 4 && magic_pos >= 1 && magic_pos - 1 >= index_end {
        cursor.seek(SeekFrom::Start(magic_pos - 1))?;
        if cursor.read_u8()? != 0 {
            return Err(Error::EncryptedIndex);
        }
    }

    Ok(footer)
}

/// Decode the index the footer points at
#[instrument(skip(cursor), err)]
pub fn read_index(cursor: &mut PakCursor, footer: &PakInfo) -> Result<PakIndex> {
    cursor.seek(SeekFrom::Start(footer.index_offset))?;
    if let Ok(size) = usize::try_from(footer.index_size) {
        cursor.preload(size)?;
    }

    let mount_point = cursor.read_fstring()?;
    let count = cursor.read_u32::<byteorder::LittleEndian>()?;

    let (records, layout) = if footer.version >= VERSION_PATH_HASH_INDEX {
        let (records, header) = read_encoded_index(cursor, footer, count)?;
        (records, IndexLayout::Encoded(header))
    } else {
        (
            read_legacy_index(cursor, footer.version, count)?,
            IndexLayout::Legacy,
        )
    };

    Ok(PakIndex {
        mount_point,
        records,
        layout,
    })
}

/// Read the data of `record`, inflating each compression block in turn
pub fn read_record_data(
    cursor: &mut PakCursor,
    footer: &PakInfo,
    record: &PakEntry,
) -> Result<Vec<u8>> {
    let method = CompressionMethod::try_from(record.compression_method)?;
    if record.encrypted {
        return Err(Error::UnsupportedOperation("record data is encrypted"));
    }

    let data_start = record.offset + footer.header_size();
    let expected = usize::try_from(record.uncompressed_size)
        .map_err(|_| Error::InvalidIndex(format!("record size {}", record.uncompressed_size)))?;

    match method {
        CompressionMethod::None => {
            cursor.seek(SeekFrom::Start(data_start))?;
            cursor.read_bytes(expected)
        }
        CompressionMethod::Zlib if record.compression_blocks.is_empty() => {
            cursor.seek(SeekFrom::Start(data_start))?;
            let raw = cursor.read_bytes(record.size as usize)?;
            inflate(&raw, expected)
        }
        CompressionMethod::Zlib => {
            let base = if footer.version >= VERSION_RELATIVE_CHUNK_OFFSETS {
                record.offset
            } else {
                0
            };

            let mut out = Vec::with_capacity(expected);
            for block in &record.compression_blocks {
                cursor.seek(SeekFrom::Start(base + block.start))?;
                let raw = cursor.read_bytes(block.len() as usize)?;
                let block_size = record.compression_block_size as usize;
                out.extend(inflate(&raw, block_size)?);
            }
            if out.len() != expected {
                debug!(
                    expected,
                    actual = out.len(),
                    "inflated size differs from record"
                );
            }
            Ok(out)
        }
    }
}
