//! Base types for structure of pak file.

use binrw::BinRead;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Magic number identifying a pak footer
pub const PAK_MAGIC: u32 = 0x5A6F12E1;

/// Size of the fixed part of the footer, starting at the magic
pub const FOOTER_SIZE: u64 = 44;

/// Default number of trailing bytes searched for the footer
pub const DEFAULT_FOOTER_WINDOW: u64 = 1024;

/// First version that stores compression methods as names in the footer
pub const VERSION_FNAME_COMPRESSION: u32 = 8;

/// Version that adds a frozen index flag to the footer
pub const VERSION_FROZEN_INDEX: u32 = 9;

/// First version using the encoded index with a separate directory index
pub const VERSION_PATH_HASH_INDEX: u32 = 10;

/// Versions from this one onward store compression block offsets relative to the record
pub const VERSION_RELATIVE_CHUNK_OFFSETS: u32 = 5;

/// pak file footer
///
/// Lives close to the end of the file and points at the index. All data is stored in little
/// endian format.
#[derive(BinRead, Debug, Clone, Default, PartialEq, Eq)]
#[br(magic = 0x5A6F12E1u32, little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PakInfo {
    /// Format version of the archive
    pub version: u32,

    /// Absolute offset of the index
    pub index_offset: u64,

    /// Size of the index in bytes
    pub index_size: u64,

    /// SHA1 of the index
    #[cfg_attr(feature = "serde", serde(skip))]
    pub index_hash: [u8; 20],

    /// Compression method names listed after the footer, from version 8
    #[br(ignore)]
    pub compression_methods: Vec<String>,
}

impl PakInfo {
    /// Size of the per-record header stored in front of each record's data
    pub fn header_size(&self) -> u64 {
        if self.version < VERSION_FNAME_COMPRESSION {
            53
        } else {
            50
        }
    }
}

/// A compression block of a record, as a byte range in the archive
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CompressionBlock {
    /// First byte of the block
    pub start: u64,

    /// One past the last byte of the block
    pub end: u64,
}

impl CompressionBlock {
    /// Compressed size of the block
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the block holds no bytes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Structure representing a pak file entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PakEntry {
    /// Name of the file, relative to the mount point
    pub file_name: String,
    /// Offset of the record header, data follows [`PakInfo::header_size`] bytes later
    pub offset: u64,
    /// Size of the data in the archive
    pub size: u64,
    /// Size of the data once decompressed
    pub uncompressed_size: u64,
    /// Compression method id, zero when stored as is
    pub compression_method: u32,
    /// Only present in version 1 archives
    pub timestamp: Option<u64>,
    /// SHA1 of the data
    #[cfg_attr(feature = "serde", serde(skip))]
    pub sha1: [u8; 20],
    /// Compressed blocks making up the data
    pub compression_blocks: Vec<CompressionBlock>,
    /// Whether the data is encrypted
    pub encrypted: bool,
    /// Uncompressed size of a single compression block
    pub compression_block_size: u32,
}

impl PakEntry {
    /// Whether the data needs decompressing
    pub fn is_compressed(&self) -> bool {
        self.compression_method != 0
    }

    /// File name with its final extension removed
    pub fn stem(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((stem, ext)) if !ext.contains('/') => stem,
            _ => &self.file_name,
        }
    }

    /// Final extension of the file name, without the dot
    pub fn extension(&self) -> Option<&str> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.contains('/'))
    }
}

/// Header of a version 10+ encoded index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EncodedIndexHeader {
    /// Seed used when hashing paths
    pub path_hash_seed: u64,
    /// Location of the path hash index, when present
    pub path_hash_index: Option<SecondaryIndex>,
    /// Location of the full directory index, when present
    pub full_directory_index: Option<SecondaryIndex>,
    /// Number of records stored with the legacy layout after the encoded blob
    pub unencoded_count: u32,
}

/// Location of a secondary index block
#[derive(BinRead, Debug, Clone, Default, PartialEq, Eq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SecondaryIndex {
    /// Absolute offset in the archive
    pub offset: i64,
    /// Size in bytes
    pub size: i64,
    /// SHA1 of the block
    #[cfg_attr(feature = "serde", serde(skip))]
    pub hash: [u8; 20],
}

/// How the record index was stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum IndexLayout {
    /// One self-describing record after another
    #[default]
    Legacy,
    /// Bit-packed records with names held in a directory index
    Encoded(EncodedIndexHeader),
}

/// Decoded pak index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PakIndex {
    /// Mount point every file name is relative to
    pub mount_point: String,
    /// Records in index order
    pub records: Vec<PakEntry>,
    /// Storage layout of the index
    pub layout: IndexLayout,
}

/// Footer and index of an opened archive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PakFile {
    /// Archive footer
    pub footer: PakInfo,
    /// Archive index
    pub index: PakIndex,
}
