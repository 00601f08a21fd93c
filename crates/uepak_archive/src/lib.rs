//! This library handles reading the **pak** containers used by *Unreal Engine 4* titles.
//!
//! # Pak Archive Format Documentation
//!
//! A pak file bundles the cooked content of a game into one file. Records are stored back to
//! back, each behind a small header, and an index describing them sits near the end of the file
//! together with a fixed footer.
//!
//! ## File Structure
//!
//! | Region            | Description                                                            |
//! |-------------------|------------------------------------------------------------------------|
//! | Records           | Per record: a header of 53 bytes (50 from version 8) then its data      |
//! | Index             | Mount point, record count, then the records in one of two layouts       |
//! | Secondary indexes | Version 10+: path hash index and full directory index                  |
//! | Footer            | Fixed 44 byte block, optionally followed by compression method names   |
//!
//! ### Footer
//!
//! The footer is found by scanning backward from 44 bytes before the end of the file, one byte
//! at a time, until the magic turns up or the search window (1024 bytes by default) runs out.
//!
//! | Offset (bytes) | Field          | Description                                             |
//! |----------------|----------------|---------------------------------------------------------|
//! | 0x0000         | Magic number   | 4 bytes: 0x5A6F12E1                                     |
//! | 0x0004         | Version        | 4 bytes: Format version                                 |
//! | 0x0008         | Index Offset   | 8 bytes: Absolute offset of the index                   |
//! | 0x0010         | Index Size     | 8 bytes: Size of the index                              |
//! | 0x0018         | Index Hash     | 20 bytes: SHA1 of the index                             |
//!
//! From version 8 the footer is followed by 32 byte, null padded compression method names.
//! Version 9 puts a frozen index flag byte in front of them.
//!
//! ### Legacy Index Records
//!
//! | Field              | Size          | Present                                          |
//! |--------------------|---------------|--------------------------------------------------|
//! | File name          | string        | always                                           |
//! | Offset             | 8 bytes       | always                                           |
//! | Size               | 8 bytes       | always                                           |
//! | Uncompressed Size  | 8 bytes       | always                                           |
//! | Compression Method | 1 or 4 bytes  | 1 byte from version 8                            |
//! | Timestamp          | 8 bytes       | version 1 only                                   |
//! | SHA1               | 20 bytes      | always                                           |
//! | Blocks             | 4 + 16n bytes | version 3+, compressed records only              |
//! | Encrypted          | 1 byte        | version 3+                                       |
//! | Block Size         | 4 bytes       | version 3+                                       |
//!
//! ### Encoded Index
//!
//! From version 10 the index holds a path hash seed, the locations of the secondary indexes, a
//! blob of bit-packed records and a list of records that could not be packed. Each packed record
//! starts with a 32-bit word:
//!
//! | Bits   | Meaning                                                       |
//! |--------|---------------------------------------------------------------|
//! | 31     | Offset fits in 32 bits                                        |
//! | 30     | Uncompressed size fits in 32 bits                             |
//! | 29     | Size fits in 32 bits, size is only stored for compressed data |
//! | 28..23 | Compression method                                            |
//! | 22     | Encrypted                                                     |
//! | 21..6  | Compression block count                                       |
//! | 5..0   | Compression block size in units of 2048 bytes                 |
//!
//! Names come from the full directory index, a list of directories each mapping file names to
//! a location: a byte offset into the blob, or `-(n + 1)` for the n-th unpacked record.
//!
//! ### Strings
//!
//! Strings carry a signed 32-bit length. Positive lengths count bytes, negative lengths count
//! UTF-16LE code units, and the stored terminator is stripped.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.pak`
//! - **Endianness**: Little-endian for all multi-byte integers
//! - **Compression**: zlib is the only supported method (id `1`)
//!

pub mod compression;
pub mod cursor;
pub mod error;
pub mod index;
pub mod read;
pub mod string;
pub mod types;

pub use compression::CompressionMethod;
pub use cursor::{Checkpoint, PakCursor, ReadSeek};
pub use read::{ArchiveSource, PakArchive, ReadOptions};
pub use types::{PakEntry, PakFile, PakIndex, PakInfo};
