//! Decoders for the two record index layouts.
//!
//! Archives before version 10 store each record in full, name included. Later archives pack
//! records into a bit-field blob and keep the names in a separate directory index.

use std::io::{self, Read, Seek, SeekFrom};

use binrw::BinRead;
use byteorder::{LittleEndian, ReadBytesExt};
use tracing::{debug, instrument, warn};

use crate::{
    error::{Error, Result},
    string::read_fstring,
    types::{
        CompressionBlock, EncodedIndexHeader, PakEntry, PakInfo, SecondaryIndex,
        VERSION_FNAME_COMPRESSION, VERSION_RELATIVE_CHUNK_OFFSETS,
    },
};

const OFFSET_32_BIT_SAFE: u32 = 1 << 31;
const UNCOMPRESSED_SIZE_32_BIT_SAFE: u32 = 1 << 30;
const SIZE_32_BIT_SAFE: u32 = 1 << 29;
const ENCRYPTED: u32 = 1 << 22;
const ENCRYPTION_ALIGNMENT: u64 = 16;

/// Read one record in the legacy layout
///
/// `file_name` is supplied by the caller, since unencoded records inside an encoded index carry
/// no name of their own.
pub fn read_legacy_entry<R: Read + Seek>(
    reader: &mut R,
    version: u32,
    file_name: String,
) -> Result<PakEntry> {
    let offset = reader.read_u64::<LittleEndian>()?;
    let size = reader.read_u64::<LittleEndian>()?;
    let uncompressed_size = reader.read_u64::<LittleEndian>()?;
    let compression_method = if version >= VERSION_FNAME_COMPRESSION {
        reader.read_u8()? as u32
    } else {
        reader.read_u32::<LittleEndian>()?
    };
    let timestamp = if version <= 1 {
        Some(reader.read_u64::<LittleEndian>()?)
    } else {
        None
    };

    let mut sha1 = [0u8; 20];
    reader.read_exact(&mut sha1)?;

    let mut compression_blocks = Vec::new();
    let mut encrypted = false;
    let mut compression_block_size = 0;
    if version >= 3 {
        if compression_method != 0 {
            let count = reader.read_u32::<LittleEndian>()?;
            compression_blocks = (0..count)
                .map(|_| CompressionBlock::read(reader).map_err(Error::from))
                .collect::<Result<_>>()?;
        }
        encrypted = reader.read_u8()? != 0;
        compression_block_size = reader.read_u32::<LittleEndian>()?;
    }

    Ok(PakEntry {
        file_name,
        offset,
        size,
        uncompressed_size,
        compression_method,
        timestamp,
        sha1,
        compression_blocks,
        encrypted,
        compression_block_size,
    })
}

/// Read `count` named records in the legacy layout
#[instrument(skip(reader), err)]
pub fn read_legacy_index<R: Read + Seek>(
    reader: &mut R,
    version: u32,
    count: u32,
) -> Result<Vec<PakEntry>> {
    (0..count)
        .map(|_| {
            let name = read_fstring(reader)?;
            read_legacy_entry(reader, version, name)
        })
        .collect()
}

/// Decode a record from the bit-packed blob of an encoded index, starting at `position`
pub fn decode_entry(blob: &[u8], position: usize, footer: &PakInfo) -> Result<PakEntry> {
    if position >= blob.len() {
        return Err(Error::InvalidIndex(format!(
            "encoded entry offset {position} outside of {} byte blob",
            blob.len()
        )));
    }

    let mut reader = io::Cursor::new(&blob[position..]);
    let bits = reader.read_u32::<LittleEndian>()?;

    let compression_method = (bits >> 23) & 0x3f;
    let encrypted = bits & ENCRYPTED != 0;
    let block_count = (bits >> 6) & 0xffff;

    let offset = read_var_u64(&mut reader, bits & OFFSET_32_BIT_SAFE != 0)?;
    let uncompressed_size = read_var_u64(&mut reader, bits & UNCOMPRESSED_SIZE_32_BIT_SAFE != 0)?;
    let size = if compression_method != 0 {
        read_var_u64(&mut reader, bits & SIZE_32_BIT_SAFE != 0)?
    } else {
        uncompressed_size
    };

    let compression_block_size = match block_count {
        0 => 0,
        _ if uncompressed_size < 65536 => uncompressed_size as u32,
        _ => (bits & 0x3f) << 11,
    };

    let base = if footer.version >= VERSION_RELATIVE_CHUNK_OFFSETS {
        0
    } else {
        offset
    };
    let serialized_size = footer.header_size()
        + if compression_method != 0 {
            4 + 16 * block_count as u64
        } else {
            0
        };

    let mut compression_blocks = Vec::with_capacity(block_count as usize);
    if block_count == 1 && !encrypted {
        let start = base + serialized_size;
        compression_blocks.push(CompressionBlock {
            start,
            end: start + size,
        });
    } else if block_count > 0 {
        let alignment = if encrypted { ENCRYPTION_ALIGNMENT } else { 1 };
        let mut current = base + serialized_size;
        for _ in 0..block_count {
            let block = reader.read_u32::<LittleEndian>()? as u64;
            compression_blocks.push(CompressionBlock {
                start: current,
                end: current + block,
            });
            current += block.div_ceil(alignment) * alignment;
        }
    }

    Ok(PakEntry {
        file_name: String::new(),
        offset,
        size,
        uncompressed_size,
        compression_method,
        timestamp: None,
        sha1: [0u8; 20],
        compression_blocks,
        encrypted,
        compression_block_size,
    })
}

fn read_var_u64<R: Read>(reader: &mut R, narrow: bool) -> Result<u64> {
    Ok(if narrow {
        reader.read_u32::<LittleEndian>()? as u64
    } else {
        reader.read_u64::<LittleEndian>()?
    })
}

fn read_secondary<R: Read + Seek>(reader: &mut R) -> Result<Option<SecondaryIndex>> {
    Ok(match reader.read_u32::<LittleEndian>()? {
        0 => None,
        _ => Some(SecondaryIndex::read(reader)?),
    })
}

/// Read the remainder of an encoded index, the mount point and record count already consumed
///
/// Records are named from the full directory index when there is one. Without it, the blob is
/// decoded front to back and the records stay unnamed.
#[instrument(skip(reader, footer), err)]
pub fn read_encoded_index<R: Read + Seek>(
    reader: &mut R,
    footer: &PakInfo,
    count: u32,
) -> Result<(Vec<PakEntry>, EncodedIndexHeader)> {
    let path_hash_seed = reader.read_u64::<LittleEndian>()?;
    let path_hash_index = read_secondary(reader)?;
    let full_directory_index = read_secondary(reader)?;

    let blob_size = reader.read_u32::<LittleEndian>()? as u64;
    let mut blob = Vec::new();
    reader.by_ref().take(blob_size).read_to_end(&mut blob)?;
    if (blob.len() as u64) < blob_size {
        return Err(Error::UnexpectedEof);
    }

    let unencoded_count = reader.read_u32::<LittleEndian>()?;
    let unencoded = (0..unencoded_count)
        .map(|_| read_legacy_entry(reader, footer.version, String::new()))
        .collect::<Result<Vec<_>>>()?;

    let header = EncodedIndexHeader {
        path_hash_seed,
        path_hash_index,
        full_directory_index,
        unencoded_count,
    };

    let records = match &header.full_directory_index {
        Some(directory) => read_directory_index(reader, directory, &blob, &unencoded, footer)?,
        None => {
            warn!("encoded index has no full directory index, records will be unnamed");
            let mut records = Vec::with_capacity(count as usize);
            let mut position = 0usize;
            while position < blob.len() && records.len() < count as usize {
                let entry = decode_entry(&blob, position, footer)?;
                position += encoded_len(&blob[position..])?;
                records.push(entry);
            }
            records.extend(unencoded);
            records
        }
    };

    if records.len() != count as usize {
        debug!(
            expected = count,
            found = records.len(),
            "record count differs from index header"
        );
    }

    Ok((records, header))
}

/// Byte length of the encoded entry at the start of `blob`
fn encoded_len(blob: &[u8]) -> Result<usize> {
    let bits = io::Cursor::new(blob).read_u32::<LittleEndian>()?;
    let compression_method = (bits >> 23) & 0x3f;
    let block_count = (bits >> 6) & 0xffff;
    let encrypted = bits & ENCRYPTED != 0;

    let width = |safe: bool| if safe { 4 } else { 8 };
    let mut len = 4
        + width(bits & OFFSET_32_BIT_SAFE != 0)
        + width(bits & UNCOMPRESSED_SIZE_32_BIT_SAFE != 0);
    if compression_method != 0 {
        len += width(bits & SIZE_32_BIT_SAFE != 0);
    }
    if block_count > 0 && (block_count != 1 || encrypted) {
        len += 4 * block_count as usize;
    }
    Ok(len)
}

fn read_directory_index<R: Read + Seek>(
    reader: &mut R,
    directory: &SecondaryIndex,
    blob: &[u8],
    unencoded: &[PakEntry],
    footer: &PakInfo,
) -> Result<Vec<PakEntry>> {
    let offset = u64::try_from(directory.offset).map_err(|_| {
        Error::InvalidIndex(format!("directory index offset {}", directory.offset))
    })?;
    reader.seek(SeekFrom::Start(offset))?;

    let directories = reader.read_i32::<LittleEndian>()?;
    let mut records = Vec::new();
    for _ in 0..directories.max(0) {
        let directory_name = read_fstring(reader)?;
        let prefix = directory_name.trim_start_matches('/');

        let files = reader.read_i32::<LittleEndian>()?;
        for _ in 0..files.max(0) {
            let file_name = read_fstring(reader)?;
            let location = reader.read_i32::<LittleEndian>()?;

            let mut entry = if location >= 0 {
                decode_entry(blob, location as usize, footer)?
            } else {
                let index = (-(location as i64 + 1)) as usize;
                unencoded.get(index).cloned().ok_or_else(|| {
                    Error::InvalidIndex(format!("unencoded entry {index} does not exist"))
                })?
            };
            entry.file_name = format!("{prefix}{file_name}");
            records.push(entry);
        }
    }

    Ok(records)
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use crate::error::Result;
    use crate::index::{decode_entry, read_legacy_index};
    use crate::types::{CompressionBlock, PakInfo};

    fn footer(version: u32) -> PakInfo {
        PakInfo {
            version,
            ..Default::default()
        }
    }

    #[test]
    fn read_legacy_v8_entry() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            // name "a.txt"
            0x06, 0x00, 0x00, 0x00, 0x61, 0x2E, 0x74, 0x78, 0x74, 0x00,
            // offset, size, uncompressed size
            0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // compression method
            0x00,
            // sha1
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // encrypted, block size
            0x00,
            0x00, 0x00, 0x01, 0x00,
        ]);

        let records = read_legacy_index(&mut input, 8, 1)?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_name, "a.txt");
        assert_eq!(records[0].offset, 0x10);
        assert_eq!(records[0].size, 5);
        assert_eq!(records[0].compression_block_size, 0x10000);
        assert_eq!(input.position(), 60);

        Ok(())
    }

    #[test]
    fn read_legacy_v1_entry_with_timestamp() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x02, 0x00, 0x00, 0x00, 0x62, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // compression method as u32
            0x00, 0x00, 0x00, 0x00,
            // timestamp
            0x2A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ]);

        let records = read_legacy_index(&mut input, 1, 1)?;
        assert_eq!(records[0].timestamp, Some(42));
        assert_eq!(input.position(), input.get_ref().len() as u64);

        Ok(())
    }

    #[test]
    fn read_legacy_compressed_entry() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x02, 0x00, 0x00, 0x00, 0x63, 0x00,
            0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x13, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x0B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x01,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // one block
            0x01, 0x00, 0x00, 0x00,
            0x46, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x59, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00,
            0x0B, 0x00, 0x00, 0x00,
        ]);

        let records = read_legacy_index(&mut input, 8, 1)?;
        assert_eq!(records[0].compression_method, 1);
        assert_eq!(
            records[0].compression_blocks,
            vec![CompressionBlock { start: 0x46, end: 0x59 }]
        );

        Ok(())
    }

    #[test]
    fn decode_narrow_fields() -> Result<()> {
        // offset, uncompressed size and size all 32-bit safe, zlib, one block
        let bits: u32 = (1 << 31) | (1 << 30) | (1 << 29) | (1 << 23) | (1 << 6);
        let mut blob = bits.to_le_bytes().to_vec();
        blob.extend(0x100u32.to_le_bytes());
        blob.extend(0x40u32.to_le_bytes());
        blob.extend(0x20u32.to_le_bytes());

        let entry = decode_entry(&blob, 0, &footer(11))?;
        assert_eq!(entry.offset, 0x100);
        assert_eq!(entry.uncompressed_size, 0x40);
        assert_eq!(entry.size, 0x20);
        assert_eq!(entry.compression_method, 1);
        assert_eq!(entry.compression_block_size, 0x40);
        assert_eq!(
            entry.compression_blocks,
            vec![CompressionBlock { start: 70, end: 102 }]
        );

        Ok(())
    }

    #[test]
    fn decode_wide_fields() -> Result<()> {
        let bits: u32 = 0;
        let mut blob = bits.to_le_bytes().to_vec();
        blob.extend(0x1_0000_0000u64.to_le_bytes());
        blob.extend(0x2_0000_0000u64.to_le_bytes());

        let entry = decode_entry(&blob, 0, &footer(11))?;
        assert_eq!(entry.offset, 0x1_0000_0000);
        assert_eq!(entry.uncompressed_size, 0x2_0000_0000);
        assert_eq!(entry.size, entry.uncompressed_size);
        assert!(entry.compression_blocks.is_empty());

        Ok(())
    }

    #[test]
    fn decode_encrypted_blocks_are_aligned() -> Result<()> {
        let bits: u32 = (1 << 31) | (1 << 30) | (1 << 29) | (1 << 23) | (1 << 22) | (2 << 6) | 32;
        let mut blob = bits.to_le_bytes().to_vec();
        blob.extend(0u32.to_le_bytes());
        blob.extend(0x20000u32.to_le_bytes());
        blob.extend(30u32.to_le_bytes());
        blob.extend(10u32.to_le_bytes());
        blob.extend(20u32.to_le_bytes());

        let entry = decode_entry(&blob, 0, &footer(11))?;
        assert!(entry.encrypted);
        assert_eq!(entry.compression_block_size, 32 << 11);
        // header 50, block table 4 + 32
        assert_eq!(
            entry.compression_blocks,
            vec![
                CompressionBlock { start: 86, end: 96 },
                CompressionBlock { start: 102, end: 122 },
            ]
        );

        Ok(())
    }

    #[test]
    fn decode_outside_blob() {
        assert!(decode_entry(&[0u8; 4], 8, &footer(11)).is_err());
    }
}
