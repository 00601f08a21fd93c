//! This library decodes the cooked **packages** stored in *Unreal Engine 4* pak archives.
//!
//! # Package Format Documentation
//!
//! A cooked package is split over two records of an archive: the `.uasset` holds the package
//! header, the `.uexp` with the same stem holds the serialized exports.
//!
//! ## Package Header
//!
//! | Field                    | Description                                                  |
//! |--------------------------|--------------------------------------------------------------|
//! | Tag                      | 4 bytes: 0x9E2A83C1                                          |
//! | Versions                 | Legacy file, legacy UE3, UE4 and licensee versions           |
//! | Custom versions          | Count followed by (Guid, version) pairs                      |
//! | Total header size        | Size of the `.uasset` part, export offsets are relative to it|
//! | Folder name              | string                                                       |
//! | Table counts and offsets | Names, gatherable text, exports, imports and others          |
//! | Package GUID             | 16 bytes                                                     |
//! | Generations              | Count followed by (export count, name count) pairs           |
//! | Engine versions          | Saved-by and compatible-with                                 |
//! | Trailing scalars         | Compression, package source, bulk data, chunk ids and others |
//! | Tables                   | Names, then imports, then exports                            |
//!
//! Uncompressed headers of version 9+ archives carry 3 opaque bytes after the custom versions.
//! Compressed headers start with a 23 byte preamble ahead of the zlib stream.
//!
//! ## Object References
//!
//! A package index of `0` is a null reference, `-n` the n-th import and `n` the n-th export,
//! both counting from one.
//!
//! ## Property Tags
//!
//! Each export is a list of tags ending at a tag named `None`.
//!
//! | Field      | Description                                                                |
//! |------------|----------------------------------------------------------------------------|
//! | Name       | name reference: 4 byte index and 4 byte instance number                    |
//! | Type       | name reference, e.g. `IntProperty`                                        |
//! | Size       | 4 bytes: size of the value                                                 |
//! | Index      | 4 bytes: index within a static array                                       |
//! | Tag data   | Struct type and GUID, bool value, enum name, element type or map types      |
//! | Has GUID   | 1 byte, followed by a 16 byte property GUID when set                       |
//! | Value      | Size bytes                                                                 |
//!
//! Whatever follows the property list of an export is a class specific payload.
//!
//! ## Example
//!
//! ```no_run
//! use uepak_archive::{ArchiveSource, PakArchive};
//! use uepak_asset::{PakProcessor, Registry};
//!
//! # fn main() -> uepak_asset::error::Result<()> {
//! let mut archive = PakArchive::open(&ArchiveSource::Path("Game.pak".into()))?;
//! let registry = Registry::new();
//!
//! PakProcessor::new(&registry).process_filtered(
//!     &mut archive,
//!     |name| name.contains("/DataTables/"),
//!     |name, entry, _| println!("{name}: {} exports", entry.exports.len()),
//! );
//! # Ok(())
//! # }
//! ```

pub mod class;
pub mod codec;
pub mod error;
pub mod package_index;
pub mod process;
pub mod profile;
pub mod property;
pub mod registry;
pub mod structs;
pub mod summary;

pub use class::ClassValue;
pub use package_index::{ObjectRef, PackageIndex};
pub use process::{ExportSet, PackageEntrySet, PakProcessor};
pub use property::{PropertyReader, PropertyTag, PropertyType, PropertyValue};
pub use registry::{GameProfile, Registry};
pub use structs::StructValue;
pub use summary::{read_summary, PackageSummary};
