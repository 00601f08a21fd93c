//! Package headers: versions, name table, imports and exports.

use std::{collections::HashSet, fmt, io::SeekFrom};

use binrw::{binread, BinRead, BinResult};
use tracing::{debug, instrument};
use uepak_archive::{PakCursor, PakEntry, PakInfo};

use crate::{
    codec::{
        fname, fstring, CompressedChunk, CustomVersion, EngineVersion, GenerationInfo, Guid,
    },
    error::{Error, Result},
    package_index::{ObjectRef, PackageIndex},
};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Opaque bytes in front of the zlib stream of a compressed package header
const COMPRESSED_PREAMBLE: u64 = 23;

/// Archive version from which uncompressed headers carry 3 opaque bytes after the versions
const VERSION_HEADER_FILLER: u32 = 9;

/// Upper bound on the number of hops [`PackageSummary::reference_chain`] takes
pub const MAX_CHAIN_DEPTH: usize = 64;

/// Entry of a package's name table
#[derive(BinRead, Debug, Default, Clone, PartialEq, Eq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct NameEntry {
    #[br(parse_with = fstring)]
    pub name: String,
    pub non_case_preserving_hash: u16,
    pub case_preserving_hash: u16,
}

/// Object defined in another package
#[derive(BinRead, Debug, Default, Clone, PartialEq, Eq)]
#[br(little, import(names: &[NameEntry]))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ObjectImport {
    #[br(parse_with = fname, args(names))]
    pub class_package: String,
    #[br(parse_with = fname, args(names))]
    pub class_name: String,
    pub outer_index: PackageIndex,
    #[br(parse_with = fname, args(names))]
    pub object_name: String,

    /// Slot the outer index resolves to, filled once every table is read
    #[br(ignore)]
    pub outer: Option<ObjectRef>,
}

/// Object defined in this package
#[derive(BinRead, Debug, Default, Clone, PartialEq, Eq)]
#[br(little, import(names: &[NameEntry]))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ObjectExport {
    pub class_index: PackageIndex,
    pub super_index: PackageIndex,
    pub template_index: PackageIndex,
    pub outer_index: PackageIndex,
    #[br(parse_with = fname, args(names))]
    pub object_name: String,
    pub object_flags: u32,
    pub serial_size: i64,
    /// Offset of the serialized object, counted from the start of the package header
    pub serial_offset: i64,
    #[br(map = |v: i32| v != 0)]
    pub forced_export: bool,
    #[br(map = |v: i32| v != 0)]
    pub not_for_client: bool,
    #[br(map = |v: i32| v != 0)]
    pub not_for_server: bool,
    pub package_guid: Guid,
    pub package_flags: u32,
    #[br(map = |v: i32| v != 0)]
    pub not_always_loaded_for_editor_game: bool,
    #[br(map = |v: i32| v != 0)]
    pub is_asset: bool,
    pub first_export_dependency: i32,
    pub serialization_before_serialization_dependencies: i32,
    pub create_before_serialization_dependencies: i32,
    pub serialization_before_create_dependencies: i32,
    pub create_before_create_dependencies: i32,
}

#[binrw::parser(reader)]
fn fstring_list(count: u32) -> BinResult<Vec<String>> {
    let mut out = Vec::new();
    for _ in 0..count {
        out.push(fstring(reader, binrw::Endian::Little, ())?);
    }
    Ok(out)
}

/// Decoded header of one package
///
/// Field order follows the on-disk layout. Fields past the export table are not decoded.
#[binread]
#[derive(Debug, Default, Clone, PartialEq)]
#[br(little, import(opaque_filler: bool))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PackageSummary {
    pub tag: i32,
    pub legacy_file_version: i32,
    pub legacy_ue3_version: i32,
    pub file_version_ue4: i32,
    pub file_version_licensee_ue4: i32,
    #[br(temp)]
    custom_version_count: u32,
    #[br(count = custom_version_count)]
    pub custom_versions: Vec<CustomVersion>,
    #[br(temp, count = if opaque_filler { 3 } else { 0 })]
    _filler: Vec<u8>,

    /// Size of everything before the first export, as stored on disk
    pub total_header_size: i32,
    #[br(parse_with = fstring)]
    pub folder_name: String,
    pub package_flags: u32,
    #[br(temp)]
    name_count: u32,
    pub name_offset: i32,
    pub gatherable_text_data_count: i32,
    pub gatherable_text_data_offset: i32,
    #[br(temp)]
    export_count: u32,
    pub export_offset: i32,
    #[br(temp)]
    import_count: u32,
    pub import_offset: i32,
    pub depends_offset: i32,
    pub string_asset_references_count: i32,
    pub string_asset_references_offset: i32,
    pub searchable_names_offset: i32,
    pub thumbnail_table_offset: i32,
    pub guid: Guid,
    #[br(temp)]
    generation_count: u32,
    #[br(count = generation_count)]
    pub generations: Vec<GenerationInfo>,
    pub saved_by_engine_version: EngineVersion,
    pub compatible_with_engine_version: EngineVersion,
    pub compression_flags: u32,
    #[br(temp)]
    compressed_chunk_count: u32,
    #[br(count = compressed_chunk_count)]
    pub compressed_chunks: Vec<CompressedChunk>,
    pub package_source: u32,
    #[br(temp)]
    additional_package_count: u32,
    #[br(parse_with = fstring_list, args(additional_package_count))]
    pub additional_packages_to_cook: Vec<String>,
    pub asset_registry_data_offset: i32,
    pub bulk_data_start_offset: i32,
    pub world_tile_info_data_offset: i32,
    #[br(temp)]
    chunk_count: u32,
    #[br(count = chunk_count)]
    pub chunk_ids: Vec<i32>,
    #[br(temp)]
    _chunk_filler: [u8; 4],
    pub preload_dependency_count: i32,
    pub preload_dependency_offset: i32,

    #[br(count = name_count)]
    pub names: Vec<NameEntry>,
    #[br(count = import_count, args { inner: (names.as_slice(),) })]
    pub imports: Vec<ObjectImport>,
    #[br(count = export_count, args { inner: (names.as_slice(),) })]
    pub exports: Vec<ObjectExport>,
}

impl PackageSummary {
    /// Resolve a reference against this package's tables
    pub fn resolve(&self, index: PackageIndex) -> Option<ObjectRef> {
        index.resolve(self.imports.len(), self.exports.len())
    }

    /// Import a reference points at, if any
    pub fn import(&self, index: PackageIndex) -> Option<&ObjectImport> {
        match self.resolve(index)? {
            ObjectRef::Import(i) => self.imports.get(i),
            ObjectRef::Export(_) => None,
        }
    }

    /// Export a reference points at, if any
    pub fn export(&self, index: PackageIndex) -> Option<&ObjectExport> {
        match self.resolve(index)? {
            ObjectRef::Export(i) => self.exports.get(i),
            ObjectRef::Import(_) => None,
        }
    }

    /// Name of the referenced object
    pub fn object_name(&self, index: PackageIndex) -> Option<&str> {
        match self.resolve(index)? {
            ObjectRef::Import(i) => self.imports.get(i).map(|o| o.object_name.as_str()),
            ObjectRef::Export(i) => self.exports.get(i).map(|o| o.object_name.as_str()),
        }
    }

    /// Class name of the referenced object
    ///
    /// For an import this is its stored class name, for an export the name of the object its
    /// class index points at. Takes at most one hop.
    pub fn class_name(&self, index: PackageIndex) -> Option<&str> {
        match self.resolve(index)? {
            ObjectRef::Import(i) => self.imports.get(i).map(|o| o.class_name.as_str()),
            ObjectRef::Export(i) => self
                .exports
                .get(i)
                .and_then(|o| self.object_name(o.class_index)),
        }
    }

    /// Follow references from `start`, taking the next hop out of each export with `next`
    ///
    /// The walk ends at a null or dangling reference, at an import, or when an export is
    /// visited twice or [`MAX_CHAIN_DEPTH`] hops have been taken.
    pub fn reference_chain(
        &self,
        start: PackageIndex,
        next: impl Fn(&ObjectExport) -> PackageIndex,
    ) -> Vec<ChainLink> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = start;

        loop {
            match self.resolve(current) {
                None => {
                    chain.push(ChainLink::Root);
                    break;
                }
                Some(ObjectRef::Import(i)) => {
                    chain.push(ChainLink::Import(self.imports[i].object_name.clone()));
                    break;
                }
                Some(ObjectRef::Export(i)) => {
                    if !visited.insert(i) || chain.len() >= MAX_CHAIN_DEPTH {
                        chain.push(ChainLink::Cycle);
                        break;
                    }
                    let export = &self.exports[i];
                    chain.push(ChainLink::Export(export.object_name.clone()));
                    current = next(export);
                }
            }
        }

        chain
    }

    fn resolve_import_outers(&mut self) {
        let (imports, exports) = (self.imports.len(), self.exports.len());
        for import in self.imports.iter_mut() {
            import.outer = import.outer_index.resolve(imports, exports);
        }
    }
}

/// One hop of a reference chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainLink {
    /// Null or dangling reference
    Root,
    Import(String),
    Export(String),
    /// The walk was cut short
    Cycle,
}

impl fmt::Display for ChainLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainLink::Root => write!(f, "ROOT"),
            ChainLink::Import(name) => write!(f, "[I] {name}"),
            ChainLink::Export(name) => write!(f, "[E] {name}"),
            ChainLink::Cycle => write!(f, "..."),
        }
    }
}

/// Decode the header stored in `record`
///
/// Compressed records skip their opaque preamble and are read through the inflate filter,
/// which is removed again whether decoding succeeds or not.
#[instrument(skip_all, fields(record = %record.file_name), err)]
pub fn read_summary(
    cursor: &mut PakCursor,
    footer: &PakInfo,
    record: &PakEntry,
) -> Result<PackageSummary> {
    cursor.seek(SeekFrom::Start(record.offset + footer.header_size()))?;

    if record.is_compressed() {
        cursor.skip(COMPRESSED_PREAMBLE)?;
        cursor.start_compression(record.compression_method)?;
    }

    let decoded = decode_summary(cursor, footer, record);
    let stopped = cursor.stop_compression();
    let summary = decoded?;
    stopped?;

    debug!(
        names = summary.names.len(),
        imports = summary.imports.len(),
        exports = summary.exports.len(),
        "read package summary"
    );
    Ok(summary)
}

fn decode_summary(
    cursor: &mut PakCursor,
    footer: &PakInfo,
    record: &PakEntry,
) -> Result<PackageSummary> {
    let preload = usize::try_from(record.uncompressed_size.saturating_sub(1)).map_err(|_| {
        Error::InvalidLength {
            context: "package header size",
            value: record.uncompressed_size as i64,
        }
    })?;
    cursor.preload(preload)?;

    let opaque_filler = footer.version >= VERSION_HEADER_FILLER && !record.is_compressed();
    let mut summary = PackageSummary::read_args(cursor, (opaque_filler,))?;
    summary.resolve_import_outers();

    Ok(summary)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::package_index::{ObjectRef, PackageIndex};
    use crate::summary::{ChainLink, ObjectExport, ObjectImport, PackageSummary};

    fn import(name: &str, class_name: &str, outer: i32) -> ObjectImport {
        ObjectImport {
            class_package: "/Script/CoreUObject".into(),
            class_name: class_name.into(),
            outer_index: PackageIndex(outer),
            object_name: name.into(),
            outer: None,
        }
    }

    fn export(name: &str, class_index: i32, outer: i32) -> ObjectExport {
        ObjectExport {
            class_index: PackageIndex(class_index),
            outer_index: PackageIndex(outer),
            object_name: name.into(),
            ..Default::default()
        }
    }

    fn summary() -> PackageSummary {
        let mut summary = PackageSummary {
            imports: vec![
                import("/Script/Engine", "Package", 0),
                import("DataTable", "Class", -1),
                import("Nested", "Class", 1),
            ],
            exports: vec![
                export("Recipes", -2, 0),
                export("Default__Recipes", 1, 1),
                export("SelfA", 4, 0),
                export("SelfB", 3, 0),
            ],
            ..Default::default()
        };
        summary.resolve_import_outers();
        summary
    }

    #[test]
    fn import_outers() {
        let summary = summary();
        assert_eq!(summary.imports[0].outer, None);
        assert_eq!(summary.imports[1].outer, Some(ObjectRef::Import(0)));
        assert_eq!(summary.imports[2].outer, Some(ObjectRef::Export(0)));
    }

    #[test]
    fn class_names() {
        let summary = summary();
        assert_eq!(summary.class_name(PackageIndex(-2)), Some("Class"));
        assert_eq!(summary.class_name(PackageIndex(1)), Some("DataTable"));
        assert_eq!(summary.class_name(PackageIndex(2)), Some("Recipes"));
        assert_eq!(summary.class_name(PackageIndex(0)), None);
        assert_eq!(summary.class_name(PackageIndex(40)), None);
    }

    #[test]
    fn class_chain() {
        let summary = summary();

        let chain = summary.reference_chain(PackageIndex(2), |e| e.class_index);
        assert_eq!(
            chain,
            vec![
                ChainLink::Export("Default__Recipes".into()),
                ChainLink::Export("Recipes".into()),
                ChainLink::Import("DataTable".into()),
            ]
        );

        let chain = summary.reference_chain(PackageIndex(2), |e| e.outer_index);
        assert_eq!(
            chain.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["[E] Default__Recipes", "[E] Recipes", "ROOT"]
        );
    }

    #[test]
    fn class_chain_cycle() {
        let summary = summary();

        let chain = summary.reference_chain(PackageIndex(3), |e| e.class_index);
        assert_eq!(
            chain,
            vec![
                ChainLink::Export("SelfA".into()),
                ChainLink::Export("SelfB".into()),
                ChainLink::Cycle,
            ]
        );
    }
}
