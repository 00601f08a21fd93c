//! Decoding of whole packages: a `.uasset` header paired with the export data in its `.uexp`.

use std::{
    any::Any,
    collections::HashMap,
    io::{self, SeekFrom},
    panic::{self, AssertUnwindSafe},
};

use tracing::{error, info, instrument, warn};
use uepak_archive::{read::read_record_data, PakArchive, PakCursor, PakEntry, PakFile, PakInfo};

use crate::{
    class::ClassValue,
    error::{Error, Result},
    property::{PropertyReader, PropertyTag},
    registry::Registry,
    summary::{read_summary, ObjectExport, PackageSummary},
};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Archive version from which every export body starts with 3 opaque bytes
const VERSION_EXPORT_FILLER: u32 = 9;

/// Trailing export bytes at or below this size are not offered to class resolvers
const MIN_CLASS_PAYLOAD: i64 = 4;

/// Decoded export
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ExportSet {
    pub export: ObjectExport,
    pub properties: Vec<PropertyTag>,
    /// Class payload following the properties
    pub data: Option<ClassValue>,
    /// Why decoding stopped, when it did
    pub diagnostic: Option<String>,
}

/// Decoded package, handed to the sink of [`PakProcessor`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PackageEntrySet {
    /// The `.uexp` record holding the exports
    pub record: PakEntry,
    pub summary: PackageSummary,
    pub exports: Vec<ExportSet>,
}

/// Record indexes of a `.uasset` and its `.uexp`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PackagePair {
    summary: usize,
    exports: usize,
}

/// Drives decoding of every package in an archive
#[derive(Debug, Clone, Copy)]
pub struct PakProcessor<'r> {
    registry: &'r Registry,
}

impl<'r> PakProcessor<'r> {
    pub fn new(registry: &'r Registry) -> PakProcessor<'r> {
        PakProcessor { registry }
    }

    /// Decode every package of `archive`, see [`PakProcessor::process_filtered`]
    pub fn process<S>(&self, archive: &mut PakArchive, sink: S) -> usize
    where
        S: FnMut(&str, PackageEntrySet, &PakFile),
    {
        self.process_filtered(archive, |_| true, sink)
    }

    /// Decode the packages whose `.uasset` and `.uexp` names both pass `filter`
    ///
    /// `sink` receives the `.uexp` name and the decoded package, in record order. Packages whose
    /// header cannot be read are logged and left out. Returns how many packages were delivered.
    #[instrument(skip_all)]
    pub fn process_filtered<P, S>(&self, archive: &mut PakArchive, filter: P, mut sink: S) -> usize
    where
        P: Fn(&str) -> bool,
        S: FnMut(&str, PackageEntrySet, &PakFile),
    {
        let pak = archive.shared();
        let pairs = pair_records(&pak, &filter);
        info!(packages = pairs.len(), "decoding packages");

        let mut delivered = 0;
        for pair in pairs {
            if let Some(entry) = self.decode_package(archive.cursor_mut(), &pak, pair) {
                let name = pak.index.records[pair.exports].file_name.clone();
                sink(&name, entry, &pak);
                delivered += 1;
            }
        }
        delivered
    }

    /// Decode packages concurrently, each on its own reader opened from `source`
    ///
    /// Delivery order is unspecified.
    #[cfg(feature = "parallel")]
    #[instrument(skip_all, err)]
    pub fn process_parallel<P, S>(
        &self,
        source: &uepak_archive::ArchiveSource,
        options: uepak_archive::ReadOptions,
        filter: P,
        sink: S,
    ) -> Result<usize>
    where
        P: Fn(&str) -> bool + Sync,
        S: Fn(&str, PackageEntrySet, &PakFile) + Sync,
    {
        use rayon::prelude::*;

        let archive = PakArchive::with_options(source.open()?, options)?;
        let pak = archive.shared();
        let pairs = pair_records(&pak, &filter);
        info!(packages = pairs.len(), "decoding packages in parallel");

        let delivered = pairs
            .par_iter()
            .map(|pair| -> Result<usize> {
                let mut cursor = PakCursor::with_preload(source.open()?, options.preload);
                match self.decode_package(&mut cursor, &pak, *pair) {
                    Some(entry) => {
                        sink(&pak.index.records[pair.exports].file_name, entry, &pak);
                        Ok(1)
                    }
                    None => Ok(0),
                }
            })
            .try_reduce(|| 0, |a, b| Ok(a + b))?;
        Ok(delivered)
    }

    fn decode_package(
        &self,
        cursor: &mut PakCursor,
        pak: &PakFile,
        pair: PackagePair,
    ) -> Option<PackageEntrySet> {
        let asset = &pak.index.records[pair.summary];
        let exp = &pak.index.records[pair.exports];
        info!(record = %asset.file_name, "reading package");

        let summary = match read_summary(cursor, &pak.footer, asset) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(
                    record = %asset.file_name,
                    error = %e,
                    "skipping package with an unreadable header"
                );
                return None;
            }
        };

        let exports = match self.read_exports(cursor, &pak.footer, exp, &summary) {
            Ok(exports) => exports,
            Err(e) => {
                error!(record = %exp.file_name, error = %e, "unable to read export data");
                Vec::new()
            }
        };

        Some(PackageEntrySet {
            record: exp.clone(),
            summary,
            exports,
        })
    }

    /// Decode every export of `summary` from its `.uexp` record
    ///
    /// Each export is decoded on its own; a failing export yields an empty [`ExportSet`] with a
    /// diagnostic and the rest carry on. Compressed records are inflated up front.
    #[instrument(skip_all, fields(record = %record.file_name), err)]
    pub fn read_exports(
        &self,
        cursor: &mut PakCursor,
        footer: &PakInfo,
        record: &PakEntry,
        summary: &PackageSummary,
    ) -> Result<Vec<ExportSet>> {
        if record.is_compressed() {
            let data = read_record_data(cursor, footer, record)?;
            let mut inflated =
                PakCursor::with_preload(io::Cursor::new(data), cursor.preload_enabled());
            return Ok(self.decode_exports(&mut inflated, 0, footer.version, summary));
        }

        let base = record.offset + footer.header_size();
        Ok(self.decode_exports(cursor, base, footer.version, summary))
    }

    fn decode_exports(
        &self,
        cursor: &mut PakCursor,
        base: u64,
        version: u32,
        summary: &PackageSummary,
    ) -> Vec<ExportSet> {
        summary
            .exports
            .iter()
            .map(|export| {
                let decoded = panic::catch_unwind(AssertUnwindSafe(|| {
                    self.decode_export(cursor, base, version, summary, export)
                }));

                let (properties, data, diagnostic) = match decoded {
                    Ok(Ok((properties, data))) => (properties, data, None),
                    Ok(Err(e)) => {
                        error!(export = %export.object_name, error = %e, "unable to decode export");
                        (Vec::new(), None, Some(e.to_string()))
                    }
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        error!(export = %export.object_name, %message, "export decoder panicked");
                        (Vec::new(), None, Some(message))
                    }
                };

                ExportSet {
                    export: export.clone(),
                    properties,
                    data,
                    diagnostic,
                }
            })
            .collect()
    }

    fn decode_export(
        &self,
        cursor: &mut PakCursor,
        base: u64,
        version: u32,
        summary: &PackageSummary,
        export: &ObjectExport,
    ) -> Result<(Vec<PropertyTag>, Option<ClassValue>)> {
        let relative = export.serial_offset - i64::from(summary.total_header_size);
        let position = i64::try_from(base)
            .ok()
            .and_then(|base| base.checked_add(relative))
            .and_then(|position| u64::try_from(position).ok())
            .ok_or(Error::InvalidLength {
                context: "export offset",
                value: export.serial_offset,
            })?;
        cursor.seek(SeekFrom::Start(position))?;

        let start = cursor.track();
        if version >= VERSION_EXPORT_FILLER {
            cursor.skip(3)?;
        }

        let mut reader = PropertyReader::new(cursor, summary, self.registry);
        let properties = reader.read_properties()?;

        let consumed = reader.cursor().untrack(start);
        let remaining = export.serial_size - consumed as i64;
        if remaining < 0 {
            warn!(
                export = %export.object_name,
                serial_size = export.serial_size,
                consumed,
                "export properties ran past the serial size"
            );
        }

        let mut data = None;
        if remaining > MIN_CLASS_PAYLOAD {
            reader.cursor().preload(remaining as usize)?;
            if let Some(class_name) = summary.class_name(export.template_index) {
                data = reader.read_class_payload(export, class_name, remaining as u64)?;
            }
        }

        Ok((properties, data))
    }
}

/// Pair every `.uexp` passing `filter` with the `.uasset` of the same stem
fn pair_records<P: Fn(&str) -> bool>(pak: &PakFile, filter: &P) -> Vec<PackagePair> {
    let summaries: HashMap<&str, usize> = pak
        .index
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| filter(&record.file_name))
        .filter_map(|(i, record)| {
            record
                .file_name
                .strip_suffix(".uasset")
                .map(|stem| (stem, i))
        })
        .collect();

    pak.index
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| filter(&record.file_name))
        .filter_map(|(i, record)| {
            let stem = record.file_name.strip_suffix(".uexp")?;
            match summaries.get(stem) {
                Some(summary) => Some(PackagePair {
                    summary: *summary,
                    exports: i,
                }),
                None => {
                    error!(record = %record.file_name, "no matching .uasset record");
                    None
                }
            }
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "export decoder panicked".to_owned()
    }
}
