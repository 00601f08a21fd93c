use std::path::PathBuf;

use clap::Args;
use miette::Result;
use tracing::info;
use uepak_archive::{ArchiveSource, PakArchive};

use super::{write_json, Selection};

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    selection: Selection,

    /// Write the full record metadata as JSON instead of printing a table
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let filter = self.selection.filter()?;

        let mut records = Vec::new();
        for path in self.selection.paks()? {
            info!("reading {}", path.display());
            let archive = PakArchive::open(&ArchiveSource::Path(path))?;
            let pak = archive.shared();
            info!(
                version = pak.footer.version,
                mount_point = %pak.index.mount_point,
                records = pak.index.records.len(),
                "opened archive"
            );

            let selected = pak.index.records.iter().filter(|r| filter.matches(&r.file_name));
            for record in selected {
                if self.json.is_none() {
                    println!(
                        "{:>12} {:>12} {:>4} {}",
                        record.size,
                        record.uncompressed_size,
                        record.compression_method,
                        record.file_name
                    );
                }
                records.push(record.clone());
            }
        }

        match &self.json {
            Some(p) => write_json(p, &records, true),
            None => Ok(()),
        }
    }
}
