use std::{path::PathBuf, sync::Mutex};

use clap::Args;
use miette::Result;
use tracing::info;
use uepak_archive::{ArchiveSource, PakArchive, ReadOptions};
use uepak_asset::{PackageEntrySet, PakProcessor, Registry};

use super::{registry, write_json, AssetFilter, Selection};

#[derive(Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    selection: Selection,

    /// Target JSON file holding every decoded package
    #[arg(short, long, value_name = "FILE", default_value = "extracted.json")]
    output: PathBuf,

    /// Write one JSON file per package below this directory instead
    #[arg(long, value_name = "DIR", conflicts_with = "output")]
    split: Option<PathBuf>,

    /// Indent the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Game specific decoders to register, e.g. `satisfactory`
    #[arg(long, value_name = "NAME")]
    profile: Option<String>,

    /// Decode packages on all cores
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let registry = registry(self.profile.as_deref())?;
        let filter = self.selection.filter()?;

        let mut packages = Vec::new();
        for path in self.selection.paks()? {
            info!("parsing {}", path.display());
            if self.parallel {
                packages.extend(decode_parallel(path, &registry, &filter)?);
            } else {
                let mut archive = PakArchive::open(&ArchiveSource::Path(path))?;
                PakProcessor::new(&registry).process_filtered(
                    &mut archive,
                    |name| filter.matches(name),
                    |_, entry, _| packages.push(entry),
                );
            }
        }
        info!(packages = packages.len(), "decoded");

        match &self.split {
            Some(directory) => {
                for package in &packages {
                    let p = directory.join(format!("{}.json", package.record.stem()));
                    info!("writing {}", p.display());
                    write_json(&p, package, self.pretty)?;
                }
                Ok(())
            }
            None => {
                info!("writing {}", self.output.display());
                write_json(&self.output, &packages, self.pretty)
            }
        }
    }
}

fn decode_parallel(
    path: PathBuf,
    registry: &Registry,
    filter: &AssetFilter,
) -> Result<Vec<PackageEntrySet>> {
    let packages = Mutex::new(Vec::new());
    PakProcessor::new(registry).process_parallel(
        &ArchiveSource::Path(path),
        ReadOptions::default(),
        |name| filter.matches(name),
        |_, entry, _| {
            packages
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(entry)
        },
    )?;

    let mut packages = packages
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    packages.sort_by(|a, b| a.record.file_name.cmp(&b.record.file_name));
    Ok(packages)
}
