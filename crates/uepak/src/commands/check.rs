use clap::Args;
use miette::{miette, Result};
use tracing::{info, warn};
use uepak_archive::{ArchiveSource, PakArchive};
use uepak_asset::PakProcessor;

use super::{registry, Selection};

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    selection: Selection,

    /// Game specific decoders to register, e.g. `satisfactory`
    #[arg(long, value_name = "NAME")]
    profile: Option<String>,
}

impl CheckArgs {
    /// Decode everything selected, failing when any export could not be decoded
    pub fn handle(&self) -> Result<()> {
        let registry = registry(self.profile.as_deref())?;
        let filter = self.selection.filter()?;

        let (mut packages, mut exports, mut failed) = (0, 0, 0);
        for path in self.selection.paks()? {
            info!("parsing {}", path.display());
            let mut archive = PakArchive::open(&ArchiveSource::Path(path))?;
            packages += PakProcessor::new(&registry).process_filtered(
                &mut archive,
                |name| filter.matches(name),
                |name, entry, _| {
                    for export in &entry.exports {
                        exports += 1;
                        if let Some(diagnostic) = &export.diagnostic {
                            failed += 1;
                            warn!(package = name, export = %export.export.object_name, %diagnostic, "export failed");
                        }
                    }
                },
            );
        }

        info!(packages, exports, failed, "checked");
        if failed > 0 {
            return Err(miette!("{failed} of {exports} exports failed to decode"));
        }
        Ok(())
    }
}
