use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use tracing::info;
use uepak_archive::{ArchiveSource, PakArchive};
use uepak_asset::{
    summary::{ChainLink, ObjectExport},
    PackageSummary, PakProcessor, Registry,
};

use super::Selection;

#[derive(Args)]
pub struct ClassTreeArgs {
    #[command(flatten)]
    selection: Selection,

    /// Target text file, standard output when absent
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl ClassTreeArgs {
    pub fn handle(&self) -> Result<()> {
        let registry = Registry::new();
        let filter = self.selection.filter()?;

        let mut lines = Vec::new();
        for path in self.selection.paks()? {
            info!("parsing {}", path.display());
            let mut archive = PakArchive::open(&ArchiveSource::Path(path))?;
            PakProcessor::new(&registry).process_filtered(
                &mut archive,
                |name| filter.matches(name),
                |name, entry, _| {
                    lines.push(name.to_owned());
                    for export in &entry.summary.exports {
                        lines.extend(export_chains(&entry.summary, export));
                    }
                },
            );
        }

        let mut out: Box<dyn Write> = match &self.output {
            Some(p) => Box::new(BufWriter::new(
                File::create(p)
                    .into_diagnostic()
                    .context(format!("creating {}", p.display()))?,
            )),
            None => Box::new(BufWriter::new(io::stdout().lock())),
        };
        for line in lines {
            writeln!(out, "{line}").into_diagnostic()?;
        }
        out.flush().into_diagnostic()
    }
}

/// The four reference chains of `export`, one line each
fn export_chains(summary: &PackageSummary, export: &ObjectExport) -> [String; 4] {
    let name = &export.object_name;
    [
        format!(
            "  Class: {name}{}",
            format_chain(&summary.reference_chain(export.class_index, |e| e.class_index))
        ),
        format!(
            "  Super: {name}{}",
            format_chain(&summary.reference_chain(export.super_index, |e| e.super_index))
        ),
        format!(
            "  Templ: {name}{}",
            format_chain(&summary.reference_chain(export.template_index, |e| e.template_index))
        ),
        format!(
            "  Outer: {name}{}",
            format_chain(&summary.reference_chain(export.outer_index, |e| e.outer_index))
        ),
    ]
}

fn format_chain(links: &[ChainLink]) -> String {
    links.iter().map(|link| format!(" -> {link}")).collect()
}
