pub mod check;
pub mod class_tree;
pub mod extract;
pub mod list;

use std::{fs::File, io::BufWriter, path::Path, path::PathBuf};

use clap::Args;
use miette::{miette, Context, IntoDiagnostic, Result};
use serde::Serialize;
use tracing::warn;
use uepak_asset::{profile::profile_by_name, Registry};

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Decode packages and write them out as JSON
    Extract(extract::ExtractArgs),
    /// List the records of pak archives
    List(list::ListArgs),
    /// Print the class, super, template and outer chains of every export
    ClassTree(class_tree::ClassTreeArgs),
    /// Decode packages and report exports that fail
    Check(check::CheckArgs),
}

impl Commands {
    pub fn handle(&self) -> Result<()> {
        match self {
            Commands::Extract(args) => args.handle(),
            Commands::List(args) => args.handle(),
            Commands::ClassTree(args) => args.handle(),
            Commands::Check(args) => args.handle(),
        }
    }
}

/// Which archives and which of their records to work on
#[derive(Args)]
pub struct Selection {
    /// Pak archives to read (supports glob)
    #[arg(short, long, value_name = "GLOB")]
    pak: String,

    /// Comma separated record patterns (supports glob), all records when absent
    #[arg(short, long, value_name = "GLOB", value_delimiter = ',')]
    assets: Vec<String>,
}

impl Selection {
    /// Archive paths matching the pak pattern
    pub fn paks(&self) -> Result<Vec<PathBuf>> {
        let paths = glob::glob(&self.pak)
            .into_diagnostic()
            .context(format!("pattern: {}", self.pak))?;

        let mut paks = Vec::new();
        for path in paths {
            match path {
                Ok(path) => paks.push(path),
                Err(e) => warn!(error = %e, "skipping unreadable path"),
            }
        }
        if paks.is_empty() {
            return Err(miette!("no archive matches {}", self.pak));
        }
        Ok(paks)
    }

    pub fn filter(&self) -> Result<AssetFilter> {
        let patterns = self
            .assets
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern.trim())
                    .into_diagnostic()
                    .context(format!("pattern: {pattern}"))
            })
            .collect::<Result<_>>()?;
        Ok(AssetFilter(patterns))
    }
}

/// Record name patterns, matching everything when empty
pub struct AssetFilter(Vec<glob::Pattern>);

impl AssetFilter {
    pub fn matches(&self, name: &str) -> bool {
        self.0.is_empty() || self.0.iter().any(|pattern| pattern.matches(name))
    }
}

/// Built-in decoders plus those of the named game profile
pub fn registry(profile: Option<&str>) -> Result<Registry> {
    let registry = Registry::new();
    match profile {
        Some(name) => {
            let profile =
                profile_by_name(name).ok_or_else(|| miette!("unknown game profile {name}"))?;
            Ok(registry.with_game_profile(profile.as_ref()))
        }
        None => Ok(registry),
    }
}

/// Write `value` as JSON to `path`, creating missing directories
pub fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .into_diagnostic()
            .context(format!("creating {}", parent.display()))?;
    }
    let out = File::create(path)
        .into_diagnostic()
        .context(format!("creating {}", path.display()))?;
    let out = BufWriter::new(out);

    if pretty {
        serde_json::to_writer_pretty(out, value).into_diagnostic()
    } else {
        serde_json::to_writer(out, value).into_diagnostic()
    }
    .context(format!("writing {}", path.display()))
}

#[cfg(test)]
mod test {
    use super::AssetFilter;

    #[test]
    fn asset_filter() {
        let all = AssetFilter(Vec::new());
        assert!(all.matches("Game/Maps/Level.uexp"));

        let tables = AssetFilter(vec![
            glob::Pattern::new("*/DataTables/*").unwrap(),
            glob::Pattern::new("*.umap").unwrap(),
        ]);
        assert!(tables.matches("FactoryGame/Content/DataTables/Items.uasset"));
        assert!(tables.matches("Game/Level.umap"));
        assert!(!tables.matches("Game/Textures/Rock.uexp"));
    }
}
