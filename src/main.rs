use std::path::PathBuf;

use anyhow::{Context, Result};
use tdb_export::{dump::MetadataDump, plugin, BuildOutcome, Config};

fn main() -> Result<()> {
    let dump_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: tdb-export <metadata-dump.json>")?;

    let config = Config::from_env()?;
    let dump = MetadataDump::from_path(&dump_path)
        .with_context(|| format!("Failed to load {}", dump_path.display()))?;

    match plugin::run(&dump, &config) {
        BuildOutcome::NoConfigDir => eprintln!(
            "[tdb-export] no `{}` directory under {}, nothing to do",
            config.config_dir_name,
            config.working_dir.display()
        ),
        BuildOutcome::AlreadyExists(path) => {
            eprintln!("[tdb-export] {} already exists", path.display())
        }
        BuildOutcome::Built(report) => eprintln!(
            "[tdb-export] wrote {} ({} types, {} fields, {} methods, {} parameters)",
            report.path.display(),
            report.summary.types,
            report.summary.fields,
            report.summary.methods,
            report.summary.parameters
        ),
        BuildOutcome::Failed(message) => eprintln!("[tdb-export] build failed: {message}"),
    }
    Ok(())
}
