use std::{fs::File, path::Path, sync::Mutex};

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

pub fn init_file_logger(path: &Path, filter: &str) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;

    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| anyhow!("Failed to install file logger: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritable_log_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = init_file_logger(&dir.path().join("missing").join("log.txt"), "info")
            .unwrap_err();
        assert!(err.to_string().contains("Failed to create log file"));
    }
}
