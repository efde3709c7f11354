use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
};

use tracing::{debug, error, info, warn};

use crate::{
    config::Config,
    discovery,
    error::failure_message,
    logging,
    normalize::Normalizer,
    reflection::{EntityKind, ReflectionSurface},
    store::{self, BuildReport},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

pub const PLUGIN_API_VERSION: PluginVersion = PluginVersion {
    major: 1,
    minor: 12,
    patch: 0,
};

pub fn required_version() -> PluginVersion {
    PLUGIN_API_VERSION
}

#[derive(Debug)]
pub enum BuildOutcome {
    NoConfigDir,
    AlreadyExists(PathBuf),
    Built(BuildReport),
    Failed(String),
}

// Failures only ever reach the log file; the host always sees success.
pub fn initialize<S: ReflectionSurface>(surface: &S, config: &Config) -> bool {
    let _ = run(surface, config);
    true
}

pub fn run<S: ReflectionSurface>(surface: &S, config: &Config) -> BuildOutcome {
    let Some(config_dir) =
        discovery::find_directory_ignore_case(&config.working_dir, &config.config_dir_name)
    else {
        return BuildOutcome::NoConfigDir;
    };

    if config.file_log {
        let log_path = discovery::log_path(&config_dir, &config.log_file_name);
        if let Err(err) = logging::init_file_logger(&log_path, &config.log_filter) {
            warn!("Keeping existing logger: {err:#}");
        }
    }
    for warning in &config.warnings {
        warn!("{warning}");
    }

    let db_path = discovery::database_path(&config_dir, &config.db_file_name);
    if db_path.exists() {
        info!(path = %db_path.display(), "TDB: Already exists");
        return BuildOutcome::AlreadyExists(db_path);
    }

    info!(path = %db_path.display(), "TDB: Does not exist");
    info!(layout = config.layout.as_str(), "TDB: Starting creation");

    match catch_quietly(|| build(surface, config, &db_path)) {
        Ok(Ok(report)) => {
            info!(
                path = %report.path.display(),
                elapsed_ms = report.elapsed_ms as u64,
                "TDB: Created"
            );
            BuildOutcome::Built(report)
        }
        Ok(Err(err)) => {
            let message = failure_message(&err.to_string());
            error!("ERROR: {message}");
            BuildOutcome::Failed(message)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("ERROR: {message}");
            BuildOutcome::Failed(message)
        }
    }
}

fn build<S: ReflectionSurface>(
    surface: &S,
    config: &Config,
    db_path: &Path,
) -> Result<BuildReport, crate::error::ExportError> {
    info!(
        num_types = surface.count(EntityKind::Type),
        num_fields = surface.count(EntityKind::Field),
        num_methods = surface.count(EntityKind::Method),
        "Host type database"
    );

    let normalizer = Normalizer::new(surface, config.layout);
    let sizes = normalizer.sizes();
    info!(types = sizes.types, "Type ids assigned");
    for (partition, size) in &sizes.fields {
        info!(partition = partition.as_str(), size, "Field ids assigned");
    }
    for (partition, size) in &sizes.methods {
        info!(partition = partition.as_str(), size, "Method ids assigned");
    }

    store::write_database(normalizer, db_path)
}

fn catch_quietly<T>(f: impl FnOnce() -> T) -> std::thread::Result<T> {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|location| location.to_string())
            .unwrap_or_default();
        debug!(location = %location, "TDB: Build panicked");
    }));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    panic::set_hook(previous);
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return failure_message(message);
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return failure_message(message);
    }
    failure_message("")
}
