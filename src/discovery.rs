use std::{
    fs,
    path::{Path, PathBuf},
};

/// An exact-case match wins over other spellings; among the remaining
/// candidates the lexically smallest path is picked so the result does not
/// depend on directory iteration order. Unreadable entries are skipped.
pub fn find_directory_ignore_case(base: &Path, name: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(base).ok()?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|file_name| file_name.to_str())
                .is_some_and(|file_name| file_name.eq_ignore_ascii_case(name))
        })
        .filter(|path| path.is_dir())
        .collect();

    candidates.sort();
    let exact = candidates
        .iter()
        .position(|path| path.file_name().and_then(|f| f.to_str()) == Some(name));
    match exact {
        Some(index) => Some(candidates.swap_remove(index)),
        None => candidates.into_iter().next(),
    }
}

pub fn database_path(config_dir: &Path, file_name: &str) -> PathBuf {
    config_dir.join(file_name)
}

pub fn log_path(config_dir: &Path, file_name: &str) -> PathBuf {
    config_dir.join(file_name)
}
