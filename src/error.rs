use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid metadata dump: {0}")]
    Dump(#[from] serde_json::Error),
}

impl ExportError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

pub fn failure_message(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        "Unknown error".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_action_and_path() {
        let err = ExportError::io(
            "Failed creating",
            "/tmp/TDB.db",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "Failed creating /tmp/TDB.db: denied");
    }

    #[test]
    fn empty_message_becomes_unknown_error() {
        assert_eq!(failure_message("  "), "Unknown error");
        assert_eq!(failure_message("disk full\n"), "disk full");
    }
}
