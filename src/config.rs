use std::{env, path::PathBuf};

use anyhow::{Context, Result};

use crate::schema::SchemaLayout;

pub const DEFAULT_CONFIG_DIR_NAME: &str = "reframework";
pub const DEFAULT_DB_FILE: &str = "TDB.db";
pub const DEFAULT_LOG_FILE: &str = "log.txt";

#[derive(Debug, Clone)]
pub struct Config {
    pub working_dir: PathBuf,
    pub config_dir_name: String,
    pub db_file_name: String,
    pub log_file_name: String,
    pub layout: SchemaLayout,
    pub log_filter: String,
    pub file_log: bool,
    pub warnings: Vec<String>,
}

impl Config {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            config_dir_name: DEFAULT_CONFIG_DIR_NAME.to_string(),
            db_file_name: DEFAULT_DB_FILE.to_string(),
            log_file_name: DEFAULT_LOG_FILE.to_string(),
            layout: SchemaLayout::default(),
            log_filter: "info".to_string(),
            file_log: true,
            warnings: Vec::new(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let working_dir = match non_empty_var("TDB_EXPORT_WORKDIR") {
            Some(dir) => PathBuf::from(dir),
            None => env::current_dir().context("Failed to resolve current directory")?,
        };
        let mut config = Self::new(working_dir);

        if let Some(name) = non_empty_var("TDB_EXPORT_CONFIG_DIR_NAME") {
            config.config_dir_name = name;
        }
        if let Some(name) = non_empty_var("TDB_EXPORT_DB_FILE") {
            config.db_file_name = name;
        }
        if let Some(name) = non_empty_var("TDB_EXPORT_LOG_FILE") {
            config.log_file_name = name;
        }
        if let Some(filter) = non_empty_var("TDB_EXPORT_LOG_FILTER") {
            config.log_filter = filter;
        }

        if let Some(raw) = non_empty_var("TDB_EXPORT_LAYOUT") {
            match SchemaLayout::parse(&raw) {
                Ok(layout) => config.layout = layout,
                Err(err) => config.warnings.push(format!(
                    "{err} Falling back to {}.",
                    config.layout.as_str()
                )),
            }
        }

        config.file_log = non_empty_var("TDB_EXPORT_FILE_LOG")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);

        Ok(config)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim().trim_matches('"').trim_matches('\'').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_host_conventions() {
        let config = Config::new("/game");
        assert_eq!(config.config_dir_name, "reframework");
        assert_eq!(config.db_file_name, "TDB.db");
        assert_eq!(config.log_file_name, "log.txt");
        assert_eq!(config.layout, SchemaLayout::Partitioned);
        assert!(config.file_log);
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn flag_parsing_accepts_common_truthy_values() {
        for value in ["1", "true", "YES", " on "] {
            assert!(parse_flag(value), "{value}");
        }
        for value in ["0", "false", "off", "maybe"] {
            assert!(!parse_flag(value), "{value}");
        }
    }
}
