use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

const DB_FILE_NAME: &str = "dietlog.db";
const DB_PATH_ENV: &str = "DIETLOG_DB";

pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_override(std::env::var_os(DB_PATH_ENV).map(PathBuf::from))
    }

    fn from_override(db_override: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_override {
            Some(path) if !path.as_os_str().is_empty() => path,
            _ => {
                let proj_dirs = ProjectDirs::from("", "", "dietlog")
                    .context("Could not determine home directory")?;
                proj_dirs.data_dir().join(DB_FILE_NAME)
            }
        };

        if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        }

        Ok(Config { db_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_path_is_used_and_parent_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("my.db");
        let config = Config::from_override(Some(path.clone())).unwrap();
        assert_eq!(config.db_path, path);
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_relative_override_without_parent() {
        let config = Config::from_override(Some(PathBuf::from("local.db"))).unwrap();
        assert_eq!(config.db_path, PathBuf::from("local.db"));
    }
}
