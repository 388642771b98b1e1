use anyhow::Result;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub config_file: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self> {
        let proj = ProjectDirs::from("org", "pathbridge", "pathbridge")
            .ok_or_else(|| anyhow::anyhow!("project dirs unavailable"))?;
        Ok(Self::from_dirs(
            proj.config_dir().to_path_buf(),
            proj.data_dir().to_path_buf(),
        ))
    }

    pub fn from_dirs(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        let log_dir = data_dir.join("logs");
        let config_file = config_dir.join("config.toml");
        Self {
            config_dir,
            data_dir,
            log_dir,
            config_file,
        }
    }

    pub fn project_config_path(base: impl AsRef<Path>) -> PathBuf {
        base.as_ref().join(".pathbridge.toml")
    }
}
