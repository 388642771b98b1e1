use crate::connections::ConnectionConfig;
use crate::paths::AppPaths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("toml serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("duplicate connection name: {0}")]
    DuplicateConnection(String),
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
    pub logging: LoggingConfig,
    pub links: LinksConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AppConfigLayer {
    pub connections: Option<Vec<ConnectionConfig>>,
    pub logging: Option<LoggingConfigLayer>,
    pub links: Option<LinksConfigLayer>,
}

impl AppConfigLayer {
    pub fn apply_to(self, cfg: &mut AppConfig) {
        if let Some(layer) = self.logging {
            cfg.logging.apply(layer);
        }
        if let Some(layer) = self.links {
            cfg.links.apply(layer);
        }
        if let Some(connections) = self.connections {
            cfg.connections = connections;
        }
    }
}

impl AppConfig {
    pub fn connection(&self, name: &str) -> Option<&ConnectionConfig> {
        self.connections.iter().find(|c| c.name == name)
    }

    /// Connection names are display keys and must be unique.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for conn in &self.connections {
            if !seen.insert(conn.name.as_str()) {
                return Err(ConfigError::DuplicateConnection(conn.name.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub stdout: bool,
    pub file_max_count: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            stdout: false,
            file_max_count: 10,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct LoggingConfigLayer {
    pub level: Option<String>,
    pub json: Option<bool>,
    pub stdout: Option<bool>,
    pub file_max_count: Option<usize>,
}

impl LoggingConfig {
    fn apply(&mut self, layer: LoggingConfigLayer) {
        if let Some(v) = layer.level {
            self.level = v;
        }
        if let Some(v) = layer.json {
            self.json = v;
        }
        if let Some(v) = layer.stdout {
            self.stdout = v;
        }
        if let Some(v) = layer.file_max_count {
            self.file_max_count = v;
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinksConfig {
    /// Try `workspace_root/<reference>` when a relative reference does not
    /// translate through the remote working directory.
    pub workspace_fallback: bool,
    /// Reference grammars to scan for: `unix`, `relative`, `cmake`, `make`.
    pub grammars: Vec<String>,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            workspace_fallback: true,
            grammars: vec![
                "unix".to_string(),
                "relative".to_string(),
                "cmake".to_string(),
                "make".to_string(),
            ],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct LinksConfigLayer {
    pub workspace_fallback: Option<bool>,
    pub grammars: Option<Vec<String>>,
}

impl LinksConfig {
    fn apply(&mut self, layer: LinksConfigLayer) {
        if let Some(v) = layer.workspace_fallback {
            self.workspace_fallback = v;
        }
        if let Some(v) = layer.grammars {
            self.grammars = v;
        }
    }
}

#[derive(Clone, Debug)]
pub struct ConfigManager {
    pub paths: AppPaths,
}

impl ConfigManager {
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }

    /// Layers, lowest priority first: user config, project `.pathbridge.toml`
    /// under `cwd`, an explicit file, then in-memory overrides.
    pub fn load(
        &self,
        cwd: Option<&Path>,
        explicit: Option<&Path>,
        overrides: Option<AppConfigLayer>,
    ) -> Result<AppConfig, ConfigError> {
        let mut cfg = AppConfig::default();

        if self.paths.config_file.exists() {
            let layer = Self::load_layer(&self.paths.config_file)?;
            layer.apply_to(&mut cfg);
        }

        if let Some(dir) = cwd {
            let project_path = AppPaths::project_config_path(dir);
            if project_path.exists() {
                let layer = Self::load_layer(&project_path)?;
                layer.apply_to(&mut cfg);
            }
        }

        if let Some(path) = explicit {
            let layer = Self::load_layer(path)?;
            layer.apply_to(&mut cfg);
        }

        if let Some(layer) = overrides {
            layer.apply_to(&mut cfg);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_layer(path: &Path) -> Result<AppConfigLayer, ConfigError> {
        let content = fs::read_to_string(path)?;
        let layer: AppConfigLayer = toml::from_str(&content)?;
        debug!(path = %path.display(), "loaded config layer");
        Ok(layer)
    }

    pub fn save_default(&self) -> Result<(), ConfigError> {
        self.save_config(&AppConfig::default())
    }

    pub fn save_config(&self, cfg: &AppConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(cfg)?;
        fs::write(&self.paths.config_file, content)?;
        Ok(())
    }
}
