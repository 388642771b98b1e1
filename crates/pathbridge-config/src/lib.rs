pub mod connections;
pub mod paths;
pub mod settings;

pub use connections::{CommandEntry, CommandSpec, ConnectionConfig, PathMappingConfig};
pub use paths::AppPaths;
pub use settings::{
    AppConfig, AppConfigLayer, ConfigError, ConfigManager, LinksConfig, LinksConfigLayer,
    LoggingConfig, LoggingConfigLayer,
};
