mod config;
mod error;
mod raw;

pub const CONFIG_FILE_NAME: &str = "shipwright.toml";
pub const DEFAULT_BACKUP_DIR: &str = "backups";
pub const DEFAULT_REPORT_DIR: &str = "reports";
pub const DEFAULT_FRONTEND_PATH: &str = "frontend";
pub const DEFAULT_DEPLOYMENT_URL_BASE: &str = "https://app.example.com";

pub use config::{
    CommandsConfig, GitConfig, PipelineConfig, RetryConfig, load_config, parse_config,
};
pub use error::ConfigError;

pub type Result<T> = std::result::Result<T, ConfigError>;
