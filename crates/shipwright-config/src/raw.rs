use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawConfig {
    #[serde(default, rename = "backup-dir")]
    pub(crate) backup_dir: Option<String>,
    #[serde(default, rename = "report-dir")]
    pub(crate) report_dir: Option<String>,
    #[serde(default, rename = "frontend-path")]
    pub(crate) frontend_path: Option<String>,
    #[serde(default, rename = "protected-paths")]
    pub(crate) protected_paths: Option<Vec<String>>,
    #[serde(default, rename = "deployment-url-base")]
    pub(crate) deployment_url_base: Option<String>,
    #[serde(default)]
    pub(crate) git: Option<RawGit>,
    #[serde(default)]
    pub(crate) retry: Option<RawRetry>,
    #[serde(default)]
    pub(crate) commands: Option<RawCommands>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawGit {
    pub(crate) commit: Option<bool>,
    #[serde(default, rename = "branch-prefix")]
    pub(crate) branch_prefix: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawRetry {
    #[serde(default, rename = "max-attempts")]
    pub(crate) max_attempts: Option<u32>,
    #[serde(default, rename = "base-delay-ms")]
    pub(crate) base_delay_ms: Option<u64>,
    #[serde(default, rename = "max-delay-ms")]
    pub(crate) max_delay_ms: Option<u64>,
    pub(crate) jitter: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawCommands {
    pub(crate) test: Option<String>,
    pub(crate) deploy: Option<String>,
    pub(crate) health: Option<String>,
    #[serde(default, rename = "timeout-secs")]
    pub(crate) timeout_secs: Option<u64>,
}

/// Reads the config file, or `None` if it does not exist.
pub(crate) fn read_raw_config(path: &Path) -> Result<Option<RawConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    toml::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}
