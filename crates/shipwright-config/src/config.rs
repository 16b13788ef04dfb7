use std::path::{Path, PathBuf};
use std::time::Duration;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::ConfigError;
use crate::raw::{RawCommands, RawConfig, RawGit, RawRetry, read_raw_config};

#[derive(Debug, Clone)]
pub struct GitConfig {
    commit: bool,
    branch_prefix: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            commit: true,
            branch_prefix: String::from("feature/"),
        }
    }
}

impl GitConfig {
    /// Whether `persist` commits written files through the source host.
    #[must_use]
    pub fn commit(&self) -> bool {
        self.commit
    }

    #[must_use]
    pub fn branch_prefix(&self) -> &str {
        &self.branch_prefix
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_commit(mut self, commit: bool) -> Self {
        self.commit = commit;
        self
    }
}

/// Exponential backoff settings for stage-internal retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    #[must_use]
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Whether each delay is randomised below its exponential value.
    #[must_use]
    pub fn jitter(&self) -> bool {
        self.jitter
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandsConfig {
    test: Option<String>,
    deploy: Option<String>,
    health: Option<String>,
    timeout: Duration,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            test: None,
            deploy: None,
            health: None,
            timeout: Duration::from_secs(300),
        }
    }
}

impl CommandsConfig {
    #[must_use]
    pub fn test(&self) -> Option<&str> {
        self.test.as_deref()
    }

    #[must_use]
    pub fn deploy(&self) -> Option<&str> {
        self.deploy.as_deref()
    }

    #[must_use]
    pub fn health(&self) -> Option<&str> {
        self.health.as_deref()
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_test(mut self, command: impl Into<String>) -> Self {
        self.test = Some(command.into());
        self
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_deploy(mut self, command: impl Into<String>) -> Self {
        self.deploy = Some(command.into());
        self
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_health(mut self, command: impl Into<String>) -> Self {
        self.health = Some(command.into());
        self
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    backup_dir: PathBuf,
    report_dir: PathBuf,
    frontend_path: PathBuf,
    protected_paths: GlobSet,
    deployment_url_base: String,
    git: GitConfig,
    retry: RetryConfig,
    commands: CommandsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            backup_dir: PathBuf::from(crate::DEFAULT_BACKUP_DIR),
            report_dir: PathBuf::from(crate::DEFAULT_REPORT_DIR),
            frontend_path: PathBuf::from(crate::DEFAULT_FRONTEND_PATH),
            protected_paths: default_protected_paths(),
            deployment_url_base: String::from(crate::DEFAULT_DEPLOYMENT_URL_BASE),
            git: GitConfig::default(),
            retry: RetryConfig::default(),
            commands: CommandsConfig::default(),
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    #[must_use]
    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    #[must_use]
    pub fn frontend_path(&self) -> &Path {
        &self.frontend_path
    }

    /// True if `path` (relative to the project root) must never be written
    /// by the pipeline. The backup and report directories always are.
    #[must_use]
    pub fn is_protected(&self, path: &Path) -> bool {
        path.starts_with(&self.backup_dir)
            || path.starts_with(&self.report_dir)
            || self.protected_paths.is_match(path)
    }

    #[must_use]
    pub fn deployment_url_base(&self) -> &str {
        &self.deployment_url_base
    }

    #[must_use]
    pub fn git(&self) -> &GitConfig {
        &self.git
    }

    #[must_use]
    pub fn retry(&self) -> RetryConfig {
        self.retry
    }

    #[must_use]
    pub fn commands(&self) -> &CommandsConfig {
        &self.commands
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_git(mut self, git: GitConfig) -> Self {
        self.git = git;
        self
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_commands(mut self, commands: CommandsConfig) -> Self {
        self.commands = commands;
        self
    }
}

fn default_protected_paths() -> GlobSet {
    build_glob_set(&[String::from(".git/**")]).unwrap_or_else(|_| GlobSet::empty())
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::GlobPattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::GlobPattern {
        pattern: patterns.join(", "),
        source,
    })
}

fn build_git_config(raw: Option<RawGit>) -> GitConfig {
    let defaults = GitConfig::default();
    match raw {
        None => defaults,
        Some(git) => GitConfig {
            commit: git.commit.unwrap_or(defaults.commit),
            branch_prefix: git.branch_prefix.unwrap_or(defaults.branch_prefix),
        },
    }
}

fn build_retry_config(raw: Option<RawRetry>) -> Result<RetryConfig, ConfigError> {
    let defaults = RetryConfig::default();
    let Some(retry) = raw else {
        return Ok(defaults);
    };

    let max_attempts = retry.max_attempts.unwrap_or(defaults.max_attempts);
    if max_attempts == 0 {
        return Err(ConfigError::InvalidValue {
            key: "retry.max-attempts",
            reason: String::from("must be at least 1"),
        });
    }
    let base_delay = retry
        .base_delay_ms
        .map_or(defaults.base_delay, Duration::from_millis);
    let max_delay = retry
        .max_delay_ms
        .map_or(defaults.max_delay, Duration::from_millis);
    if base_delay > max_delay {
        return Err(ConfigError::InvalidValue {
            key: "retry.base-delay-ms",
            reason: String::from("must not exceed retry.max-delay-ms"),
        });
    }

    Ok(RetryConfig {
        max_attempts,
        base_delay,
        max_delay,
        jitter: retry.jitter.unwrap_or(defaults.jitter),
    })
}

fn build_commands_config(raw: Option<RawCommands>) -> Result<CommandsConfig, ConfigError> {
    let defaults = CommandsConfig::default();
    let Some(commands) = raw else {
        return Ok(defaults);
    };

    let timeout = commands
        .timeout_secs
        .map_or(defaults.timeout, Duration::from_secs);
    if timeout.is_zero() {
        return Err(ConfigError::InvalidValue {
            key: "commands.timeout-secs",
            reason: String::from("must be at least 1"),
        });
    }

    let non_blank = |command: Option<String>| command.filter(|c| !c.trim().is_empty());
    Ok(CommandsConfig {
        test: non_blank(commands.test),
        deploy: non_blank(commands.deploy),
        health: non_blank(commands.health),
        timeout,
    })
}

fn relative_dir(key: &'static str, value: Option<String>, default: &str) -> Result<PathBuf, ConfigError> {
    let dir = PathBuf::from(value.unwrap_or_else(|| default.to_string()));
    let escapes = dir.is_absolute()
        || dir
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir));
    if dir.as_os_str().is_empty() || escapes {
        return Err(ConfigError::InvalidValue {
            key,
            reason: format!("'{}' must be a relative path inside the project", dir.display()),
        });
    }
    Ok(dir)
}

fn build_config(raw: RawConfig) -> Result<PipelineConfig, ConfigError> {
    let protected_paths = match raw.protected_paths {
        Some(patterns) => build_glob_set(&patterns)?,
        None => default_protected_paths(),
    };

    let deployment_url_base = raw
        .deployment_url_base
        .map_or_else(
            || crate::DEFAULT_DEPLOYMENT_URL_BASE.to_string(),
            |base| base.trim_end_matches('/').to_string(),
        );
    if deployment_url_base.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "deployment-url-base",
            reason: String::from("must not be empty"),
        });
    }

    Ok(PipelineConfig {
        backup_dir: relative_dir("backup-dir", raw.backup_dir, crate::DEFAULT_BACKUP_DIR)?,
        report_dir: relative_dir("report-dir", raw.report_dir, crate::DEFAULT_REPORT_DIR)?,
        frontend_path: relative_dir(
            "frontend-path",
            raw.frontend_path,
            crate::DEFAULT_FRONTEND_PATH,
        )?,
        protected_paths,
        deployment_url_base,
        git: build_git_config(raw.git),
        retry: build_retry_config(raw.retry)?,
        commands: build_commands_config(raw.commands)?,
    })
}

/// Parses configuration from TOML text.
///
/// # Errors
///
/// Returns an error if the TOML is malformed, contains unknown keys, or
/// holds invalid values.
pub fn parse_config(content: &str) -> Result<PipelineConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: PathBuf::from(crate::CONFIG_FILE_NAME),
        source,
    })?;
    build_config(raw)
}

/// Loads `shipwright.toml` from the project root. A missing file yields the
/// defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or holds invalid
/// values.
pub fn load_config(project_root: &Path) -> Result<PipelineConfig, ConfigError> {
    let path = project_root.join(crate::CONFIG_FILE_NAME);
    match read_raw_config(&path)? {
        Some(raw) => build_config(raw),
        None => Ok(PipelineConfig::default()),
    }
}
