//! Configuration file handling

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// CLI under test
    #[serde(default)]
    pub cli: CliConfig,

    /// Where credentials are read from
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Polling budgets
    #[serde(default)]
    pub polling: PollingConfig,

    /// Database lifecycle scenario settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Deploy lifecycle scenario settings
    #[serde(default)]
    pub deploy: DeployConfig,

    /// Workspace settings
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

/// Configuration for the CLI under test
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CliConfig {
    /// Program name or path of the gigalixir CLI
    #[serde(default = "default_program")]
    pub program: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
        }
    }
}

fn default_program() -> PathBuf {
    PathBuf::from("gigalixir")
}

/// Names of the environment variables holding credentials
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CredentialsConfig {
    #[serde(default = "default_email_var")]
    pub email_var: String,

    #[serde(default = "default_password_var")]
    pub password_var: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            email_var: default_email_var(),
            password_var: default_password_var(),
        }
    }
}

fn default_email_var() -> String {
    "GIGALIXIR_EMAIL".to_string()
}
fn default_password_var() -> String {
    "GIGALIXIR_PASSWORD".to_string()
}

/// Polling budgets for each kind of convergence check
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PollingConfig {
    /// Database state polling
    #[serde(default = "default_database_poll")]
    pub database: PollSettings,

    /// HTTP endpoint polling
    #[serde(default = "default_http_poll")]
    pub http: PollSettings,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            database: default_database_poll(),
            http: default_http_poll(),
        }
    }
}

/// Attempt count and fixed interval for one polling loop
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub attempts: u32,
    pub interval_secs: u64,
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_database_poll() -> PollSettings {
    PollSettings {
        attempts: 30,
        interval_secs: 30,
    }
}
fn default_http_poll() -> PollSettings {
    PollSettings {
        attempts: 30,
        interval_secs: 5,
    }
}

/// Database lifecycle settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// App to provision against; defaults to the last app the account lists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,

    /// Size passed to scale_database
    #[serde(default = "default_scale_size")]
    pub scale_size: f64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            app: None,
            scale_size: default_scale_size(),
        }
    }
}

fn default_scale_size() -> f64 {
    1.7
}

/// Deploy lifecycle settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DeployConfig {
    /// Reference repository cloned and deployed
    #[serde(default = "default_repository")]
    pub repository: String,

    /// Git remote that `create` adds
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Branch pushed to the remote
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Ref rebased onto for the hot upgrade
    #[serde(default = "default_upgrade_ref")]
    pub upgrade_ref: String,

    /// Substring the upgraded app must serve
    #[serde(default = "default_version_marker")]
    pub version_marker: String,

    /// Domain apps are served under
    #[serde(default = "default_app_domain")]
    pub app_domain: String,

    /// Config entry set and deleted during the scenario
    #[serde(default = "default_config_key")]
    pub config_key: String,

    #[serde(default = "default_config_value")]
    pub config_value: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            remote: default_remote(),
            branch: default_branch(),
            upgrade_ref: default_upgrade_ref(),
            version_marker: default_version_marker(),
            app_domain: default_app_domain(),
            config_key: default_config_key(),
            config_value: default_config_value(),
        }
    }
}

fn default_repository() -> String {
    "https://github.com/gigalixir/gigalixir-getting-started.git".to_string()
}
fn default_remote() -> String {
    "gigalixir".to_string()
}
fn default_branch() -> String {
    "master".to_string()
}
fn default_upgrade_ref() -> String {
    "origin/v0.0.2".to_string()
}
fn default_version_marker() -> String {
    "0.0.2".to_string()
}
fn default_app_domain() -> String {
    "gigalixirapp.com".to_string()
}
fn default_config_key() -> String {
    "FOO".to_string()
}
fn default_config_value() -> String {
    "foo".to_string()
}

/// Workspace settings
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct WorkspaceConfig {
    /// Keep the scenario directory after the run for inspection
    #[serde(default)]
    pub preserve: bool,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.polling.database.attempts == 0 || self.polling.http.attempts == 0 {
            return Err(Error::Config(
                "polling attempts must be at least 1".to_string(),
            ));
        }
        let size = self.database.scale_size;
        if size.is_nan() || size <= 0.0 {
            return Err(Error::Config(format!(
                "database.scale_size must be positive, got {}",
                size
            )));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Internal(e.to_string()))
    }

    /// Resolve the CLI program to an executable path
    ///
    /// Bare names are searched on PATH
    pub fn resolve_cli(&self) -> Result<PathBuf> {
        let program = &self.cli.program;
        if program.components().count() > 1 {
            if program.exists() {
                return Ok(program.clone());
            }
            return Err(Error::CliNotFound(program.display().to_string()));
        }
        which::which(program).map_err(|e| {
            Error::CliNotFound(format!("'{}' is not on PATH ({})", program.display(), e))
        })
    }
}
