//! Runtime configuration resolved from environment variables.
//!
//! # Responsibility
//! - Resolve database path, logging and email-domain settings.
//! - Keep lookup injectable so resolution is testable without touching the
//!   process environment.
//!
//! # Invariants
//! - Blank variables are treated as unset.
//! - Logging stays disabled unless a log directory is configured.

use crate::logging::{default_log_level, normalize_level, normalize_log_dir};
use crate::model::assignee::{EmailPolicy, DEFAULT_EMAIL_DOMAIN};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "TASKBOARD_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "TASKBOARD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TASKBOARD_LOG_DIR";
pub const ENV_EMAIL_DOMAIN: &str = "TASKBOARD_EMAIL_DOMAIN";

const DEFAULT_DB_FILE_NAME: &str = "taskboard.sqlite3";

/// Configuration errors, one per offending variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    InvalidLogDir(String),
    InvalidEmailDomain(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{ENV_LOG_LEVEL}: {message}"),
            Self::InvalidLogDir(message) => write!(f, "{ENV_LOG_DIR}: {message}"),
            Self::InvalidEmailDomain(value) => {
                write!(f, "{ENV_EMAIL_DOMAIN}: `{value}` is not a domain name")
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub email_domain: String,
}

impl CoreConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup(variable) -> value`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(value) => normalize_level(&value).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };

        let log_dir = read(ENV_LOG_DIR)
            .map(|value| normalize_log_dir(&value).map_err(ConfigError::InvalidLogDir))
            .transpose()?;

        let email_domain = match read(ENV_EMAIL_DOMAIN) {
            Some(value) => {
                let policy = EmailPolicy::new(&value);
                if policy.domain().is_empty() || !policy.domain().contains('.') {
                    return Err(ConfigError::InvalidEmailDomain(value));
                }
                policy.domain().to_string()
            }
            None => DEFAULT_EMAIL_DOMAIN.to_string(),
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir,
            email_domain,
        })
    }

    pub fn email_policy(&self) -> EmailPolicy {
        EmailPolicy::new(&self.email_domain)
    }
}
