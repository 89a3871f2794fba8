//! Runtime configuration loaded from `BLOG_*` environment variables.
//!
//! # Invariants
//! - Blank values are treated as unset.
//! - Loading never touches the store or the logger.

use crate::logging::{default_log_level, normalize_level, LogTarget, LoggingConfig};
use crate::service::blog_service::{PostDeleteRule, ServiceOptions};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "BLOG_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "BLOG_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "BLOG_LOG_DIR";
pub const POST_DELETE_VAR: &str = "BLOG_POST_DELETE";

const DEFAULT_DB_FILE_NAME: &str = "blog.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid {
        variable: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid { variable, message } => write!(f, "invalid {variable}: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Settings for the blog demo process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogConfig {
    pub db_path: PathBuf,
    pub logging: LoggingConfig,
    pub service: ServiceOptions,
}

impl BlogConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(DB_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        let level = match read(LOG_LEVEL_VAR) {
            Some(raw) => normalize_level(&raw).map_err(|message| ConfigError::Invalid {
                variable: LOG_LEVEL_VAR,
                message,
            })?,
            None => default_log_level(),
        };

        let target = match read(LOG_DIR_VAR) {
            Some(raw) => {
                let dir = PathBuf::from(&raw);
                if !dir.is_absolute() {
                    return Err(ConfigError::Invalid {
                        variable: LOG_DIR_VAR,
                        message: format!("must be an absolute path, got `{raw}`"),
                    });
                }
                LogTarget::Directory(dir)
            }
            None => LogTarget::Stderr,
        };

        let post_delete = match read(POST_DELETE_VAR) {
            Some(raw) => raw
                .parse::<PostDeleteRule>()
                .map_err(|message| ConfigError::Invalid {
                    variable: POST_DELETE_VAR,
                    message,
                })?,
            None => PostDeleteRule::default(),
        };

        Ok(Self {
            db_path,
            logging: LoggingConfig { level, target },
            service: ServiceOptions { post_delete },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{BlogConfig, ConfigError, LOG_DIR_VAR, POST_DELETE_VAR};
    use crate::logging::{default_log_level, LogTarget};
    use crate::service::blog_service::PostDeleteRule;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn load(vars: &[(&str, &str)]) -> Result<BlogConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BlogConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config.db_path, std::env::temp_dir().join("blog.db"));
        assert_eq!(config.logging.level, default_log_level());
        assert_eq!(config.logging.target, LogTarget::Stderr);
        assert_eq!(config.service.post_delete, PostDeleteRule::Cascade);
    }

    #[test]
    fn values_are_trimmed_and_blank_means_unset() {
        let config = load(&[
            ("BLOG_DB_PATH", "  /data/blog.db "),
            ("BLOG_LOG_LEVEL", "WARNING"),
            ("BLOG_POST_DELETE", "   "),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/blog.db"));
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.service.post_delete, PostDeleteRule::Cascade);
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = load(&[("BLOG_LOG_DIR", "logs")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { variable, .. } if variable == LOG_DIR_VAR));
    }

    #[test]
    fn unknown_delete_rule_is_rejected() {
        let err = load(&[("BLOG_POST_DELETE", "restrict")]).unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { variable, .. } if variable == POST_DELETE_VAR)
        );
    }
}
