//! Configuration file loading and parsing.

use crate::env::{vars, Environment};
use crate::types::WardenConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("env var pattern is valid")
});

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
        }
    }

    /// Create a loader rooted at `WARDEN_CONFIG_DIR`, or the working directory.
    pub fn from_env() -> Self {
        match Environment::get(vars::WARDEN_CONFIG_DIR) {
            Some(dir) => Self::new(dir),
            None => Self::default(),
        }
    }

    fn config_path(&self) -> PathBuf {
        self.base_path.join(".warden/config.yaml")
    }

    /// Load configuration from `.warden/config.yaml`.
    ///
    /// A missing file yields defaults. `WARDEN_DATABASE_URL` overrides the
    /// file's database URL.
    pub fn load(&self) -> Result<WardenConfig, ConfigError> {
        let config_path = self.config_path();

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let expanded = self.expand_env_vars(&contents)?;

            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?
        } else {
            WardenConfig::default()
        };

        if let Some(url) = Environment::get(vars::WARDEN_DATABASE_URL) {
            config.database.url = url;
        }

        self.validate(&config)?;
        Ok(config)
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();

        for cap in ENV_VAR_PATTERN.captures_iter(content) {
            let full_match = &cap[0];
            let var_name = &cap[1];
            let default = cap.get(2).map(|m| m.as_str());

            let value = match (std::env::var(var_name), default) {
                (Ok(v), _) => v,
                (Err(_), Some(d)) => d.to_string(),
                (Err(_), None) => {
                    return Err(ConfigError::EnvVarNotFound {
                        var: var_name.to_string(),
                    })
                }
            };

            result = result.replace(full_match, &value);
        }

        Ok(result)
    }

    /// Validate configuration values.
    fn validate(&self, config: &WardenConfig) -> Result<(), ConfigError> {
        let fail = |message: &str| {
            Err(ConfigError::ValidationError {
                message: message.to_string(),
            })
        };

        if config.database.max_connections == 0 {
            return fail("database.max_connections must be at least 1");
        }
        if config.database.min_connections > config.database.max_connections {
            return fail("database.min_connections cannot exceed database.max_connections");
        }

        if !config.access.divert_location.starts_with('/') {
            return fail("access.divert_location must be an absolute path");
        }

        for (section, default, max) in [
            ("audit", config.audit.default_page_size, config.audit.max_page_size),
            (
                "organizations",
                config.organizations.default_page_size,
                config.organizations.max_page_size,
            ),
        ] {
            if default == 0 || default > max {
                return Err(ConfigError::ValidationError {
                    message: format!(
                        "{section}.default_page_size must be between 1 and {section}.max_page_size"
                    ),
                });
            }
        }

        if config.metrics.recent_audit_window_hours == 0 {
            return fail("metrics.recent_audit_window_hours must be greater than 0");
        }

        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, config: &WardenConfig) -> Result<(), ConfigError> {
        let config_dir = self.base_path.join(".warden");
        std::fs::create_dir_all(&config_dir)?;

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(self.config_path(), yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}
