//! Environment variable handling.

use std::env;
use std::path::Path;
use thiserror::Error;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("required environment variable not set: {var}")]
    NotSet { var: String },

    #[error("failed to load .env file: {0}")]
    DotenvError(#[from] dotenvy::Error),
}

/// Environment variable names.
pub mod vars {
    pub const WARDEN_CONFIG_DIR: &str = "WARDEN_CONFIG_DIR";
    pub const WARDEN_DATABASE_URL: &str = "WARDEN_DATABASE_URL";
    pub const WARDEN_ENV: &str = "WARDEN_ENV";
}

fn load_env_file(path: impl AsRef<Path>) -> Result<(), EnvError> {
    match dotenvy::from_filename(path) {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Environment configuration.
pub struct Environment {
    _guard: (),
}

impl Environment {
    /// Initialize environment from `.env`, `.env.local` and `.env.<WARDEN_ENV>`.
    ///
    /// Missing files are ignored; a file that exists but does not parse is an
    /// error. Variables already set are never overridden.
    pub fn init() -> Result<Self, EnvError> {
        load_env_file(".env")?;
        load_env_file(".env.local")?;

        if let Ok(env) = env::var(vars::WARDEN_ENV) {
            load_env_file(format!(".env.{}", env))?;
        }

        Ok(Self { _guard: () })
    }

    /// Get a required string variable.
    pub fn require(var: &str) -> Result<String, EnvError> {
        env::var(var).map_err(|_| EnvError::NotSet { var: var.to_string() })
    }

    /// Get an optional string variable. Empty values count as unset.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok().filter(|v| !v.is_empty())
    }

    /// Get a boolean variable.
    pub fn get_bool(var: &str) -> Option<bool> {
        env::var(var)
            .ok()
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
    }

    /// Check if running in production mode.
    pub fn is_production() -> bool {
        env::var(vars::WARDEN_ENV)
            .map(|v| v == "production")
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_env_file_loading() {
        let dir = tempdir().unwrap();
        assert!(load_env_file(dir.path().join(".env.absent")).is_ok());

        let good = dir.path().join(".env.good");
        std::fs::write(&good, "WARDEN_TEST_FROM_FILE=loaded\n").unwrap();
        load_env_file(&good).unwrap();
        assert_eq!(Environment::get("WARDEN_TEST_FROM_FILE").as_deref(), Some("loaded"));

        let broken = dir.path().join(".env.broken");
        std::fs::write(&broken, "this is not an assignment\n").unwrap();
        assert!(matches!(load_env_file(&broken), Err(EnvError::DotenvError(_))));
    }

    #[test]
    fn test_bool_parsing() {
        env::set_var("WARDEN_TEST_BOOL", "true");
        assert_eq!(Environment::get_bool("WARDEN_TEST_BOOL"), Some(true));
        env::set_var("WARDEN_TEST_BOOL", "1");
        assert_eq!(Environment::get_bool("WARDEN_TEST_BOOL"), Some(true));
        env::set_var("WARDEN_TEST_BOOL", "false");
        assert_eq!(Environment::get_bool("WARDEN_TEST_BOOL"), Some(false));
        env::remove_var("WARDEN_TEST_BOOL");
        assert_eq!(Environment::get_bool("WARDEN_TEST_BOOL"), None);
    }

    #[test]
    fn test_empty_value_counts_as_unset() {
        env::set_var("WARDEN_TEST_EMPTY", "");
        assert_eq!(Environment::get("WARDEN_TEST_EMPTY"), None);
        env::remove_var("WARDEN_TEST_EMPTY");
    }

    #[test]
    fn test_require_reports_variable_name() {
        match Environment::require("WARDEN_TEST_REQUIRED_MISSING") {
            Err(EnvError::NotSet { var }) => assert_eq!(var, "WARDEN_TEST_REQUIRED_MISSING"),
            other => panic!("Expected NotSet, got {:?}", other),
        }
    }

    #[test]
    fn test_environment_init_without_files() {
        assert!(Environment::init().is_ok());
    }
}
