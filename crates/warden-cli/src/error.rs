//! CLI error handling.

use std::process::ExitCode;

use thiserror::Error;
use warden_admin::AdminError;
use warden_backend::BackendError;
use warden_common_config::{ConfigError, EnvError};
use warden_common_log::LogError;

/// Application exit codes
#[repr(u8)]
pub enum Exit {
    Success = 0,
    GeneralError = 1,
    ConfigError = 2,
    BackendError = 3,
    AccessDenied = 4,
    OperationRejected = 5,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("environment error: {0}")]
    Env(#[from] EnvError),

    #[error("logging error: {0}")]
    Log(#[from] LogError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("no acting actor; pass --as or set WARDEN_ACTOR")]
    NoActor,

    /// The store refused the operation (for example an invalid lifecycle
    /// transition); details were logged.
    #[error("{0} was rejected")]
    Rejected(&'static str),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),

    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> Exit {
        match self {
            Self::Config(_) | Self::Env(_) | Self::Log(_) => Exit::ConfigError,
            Self::Admin(e) if e.is_access_denied() => Exit::AccessDenied,
            Self::NoActor => Exit::AccessDenied,
            Self::Admin(_) | Self::Backend(_) => Exit::BackendError,
            Self::Rejected(_) => Exit::OperationRejected,
            Self::Output(_) | Self::Runtime(_) => Exit::GeneralError,
        }
    }
}
