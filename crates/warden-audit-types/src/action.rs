//! Audited action names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Privileged actions recorded in the audit log.
///
/// Stored as the snake_case action name. Names the store hands back that
/// are not known here come back as [`AuditAction::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuditAction {
    SuspendOrganization,
    ReactivateOrganization,
    AssignRole,
    RevokeRole,
    UpdateSystemSetting,
    /// Any other caller-defined action name.
    Custom(String),
}

impl AuditAction {
    /// The action name as written to the store.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SuspendOrganization => "suspend_organization",
            Self::ReactivateOrganization => "reactivate_organization",
            Self::AssignRole => "assign_role",
            Self::RevokeRole => "revoke_role",
            Self::UpdateSystemSetting => "update_system_setting",
            Self::Custom(name) => name,
        }
    }

    /// Create a custom action.
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for AuditAction {
    fn from(s: &str) -> Self {
        match s {
            "suspend_organization" => Self::SuspendOrganization,
            "reactivate_organization" => Self::ReactivateOrganization,
            "assign_role" => Self::AssignRole,
            "revoke_role" => Self::RevokeRole,
            "update_system_setting" => Self::UpdateSystemSetting,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for AuditAction {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<AuditAction> for String {
    fn from(action: AuditAction) -> Self {
        action.as_str().to_string()
    }
}

impl FromStr for AuditAction {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}
