//! Audit target types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of entity an audited action was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditTargetType {
    /// A tenant organization; target id is the organization id.
    Organization,
    /// A user account; target id is the actor id.
    User,
    /// A system setting; target id is the setting key.
    Setting,
    /// A role definition.
    Role,
    /// Platform-wide actions with no specific target.
    System,
}
