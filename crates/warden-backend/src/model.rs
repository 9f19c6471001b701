//! Rows owned by the store, as Warden sees them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use warden_common_core::{ActorId, OrganizationId, RoleAssignmentId, RoleId};

/// An actor's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ActorId,
    pub email: String,
    pub full_name: Option<String>,
    pub is_super_admin: bool,
    /// Legacy per-admin permission list. `None`, empty, or containing `*`
    /// means unrestricted.
    pub super_admin_permissions: Option<Vec<String>>,
}

impl Profile {
    pub fn new(id: ActorId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            full_name: None,
            is_super_admin: false,
            super_admin_permissions: None,
        }
    }

    pub fn super_admin(mut self) -> Self {
        self.is_super_admin = true;
        self
    }

    pub fn with_legacy_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.super_admin_permissions = Some(permissions.into_iter().map(Into::into).collect());
        self
    }
}

/// A named bundle of permissions, keyed by resource category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
    pub permissions: BTreeMap<String, BTreeSet<String>>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            description: None,
            permissions: BTreeMap::new(),
        }
    }

    pub fn with_permission(mut self, resource: impl Into<String>, action: impl Into<String>) -> Self {
        self.permissions
            .entry(resource.into())
            .or_default()
            .insert(action.into());
        self
    }

    /// Whether this role grants `action`, within `resource` if given,
    /// otherwise within any resource category.
    pub fn grants(&self, action: &str, resource: Option<&str>) -> bool {
        match resource {
            Some(resource) => self
                .permissions
                .get(resource)
                .is_some_and(|actions| actions.contains(action)),
            None => self.permissions.values().any(|actions| actions.contains(action)),
        }
    }
}

/// An actor's assignment to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub id: RoleAssignmentId,
    pub actor_id: ActorId,
    pub role: Role,
    /// `None` means the assignment never expires.
    pub expires_at: Option<DateTime<Utc>>,
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: Option<ActorId>,
}

/// Input for creating a role assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoleAssignment {
    pub actor_id: ActorId,
    pub role_id: RoleId,
    pub expires_at: Option<DateTime<Utc>>,
    pub assigned_by: ActorId,
}

/// Organization lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationStatus {
    Active,
    Suspended,
    Cancelled,
    PendingSetup,
}

impl OrganizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Cancelled => "cancelled",
            Self::PendingSetup => "pending_setup",
        }
    }
}

impl fmt::Display for OrganizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for OrganizationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "cancelled" => Ok(Self::Cancelled),
            "pending_setup" => Ok(Self::PendingSetup),
            other => Err(format!("unknown organization status '{}'", other)),
        }
    }
}

/// A tenant organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub slug: String,
    pub status: OrganizationStatus,
    pub plan: Option<String>,
    pub subscription_status: Option<String>,
    pub seat_count: u32,
    pub created_at: DateTime<Utc>,
    pub suspended_at: Option<DateTime<Utc>>,
    pub suspended_reason: Option<String>,
    pub suspended_by: Option<ActorId>,
}

impl Organization {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: OrganizationId::new(),
            name: name.into(),
            slug: slug.into(),
            status: OrganizationStatus::Active,
            plan: None,
            subscription_status: None,
            seat_count: 0,
            created_at: Utc::now(),
            suspended_at: None,
            suspended_reason: None,
            suspended_by: None,
        }
    }

    pub fn with_status(mut self, status: OrganizationStatus) -> Self {
        self.status = status;
        self
    }
}

/// A system setting as stored. `value` is the raw serialized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    pub category: String,
    pub is_public: bool,
    pub description: Option<String>,
    pub updated_by: Option<ActorId>,
    pub updated_at: DateTime<Utc>,
}

/// Input for an upsert keyed by `key`. `None` fields keep the stored value
/// on update and take the store default on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingUpsert {
    pub key: String,
    pub value: String,
    pub category: Option<String>,
    pub is_public: Option<bool>,
    pub updated_by: ActorId,
}
