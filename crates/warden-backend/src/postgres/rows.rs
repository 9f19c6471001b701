//! Row shapes returned by the Postgres queries.

use crate::error::BackendError;
use crate::model::{Organization, OrganizationStatus, Profile, Role, RoleAssignment, SystemSetting};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;
use warden_audit_types::{AuditRecord, AuditSeverity, AuditTargetType};
use warden_common_core::{ActorId, AuditRecordId, OrganizationId, RoleAssignmentId, RoleId};

pub(crate) type PermissionMap = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, FromRow)]
pub(crate) struct ProfileRow {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub is_super_admin: bool,
    pub super_admin_permissions: Option<Vec<String>>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: ActorId::from_uuid(row.id),
            email: row.email,
            full_name: row.full_name,
            is_super_admin: row.is_super_admin,
            super_admin_permissions: row.super_admin_permissions,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct RoleRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Json<PermissionMap>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Self {
            id: RoleId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            permissions: row.permissions.0,
        }
    }
}

/// A role assignment joined with its role.
#[derive(Debug, FromRow)]
pub(crate) struct AssignmentRow {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: Option<Uuid>,
    pub role_id: Uuid,
    pub role_name: String,
    pub role_description: Option<String>,
    pub role_permissions: Json<PermissionMap>,
}

impl From<AssignmentRow> for RoleAssignment {
    fn from(row: AssignmentRow) -> Self {
        Self {
            id: RoleAssignmentId::from_uuid(row.id),
            actor_id: ActorId::from_uuid(row.actor_id),
            role: Role {
                id: RoleId::from_uuid(row.role_id),
                name: row.role_name,
                description: row.role_description,
                permissions: row.role_permissions.0,
            },
            expires_at: row.expires_at,
            assigned_at: row.assigned_at,
            assigned_by: row.assigned_by.map(ActorId::from_uuid),
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct OrganizationRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub status: String,
    pub plan: Option<String>,
    pub subscription_status: Option<String>,
    pub seat_count: i32,
    pub created_at: DateTime<Utc>,
    pub suspended_at: Option<DateTime<Utc>>,
    pub suspended_reason: Option<String>,
    pub suspended_by: Option<Uuid>,
}

impl TryFrom<OrganizationRow> for Organization {
    type Error = BackendError;

    fn try_from(row: OrganizationRow) -> Result<Self, Self::Error> {
        let status: OrganizationStatus = row.status.parse().map_err(BackendError::CorruptRow)?;
        let seat_count = u32::try_from(row.seat_count)
            .map_err(|_| BackendError::CorruptRow(format!("negative seat count {}", row.seat_count)))?;

        Ok(Self {
            id: OrganizationId::from_uuid(row.id),
            name: row.name,
            slug: row.slug,
            status,
            plan: row.plan,
            subscription_status: row.subscription_status,
            seat_count,
            created_at: row.created_at,
            suspended_at: row.suspended_at,
            suspended_reason: row.suspended_reason,
            suspended_by: row.suspended_by.map(ActorId::from_uuid),
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct AuditRow {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub actor_email: Option<String>,
    pub action: String,
    pub target_type: String,
    pub target_id: Option<String>,
    pub details: Json<serde_json::Value>,
    pub severity: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditRecord {
    type Error = BackendError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let target_type: AuditTargetType = row
            .target_type
            .parse()
            .map_err(|_| BackendError::CorruptRow(format!("unknown target type '{}'", row.target_type)))?;
        let severity: AuditSeverity = row
            .severity
            .parse()
            .map_err(|_| BackendError::CorruptRow(format!("unknown severity '{}'", row.severity)))?;

        Ok(Self {
            id: AuditRecordId::from_uuid(row.id),
            actor_id: ActorId::from_uuid(row.actor_id),
            actor_email: row.actor_email,
            action: row.action.into(),
            target_type,
            target_id: row.target_id,
            details: row.details.0,
            severity,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct SettingRow {
    pub key: String,
    pub value: String,
    pub category: String,
    pub is_public: bool,
    pub description: Option<String>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl From<SettingRow> for SystemSetting {
    fn from(row: SettingRow) -> Self {
        Self {
            key: row.key,
            value: row.value,
            category: row.category,
            is_public: row.is_public,
            description: row.description,
            updated_by: row.updated_by.map(ActorId::from_uuid),
            updated_at: row.updated_at,
        }
    }
}
