//! The store interface.

use crate::error::BackendResult;
use crate::model::{
    NewRoleAssignment, Organization, OrganizationStatus, Profile, Role, RoleAssignment,
    SettingUpsert, SystemSetting,
};
use crate::query::{AssignmentFilter, AuditQuery, OrganizationQuery, Page};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use warden_audit_types::{AuditRecord, NewAuditRecord};
use warden_common_core::{ActorId, AuditRecordId, OrganizationId, RoleAssignmentId};

/// Query and procedure interface of the managed relational store.
///
/// The store is the authority on uniqueness, lifecycle preconditions and
/// row-level security. Implementations report failures as
/// [`BackendError`](crate::BackendError) and never panic.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait AdminBackend: Send + Sync {
    /// Profile for an actor, if one exists.
    async fn fetch_profile(&self, actor_id: ActorId) -> BackendResult<Option<Profile>>;

    async fn count_users(&self) -> BackendResult<u64>;

    async fn count_super_admins(&self) -> BackendResult<u64>;

    async fn list_roles(&self) -> BackendResult<Vec<Role>>;

    /// An actor's role assignments (with their roles) passing `filter`.
    async fn fetch_role_assignments(
        &self,
        actor_id: ActorId,
        filter: AssignmentFilter,
    ) -> BackendResult<Vec<RoleAssignment>>;

    async fn insert_role_assignment(
        &self,
        assignment: NewRoleAssignment,
    ) -> BackendResult<RoleAssignment>;

    /// Delete an assignment, returning the removed row.
    async fn delete_role_assignment(&self, id: RoleAssignmentId) -> BackendResult<RoleAssignment>;

    async fn list_organizations(&self, query: OrganizationQuery) -> BackendResult<Page<Organization>>;

    async fn fetch_organization(&self, id: OrganizationId) -> BackendResult<Option<Organization>>;

    /// Organization count, optionally restricted to one status.
    async fn count_organizations(&self, status: Option<OrganizationStatus>) -> BackendResult<u64>;

    /// `suspend_organization(org_id, reason, suspended_by_id)` procedure.
    async fn suspend_organization(
        &self,
        org_id: OrganizationId,
        reason: String,
        suspended_by: ActorId,
    ) -> BackendResult<()>;

    /// `reactivate_organization(org_id, reactivated_by_id)` procedure.
    async fn reactivate_organization(
        &self,
        org_id: OrganizationId,
        reactivated_by: ActorId,
    ) -> BackendResult<()>;

    /// `log_super_admin_action(...)` procedure. Returns the new record id.
    async fn log_super_admin_action(&self, record: NewAuditRecord) -> BackendResult<AuditRecordId>;

    async fn list_audit_records(&self, query: AuditQuery) -> BackendResult<Page<AuditRecord>>;

    async fn count_audit_records_since(&self, since: DateTime<Utc>) -> BackendResult<u64>;

    /// Insert or overwrite a setting keyed by `key`.
    async fn upsert_setting(&self, setting: SettingUpsert) -> BackendResult<()>;

    async fn fetch_settings(&self) -> BackendResult<Vec<SystemSetting>>;
}
