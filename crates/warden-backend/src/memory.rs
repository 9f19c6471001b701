//! In-process store with the same procedure semantics as the SQL schema.

use crate::backend::AdminBackend;
use crate::error::{BackendError, BackendResult};
use crate::model::{
    NewRoleAssignment, Organization, OrganizationStatus, Profile, Role, RoleAssignment,
    SettingUpsert, SystemSetting,
};
use crate::query::{
    resolve_limit, AssignmentFilter, AuditQuery, OrganizationQuery, OrganizationSort, Page,
    SortDirection,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;
use warden_audit_types::{AuditRecord, NewAuditRecord};
use warden_common_core::{ActorId, AuditRecordId, OrganizationId, RoleAssignmentId, RoleId};

#[derive(Debug, Clone)]
struct StoredAssignment {
    id: RoleAssignmentId,
    actor_id: ActorId,
    role_id: RoleId,
    expires_at: Option<DateTime<Utc>>,
    assigned_at: DateTime<Utc>,
    assigned_by: Option<ActorId>,
}

#[derive(Default)]
struct Tables {
    profiles: HashMap<ActorId, Profile>,
    roles: HashMap<RoleId, Role>,
    assignments: Vec<StoredAssignment>,
    organizations: HashMap<OrganizationId, Organization>,
    audit_log: Vec<AuditRecord>,
    settings: BTreeMap<String, SystemSetting>,
}

impl Tables {
    fn hydrate(&self, stored: &StoredAssignment) -> BackendResult<RoleAssignment> {
        let role = self
            .roles
            .get(&stored.role_id)
            .cloned()
            .ok_or_else(|| BackendError::not_found("role", stored.role_id))?;

        Ok(RoleAssignment {
            id: stored.id,
            actor_id: stored.actor_id,
            role,
            expires_at: stored.expires_at,
            assigned_at: stored.assigned_at,
            assigned_by: stored.assigned_by,
        })
    }

    fn organization_mut(&mut self, id: OrganizationId) -> BackendResult<&mut Organization> {
        self.organizations
            .get_mut(&id)
            .ok_or_else(|| BackendError::not_found("organization", id))
    }
}

fn paginate<T>(items: Vec<T>, offset: u32, limit: u32) -> Page<T> {
    let limit = resolve_limit(limit);
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();

    Page {
        items,
        total,
        offset,
        limit,
    }
}

/// In-memory [`AdminBackend`].
///
/// Tables sit behind one lock, so each call observes a consistent snapshot.
/// Seed it through the `insert_*` helpers.
#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<Tables>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_profile(&self, profile: Profile) {
        self.tables.write().await.profiles.insert(profile.id, profile);
    }

    pub async fn insert_role(&self, role: Role) {
        self.tables.write().await.roles.insert(role.id, role);
    }

    pub async fn insert_organization(&self, organization: Organization) {
        self.tables
            .write()
            .await
            .organizations
            .insert(organization.id, organization);
    }

    /// Every audit record, oldest first.
    pub async fn audit_records(&self) -> Vec<AuditRecord> {
        self.tables.read().await.audit_log.clone()
    }
}

#[async_trait]
impl AdminBackend for MemoryBackend {
    async fn fetch_profile(&self, actor_id: ActorId) -> BackendResult<Option<Profile>> {
        Ok(self.tables.read().await.profiles.get(&actor_id).cloned())
    }

    async fn count_users(&self) -> BackendResult<u64> {
        Ok(self.tables.read().await.profiles.len() as u64)
    }

    async fn count_super_admins(&self) -> BackendResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.values().filter(|p| p.is_super_admin).count() as u64)
    }

    async fn list_roles(&self) -> BackendResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.tables.read().await.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn fetch_role_assignments(
        &self,
        actor_id: ActorId,
        filter: AssignmentFilter,
    ) -> BackendResult<Vec<RoleAssignment>> {
        let tables = self.tables.read().await;
        tables
            .assignments
            .iter()
            .filter(|a| a.actor_id == actor_id && filter.admits(a.expires_at))
            .map(|a| tables.hydrate(a))
            .collect()
    }

    async fn insert_role_assignment(
        &self,
        assignment: NewRoleAssignment,
    ) -> BackendResult<RoleAssignment> {
        let mut tables = self.tables.write().await;

        if !tables.profiles.contains_key(&assignment.actor_id) {
            return Err(BackendError::not_found("profile", assignment.actor_id));
        }
        if !tables.roles.contains_key(&assignment.role_id) {
            return Err(BackendError::not_found("role", assignment.role_id));
        }
        if tables
            .assignments
            .iter()
            .any(|a| a.actor_id == assignment.actor_id && a.role_id == assignment.role_id)
        {
            return Err(BackendError::Conflict(format!(
                "{} already holds role {}",
                assignment.actor_id, assignment.role_id
            )));
        }

        let stored = StoredAssignment {
            id: RoleAssignmentId::new(),
            actor_id: assignment.actor_id,
            role_id: assignment.role_id,
            expires_at: assignment.expires_at,
            assigned_at: Utc::now(),
            assigned_by: Some(assignment.assigned_by),
        };
        let hydrated = tables.hydrate(&stored)?;
        tables.assignments.push(stored);
        Ok(hydrated)
    }

    async fn delete_role_assignment(&self, id: RoleAssignmentId) -> BackendResult<RoleAssignment> {
        let mut tables = self.tables.write().await;
        let index = tables
            .assignments
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| BackendError::not_found("role assignment", id))?;

        let hydrated = tables.hydrate(&tables.assignments[index])?;
        tables.assignments.remove(index);
        Ok(hydrated)
    }

    async fn list_organizations(&self, query: OrganizationQuery) -> BackendResult<Page<Organization>> {
        let tables = self.tables.read().await;
        let needle = query.search.as_deref().map(str::to_lowercase);

        let mut matching: Vec<Organization> = tables
            .organizations
            .values()
            .filter(|org| query.status.map_or(true, |status| org.status == status))
            .filter(|org| {
                needle.as_deref().map_or(true, |needle| {
                    org.name.to_lowercase().contains(needle) || org.slug.to_lowercase().contains(needle)
                })
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ordering = match query.sort {
                OrganizationSort::CreatedAt => a.created_at.cmp(&b.created_at),
                OrganizationSort::Name => a.name.cmp(&b.name),
            };
            match query.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        Ok(paginate(matching, query.offset, query.limit))
    }

    async fn fetch_organization(&self, id: OrganizationId) -> BackendResult<Option<Organization>> {
        Ok(self.tables.read().await.organizations.get(&id).cloned())
    }

    async fn count_organizations(&self, status: Option<OrganizationStatus>) -> BackendResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .organizations
            .values()
            .filter(|org| status.map_or(true, |s| org.status == s))
            .count() as u64)
    }

    async fn suspend_organization(
        &self,
        org_id: OrganizationId,
        reason: String,
        suspended_by: ActorId,
    ) -> BackendResult<()> {
        let mut tables = self.tables.write().await;
        let org = tables.organization_mut(org_id)?;

        match org.status {
            OrganizationStatus::Active | OrganizationStatus::PendingSetup => {
                org.status = OrganizationStatus::Suspended;
                org.suspended_at = Some(Utc::now());
                org.suspended_reason = Some(reason);
                org.suspended_by = Some(suspended_by);
                debug!(org_id = %org_id, "organization suspended");
                Ok(())
            }
            other => Err(BackendError::InvalidState(format!(
                "cannot suspend organization in status {}",
                other
            ))),
        }
    }

    async fn reactivate_organization(
        &self,
        org_id: OrganizationId,
        _reactivated_by: ActorId,
    ) -> BackendResult<()> {
        let mut tables = self.tables.write().await;
        let org = tables.organization_mut(org_id)?;

        if org.status != OrganizationStatus::Suspended {
            return Err(BackendError::InvalidState(format!(
                "cannot reactivate organization in status {}",
                org.status
            )));
        }

        org.status = OrganizationStatus::Active;
        org.suspended_at = None;
        org.suspended_reason = None;
        org.suspended_by = None;
        debug!(org_id = %org_id, "organization reactivated");
        Ok(())
    }

    async fn log_super_admin_action(&self, record: NewAuditRecord) -> BackendResult<AuditRecordId> {
        let mut tables = self.tables.write().await;

        let id = AuditRecordId::new();
        tables.audit_log.push(AuditRecord {
            id,
            actor_id: record.actor_id,
            actor_email: record.actor_email,
            action: record.action,
            target_type: record.target_type,
            target_id: record.target_id,
            details: record.details,
            severity: record.severity,
            ip_address: record.client.ip_address,
            user_agent: record.client.user_agent,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_audit_records(&self, query: AuditQuery) -> BackendResult<Page<AuditRecord>> {
        let tables = self.tables.read().await;

        let matching: Vec<AuditRecord> = tables
            .audit_log
            .iter()
            .rev()
            .filter(|r| query.actor_id.map_or(true, |id| r.actor_id == id))
            .filter(|r| query.action.as_ref().map_or(true, |a| &r.action == a))
            .filter(|r| query.target_type.map_or(true, |t| r.target_type == t))
            .filter(|r| {
                query
                    .target_id
                    .as_deref()
                    .map_or(true, |id| r.target_id.as_deref() == Some(id))
            })
            .filter(|r| query.min_severity.map_or(true, |s| r.severity.meets_threshold(s)))
            .filter(|r| query.since.map_or(true, |since| r.created_at >= since))
            .filter(|r| query.until.map_or(true, |until| r.created_at < until))
            .cloned()
            .collect();

        Ok(paginate(matching, query.offset, query.limit))
    }

    async fn count_audit_records_since(&self, since: DateTime<Utc>) -> BackendResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .audit_log
            .iter()
            .filter(|r| r.created_at >= since)
            .count() as u64)
    }

    async fn upsert_setting(&self, setting: SettingUpsert) -> BackendResult<()> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        match tables.settings.get_mut(&setting.key) {
            Some(existing) => {
                existing.value = setting.value;
                if let Some(category) = setting.category {
                    existing.category = category;
                }
                if let Some(is_public) = setting.is_public {
                    existing.is_public = is_public;
                }
                existing.updated_by = Some(setting.updated_by);
                existing.updated_at = now;
            }
            None => {
                tables.settings.insert(
                    setting.key.clone(),
                    SystemSetting {
                        key: setting.key,
                        value: setting.value,
                        category: setting.category.unwrap_or_else(|| "general".to_string()),
                        is_public: setting.is_public.unwrap_or(false),
                        description: None,
                        updated_by: Some(setting.updated_by),
                        updated_at: now,
                    },
                );
            }
        }
        Ok(())
    }

    async fn fetch_settings(&self) -> BackendResult<Vec<SystemSetting>> {
        Ok(self.tables.read().await.settings.values().cloned().collect())
    }
}
