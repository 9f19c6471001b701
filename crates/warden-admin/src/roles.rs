//! Role assignment management.

use crate::audit::AuditEntry;
use crate::context::AdminContext;
use crate::error::AdminResult;
use crate::service::AdminService;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, instrument, warn};
use warden_audit_types::{AuditAction, AuditSeverity, AuditTargetType};
use warden_backend::{AssignmentFilter, NewRoleAssignment, Role, RoleAssignment};
use warden_common_core::{ActorId, RoleAssignmentId, RoleId};

impl AdminService {
    pub async fn list_roles(&self, ctx: &AdminContext) -> AdminResult<Vec<Role>> {
        self.access.require_super_admin(ctx).await?;
        Ok(self.backend.list_roles().await?)
    }

    /// An actor's unexpired assignments, including ones with a future expiry
    /// that the access check may not honor.
    pub async fn list_role_assignments(
        &self,
        ctx: &AdminContext,
        actor_id: ActorId,
    ) -> AdminResult<Vec<RoleAssignment>> {
        self.access.require_super_admin(ctx).await?;
        Ok(self
            .backend
            .fetch_role_assignments(actor_id, AssignmentFilter::ActiveAt(Utc::now()))
            .await?)
    }

    #[instrument(skip(self, ctx))]
    pub async fn assign_role(
        &self,
        ctx: &AdminContext,
        actor_id: ActorId,
        role_id: RoleId,
        expires_at: Option<DateTime<Utc>>,
    ) -> AdminResult<Option<RoleAssignmentId>> {
        let admin = self.access.require_super_admin(ctx).await?;

        let assignment = match self
            .backend
            .insert_role_assignment(NewRoleAssignment {
                actor_id,
                role_id,
                expires_at,
                assigned_by: admin.id,
            })
            .await
        {
            Ok(assignment) => assignment,
            Err(e) => {
                warn!(actor_id = %actor_id, role_id = %role_id, error = %e, "Failed to assign role");
                return Ok(None);
            }
        };

        info!(actor_id = %actor_id, role = %assignment.role.name, "Role assigned");

        let entry = AuditEntry::new(AuditAction::AssignRole, AuditTargetType::User)
            .target(actor_id)
            .details(json!({
                "assignment_id": assignment.id,
                "role_id": role_id,
                "role_name": assignment.role.name,
                "expires_at": expires_at,
            }))
            .severity(AuditSeverity::Medium);
        self.audit.record(&admin, ctx, entry).await;

        Ok(Some(assignment.id))
    }

    #[instrument(skip(self, ctx))]
    pub async fn revoke_role(
        &self,
        ctx: &AdminContext,
        assignment_id: RoleAssignmentId,
    ) -> AdminResult<bool> {
        let admin = self.access.require_super_admin(ctx).await?;

        let removed = match self.backend.delete_role_assignment(assignment_id).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(assignment_id = %assignment_id, error = %e, "Failed to revoke role");
                return Ok(false);
            }
        };

        info!(actor_id = %removed.actor_id, role = %removed.role.name, "Role revoked");

        let entry = AuditEntry::new(AuditAction::RevokeRole, AuditTargetType::User)
            .target(removed.actor_id)
            .details(json!({
                "assignment_id": assignment_id,
                "role_id": removed.role.id,
                "role_name": removed.role.name,
            }))
            .severity(AuditSeverity::Medium);
        self.audit.record(&admin, ctx, entry).await;

        Ok(true)
    }
}
