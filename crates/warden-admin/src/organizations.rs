//! Organization lifecycle and listing.

use crate::audit::AuditEntry;
use crate::context::AdminContext;
use crate::error::AdminResult;
use crate::service::{clamp_limit, AdminService};
use serde_json::json;
use tracing::{info, instrument, warn};
use warden_audit_types::{AuditAction, AuditSeverity, AuditTargetType};
use warden_backend::{Organization, OrganizationQuery, Page};
use warden_common_core::OrganizationId;

impl AdminService {
    /// Suspend an organization.
    ///
    /// Returns `Ok(false)` if the store rejects the transition; in that case
    /// no audit record is written.
    #[instrument(skip(self, ctx, reason))]
    pub async fn suspend_organization(
        &self,
        ctx: &AdminContext,
        org_id: OrganizationId,
        reason: &str,
    ) -> AdminResult<bool> {
        let actor = self.access.require_super_admin(ctx).await?;

        if let Err(e) = self
            .backend
            .suspend_organization(org_id, reason.to_string(), actor.id)
            .await
        {
            warn!(org_id = %org_id, error = %e, "Failed to suspend organization");
            return Ok(false);
        }

        info!(org_id = %org_id, actor_id = %actor.id, "Organization suspended");

        let entry = AuditEntry::new(AuditAction::SuspendOrganization, AuditTargetType::Organization)
            .target(org_id)
            .details(json!({ "reason": reason }))
            .severity(AuditSeverity::High);
        self.audit.record(&actor, ctx, entry).await;

        Ok(true)
    }

    /// Reactivate a suspended organization.
    #[instrument(skip(self, ctx))]
    pub async fn reactivate_organization(
        &self,
        ctx: &AdminContext,
        org_id: OrganizationId,
    ) -> AdminResult<bool> {
        let actor = self.access.require_super_admin(ctx).await?;

        if let Err(e) = self.backend.reactivate_organization(org_id, actor.id).await {
            warn!(org_id = %org_id, error = %e, "Failed to reactivate organization");
            return Ok(false);
        }

        info!(org_id = %org_id, actor_id = %actor.id, "Organization reactivated");

        let entry = AuditEntry::new(AuditAction::ReactivateOrganization, AuditTargetType::Organization)
            .target(org_id)
            .severity(AuditSeverity::Medium);
        self.audit.record(&actor, ctx, entry).await;

        Ok(true)
    }

    #[instrument(skip(self, ctx))]
    pub async fn list_organizations(
        &self,
        ctx: &AdminContext,
        mut query: OrganizationQuery,
    ) -> AdminResult<Page<Organization>> {
        self.access.require_super_admin(ctx).await?;

        query.limit = clamp_limit(
            query.limit,
            self.config.organizations.default_page_size,
            self.config.organizations.max_page_size,
        );
        Ok(self.backend.list_organizations(query).await?)
    }

    pub async fn get_organization(
        &self,
        ctx: &AdminContext,
        org_id: OrganizationId,
    ) -> AdminResult<Option<Organization>> {
        self.access.require_super_admin(ctx).await?;
        Ok(self.backend.fetch_organization(org_id).await?)
    }
}
