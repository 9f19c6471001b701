//! The admin facade.

use crate::access::{AccessDecision, AccessEvaluator};
use crate::audit::{AuditEntry, AuditRecorder};
use crate::context::AdminContext;
use crate::error::AdminResult;
use std::sync::Arc;
use tracing::instrument;
use warden_audit_types::AuditRecord;
use warden_backend::{AdminBackend, AuditQuery, Page, Profile};
use warden_common_config::WardenConfig;
use warden_common_core::{ActorId, AuditRecordId};

/// Typed entry point for every control-plane operation.
///
/// Privileged operations check access first, then touch the store, then
/// write one audit record if they mutated anything.
#[derive(Clone)]
pub struct AdminService {
    pub(crate) backend: Arc<dyn AdminBackend>,
    pub(crate) config: Arc<WardenConfig>,
    pub(crate) access: AccessEvaluator,
    pub(crate) audit: AuditRecorder,
}

impl AdminService {
    pub fn new(backend: Arc<dyn AdminBackend>, config: WardenConfig) -> Self {
        let access = AccessEvaluator::new(Arc::clone(&backend), config.access.clone());
        let audit = AuditRecorder::new(Arc::clone(&backend), access.clone());

        Self {
            backend,
            config: Arc::new(config),
            access,
            audit,
        }
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    pub fn access(&self) -> &AccessEvaluator {
        &self.access
    }

    pub fn audit(&self) -> &AuditRecorder {
        &self.audit
    }

    pub async fn is_super_admin(&self, actor_id: ActorId) -> bool {
        self.access.is_super_admin(actor_id).await
    }

    pub async fn has_permission(
        &self,
        ctx: &AdminContext,
        action: &str,
        resource: Option<&str>,
    ) -> AccessDecision {
        self.access.has_permission(ctx, action, resource).await
    }

    pub async fn require_super_admin(&self, ctx: &AdminContext) -> AdminResult<Profile> {
        self.access.require_super_admin(ctx).await
    }

    pub async fn has_super_admin_permission(&self, ctx: &AdminContext, permission: &str) -> bool {
        self.access.has_super_admin_permission(ctx, permission).await
    }

    #[instrument(skip(self, ctx, entry), fields(action = %entry.action))]
    pub async fn log_action(
        &self,
        ctx: &AdminContext,
        entry: AuditEntry,
    ) -> AdminResult<Option<AuditRecordId>> {
        self.audit.log_action(ctx, entry).await
    }

    /// Audit log, newest first. Super admins only.
    #[instrument(skip(self, ctx))]
    pub async fn list_audit_records(
        &self,
        ctx: &AdminContext,
        mut query: AuditQuery,
    ) -> AdminResult<Page<AuditRecord>> {
        self.access.require_super_admin(ctx).await?;

        query.limit = clamp_limit(
            query.limit,
            self.config.audit.default_page_size,
            self.config.audit.max_page_size,
        );
        Ok(self.backend.list_audit_records(query).await?)
    }
}

/// `0` takes the default; anything above `max` is capped.
pub(crate) fn clamp_limit(requested: u32, default: u32, max: u32) -> u32 {
    match requested {
        0 => default.min(max),
        n => n.min(max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(0, 20, 100), 20);
        assert_eq!(clamp_limit(5, 20, 100), 5);
        assert_eq!(clamp_limit(1000, 20, 100), 100);
    }
}
