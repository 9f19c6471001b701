//! Audit recording.

use crate::access::AccessEvaluator;
use crate::context::AdminContext;
use crate::error::AdminResult;
use std::sync::Arc;
use tracing::{debug, error};
use warden_audit_types::{AuditAction, AuditSeverity, AuditTargetType, NewAuditRecord};
use warden_backend::{AdminBackend, Profile};
use warden_common_core::AuditRecordId;

/// One audit entry as described by the caller.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub target_type: AuditTargetType,
    pub target_id: Option<String>,
    pub details: serde_json::Value,
    pub severity: AuditSeverity,
}

impl AuditEntry {
    pub fn new(action: AuditAction, target_type: AuditTargetType) -> Self {
        Self {
            action,
            target_type,
            target_id: None,
            details: serde_json::json!({}),
            severity: AuditSeverity::Info,
        }
    }

    pub fn target(mut self, id: impl ToString) -> Self {
        self.target_id = Some(id.to_string());
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// The email written into an audit record: the session's, falling back to
/// the profile's when the session carries none.
fn stamped_email(ctx: &AdminContext, actor: &Profile) -> String {
    ctx.session
        .as_ref()
        .map(|user| user.email.trim())
        .filter(|email| !email.is_empty())
        .unwrap_or(actor.email.as_str())
        .to_string()
}

/// Appends super-admin actions to the store's audit log.
///
/// Writes are best-effort: a failed write is logged and reported as `None`,
/// and never undoes the action it describes.
#[derive(Clone)]
pub struct AuditRecorder {
    backend: Arc<dyn AdminBackend>,
    access: AccessEvaluator,
}

impl AuditRecorder {
    pub fn new(backend: Arc<dyn AdminBackend>, access: AccessEvaluator) -> Self {
        Self { backend, access }
    }

    /// Record an action on behalf of the caller. The caller must be a super
    /// admin; otherwise nothing is written and the gate error is returned.
    pub async fn log_action(
        &self,
        ctx: &AdminContext,
        entry: AuditEntry,
    ) -> AdminResult<Option<AuditRecordId>> {
        let actor = self.access.require_super_admin(ctx).await?;
        Ok(self.record(&actor, ctx, entry).await)
    }

    /// Record an action for an already-verified super admin.
    pub(crate) async fn record(
        &self,
        actor: &Profile,
        ctx: &AdminContext,
        entry: AuditEntry,
    ) -> Option<AuditRecordId> {
        let action = entry.action.clone();
        let record = NewAuditRecord::builder(actor.id, entry.action, entry.target_type)
            .actor_email(stamped_email(ctx, actor))
            .maybe_target_id(entry.target_id)
            .details(entry.details)
            .severity(entry.severity)
            .client(ctx.client.clone())
            .build();

        match self.backend.log_super_admin_action(record).await {
            Ok(id) => {
                debug!(audit_id = %id, action = %action, "Audit record written");
                Some(id)
            }
            Err(e) => {
                error!(actor_id = %actor.id, action = %action, error = %e, "Failed to write audit record");
                None
            }
        }
    }
}
