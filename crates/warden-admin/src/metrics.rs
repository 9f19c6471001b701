//! Platform-wide counters.

use crate::context::AdminContext;
use crate::error::AdminResult;
use crate::service::AdminService;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use warden_backend::OrganizationStatus;

/// Snapshot of platform counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformMetrics {
    pub total_organizations: u64,
    pub active_organizations: u64,
    pub suspended_organizations: u64,
    pub pending_setup_organizations: u64,
    pub total_users: u64,
    pub super_admins: u64,
    /// Audit records written within `recent_window_hours`.
    pub recent_audit_records: u64,
    pub recent_window_hours: u32,
    pub generated_at: DateTime<Utc>,
}

impl AdminService {
    /// Gather platform counters. The reads run concurrently; if any fails
    /// the whole snapshot is dropped and `Ok(None)` returned.
    #[instrument(skip(self, ctx))]
    pub async fn platform_metrics(&self, ctx: &AdminContext) -> AdminResult<Option<PlatformMetrics>> {
        self.access.require_super_admin(ctx).await?;

        let window_hours = self.config.metrics.recent_audit_window_hours;
        let now = Utc::now();
        let since = now - Duration::hours(i64::from(window_hours));
        let backend = &self.backend;

        let counts = tokio::try_join!(
            backend.count_organizations(None),
            backend.count_organizations(Some(OrganizationStatus::Active)),
            backend.count_organizations(Some(OrganizationStatus::Suspended)),
            backend.count_organizations(Some(OrganizationStatus::PendingSetup)),
            backend.count_users(),
            backend.count_super_admins(),
            backend.count_audit_records_since(since),
        );

        match counts {
            Ok((total, active, suspended, pending_setup, users, super_admins, recent_audit)) => {
                Ok(Some(PlatformMetrics {
                    total_organizations: total,
                    active_organizations: active,
                    suspended_organizations: suspended,
                    pending_setup_organizations: pending_setup,
                    total_users: users,
                    super_admins,
                    recent_audit_records: recent_audit,
                    recent_window_hours: window_hours,
                    generated_at: now,
                }))
            }
            Err(e) => {
                warn!(error = %e, "Failed to gather platform metrics");
                Ok(None)
            }
        }
    }
}
