//! Query inputs and paged results.

use crate::model::OrganizationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_audit_types::{AuditAction, AuditSeverity, AuditTargetType};
use warden_common_core::ActorId;

/// Page size a store applies when a query leaves `limit` at zero.
pub(crate) const FALLBACK_LIMIT: u32 = 50;

pub(crate) fn resolve_limit(limit: u32) -> u32 {
    if limit == 0 {
        FALLBACK_LIMIT
    } else {
        limit
    }
}

/// Which role assignments a lookup returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentFilter {
    /// Only rows with `expires_at IS NULL`.
    NonExpiringOnly,
    /// Rows with no expiry, or an expiry after the given instant.
    ActiveAt(DateTime<Utc>),
}

impl AssignmentFilter {
    /// Whether an assignment with this expiry passes the filter.
    pub fn admits(&self, expires_at: Option<DateTime<Utc>>) -> bool {
        match (self, expires_at) {
            (_, None) => true,
            (Self::NonExpiringOnly, Some(_)) => false,
            (Self::ActiveAt(now), Some(expiry)) => expiry > *now,
        }
    }
}

/// Sort key for organization listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationSort {
    #[default]
    CreatedAt,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Organization listing filters with offset/limit pagination.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationQuery {
    /// Case-insensitive substring match on name or slug.
    pub search: Option<String>,
    pub status: Option<OrganizationStatus>,
    pub sort: OrganizationSort,
    pub direction: SortDirection,
    pub offset: u32,
    /// `0` means "use the configured default".
    pub limit: u32,
}

impl OrganizationQuery {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: OrganizationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn sort(mut self, sort: OrganizationSort, direction: SortDirection) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    pub fn page(mut self, offset: u32, limit: u32) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}

/// Audit log filters. Results are always newest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditQuery {
    pub actor_id: Option<ActorId>,
    pub action: Option<AuditAction>,
    pub target_type: Option<AuditTargetType>,
    pub target_id: Option<String>,
    pub min_severity: Option<AuditSeverity>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub offset: u32,
    /// `0` means "use the configured default".
    pub limit: u32,
}

impl AuditQuery {
    pub fn actor(mut self, actor_id: ActorId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn target(mut self, target_type: AuditTargetType, target_id: impl Into<String>) -> Self {
        self.target_type = Some(target_type);
        self.target_id = Some(target_id.into());
        self
    }

    pub fn min_severity(mut self, severity: AuditSeverity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    pub fn between(mut self, since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    pub fn page(mut self, offset: u32, limit: u32) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}

/// One page of results plus the unpaged total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        (self.offset as u64) + (self.items.len() as u64) < self.total
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}
