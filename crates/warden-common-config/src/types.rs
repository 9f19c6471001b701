//! Configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Connection to the managed relational store.
    pub database: DatabaseConfig,
    /// Access evaluation behavior.
    pub access: AccessConfig,
    /// Audit log reads.
    pub audit: AuditConfig,
    /// Organization listing.
    pub organizations: OrganizationsConfig,
    /// Platform metrics aggregation.
    pub metrics: MetricsConfig,
}

/// Database pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Postgres connection URL.
    pub url: String,
    /// Maximum connections in pool.
    pub max_connections: u32,
    /// Minimum connections in pool.
    pub min_connections: u32,
    /// Connection acquire timeout.
    pub acquire_timeout_secs: u64,
    /// Connection idle timeout.
    pub idle_timeout_secs: u64,
    /// Maximum connection lifetime.
    pub max_lifetime_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 3600,
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

/// Which role assignments count when resolving permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentExpiry {
    /// Only assignments with no expiry grant anything. Any non-null
    /// `expires_at`, past or future, is excluded.
    #[default]
    NonExpiringOnly,
    /// Assignments with no expiry or an expiry in the future.
    Unexpired,
}

/// Access evaluation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Role assignment expiry rule.
    pub assignment_expiry: AssignmentExpiry,
    /// Landing location callers are diverted to when a super-admin gate fails.
    pub divert_location: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            assignment_expiry: AssignmentExpiry::default(),
            divert_location: "/dashboard".to_string(),
        }
    }
}

/// Audit log read configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 500,
        }
    }
}

/// Organization listing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationsConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for OrganizationsConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// Platform metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Window for the "recent audit activity" counter.
    pub recent_audit_window_hours: u32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            recent_audit_window_hours: 24,
        }
    }
}
