//! Audit severity levels.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum::{Display, EnumIter, EnumString};

/// Severity (risk) classification attached to an audit record.
///
/// Always supplied by the caller; nothing here derives or escalates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumIter, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuditSeverity {
    /// Routine administrative activity.
    Info,
    /// Low-impact change.
    Low,
    /// Change worth reviewing (role grants, settings).
    Medium,
    /// Tenant-affecting change (suspensions).
    High,
    /// Security-critical change.
    Critical,
}

impl AuditSeverity {
    /// Numeric value for comparison (higher = more severe).
    pub fn level(&self) -> u8 {
        match self {
            Self::Info => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    /// Check if this severity meets a minimum threshold.
    pub fn meets_threshold(&self, threshold: Self) -> bool {
        self.level() >= threshold.level()
    }

    /// All severities at or above `threshold`, lowest first.
    pub fn at_least(threshold: Self) -> impl Iterator<Item = Self> {
        use strum::IntoEnumIterator;
        Self::iter().filter(move |s| s.meets_threshold(threshold))
    }
}

impl PartialOrd for AuditSeverity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AuditSeverity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.level().cmp(&other.level())
    }
}

impl Default for AuditSeverity {
    fn default() -> Self {
        Self::Info
    }
}
