//! Audit record types for Warden.

mod action;
mod client;
mod record;
mod severity;
mod target;

pub use action::AuditAction;
pub use client::ClientMetadata;
pub use record::{AuditRecord, NewAuditRecord, NewAuditRecordBuilder};
pub use severity::AuditSeverity;
pub use target::AuditTargetType;
