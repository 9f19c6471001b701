//! Super-admin control plane for Warden.
//!
//! [`AdminService`] is the entry point. Each privileged operation:
//!
//! 1. checks the caller through the [`AccessEvaluator`] (fail-closed),
//! 2. reads or writes through an [`AdminBackend`](warden_backend::AdminBackend),
//! 3. for mutations, appends one record through the [`AuditRecorder`].
//!
//! The audit write is best-effort. It happens after the mutation, is not
//! part of the same transaction, and a failure is logged rather than
//! reported to the caller.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use warden_admin::{AdminContext, AdminService, SessionUser};
//! use warden_backend::MemoryBackend;
//! use warden_common_config::WardenConfig;
//! use warden_common_core::{ActorId, OrganizationId};
//!
//! # async fn run() -> warden_admin::AdminResult<()> {
//! let service = AdminService::new(Arc::new(MemoryBackend::new()), WardenConfig::default());
//! let ctx = AdminContext::authenticated(SessionUser::new(ActorId::new(), "ops@example.com"));
//!
//! let suspended = service
//!     .suspend_organization(&ctx, OrganizationId::new(), "chargeback fraud")
//!     .await?;
//! # let _ = suspended;
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod audit;
pub mod context;
pub mod error;
pub mod metrics;
mod organizations;
mod roles;
pub mod service;
pub mod settings;

pub use access::{AccessDecision, AccessEvaluator, DecisionBasis};
pub use audit::{AuditEntry, AuditRecorder};
pub use context::{AdminContext, SessionUser};
pub use error::{AdminError, AdminResult};
pub use metrics::PlatformMetrics;
pub use service::AdminService;
