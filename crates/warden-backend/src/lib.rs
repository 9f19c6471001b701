//! Store interface for the Warden control plane.
//!
//! Every privileged operation in Warden is a read or write against a managed
//! relational store. [`AdminBackend`] is that seam. Two implementations ship
//! here:
//!
//! - [`PgBackend`]: Postgres via `sqlx`, with the lifecycle and audit
//!   procedures defined in `migrations/`.
//! - [`MemoryBackend`]: in-process tables with the same procedure semantics,
//!   for tests and local development.

mod backend;
mod error;
mod memory;
mod model;
mod postgres;
mod query;

pub use backend::AdminBackend;
#[cfg(feature = "mocks")]
pub use backend::MockAdminBackend;
pub use error::{BackendError, BackendResult};
pub use memory::MemoryBackend;
pub use model::{
    NewRoleAssignment, Organization, OrganizationStatus, Profile, Role, RoleAssignment,
    SettingUpsert, SystemSetting,
};
pub use postgres::{PgBackend, PoolStats};
pub use query::{AssignmentFilter, AuditQuery, OrganizationQuery, OrganizationSort, Page, SortDirection};
