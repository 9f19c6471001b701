//! Access evaluation: super-admin status and role-based permissions.
//!
//! Every check here fails closed. A missing session, a missing profile or a
//! store error all resolve to "denied".

use crate::context::AdminContext;
use crate::error::{AdminError, AdminResult};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};
use warden_backend::{AdminBackend, AssignmentFilter, Profile};
use warden_common_config::{AccessConfig, AssignmentExpiry};
use warden_common_core::ActorId;

/// Legacy permission token that grants every permission.
pub const WILDCARD_PERMISSION: &str = "*";

/// Why a permission check came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionBasis {
    SuperAdmin,
    /// Granted by the named role.
    Role(String),
    Unauthenticated,
    NoMatchingRole,
    LookupFailed,
}

/// Outcome of a permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub granted: bool,
    pub basis: DecisionBasis,
}

impl AccessDecision {
    fn grant(basis: DecisionBasis) -> Self {
        Self {
            granted: true,
            basis,
        }
    }

    fn deny(basis: DecisionBasis) -> Self {
        Self {
            granted: false,
            basis,
        }
    }

    pub fn is_granted(&self) -> bool {
        self.granted
    }
}

/// Resolves an actor's privileges against the store.
#[derive(Clone)]
pub struct AccessEvaluator {
    backend: Arc<dyn AdminBackend>,
    config: AccessConfig,
}

impl AccessEvaluator {
    pub fn new(backend: Arc<dyn AdminBackend>, config: AccessConfig) -> Self {
        Self { backend, config }
    }

    /// The assignment filter for the configured expiry rule, evaluated now.
    pub fn assignment_filter(&self) -> AssignmentFilter {
        match self.config.assignment_expiry {
            AssignmentExpiry::NonExpiringOnly => AssignmentFilter::NonExpiringOnly,
            AssignmentExpiry::Unexpired => AssignmentFilter::ActiveAt(Utc::now()),
        }
    }

    /// The super-admin profile for `actor_id`, or `None` if the actor is not
    /// one or the lookup fails.
    async fn super_admin_profile(&self, actor_id: ActorId) -> Option<Profile> {
        match self.backend.fetch_profile(actor_id).await {
            Ok(Some(profile)) if profile.is_super_admin => Some(profile),
            Ok(_) => None,
            Err(e) => {
                warn!(actor_id = %actor_id, error = %e, "Profile lookup failed");
                None
            }
        }
    }

    /// Whether `actor_id` is a super admin. Never errors.
    pub async fn is_super_admin(&self, actor_id: ActorId) -> bool {
        self.super_admin_profile(actor_id).await.is_some()
    }

    /// Whether the caller may perform `action`, within `resource` if given.
    ///
    /// Super admins are granted everything. Everyone else needs a role
    /// assignment, admitted by the configured expiry rule, whose role
    /// carries the action.
    pub async fn has_permission(
        &self,
        ctx: &AdminContext,
        action: &str,
        resource: Option<&str>,
    ) -> AccessDecision {
        let Some(actor_id) = ctx.actor_id() else {
            return AccessDecision::deny(DecisionBasis::Unauthenticated);
        };

        if self.is_super_admin(actor_id).await {
            return AccessDecision::grant(DecisionBasis::SuperAdmin);
        }

        let assignments = match self
            .backend
            .fetch_role_assignments(actor_id, self.assignment_filter())
            .await
        {
            Ok(assignments) => assignments,
            Err(e) => {
                warn!(actor_id = %actor_id, error = %e, "Role assignment lookup failed");
                return AccessDecision::deny(DecisionBasis::LookupFailed);
            }
        };

        match assignments
            .iter()
            .find(|assignment| assignment.role.grants(action, resource))
        {
            Some(assignment) => {
                debug!(actor_id = %actor_id, role = %assignment.role.name, action, "Permission granted by role");
                AccessDecision::grant(DecisionBasis::Role(assignment.role.name.clone()))
            }
            None => AccessDecision::deny(DecisionBasis::NoMatchingRole),
        }
    }

    /// Gate for super-admin-only operations.
    pub async fn require_super_admin(&self, ctx: &AdminContext) -> AdminResult<Profile> {
        let actor_id = ctx.actor_id().ok_or(AdminError::NotAuthenticated)?;

        match self.super_admin_profile(actor_id).await {
            Some(profile) => Ok(profile),
            None => {
                warn!(actor_id = %actor_id, "Super admin check failed, diverting");
                Err(AdminError::Diverted {
                    location: self.config.divert_location.clone(),
                })
            }
        }
    }

    /// Legacy check against the profile's own permission list.
    ///
    /// Requires super-admin status. An absent or empty list, or one holding
    /// [`WILDCARD_PERMISSION`], grants everything.
    pub async fn has_super_admin_permission(&self, ctx: &AdminContext, permission: &str) -> bool {
        let Some(actor_id) = ctx.actor_id() else {
            return false;
        };

        match self.super_admin_profile(actor_id).await {
            Some(profile) => legacy_list_grants(profile.super_admin_permissions.as_deref(), permission),
            None => false,
        }
    }
}

fn legacy_list_grants(list: Option<&[String]>, permission: &str) -> bool {
    match list {
        None => true,
        Some([]) => true,
        Some(list) => list
            .iter()
            .any(|entry| entry == WILDCARD_PERMISSION || entry == permission),
    }
}
