//! Per-call request context.

use serde::{Deserialize, Serialize};
use warden_audit_types::ClientMetadata;
use warden_common_core::ActorId;

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: ActorId,
    pub email: String,
}

impl SessionUser {
    pub fn new(id: ActorId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}

/// Everything an operation needs to know about its caller.
///
/// Built by the outer surface (HTTP handler, CLI, job runner) and passed to
/// every [`AdminService`](crate::AdminService) call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminContext {
    /// `None` for unauthenticated callers.
    pub session: Option<SessionUser>,
    pub client: ClientMetadata,
}

impl AdminContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: SessionUser) -> Self {
        Self {
            session: Some(user),
            client: ClientMetadata::default(),
        }
    }

    pub fn with_client(mut self, client: ClientMetadata) -> Self {
        self.client = client;
        self
    }

    pub fn actor_id(&self) -> Option<ActorId> {
        self.session.as_ref().map(|user| user.id)
    }
}
