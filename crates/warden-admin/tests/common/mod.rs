//! Shared fixtures for admin integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use warden_admin::{AdminContext, AdminService, SessionUser};
use warden_audit_types::ClientMetadata;
use warden_backend::{MemoryBackend, Profile};
use warden_common_config::WardenConfig;
use warden_common_core::ActorId;

pub struct Harness {
    pub backend: Arc<MemoryBackend>,
    pub service: AdminService,
    pub admin: ActorId,
    pub user: ActorId,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config(WardenConfig::default()).await
    }

    pub async fn with_config(config: WardenConfig) -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let admin = ActorId::new();
        let user = ActorId::new();

        backend
            .insert_profile(Profile::new(admin, "root@example.com").super_admin())
            .await;
        backend.insert_profile(Profile::new(user, "user@example.com")).await;

        let service = AdminService::new(backend.clone(), config);
        Self {
            backend,
            service,
            admin,
            user,
        }
    }

    pub fn admin_ctx(&self) -> AdminContext {
        AdminContext::authenticated(SessionUser::new(self.admin, "root@example.com")).with_client(
            ClientMetadata::default()
                .with_ip_address("203.0.113.7")
                .with_user_agent("warden-tests"),
        )
    }

    pub fn user_ctx(&self) -> AdminContext {
        AdminContext::authenticated(SessionUser::new(self.user, "user@example.com"))
    }
}
