//! Audit records as written to and read from the store.

use crate::{AuditAction, AuditSeverity, AuditTargetType, ClientMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_common_core::{ActorId, AuditRecordId, OrganizationId};

/// A persisted, immutable audit record.
///
/// `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditRecordId,
    pub actor_id: ActorId,
    pub actor_email: Option<String>,
    pub action: AuditAction,
    pub target_type: AuditTargetType,
    pub target_id: Option<String>,
    pub details: serde_json::Value,
    pub severity: AuditSeverity,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// The targeted organization, if this record targets one.
    pub fn target_organization(&self) -> Option<OrganizationId> {
        match self.target_type {
            AuditTargetType::Organization => self
                .target_id
                .as_deref()
                .and_then(|id| OrganizationId::parse(id).ok()),
            _ => None,
        }
    }

    /// The targeted user, if this record targets one.
    pub fn target_user(&self) -> Option<ActorId> {
        match self.target_type {
            AuditTargetType::User => self
                .target_id
                .as_deref()
                .and_then(|id| ActorId::parse(id).ok()),
            _ => None,
        }
    }
}

/// An audit record about to be appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditRecord {
    pub actor_id: ActorId,
    /// Stamped at write time; later profile changes do not reach it.
    pub actor_email: Option<String>,
    pub action: AuditAction,
    pub target_type: AuditTargetType,
    pub target_id: Option<String>,
    pub details: serde_json::Value,
    pub severity: AuditSeverity,
    pub client: ClientMetadata,
}

impl NewAuditRecord {
    /// Create a new record builder.
    pub fn builder(
        actor_id: ActorId,
        action: AuditAction,
        target_type: AuditTargetType,
    ) -> NewAuditRecordBuilder {
        NewAuditRecordBuilder::new(actor_id, action, target_type)
    }
}

/// Builder for [`NewAuditRecord`].
#[derive(Debug)]
pub struct NewAuditRecordBuilder {
    actor_id: ActorId,
    actor_email: Option<String>,
    action: AuditAction,
    target_type: AuditTargetType,
    target_id: Option<String>,
    details: serde_json::Value,
    severity: AuditSeverity,
    client: ClientMetadata,
}

impl NewAuditRecordBuilder {
    /// Create a new builder. Severity defaults to `info`, details to `{}`.
    pub fn new(actor_id: ActorId, action: AuditAction, target_type: AuditTargetType) -> Self {
        Self {
            actor_id,
            actor_email: None,
            action,
            target_type,
            target_id: None,
            details: serde_json::Value::Object(serde_json::Map::new()),
            severity: AuditSeverity::default(),
            client: ClientMetadata::default(),
        }
    }

    /// Set the actor email recorded with the entry.
    pub fn actor_email(mut self, email: impl Into<String>) -> Self {
        self.actor_email = Some(email.into());
        self
    }

    /// Set the target identifier.
    pub fn target_id(mut self, id: impl Into<String>) -> Self {
        self.target_id = Some(id.into());
        self
    }

    /// Set an optional target identifier.
    pub fn maybe_target_id(mut self, id: Option<String>) -> Self {
        self.target_id = id;
        self
    }

    /// Replace the detail payload.
    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Add a single detail field. Non-object payloads are replaced by an object.
    pub fn detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(json) = serde_json::to_value(value) {
            if !self.details.is_object() {
                self.details = serde_json::Value::Object(serde_json::Map::new());
            }
            if let Some(map) = self.details.as_object_mut() {
                map.insert(key.into(), json);
            }
        }
        self
    }

    /// Set the severity.
    pub fn severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the client metadata.
    pub fn client(mut self, client: ClientMetadata) -> Self {
        self.client = client;
        self
    }

    /// Build the record.
    pub fn build(self) -> NewAuditRecord {
        NewAuditRecord {
            actor_id: self.actor_id,
            actor_email: self.actor_email,
            action: self.action,
            target_type: self.target_type,
            target_id: self.target_id,
            details: self.details,
            severity: self.severity,
            client: self.client,
        }
    }
}
