//! Integration tests for the Postgres store.
//!
//! These run against a real database named by `WARDEN_TEST_DATABASE_URL` and
//! return early when it is unset. Every test seeds its own rows under fresh
//! ids, so they can share one database and run in parallel.

use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::types::Json;
use warden_audit_types::{AuditAction, AuditSeverity, AuditTargetType, NewAuditRecord};
use warden_backend::{
    AdminBackend, AssignmentFilter, AuditQuery, BackendError, NewRoleAssignment,
    OrganizationQuery, OrganizationStatus, PgBackend, SettingUpsert,
};
use warden_common_config::DatabaseConfig;
use warden_common_core::{ActorId, OrganizationId, RoleId};

async fn test_backend() -> Option<PgBackend> {
    let url = std::env::var("WARDEN_TEST_DATABASE_URL")
        .ok()
        .filter(|url| !url.is_empty())?;

    let config = DatabaseConfig {
        url,
        max_connections: 4,
        min_connections: 0,
        ..DatabaseConfig::default()
    };
    let backend = PgBackend::connect(&config).await.unwrap();
    backend.migrate().await.unwrap();
    Some(backend)
}

async fn seed_profile(backend: &PgBackend, super_admin: bool) -> ActorId {
    let id = ActorId::new();
    sqlx::query("INSERT INTO profiles (id, email, is_super_admin) VALUES ($1, $2, $3)")
        .bind(id.as_uuid())
        .bind(format!("{}@example.com", id.as_uuid()))
        .bind(super_admin)
        .execute(backend.pool())
        .await
        .unwrap();
    id
}

async fn seed_role(backend: &PgBackend) -> RoleId {
    let id = RoleId::new();
    sqlx::query("INSERT INTO roles (id, name, permissions) VALUES ($1, $2, $3)")
        .bind(id.as_uuid())
        .bind(format!("role-{}", id.as_uuid()))
        .bind(Json(json!({ "billing": ["refund"] })))
        .execute(backend.pool())
        .await
        .unwrap();
    id
}

async fn seed_organization(backend: &PgBackend, name: &str, status: OrganizationStatus) -> OrganizationId {
    let id = OrganizationId::new();
    sqlx::query("INSERT INTO organizations (id, name, slug, status) VALUES ($1, $2, $3, $4)")
        .bind(id.as_uuid())
        .bind(name)
        .bind(format!("org-{}", id.as_uuid()))
        .bind(status.as_str())
        .execute(backend.pool())
        .await
        .unwrap();
    id
}

#[tokio::test]
async fn migrations_reapply_cleanly() {
    let Some(backend) = test_backend().await else { return };

    backend.migrate().await.unwrap();
    backend
        .health_check(std::time::Duration::from_secs(5))
        .await
        .unwrap();
    assert!(backend.stats().size >= 1);
}

#[tokio::test]
async fn assignment_filters_follow_expiry() {
    let Some(backend) = test_backend().await else { return };
    let admin = seed_profile(&backend, true).await;
    let user = seed_profile(&backend, false).await;
    let (permanent, upcoming, lapsed) = (
        seed_role(&backend).await,
        seed_role(&backend).await,
        seed_role(&backend).await,
    );

    for (role_id, expires_at) in [
        (permanent, None),
        (upcoming, Some(Utc::now() + Duration::days(7))),
        (lapsed, Some(Utc::now() - Duration::days(1))),
    ] {
        let assignment = backend
            .insert_role_assignment(NewRoleAssignment {
                actor_id: user,
                role_id,
                expires_at,
                assigned_by: admin,
            })
            .await
            .unwrap();
        assert_eq!(assignment.role.id, role_id);
        assert!(assignment.role.permissions["billing"].contains("refund"));
    }

    let non_expiring = backend
        .fetch_role_assignments(user, AssignmentFilter::NonExpiringOnly)
        .await
        .unwrap();
    assert_eq!(non_expiring.len(), 1);
    assert_eq!(non_expiring[0].role.id, permanent);

    let mut active: Vec<RoleId> = backend
        .fetch_role_assignments(user, AssignmentFilter::ActiveAt(Utc::now()))
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.role.id)
        .collect();
    active.sort_by_key(|id| id.as_uuid());
    let mut expected = vec![permanent, upcoming];
    expected.sort_by_key(|id| id.as_uuid());
    assert_eq!(active, expected);
}

#[tokio::test]
async fn assignment_insert_reports_the_missing_row() {
    let Some(backend) = test_backend().await else { return };
    let admin = seed_profile(&backend, true).await;
    let user = seed_profile(&backend, false).await;
    let role = seed_role(&backend).await;

    let missing_role = RoleId::new();
    let err = backend
        .insert_role_assignment(NewRoleAssignment {
            actor_id: user,
            role_id: missing_role,
            expires_at: None,
            assigned_by: admin,
        })
        .await
        .unwrap_err();
    assert!(matches!(&err, BackendError::NotFound { entity: "role", id } if *id == missing_role.to_string()));

    let missing_actor = ActorId::new();
    let err = backend
        .insert_role_assignment(NewRoleAssignment {
            actor_id: missing_actor,
            role_id: role,
            expires_at: None,
            assigned_by: admin,
        })
        .await
        .unwrap_err();
    assert!(matches!(&err, BackendError::NotFound { entity: "profile", id } if *id == missing_actor.to_string()));

    let granted = NewRoleAssignment {
        actor_id: user,
        role_id: role,
        expires_at: None,
        assigned_by: admin,
    };
    let assignment = backend.insert_role_assignment(granted.clone()).await.unwrap();
    let err = backend.insert_role_assignment(granted).await.unwrap_err();
    assert!(matches!(err, BackendError::Conflict(_)));

    let removed = backend.delete_role_assignment(assignment.id).await.unwrap();
    assert_eq!(removed.actor_id, user);
    assert!(backend
        .delete_role_assignment(assignment.id)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn lifecycle_procedures_enforce_transitions() {
    let Some(backend) = test_backend().await else { return };
    let admin = seed_profile(&backend, true).await;
    let org = seed_organization(&backend, "Acme", OrganizationStatus::Active).await;

    backend
        .suspend_organization(org, "chargeback".to_string(), admin)
        .await
        .unwrap();
    let suspended = backend.fetch_organization(org).await.unwrap().unwrap();
    assert_eq!(suspended.status, OrganizationStatus::Suspended);
    assert_eq!(suspended.suspended_reason.as_deref(), Some("chargeback"));
    assert_eq!(suspended.suspended_by, Some(admin));
    assert!(suspended.suspended_at.is_some());

    let err = backend
        .suspend_organization(org, "again".to_string(), admin)
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::InvalidState(_)));

    backend.reactivate_organization(org, admin).await.unwrap();
    let active = backend.fetch_organization(org).await.unwrap().unwrap();
    assert_eq!(active.status, OrganizationStatus::Active);
    assert!(active.suspended_reason.is_none());
    assert!(active.suspended_by.is_none());

    let err = backend.reactivate_organization(org, admin).await.unwrap_err();
    assert!(matches!(err, BackendError::InvalidState(_)));

    let err = backend
        .suspend_organization(OrganizationId::new(), "ghost".to_string(), admin)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let cancelled = seed_organization(&backend, "Gone", OrganizationStatus::Cancelled).await;
    let err = backend
        .suspend_organization(cancelled, "late".to_string(), admin)
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::InvalidState(_)));
}

#[tokio::test]
async fn organization_filters_and_paging() {
    let Some(backend) = test_backend().await else { return };
    let token = format!("zz{}", uuid::Uuid::new_v4().simple());

    for (suffix, status) in [
        ("one", OrganizationStatus::Active),
        ("two", OrganizationStatus::Active),
        ("three", OrganizationStatus::Suspended),
    ] {
        seed_organization(&backend, &format!("{token} {suffix}"), status).await;
    }

    let all = backend
        .list_organizations(OrganizationQuery::default().search(token.clone()).page(0, 2))
        .await
        .unwrap();
    assert_eq!(all.total, 3);
    assert_eq!(all.items.len(), 2);
    assert!(all.has_more());

    let suspended = backend
        .list_organizations(
            OrganizationQuery::default()
                .search(token.to_uppercase())
                .status(OrganizationStatus::Suspended),
        )
        .await
        .unwrap();
    assert_eq!(suspended.total, 1);
    assert_eq!(suspended.items[0].name, format!("{token} three"));

    // `%` and `_` match literally.
    let literal = backend
        .list_organizations(OrganizationQuery::default().search(format!("{token}%")))
        .await
        .unwrap();
    assert_eq!(literal.total, 0);
}

#[tokio::test]
async fn settings_upsert_keeps_unspecified_fields() {
    let Some(backend) = test_backend().await else { return };
    let admin = seed_profile(&backend, true).await;
    let key = format!("limits.{}", uuid::Uuid::new_v4().simple());
    let fresh = format!("banner.{}", uuid::Uuid::new_v4().simple());

    backend
        .upsert_setting(SettingUpsert {
            key: key.clone(),
            value: "5".into(),
            category: Some("billing".into()),
            is_public: Some(true),
            updated_by: admin,
        })
        .await
        .unwrap();
    backend
        .upsert_setting(SettingUpsert {
            key: key.clone(),
            value: r#"{"seats":6}"#.into(),
            category: None,
            is_public: None,
            updated_by: admin,
        })
        .await
        .unwrap();
    backend
        .upsert_setting(SettingUpsert {
            key: fresh.clone(),
            value: "\"hello\"".into(),
            category: None,
            is_public: None,
            updated_by: admin,
        })
        .await
        .unwrap();

    let settings = backend.fetch_settings().await.unwrap();
    let stored = settings.iter().find(|s| s.key == key).unwrap();
    assert_eq!(stored.value, r#"{"seats":6}"#);
    assert_eq!(stored.category, "billing");
    assert!(stored.is_public);
    assert_eq!(stored.updated_by, Some(admin));

    let defaulted = settings.iter().find(|s| s.key == fresh).unwrap();
    assert_eq!(defaulted.category, "general");
    assert!(!defaulted.is_public);
}

#[tokio::test]
async fn audit_records_page_newest_first_with_stamped_email() {
    let Some(backend) = test_backend().await else { return };
    let actor = seed_profile(&backend, true).await;
    let email = format!("{}@example.com", actor.as_uuid());

    for severity in [
        AuditSeverity::Info,
        AuditSeverity::Medium,
        AuditSeverity::High,
        AuditSeverity::Info,
        AuditSeverity::Critical,
    ] {
        let record = NewAuditRecord::builder(actor, AuditAction::UpdateSystemSetting, AuditTargetType::Setting)
            .actor_email(email.clone())
            .target_id("limits")
            .severity(severity)
            .build();
        backend.log_super_admin_action(record).await.unwrap();
    }

    sqlx::query("UPDATE profiles SET email = $2 WHERE id = $1")
        .bind(actor.as_uuid())
        .bind(format!("renamed-{}@example.com", actor.as_uuid()))
        .execute(backend.pool())
        .await
        .unwrap();

    let first = backend
        .list_audit_records(AuditQuery::default().actor(actor).page(0, 2))
        .await
        .unwrap();
    assert_eq!(first.total, 5);
    assert_eq!(first.items.len(), 2);
    assert!(first.has_more());
    assert!(first.items[0].created_at >= first.items[1].created_at);
    assert!(first
        .items
        .iter()
        .all(|r| r.actor_email.as_deref() == Some(email.as_str())));

    let last = backend
        .list_audit_records(AuditQuery::default().actor(actor).page(4, 2))
        .await
        .unwrap();
    assert_eq!(last.items.len(), 1);
    assert!(!last.has_more());

    let serious = backend
        .list_audit_records(AuditQuery::default().actor(actor).min_severity(AuditSeverity::High))
        .await
        .unwrap();
    assert_eq!(serious.total, 2);

    let targeted = backend
        .list_audit_records(AuditQuery::default().actor(actor).target(AuditTargetType::Setting, "limits"))
        .await
        .unwrap();
    assert_eq!(targeted.total, 5);
}
