mod common;

use common::Harness;
use serde_json::json;
use warden_admin::{AdminContext, AdminError, AuditEntry, SessionUser};
use warden_audit_types::{AuditAction, AuditSeverity, AuditTargetType};
use warden_backend::{
    AuditQuery, Organization, OrganizationQuery, OrganizationStatus, Profile, Role,
};

#[tokio::test]
async fn log_action_round_trips_through_audit_read() {
    let h = Harness::new().await;
    let ctx = h.admin_ctx();

    let id = h
        .service
        .log_action(
            &ctx,
            AuditEntry::new(AuditAction::custom("exported_report"), AuditTargetType::System)
                .target("monthly")
                .details(json!({ "rows": 120 })),
        )
        .await
        .unwrap()
        .expect("audit write succeeds");

    let page = h.service.list_audit_records(&ctx, AuditQuery::default()).await.unwrap();
    assert_eq!(page.total, 1);
    let record = &page.items[0];
    assert_eq!(record.id, id);
    assert_eq!(record.actor_id, h.admin);
    assert_eq!(record.actor_email.as_deref(), Some("root@example.com"));
    assert_eq!(record.action.as_str(), "exported_report");
    assert_eq!(record.target_type, AuditTargetType::System);
    assert_eq!(record.target_id.as_deref(), Some("monthly"));
    assert_eq!(record.details["rows"], 120);
    assert_eq!(record.severity, AuditSeverity::Info);
    assert_eq!(record.ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(record.user_agent.as_deref(), Some("warden-tests"));
}

#[tokio::test]
async fn audit_email_comes_from_session_and_survives_profile_changes() {
    let h = Harness::new().await;
    let ctx = AdminContext::authenticated(SessionUser::new(h.admin, "session@corp.example"));

    h.service
        .log_action(&ctx, AuditEntry::new(AuditAction::custom("rotated_keys"), AuditTargetType::System))
        .await
        .unwrap()
        .expect("audit write succeeds");

    h.backend
        .insert_profile(Profile::new(h.admin, "renamed@example.com").super_admin())
        .await;

    let page = h.service.list_audit_records(&ctx, AuditQuery::default()).await.unwrap();
    assert_eq!(page.items[0].actor_email.as_deref(), Some("session@corp.example"));
}

#[tokio::test]
async fn audit_email_falls_back_to_profile() {
    let h = Harness::new().await;
    let ctx = AdminContext::authenticated(SessionUser::new(h.admin, ""));

    h.service
        .log_action(&ctx, AuditEntry::new(AuditAction::custom("rotated_keys"), AuditTargetType::System))
        .await
        .unwrap()
        .expect("audit write succeeds");

    let records = h.backend.audit_records().await;
    assert_eq!(records[0].actor_email.as_deref(), Some("root@example.com"));
}

#[tokio::test]
async fn log_action_requires_super_admin() {
    let h = Harness::new().await;
    let entry = AuditEntry::new(AuditAction::custom("heartbeat"), AuditTargetType::System);

    let err = h.service.log_action(&h.user_ctx(), entry.clone()).await.unwrap_err();
    assert!(matches!(err, AdminError::Diverted { .. }));
    let err = h.service.log_action(&AdminContext::anonymous(), entry).await.unwrap_err();
    assert!(matches!(err, AdminError::NotAuthenticated));

    assert!(h.backend.audit_records().await.is_empty());
}

#[tokio::test]
async fn suspend_writes_exactly_one_audit_record() {
    let h = Harness::new().await;
    let org = Organization::new("Acme", "acme");
    let org_id = org.id;
    h.backend.insert_organization(org).await;

    let ok = h
        .service
        .suspend_organization(&h.admin_ctx(), org_id, "chargeback fraud")
        .await
        .unwrap();
    assert!(ok);

    let stored = h.service.get_organization(&h.admin_ctx(), org_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrganizationStatus::Suspended);
    assert_eq!(stored.suspended_by, Some(h.admin));

    let records = h.backend.audit_records().await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.action, AuditAction::SuspendOrganization);
    assert_eq!(record.target_type, AuditTargetType::Organization);
    assert_eq!(record.target_organization(), Some(org_id));
    assert_eq!(record.details["reason"], "chargeback fraud");
    assert_eq!(record.severity, AuditSeverity::High);
}

#[tokio::test]
async fn rejected_transition_returns_false_without_audit() {
    let h = Harness::new().await;
    let org = Organization::new("Acme", "acme").with_status(OrganizationStatus::Cancelled);
    let org_id = org.id;
    h.backend.insert_organization(org).await;
    let ctx = h.admin_ctx();

    assert!(!h.service.suspend_organization(&ctx, org_id, "late").await.unwrap());
    assert!(!h.service.reactivate_organization(&ctx, org_id).await.unwrap());
    assert!(h.backend.audit_records().await.is_empty());
}

#[tokio::test]
async fn reactivate_after_suspend() {
    let h = Harness::new().await;
    let org = Organization::new("Acme", "acme");
    let org_id = org.id;
    h.backend.insert_organization(org).await;
    let ctx = h.admin_ctx();

    assert!(h.service.suspend_organization(&ctx, org_id, "review").await.unwrap());
    assert!(h.service.reactivate_organization(&ctx, org_id).await.unwrap());

    let stored = h.service.get_organization(&ctx, org_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrganizationStatus::Active);
    assert!(stored.suspended_reason.is_none());

    let page = h
        .service
        .list_audit_records(
            &ctx,
            AuditQuery::default().action(AuditAction::ReactivateOrganization),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].severity, AuditSeverity::Medium);
    assert_eq!(page.items[0].details, json!({}));
}

#[tokio::test]
async fn unprivileged_callers_cannot_mutate() {
    let h = Harness::new().await;
    let org = Organization::new("Acme", "acme");
    let org_id = org.id;
    h.backend.insert_organization(org).await;

    for ctx in [h.user_ctx(), AdminContext::anonymous()] {
        let err = h.service.suspend_organization(&ctx, org_id, "nope").await.unwrap_err();
        assert!(err.is_access_denied());
        let err = h
            .service
            .update_system_setting(&ctx, "k", &json!(1), None, None)
            .await
            .unwrap_err();
        assert!(err.is_access_denied());
        assert!(h.service.list_roles(&ctx).await.is_err());
        assert!(h.service.platform_metrics(&ctx).await.is_err());
    }

    let stored = h.service.get_organization(&h.admin_ctx(), org_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrganizationStatus::Active);
    assert!(h.service.get_system_settings(&h.admin_ctx()).await.unwrap().is_empty());
    assert!(h.backend.audit_records().await.is_empty());
}

#[tokio::test]
async fn list_organizations_clamps_page_size() {
    let mut config = warden_common_config::WardenConfig::default();
    config.organizations.default_page_size = 2;
    config.organizations.max_page_size = 3;
    let h = Harness::with_config(config).await;
    for i in 0..5 {
        h.backend
            .insert_organization(Organization::new(format!("Org {i}"), format!("org-{i}")))
            .await;
    }
    let ctx = h.admin_ctx();

    let default_page = h
        .service
        .list_organizations(&ctx, OrganizationQuery::default())
        .await
        .unwrap();
    assert_eq!(default_page.items.len(), 2);
    assert_eq!(default_page.total, 5);

    let capped = h
        .service
        .list_organizations(&ctx, OrganizationQuery::default().page(0, 50))
        .await
        .unwrap();
    assert_eq!(capped.limit, 3);
    assert_eq!(capped.items.len(), 3);
}

#[tokio::test]
async fn settings_update_is_audited_and_decoded() {
    let h = Harness::new().await;
    let ctx = h.admin_ctx();
    let value = json!({ "enabled": true, "regions": ["eu", "us"] });

    assert!(h
        .service
        .update_system_setting(&ctx, "feature.sso", &value, Some("auth"), Some(false))
        .await
        .unwrap());
    assert!(h
        .service
        .update_system_setting(&ctx, "banner", &json!("Scheduled maintenance"), None, Some(true))
        .await
        .unwrap());

    let all = h.service.get_system_settings(&ctx).await.unwrap();
    assert_eq!(all["feature.sso"], value);
    assert_eq!(all["banner"], json!("Scheduled maintenance"));

    let public = h.service.get_public_settings().await.unwrap();
    assert_eq!(public.len(), 1);
    assert!(public.contains_key("banner"));

    let page = h
        .service
        .list_audit_records(&ctx, AuditQuery::default().target(AuditTargetType::Setting, "feature.sso"))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].action, AuditAction::UpdateSystemSetting);
    assert_eq!(page.items[0].details, json!({ "key": "feature.sso", "value": value }));
}

#[tokio::test]
async fn assign_and_revoke_role_are_audited() {
    let h = Harness::new().await;
    let role = Role::new("support").with_permission("organizations", "read");
    h.backend.insert_role(role.clone()).await;
    let ctx = h.admin_ctx();

    let assignment_id = h
        .service
        .assign_role(&ctx, h.user, role.id, None)
        .await
        .unwrap()
        .expect("assignment created");
    assert!(h.service.has_permission(&h.user_ctx(), "read", Some("organizations")).await.granted);

    // Second assignment of the same role conflicts in the store.
    assert!(h.service.assign_role(&ctx, h.user, role.id, None).await.unwrap().is_none());

    let listed = h.service.list_role_assignments(&ctx, h.user).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, assignment_id);

    assert!(h.service.revoke_role(&ctx, assignment_id).await.unwrap());
    assert!(!h.service.has_permission(&h.user_ctx(), "read", Some("organizations")).await.granted);
    assert!(!h.service.revoke_role(&ctx, assignment_id).await.unwrap());

    let records = h.backend.audit_records().await;
    let actions: Vec<_> = records.iter().map(|r| r.action.clone()).collect();
    assert_eq!(actions, vec![AuditAction::AssignRole, AuditAction::RevokeRole]);
    assert!(records.iter().all(|r| r.target_user() == Some(h.user)));
    assert_eq!(records[0].details["role_name"], "support");
}

#[tokio::test]
async fn platform_metrics_counts_everything() {
    let h = Harness::new().await;
    for (slug, status) in [
        ("a", OrganizationStatus::Active),
        ("b", OrganizationStatus::Active),
        ("c", OrganizationStatus::Suspended),
        ("d", OrganizationStatus::PendingSetup),
        ("e", OrganizationStatus::Cancelled),
    ] {
        h.backend
            .insert_organization(Organization::new(slug.to_uppercase(), slug).with_status(status))
            .await;
    }
    let ctx = h.admin_ctx();
    h.service
        .log_action(&ctx, AuditEntry::new(AuditAction::custom("heartbeat"), AuditTargetType::System))
        .await
        .unwrap();

    let metrics = h.service.platform_metrics(&ctx).await.unwrap().unwrap();
    assert_eq!(metrics.total_organizations, 5);
    assert_eq!(metrics.active_organizations, 2);
    assert_eq!(metrics.suspended_organizations, 1);
    assert_eq!(metrics.pending_setup_organizations, 1);
    assert_eq!(metrics.total_users, 2);
    assert_eq!(metrics.super_admins, 1);
    assert_eq!(metrics.recent_audit_records, 1);
    assert_eq!(metrics.recent_window_hours, 24);
}
