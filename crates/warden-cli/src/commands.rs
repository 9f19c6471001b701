//! Command execution.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::info;
use warden_admin::{AdminContext, AdminService, SessionUser};
use warden_audit_types::ClientMetadata;
use warden_backend::{AuditQuery, OrganizationQuery, PgBackend};
use warden_common_config::WardenConfig;

use crate::cli::{AuditCommand, Cli, Command, OrgsCommand, RolesCommand, SettingsCommand};
use crate::error::CliError;
use crate::output::{audit_line, organization_line, page_text, render};

impl Cli {
    /// Context for the acting actor, or an error if none was given.
    fn context(&self) -> Result<AdminContext, CliError> {
        let actor = self.actor.ok_or(CliError::NoActor)?;
        // An empty email makes the audit recorder fall back to the profile's.
        let email = self.actor_email.clone().unwrap_or_default();
        Ok(
            AdminContext::authenticated(SessionUser::new(actor, email))
                .with_client(
                    ClientMetadata::default()
                        .with_user_agent(concat!("warden-cli/", env!("CARGO_PKG_VERSION"))),
                ),
        )
    }

    /// Run the command and return what to print.
    pub async fn execute(self, config: WardenConfig) -> Result<String, CliError> {
        let backend = Arc::new(PgBackend::connect(&config.database).await?);
        let result = self.dispatch(&backend, config).await;
        backend.close().await;
        result
    }

    async fn dispatch(&self, backend: &Arc<PgBackend>, config: WardenConfig) -> Result<String, CliError> {
        let service = AdminService::new(backend.clone(), config);
        let ctx = || self.context();
        let format = self.format;

        match &self.command {
            Command::Migrate => {
                backend.migrate().await?;
                Ok("migrations applied".to_string())
            }

            Command::Health { timeout_ms } => {
                let latency = backend.health_check(Duration::from_millis(*timeout_ms)).await?;
                let stats = backend.stats();
                let report = json!({
                    "healthy": true,
                    "latency_ms": latency.as_millis() as u64,
                    "pool_size": stats.size,
                    "pool_idle": stats.idle,
                    "pool_active": stats.active,
                });
                render(format, &report, |_| {
                    format!(
                        "ok ({} ms, pool {}/{} active)",
                        latency.as_millis(),
                        stats.active,
                        stats.size
                    )
                })
            }

            Command::Metrics => match service.platform_metrics(&ctx()?).await? {
                Some(metrics) => render(format, &metrics, |m| {
                    format!(
                        "organizations: {} ({} active, {} suspended, {} pending setup)\n\
                         users: {} ({} super admins)\n\
                         audit records in last {}h: {}",
                        m.total_organizations,
                        m.active_organizations,
                        m.suspended_organizations,
                        m.pending_setup_organizations,
                        m.total_users,
                        m.super_admins,
                        m.recent_window_hours,
                        m.recent_audit_records,
                    )
                }),
                None => Err(CliError::Rejected("metrics collection")),
            },

            Command::Can { action, resource } => {
                let decision = service.has_permission(&ctx()?, action, resource.as_deref()).await;
                let report = json!({ "granted": decision.granted, "basis": format!("{:?}", decision.basis) });
                render(format, &report, |_| {
                    format!(
                        "{} ({:?})",
                        if decision.granted { "granted" } else { "denied" },
                        decision.basis
                    )
                })
            }

            Command::Orgs(cmd) => match cmd {
                OrgsCommand::List { search, status, page } => {
                    let mut query = OrganizationQuery::default().page(page.offset, page.limit);
                    query.search = search.clone();
                    query.status = *status;
                    let orgs = service.list_organizations(&ctx()?, query).await?;
                    render(format, &orgs, |p| page_text(p, organization_line))
                }
                OrgsCommand::Show { id } => {
                    let org = service.get_organization(&ctx()?, *id).await?;
                    render(format, &org, |o| match o {
                        Some(org) => organization_line(org),
                        None => format!("{} not found", id),
                    })
                }
                OrgsCommand::Suspend { id, reason } => {
                    if !service.suspend_organization(&ctx()?, *id, reason).await? {
                        return Err(CliError::Rejected("suspend"));
                    }
                    info!(org_id = %id, "suspended");
                    Ok(format!("{} suspended", id))
                }
                OrgsCommand::Reactivate { id } => {
                    if !service.reactivate_organization(&ctx()?, *id).await? {
                        return Err(CliError::Rejected("reactivate"));
                    }
                    Ok(format!("{} reactivated", id))
                }
            },

            Command::Audit(AuditCommand::List {
                actor,
                min_severity,
                since,
                page,
            }) => {
                let mut query = AuditQuery::default()
                    .between(*since, None)
                    .page(page.offset, page.limit);
                query.actor_id = *actor;
                query.min_severity = *min_severity;
                let records = service.list_audit_records(&ctx()?, query).await?;
                render(format, &records, |p| page_text(p, audit_line))
            }

            Command::Settings(cmd) => match cmd {
                SettingsCommand::List => {
                    let settings = service.get_system_settings(&ctx()?).await?;
                    render(format, &settings, |s| settings_text(s))
                }
                SettingsCommand::Public => {
                    let settings = service.get_public_settings().await?;
                    render(format, &settings, |s| settings_text(s))
                }
                SettingsCommand::Set {
                    key,
                    value,
                    category,
                    public,
                } => {
                    if !service
                        .update_system_setting(&ctx()?, key, value, category.as_deref(), *public)
                        .await?
                    {
                        return Err(CliError::Rejected("setting update"));
                    }
                    Ok(format!("{} updated", key))
                }
            },

            Command::Roles(cmd) => match cmd {
                RolesCommand::List => {
                    let roles = service.list_roles(&ctx()?).await?;
                    render(format, &roles, |roles| {
                        roles
                            .iter()
                            .map(|r| format!("{}  {}", r.id, r.name))
                            .collect::<Vec<_>>()
                            .join("\n")
                    })
                }
                RolesCommand::Assignments { actor } => {
                    let assignments = service.list_role_assignments(&ctx()?, *actor).await?;
                    render(format, &assignments, |list| {
                        list.iter()
                            .map(|a| {
                                let expiry = a
                                    .expires_at
                                    .map(|t| t.to_rfc3339())
                                    .unwrap_or_else(|| "never".to_string());
                                format!("{}  {}  expires: {}", a.id, a.role.name, expiry)
                            })
                            .collect::<Vec<_>>()
                            .join("\n")
                    })
                }
                RolesCommand::Assign {
                    actor,
                    role,
                    expires_at,
                } => match service.assign_role(&ctx()?, *actor, *role, *expires_at).await? {
                    Some(id) => Ok(id.to_string()),
                    None => Err(CliError::Rejected("role assignment")),
                },
                RolesCommand::Revoke { assignment } => {
                    if !service.revoke_role(&ctx()?, *assignment).await? {
                        return Err(CliError::Rejected("role revocation"));
                    }
                    Ok(format!("{} revoked", assignment))
                }
            },
        }
    }
}

fn settings_text(settings: &std::collections::BTreeMap<String, serde_json::Value>) -> String {
    settings
        .iter()
        .map(|(key, value)| format!("{} = {}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}
