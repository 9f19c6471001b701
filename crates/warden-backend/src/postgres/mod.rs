//! Postgres store.

mod rows;

use crate::backend::AdminBackend;
use crate::error::{BackendError, BackendResult};
use crate::model::{
    NewRoleAssignment, Organization, OrganizationStatus, Profile, Role, RoleAssignment,
    SettingUpsert, SystemSetting,
};
use crate::query::{
    resolve_limit, AssignmentFilter, AuditQuery, OrganizationQuery, OrganizationSort, Page,
    SortDirection,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rows::{AssignmentRow, AuditRow, OrganizationRow, ProfileRow, RoleRow, SettingRow};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use warden_audit_types::{AuditRecord, AuditSeverity, NewAuditRecord};
use warden_common_config::DatabaseConfig;
use warden_common_core::{ActorId, AuditRecordId, OrganizationId, RoleAssignmentId};

const ASSIGNMENT_COLUMNS: &str = "a.id, a.actor_id, a.expires_at, a.assigned_at, a.assigned_by, \
     r.id AS role_id, r.name AS role_name, r.description AS role_description, \
     r.permissions AS role_permissions";

const ORGANIZATION_COLUMNS: &str = "id, name, slug, status, plan, subscription_status, seat_count, \
     created_at, suspended_at, suspended_reason, suspended_by";

const AUDIT_COLUMNS: &str = "l.id, l.actor_id, l.actor_email, l.action, l.target_type, \
     l.target_id, l.details, l.severity, l.ip_address, l.user_agent, l.created_at";

// SQLSTATE codes raised by the schema and its procedures.
const NO_DATA_FOUND: &str = "P0002";
const NOT_IN_PREREQUISITE_STATE: &str = "55000";
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Pool statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
    pub active: u32,
}

/// [`AdminBackend`] over a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    /// Open a pool and verify it with a round trip.
    pub async fn connect(config: &DatabaseConfig) -> BackendResult<Self> {
        if config.url.is_empty() {
            return Err(BackendError::Unavailable(
                "database url is not configured".to_string(),
            ));
        }

        info!("Creating database connection pool...");

        let options = PgConnectOptions::from_str(&config.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(Some(config.idle_timeout()))
            .max_lifetime(Some(config.max_lifetime()))
            .connect_with(options)
            .await?;

        sqlx::query("SELECT 1").fetch_one(&pool).await?;

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Database pool created"
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> BackendResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Round trip bounded by `timeout`. Returns the observed latency.
    pub async fn health_check(&self, timeout: Duration) -> BackendResult<Duration> {
        let start = Instant::now();

        match tokio::time::timeout(timeout, sqlx::query("SELECT 1").fetch_one(&self.pool)).await {
            Ok(Ok(_)) => {
                let latency = start.elapsed();
                debug!(latency_ms = latency.as_millis() as u64, "Database health check passed");
                Ok(latency)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Database health check failed");
                Err(e.into())
            }
            Err(_) => {
                warn!("Database health check timed out");
                Err(BackendError::Unavailable("connection timeout".to_string()))
            }
        }
    }

    pub fn stats(&self) -> PoolStats {
        let size = self.pool.size();
        let idle = self.pool.num_idle();
        PoolStats {
            size,
            idle,
            active: size.saturating_sub(idle as u32),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Translate the schema's SQLSTATE codes into typed errors.
fn classify(err: sqlx::Error, entity: &'static str, id: impl ToString) -> BackendError {
    let code = match &err {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    };

    match code.as_deref() {
        Some(NO_DATA_FOUND) | Some(FOREIGN_KEY_VIOLATION) => BackendError::not_found(entity, id),
        Some(NOT_IN_PREREQUISITE_STATE) => match err {
            sqlx::Error::Database(db) => BackendError::InvalidState(db.message().to_string()),
            other => BackendError::Database(other),
        },
        Some(UNIQUE_VIOLATION) => BackendError::Conflict(format!("{} {} already exists", entity, id.to_string())),
        _ => BackendError::Database(err),
    }
}

/// The row a failed assignment insert pointed at, named by the violated
/// foreign key.
fn missing_assignment_reference(constraint: Option<&str>, assignment: &NewRoleAssignment) -> BackendError {
    match constraint {
        Some("role_assignments_role_fk") => BackendError::not_found("role", assignment.role_id),
        Some("role_assignments_assigned_by_fk") => {
            BackendError::not_found("profile", assignment.assigned_by)
        }
        _ => BackendError::not_found("profile", assignment.actor_id),
    }
}

/// Escape `LIKE` metacharacters and wrap for substring matching.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_organization_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &OrganizationQuery) {
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(term) = query.search.as_deref().filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR slug ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_audit_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &AuditQuery) {
    if let Some(actor_id) = query.actor_id {
        qb.push(" AND l.actor_id = ").push_bind(actor_id.as_uuid());
    }
    if let Some(action) = &query.action {
        qb.push(" AND l.action = ").push_bind(action.as_str().to_string());
    }
    if let Some(target_type) = query.target_type {
        qb.push(" AND l.target_type = ").push_bind(target_type.to_string());
    }
    if let Some(target_id) = &query.target_id {
        qb.push(" AND l.target_id = ").push_bind(target_id.clone());
    }
    if let Some(min) = query.min_severity {
        let accepted: Vec<String> = AuditSeverity::at_least(min).map(|s| s.to_string()).collect();
        qb.push(" AND l.severity = ANY(").push_bind(accepted).push(")");
    }
    if let Some(since) = query.since {
        qb.push(" AND l.created_at >= ").push_bind(since);
    }
    if let Some(until) = query.until {
        qb.push(" AND l.created_at < ").push_bind(until);
    }
}

fn to_count(value: i64) -> u64 {
    value.max(0) as u64
}

#[async_trait]
impl AdminBackend for PgBackend {
    #[instrument(skip(self))]
    async fn fetch_profile(&self, actor_id: ActorId) -> BackendResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, email, full_name, is_super_admin, super_admin_permissions \
             FROM profiles WHERE id = $1",
        )
        .bind(actor_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Profile::from))
    }

    async fn count_users(&self) -> BackendResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;
        Ok(to_count(count))
    }

    async fn count_super_admins(&self) -> BackendResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE is_super_admin")
            .fetch_one(&self.pool)
            .await?;
        Ok(to_count(count))
    }

    async fn list_roles(&self) -> BackendResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description, permissions FROM roles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_role_assignments(
        &self,
        actor_id: ActorId,
        filter: AssignmentFilter,
    ) -> BackendResult<Vec<RoleAssignment>> {
        // A NULL cutoff leaves only non-expiring rows.
        let cutoff: Option<DateTime<Utc>> = match filter {
            AssignmentFilter::NonExpiringOnly => None,
            AssignmentFilter::ActiveAt(now) => Some(now),
        };

        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM role_assignments a \
             JOIN roles r ON r.id = a.role_id \
             WHERE a.actor_id = $1 \
               AND (a.expires_at IS NULL OR ($2::timestamptz IS NOT NULL AND a.expires_at > $2)) \
             ORDER BY a.assigned_at"
        );
        let rows = sqlx::query_as::<_, AssignmentRow>(&sql)
            .bind(actor_id.as_uuid())
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(RoleAssignment::from).collect())
    }

    #[instrument(skip(self), fields(actor_id = %assignment.actor_id, role_id = %assignment.role_id))]
    async fn insert_role_assignment(
        &self,
        assignment: NewRoleAssignment,
    ) -> BackendResult<RoleAssignment> {
        let sql = format!(
            "WITH a AS ( \
                 INSERT INTO role_assignments (id, actor_id, role_id, expires_at, assigned_by) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING * \
             ) \
             SELECT {ASSIGNMENT_COLUMNS} FROM a JOIN roles r ON r.id = a.role_id"
        );
        let row = sqlx::query_as::<_, AssignmentRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(assignment.actor_id.as_uuid())
            .bind(assignment.role_id.as_uuid())
            .bind(assignment.expires_at)
            .bind(assignment.assigned_by.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let violated_key = match &e {
                    sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
                        Some(db.constraint().map(str::to_owned))
                    }
                    _ => None,
                };
                match violated_key {
                    Some(constraint) => missing_assignment_reference(constraint.as_deref(), &assignment),
                    None => classify(e, "role assignment", assignment.role_id),
                }
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete_role_assignment(&self, id: RoleAssignmentId) -> BackendResult<RoleAssignment> {
        let sql = format!(
            "WITH a AS (DELETE FROM role_assignments WHERE id = $1 RETURNING *) \
             SELECT {ASSIGNMENT_COLUMNS} FROM a JOIN roles r ON r.id = a.role_id"
        );
        let row = sqlx::query_as::<_, AssignmentRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| BackendError::not_found("role assignment", id))?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn list_organizations(&self, query: OrganizationQuery) -> BackendResult<Page<Organization>> {
        let limit = resolve_limit(query.limit);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM organizations WHERE TRUE");
        push_organization_filters(&mut count, &query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE TRUE"
        ));
        push_organization_filters(&mut select, &query);
        select.push(match query.sort {
            OrganizationSort::CreatedAt => " ORDER BY created_at",
            OrganizationSort::Name => " ORDER BY name",
        });
        select.push(match query.direction {
            SortDirection::Asc => " ASC, id ASC",
            SortDirection::Desc => " DESC, id DESC",
        });
        select
            .push(" LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(i64::from(query.offset));

        let rows: Vec<OrganizationRow> = select.build_query_as().fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(Organization::try_from)
            .collect::<BackendResult<Vec<_>>>()?;

        Ok(Page {
            items,
            total: to_count(total),
            offset: query.offset,
            limit,
        })
    }

    async fn fetch_organization(&self, id: OrganizationId) -> BackendResult<Option<Organization>> {
        let sql = format!("SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = $1");
        let row = sqlx::query_as::<_, OrganizationRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Organization::try_from).transpose()
    }

    async fn count_organizations(&self, status: Option<OrganizationStatus>) -> BackendResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM organizations WHERE $1::text IS NULL OR status = $1",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;
        Ok(to_count(count))
    }

    #[instrument(skip(self, reason))]
    async fn suspend_organization(
        &self,
        org_id: OrganizationId,
        reason: String,
        suspended_by: ActorId,
    ) -> BackendResult<()> {
        sqlx::query("SELECT suspend_organization($1, $2, $3)")
            .bind(org_id.as_uuid())
            .bind(reason)
            .bind(suspended_by.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, "organization", org_id))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn reactivate_organization(
        &self,
        org_id: OrganizationId,
        reactivated_by: ActorId,
    ) -> BackendResult<()> {
        sqlx::query("SELECT reactivate_organization($1, $2)")
            .bind(org_id.as_uuid())
            .bind(reactivated_by.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, "organization", org_id))?;
        Ok(())
    }

    #[instrument(skip(self, record), fields(action = %record.action))]
    async fn log_super_admin_action(&self, record: NewAuditRecord) -> BackendResult<AuditRecordId> {
        let id: Uuid = sqlx::query_scalar(
            "SELECT log_super_admin_action($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(record.actor_id.as_uuid())
        .bind(record.actor_email)
        .bind(record.action.as_str().to_string())
        .bind(record.target_type.to_string())
        .bind(record.target_id)
        .bind(Json(record.details))
        .bind(record.severity.to_string())
        .bind(record.client.ip_address)
        .bind(record.client.user_agent)
        .fetch_one(&self.pool)
        .await?;

        Ok(AuditRecordId::from_uuid(id))
    }

    #[instrument(skip(self))]
    async fn list_audit_records(&self, query: AuditQuery) -> BackendResult<Page<AuditRecord>> {
        let limit = resolve_limit(query.limit);

        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM super_admin_audit_logs l WHERE TRUE");
        push_audit_filters(&mut count, &query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {AUDIT_COLUMNS} FROM super_admin_audit_logs l WHERE TRUE"
        ));
        push_audit_filters(&mut select, &query);
        select
            .push(" ORDER BY l.created_at DESC, l.id DESC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(i64::from(query.offset));

        let rows: Vec<AuditRow> = select.build_query_as().fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(AuditRecord::try_from)
            .collect::<BackendResult<Vec<_>>>()?;

        Ok(Page {
            items,
            total: to_count(total),
            offset: query.offset,
            limit,
        })
    }

    async fn count_audit_records_since(&self, since: DateTime<Utc>) -> BackendResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM super_admin_audit_logs WHERE created_at >= $1")
                .bind(since)
                .fetch_one(&self.pool)
                .await?;
        Ok(to_count(count))
    }

    #[instrument(skip(self, setting), fields(key = %setting.key))]
    async fn upsert_setting(&self, setting: SettingUpsert) -> BackendResult<()> {
        sqlx::query(
            "INSERT INTO system_settings (key, value, category, is_public, updated_by, updated_at) \
             VALUES ($1, $2, COALESCE($3, 'general'), COALESCE($4, FALSE), $5, NOW()) \
             ON CONFLICT (key) DO UPDATE SET \
                 value = EXCLUDED.value, \
                 category = COALESCE($3, system_settings.category), \
                 is_public = COALESCE($4, system_settings.is_public), \
                 updated_by = EXCLUDED.updated_by, \
                 updated_at = NOW()",
        )
        .bind(setting.key)
        .bind(setting.value)
        .bind(setting.category)
        .bind(setting.is_public)
        .bind(setting.updated_by.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_settings(&self) -> BackendResult<Vec<SystemSetting>> {
        let rows = sqlx::query_as::<_, SettingRow>(
            "SELECT key, value, category, is_public, description, updated_by, updated_at \
             FROM system_settings ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SystemSetting::from).collect())
    }
}
