//! System settings.

use crate::audit::AuditEntry;
use crate::context::AdminContext;
use crate::error::AdminResult;
use crate::service::AdminService;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};
use warden_audit_types::{AuditAction, AuditSeverity, AuditTargetType};
use warden_backend::{SettingUpsert, SystemSetting};

/// Decode a stored value, keeping the raw text when it is not valid JSON.
pub fn decode_setting_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn into_map<'a>(settings: impl IntoIterator<Item = &'a SystemSetting>) -> BTreeMap<String, Value> {
    settings
        .into_iter()
        .map(|setting| (setting.key.clone(), decode_setting_value(&setting.value)))
        .collect()
}

impl AdminService {
    /// Insert or overwrite a setting. `None` for `category` or `is_public`
    /// keeps the stored value.
    #[instrument(skip(self, ctx, value))]
    pub async fn update_system_setting(
        &self,
        ctx: &AdminContext,
        key: &str,
        value: &Value,
        category: Option<&str>,
        is_public: Option<bool>,
    ) -> AdminResult<bool> {
        let actor = self.access.require_super_admin(ctx).await?;

        let upsert = SettingUpsert {
            key: key.to_string(),
            value: value.to_string(),
            category: category.map(str::to_string),
            is_public,
            updated_by: actor.id,
        };

        if let Err(e) = self.backend.upsert_setting(upsert).await {
            warn!(key, error = %e, "Failed to update system setting");
            return Ok(false);
        }

        info!(key, actor_id = %actor.id, "System setting updated");

        let entry = AuditEntry::new(AuditAction::UpdateSystemSetting, AuditTargetType::Setting)
            .target(key)
            .details(json!({ "key": key, "value": value }))
            .severity(AuditSeverity::Medium);
        self.audit.record(&actor, ctx, entry).await;

        Ok(true)
    }

    /// Every setting, decoded. Super admins only.
    pub async fn get_system_settings(&self, ctx: &AdminContext) -> AdminResult<BTreeMap<String, Value>> {
        self.access.require_super_admin(ctx).await?;
        let settings = self.backend.fetch_settings().await?;
        Ok(into_map(&settings))
    }

    /// Settings flagged public. Needs no session.
    pub async fn get_public_settings(&self) -> AdminResult<BTreeMap<String, Value>> {
        let settings = self.backend.fetch_settings().await?;
        Ok(into_map(settings.iter().filter(|s| s.is_public)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_falls_back_to_raw_text() {
        assert_eq!(decode_setting_value("{\"a\":[1,2]}"), json!({ "a": [1, 2] }));
        assert_eq!(decode_setting_value("42"), json!(42));
        assert_eq!(decode_setting_value("not json"), json!("not json"));
        assert_eq!(decode_setting_value(""), json!(""));
    }
}
