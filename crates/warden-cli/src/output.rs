//! Output formatting.

use serde::Serialize;
use warden_audit_types::AuditRecord;
use warden_backend::{Organization, Page};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render `value` as pretty JSON, or through `text` for humans.
pub fn render<T: Serialize>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Text => text(value),
    })
}

pub fn organization_line(org: &Organization) -> String {
    let mut line = format!("{}  {:<14} {} ({})", org.id, org.status, org.name, org.slug);
    if let Some(reason) = &org.suspended_reason {
        line.push_str(&format!("  reason: {}", reason));
    }
    line
}

pub fn audit_line(record: &AuditRecord) -> String {
    format!(
        "{}  {:<8} {} {} {}{}",
        record.created_at.format("%Y-%m-%d %H:%M:%S"),
        record.severity,
        record.actor_email.as_deref().unwrap_or("-"),
        record.action,
        record.target_type,
        record
            .target_id
            .as_deref()
            .map(|id| format!(":{}", id))
            .unwrap_or_default(),
    )
}

/// Items one per line, followed by a paging footer.
pub fn page_text<T>(page: &Page<T>, line: impl Fn(&T) -> String) -> String {
    let mut out: Vec<String> = page.items.iter().map(line).collect();
    out.push(format!(
        "-- {} of {} (offset {}{})",
        page.items.len(),
        page.total,
        page.offset,
        if page.has_more() { ", more available" } else { "" }
    ));
    out.join("\n")
}
