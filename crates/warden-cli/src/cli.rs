//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use warden_audit_types::AuditSeverity;
use warden_backend::OrganizationStatus;
use warden_common_core::{ActorId, OrganizationId, RoleAssignmentId, RoleId};

/// Warden - super-admin control plane
#[derive(Debug, Parser)]
#[command(
    name = "warden",
    author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory holding `.warden/config.yaml`
    #[arg(
        short = 'C',
        long,
        global = true,
        env = "WARDEN_CONFIG_DIR",
        value_hint = ValueHint::DirPath
    )]
    pub config_dir: Option<PathBuf>,

    /// Actor to act as
    #[arg(long = "as", global = true, env = "WARDEN_ACTOR", value_name = "ACTOR_ID")]
    pub actor: Option<ActorId>,

    /// Email stamped on audit records; defaults to the actor's profile email
    #[arg(long, global = true, env = "WARDEN_ACTOR_EMAIL")]
    pub actor_email: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "text", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply schema migrations
    Migrate,

    /// Check database connectivity
    Health {
        /// Timeout in milliseconds
        #[arg(long, default_value_t = 2000)]
        timeout_ms: u64,
    },

    /// Show platform counters
    Metrics,

    /// Organization lifecycle
    #[command(subcommand)]
    Orgs(OrgsCommand),

    /// Audit log
    #[command(subcommand)]
    Audit(AuditCommand),

    /// System settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Roles and assignments
    #[command(subcommand)]
    Roles(RolesCommand),

    /// Check a permission for the acting actor
    Can {
        action: String,
        /// Resource category
        #[arg(long)]
        resource: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
    /// Page size; 0 uses the configured default
    #[arg(long, default_value_t = 0)]
    pub limit: u32,
}

#[derive(Debug, Subcommand)]
pub enum OrgsCommand {
    /// List organizations
    List {
        /// Substring match on name or slug
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<OrganizationStatus>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one organization
    Show { id: OrganizationId },
    /// Suspend an organization
    Suspend {
        id: OrganizationId,
        #[arg(long)]
        reason: String,
    },
    /// Reactivate a suspended organization
    Reactivate { id: OrganizationId },
}

#[derive(Debug, Subcommand)]
pub enum AuditCommand {
    /// List audit records, newest first
    List {
        /// Only records by this actor
        #[arg(long)]
        actor: Option<ActorId>,
        #[arg(long)]
        min_severity: Option<AuditSeverity>,
        /// RFC 3339 lower bound
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// All settings
    List,
    /// Public settings only
    Public,
    /// Create or overwrite a setting
    Set {
        key: String,
        /// JSON value; non-JSON input is stored as a string
        #[arg(value_parser = parse_json_value)]
        value: serde_json::Value,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        public: Option<bool>,
    },
}

#[derive(Debug, Subcommand)]
pub enum RolesCommand {
    /// All roles
    List,
    /// An actor's unexpired assignments
    Assignments { actor: ActorId },
    /// Assign a role to an actor
    Assign {
        actor: ActorId,
        role: RoleId,
        /// RFC 3339 expiry
        #[arg(long)]
        expires_at: Option<DateTime<Utc>>,
    },
    /// Remove a role assignment
    Revoke { assignment: RoleAssignmentId },
}

fn parse_json_value(raw: &str) -> Result<serde_json::Value, std::convert::Infallible> {
    Ok(serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_suspend() {
        let org = OrganizationId::new();
        let actor = ActorId::new();
        let cli = Cli::try_parse_from([
            "warden",
            "--as",
            &actor.to_string(),
            "orgs",
            "suspend",
            &org.to_string(),
            "--reason",
            "fraud",
        ])
        .unwrap();

        assert_eq!(cli.actor, Some(actor));
        match cli.command {
            Command::Orgs(OrgsCommand::Suspend { id, reason }) => {
                assert_eq!(id, org);
                assert_eq!(reason, "fraud");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_settings_value_falls_back_to_string() {
        let cli = Cli::try_parse_from(["warden", "settings", "set", "banner", "hello world"]).unwrap();
        match cli.command {
            Command::Settings(SettingsCommand::Set { value, .. }) => {
                assert_eq!(value, serde_json::json!("hello world"));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["warden", "settings", "set", "limits", r#"{"seats":5}"#]).unwrap();
        match cli.command {
            Command::Settings(SettingsCommand::Set { value, .. }) => {
                assert_eq!(value["seats"], 5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_ids_and_status() {
        assert!(Cli::try_parse_from(["warden", "orgs", "show", "not-an-id"]).is_err());
        assert!(Cli::try_parse_from(["warden", "orgs", "list", "--status", "archived"]).is_err());
        assert!(Cli::try_parse_from(["warden", "orgs", "list", "--status", "pending_setup"]).is_ok());
    }
}
