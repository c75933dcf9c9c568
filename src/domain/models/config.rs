use serde::{Deserialize, Serialize};

/// Main configuration structure for the planner janitor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Credential acquisition settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Microsoft Graph transport settings
    #[serde(default)]
    pub graph: GraphConfig,

    /// Mailbox the summary task reports on
    #[serde(default)]
    pub mailbox: MailboxConfig,

    /// Target plan settings
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Cleanup budget and policy switches
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which credential flow is used to reach Graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Client-credential (application) flow
    #[default]
    App,
    /// Interactive device-code (delegated) flow
    Delegated,
}

/// Credential acquisition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,

    /// Azure AD tenant id
    #[serde(default)]
    pub tenant_id: String,

    /// Application (client) id
    #[serde(default)]
    pub client_id: String,

    /// Client secret, required in `app` mode
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Scope requested in `app` mode
    #[serde(default = "default_app_scope")]
    pub app_scope: String,

    /// Scopes requested in `delegated` mode
    #[serde(default = "default_delegated_scopes")]
    pub delegated_scopes: Vec<String>,

    /// Login host; the tenant id is appended to form the authority
    #[serde(default = "default_authority_host")]
    pub authority_host: String,
}

fn default_app_scope() -> String {
    "https://graph.microsoft.com/.default".to_string()
}

fn default_delegated_scopes() -> Vec<String> {
    vec![
        "User.Read".to_string(),
        "Mail.Read".to_string(),
        "Tasks.ReadWrite".to_string(),
        "Group.ReadWrite.All".to_string(),
    ]
}

fn default_authority_host() -> String {
    "https://login.microsoftonline.com".to_string()
}

impl AuthConfig {
    /// Full authority URL, e.g. `https://login.microsoftonline.com/<tenant>`
    pub fn authority(&self) -> String {
        format!(
            "{}/{}",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::default(),
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: None,
            app_scope: default_app_scope(),
            delegated_scopes: default_delegated_scopes(),
            authority_host: default_authority_host(),
        }
    }
}

/// Microsoft Graph transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GraphConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: f64,
}

fn default_base_url() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

const fn default_request_timeout_secs() -> f64 {
    30.0
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Mailbox the summary task reports on
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MailboxConfig {
    /// User principal name of the mailbox owner
    #[serde(default)]
    pub user_email: String,

    /// How many recent messages the summary lists
    #[serde(default = "default_recent_count")]
    pub recent_count: usize,
}

const fn default_recent_count() -> usize {
    5
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            user_email: String::new(),
            recent_count: default_recent_count(),
        }
    }
}

/// Target plan settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PlannerConfig {
    /// Title of the plan that receives summary tasks
    #[serde(default)]
    pub plan_title: String,

    /// Display name of the group a missing plan is created under.
    /// When unset the first group found is used.
    #[serde(default)]
    pub plan_group: Option<String>,

    /// Prefix of summary task titles; defaults to the plan title
    #[serde(default)]
    pub task_title_prefix: Option<String>,

    /// Name of the bucket created when the plan has none
    #[serde(default = "default_bucket_name")]
    pub default_bucket_name: String,
}

fn default_bucket_name() -> String {
    "To do".to_string()
}

impl PlannerConfig {
    pub fn title_prefix(&self) -> &str {
        self.task_title_prefix
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.plan_title)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            plan_title: String::new(),
            plan_group: None,
            task_title_prefix: None,
            default_bucket_name: default_bucket_name(),
        }
    }
}

/// Cleanup budget and policy switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CleanupConfig {
    /// Maximum deletions in a single pass
    #[serde(default = "default_max_delete_per_run")]
    pub max_delete_per_run: usize,

    /// Wall-clock budget per pass in seconds; zero or negative disables the
    /// age-based pass and removes the limit from the duplicate pass
    #[serde(default = "default_time_budget_seconds")]
    pub time_budget_seconds: f64,

    /// Run the age-based pass as part of the keepalive cycle
    #[serde(default)]
    pub enable_old_cleanup: bool,
}

const fn default_max_delete_per_run() -> usize {
    500
}

const fn default_time_budget_seconds() -> f64 {
    120.0
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            max_delete_per_run: default_max_delete_per_run(),
            time_budget_seconds: default_time_budget_seconds(),
            enable_old_cleanup: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling JSON log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_log_rotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authority_joins_host_and_tenant() {
        let auth = AuthConfig {
            tenant_id: "contoso".to_string(),
            authority_host: "https://login.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(auth.authority(), "https://login.example.com/contoso");
    }

    #[test]
    fn test_title_prefix_falls_back_to_plan_title() {
        let mut planner = PlannerConfig {
            plan_title: "Mailbox check".to_string(),
            ..Default::default()
        };
        assert_eq!(planner.title_prefix(), "Mailbox check");

        planner.task_title_prefix = Some(String::new());
        assert_eq!(planner.title_prefix(), "Mailbox check");

        planner.task_title_prefix = Some("KA".to_string());
        assert_eq!(planner.title_prefix(), "KA");
    }

    #[test]
    fn test_auth_mode_parses_lowercase() {
        let mode: AuthMode = serde_yaml::from_str("delegated").unwrap();
        assert_eq!(mode, AuthMode::Delegated);
    }
}
