use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";
pub const DEFAULT_AI_RATE_LIMIT_PER_MINUTE: u32 = 10;
pub const DEFAULT_CODE_RUNNER_TIMEOUT_SECONDS: u64 = 15;
pub const DEFAULT_SESSION_IDLE_TIMEOUT_SECONDS: u64 = 600;
pub const DEFAULT_LINK_EARLY_GRACE_SECONDS: i64 = 900;
pub const DEFAULT_LINK_LATE_GRACE_SECONDS: i64 = 7200;

/// Top-level service configuration: `interview.toml` plus flat environment
/// overrides. Env var names are deliberately flat (not `INTERVIEW_`-prefixed
/// throughout) because the spec names them individually — see §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HMAC secret for the token service (C1). Required in production.
    #[serde(default)]
    pub interview_link_secret: String,
    /// Civil-time zone for Slot ↔ Interview conversions.
    #[serde(default = "default_timezone")]
    pub interview_timezone: String,
    /// Public URL prefix used in outbound candidate links.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_rate_limit")]
    pub ai_rate_limit_per_minute: u32,
    /// If true, operations that would use fallbacks instead return ERROR.
    #[serde(default)]
    pub ai_quota_hard_fail: bool,
    #[serde(default = "default_code_runner_timeout")]
    pub code_runner_timeout_seconds: u64,
    #[serde(default = "default_session_idle_timeout")]
    pub session_idle_timeout_seconds: u64,
    #[serde(default = "default_link_early_grace")]
    pub link_early_grace_seconds: i64,
    #[serde(default = "default_link_late_grace")]
    pub link_late_grace_seconds: i64,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// HTTP bind address for the `ai-interview-admin` server mode. Not named by
/// the external interface contract, which only fixes the route shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Opaque notification-sink credentials. The core never inspects these
/// beyond passing them to whichever `NotificationSink` implementation is
/// wired up at startup — SMTP configuration is an external collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interview_link_secret: String::new(),
            interview_timezone: default_timezone(),
            base_url: String::new(),
            ai_rate_limit_per_minute: default_rate_limit(),
            ai_quota_hard_fail: false,
            code_runner_timeout_seconds: default_code_runner_timeout(),
            session_idle_timeout_seconds: default_session_idle_timeout(),
            link_early_grace_seconds: default_link_early_grace(),
            link_late_grace_seconds: default_link_late_grace(),
            database: DatabaseConfig::default(),
            notification: NotificationConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}
fn default_rate_limit() -> u32 {
    DEFAULT_AI_RATE_LIMIT_PER_MINUTE
}
fn default_code_runner_timeout() -> u64 {
    DEFAULT_CODE_RUNNER_TIMEOUT_SECONDS
}
fn default_session_idle_timeout() -> u64 {
    DEFAULT_SESSION_IDLE_TIMEOUT_SECONDS
}
fn default_link_early_grace() -> i64 {
    DEFAULT_LINK_EARLY_GRACE_SECONDS
}
fn default_link_late_grace() -> i64 {
    DEFAULT_LINK_LATE_GRACE_SECONDS
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.ai-interview/interview.db")
}

impl Config {
    /// Load config from a TOML file, overridden by flat environment variables.
    ///
    /// Checks in order: explicit path argument, then `~/.ai-interview/interview.toml`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: Config = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::raw())
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        config.validate_deployment()?;
        Ok(config)
    }

    /// Refuse to publish candidate links pointed at localhost outside
    /// development, per §6: "the service must log a warning and refuse to
    /// include a link in outbound email."
    pub fn validate_deployment(&self) -> crate::error::Result<()> {
        if self.base_url.is_empty() {
            tracing::warn!("base_url is not configured; outbound links will be omitted");
        } else if (self.base_url.contains("localhost") || self.base_url.contains("127.0.0.1"))
            && std::env::var("AI_INTERVIEW_ENV").as_deref() != Ok("development")
        {
            tracing::warn!(
                base_url = %self.base_url,
                "base_url points at localhost outside a development deployment"
            );
        }
        Ok(())
    }

    pub fn link_url_is_publishable(&self) -> bool {
        if self.base_url.is_empty() {
            return false;
        }
        let is_localhost = self.base_url.contains("localhost") || self.base_url.contains("127.0.0.1");
        !is_localhost || std::env::var("AI_INTERVIEW_ENV").as_deref() == Ok("development")
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.ai-interview/interview.toml")
}
