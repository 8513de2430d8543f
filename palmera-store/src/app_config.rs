use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub guides: GuidesConfig,
    pub supabase: Option<SupabaseConfig>,
    pub airtable: Option<AirtableConfig>,
    pub webhook: Option<WebhookConfig>,
    pub email: Option<EmailConfig>,
    pub stripe: Option<StripeConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Which `Storage` implementation the process runs against.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Supabase,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub session_secret: String,
    pub session_ttl_seconds: u64,
    pub admin_email: String,
    pub admin_password: String,
    /// Optional second credential pair for the partner (read-only) role.
    pub partner_email: Option<String>,
    pub partner_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GuidesConfig {
    pub download_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AirtableConfig {
    pub api_key: String,
    pub base_id: String,
    pub leads_table: String,
    pub bookings_table: String,
    pub guides_table: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    pub target_url: String,
    pub relay_base_url: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_name: String,
    pub from_address: String,
    pub admin_address: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_smtp_port() -> u16 {
    587
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Layer the current environment file on top (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Finally environment variables, e.g. PALMERA__SERVER__PORT=8080
            .add_source(config::Environment::with_prefix("PALMERA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
