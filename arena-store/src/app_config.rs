use arena_catalog::{CatalogError, CategoryDefinition, InventoryCatalog, LiveEvent};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    pub payment: PaymentConfig,
    pub mail: MailConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// CORS origin of the storefront page; `None` allows any.
    #[serde(default)]
    pub allowed_origin: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    /// Empty selects the mock provider.
    #[serde(default)]
    pub stripe_secret_key: String,
    pub webhook_secret: String,
    #[serde(default = "default_tolerance")]
    pub signature_tolerance_secs: i64,
    pub success_url: String,
    pub cancel_url: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// Unset selects the console notifier.
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub events: Vec<LiveEvent>,
    pub suites: Vec<CategoryDefinition>,
    #[serde(default)]
    pub tables: Vec<CategoryDefinition>,
}

impl CatalogConfig {
    pub fn build(&self) -> Result<InventoryCatalog, CatalogError> {
        InventoryCatalog::new(&self.suites, &self.tables, self.events.clone())
    }
}

fn default_max_connections() -> u32 { 5 }
fn default_rate_limit() -> i64 { 100 }
fn default_tolerance() -> i64 { arena_core::signature::DEFAULT_TOLERANCE_SECS }
fn default_api_base() -> String { "https://api.stripe.com".to_string() }
fn default_smtp_port() -> u16 { 587 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `ARENA__PAYMENT__WEBHOOK_SECRET=whsec_...`
            .add_source(config::Environment::with_prefix("ARENA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
