use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub replicate: ReplicateConfig,
    pub training: TrainingConfig,
    pub webhook: WebhookConfig,
    pub storage: StorageConfig,
    pub email: EmailConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplicateConfig {
    pub api_base: String,
    pub api_token: String,
    /// Account that owns created model namespaces (the training destination).
    pub model_owner: String,
    pub trainer: TrainerConfig,
    pub hardware: String,
    pub request_timeout_ms: u64,
}

/// Pinned trainer model the provider runs for every submission.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainerConfig {
    pub owner: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    pub steps: i32,
    pub resolution: String,
    pub trigger_word: String,
    /// Pending/processing jobs older than this are expired by the sweep.
    pub stale_after_minutes: i64,
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Public base URL this service is reachable on; the provider posts
    /// completion callbacks here.
    pub base_url: String,
    /// Deliveries with a timestamp further from now than this are rejected.
    pub timestamp_tolerance_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint_url: String,
    pub region: String,
    pub bucket_name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// The provider must fetch the training archive within this window.
    pub signed_url_expiration_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for environment variable overrides)
        dotenvy::dotenv().ok();

        // Build config from config.yml (required) with environment variable overrides
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(
                config::Environment::with_prefix("TRAINVONIA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
