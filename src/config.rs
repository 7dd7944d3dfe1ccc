use std::time::Duration;

use secrecy::Secret;
use serde::Deserialize;

const DEFAULT_USER_SERVICE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,

    // User service; the in-memory demo directory is used when unset
    pub user_service_url: Option<String>,
    pub user_service_token: Option<Secret<String>>,
    pub user_service_timeout_secs: u64,

    pub seed_demo_data: bool,

    // Cron expression for the balance reconciliation job
    pub reconcile_schedule: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Ok(Self {
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port").unwrap_or(8080),

            user_service_url: config
                .get::<String>("user_service_url")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            user_service_token: config
                .get::<String>("user_service_token")
                .ok()
                .map(Secret::new),
            user_service_timeout_secs: config
                .get("user_service_timeout_secs")
                .unwrap_or(DEFAULT_USER_SERVICE_TIMEOUT_SECS),

            seed_demo_data: config.get("seed_demo_data").unwrap_or(true),

            reconcile_schedule: config
                .get::<String>("reconcile_schedule")
                .ok()
                .filter(|expr| !expr.trim().is_empty()),
        })
    }

    pub fn user_service_timeout(&self) -> Duration {
        Duration::from_secs(self.user_service_timeout_secs)
    }
}
