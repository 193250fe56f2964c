//! API configuration, loaded from `API_*` environment variables with
//! local-development defaults for every field.

use domain_credit::OverLimitPolicy;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "defaults::host")]
    pub host: String,
    #[serde(default = "defaults::port")]
    pub port: u16,
    /// JWT signing secret. The default is for local development only.
    #[serde(default = "defaults::jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "defaults::jwt_expiration_secs")]
    pub jwt_expiration_secs: u64,
    #[serde(default = "defaults::database_url")]
    pub database_url: String,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    /// Refuse over-limit credit increases instead of flagging them.
    #[serde(default)]
    pub credit_hard_block: bool,
}

mod defaults {
    pub fn host() -> String {
        "0.0.0.0".to_string()
    }
    pub fn port() -> u16 {
        8080
    }
    pub fn jwt_secret() -> String {
        "dev-secret-change-in-production".to_string()
    }
    pub fn jwt_expiration_secs() -> u64 {
        3600
    }
    pub fn database_url() -> String {
        "postgres://localhost/marketplace".to_string()
    }
    pub fn log_level() -> String {
        "info".to_string()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            jwt_secret: defaults::jwt_secret(),
            jwt_expiration_secs: defaults::jwt_expiration_secs(),
            database_url: defaults::database_url(),
            log_level: defaults::log_level(),
            credit_hard_block: false,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables. The bare
    /// `DATABASE_URL` convention is honored as an override.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let mut cfg: Self = config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()?;

        if let Ok(url) = std::env::var("DATABASE_URL") {
            cfg.database_url = url;
        }
        Ok(cfg)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The over-limit policy the credit guard is built with.
    pub fn over_limit_policy(&self) -> OverLimitPolicy {
        if self.credit_hard_block {
            OverLimitPolicy::HardBlock
        } else {
            OverLimitPolicy::AllowAndFlag
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_developer_friendly() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert!(matches!(
            config.over_limit_policy(),
            OverLimitPolicy::AllowAndFlag
        ));
    }

    #[test]
    fn test_hard_block_switches_the_policy() {
        let config = ApiConfig {
            credit_hard_block: true,
            ..ApiConfig::default()
        };
        assert!(matches!(
            config.over_limit_policy(),
            OverLimitPolicy::HardBlock
        ));
    }
}
