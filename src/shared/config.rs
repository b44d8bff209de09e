use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub max_attempts: u32,
    pub backoff_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/fieldsync.db".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            api: ApiConfig {
                base_url: "http://localhost:8080/api".to_string(),
                request_timeout: 30,
            },
            sync: SyncConfig {
                max_attempts: 5,
                backoff_secs: 30,
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FIELDSYNC_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v;
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_API_BASE_URL") {
            if !v.trim().is_empty() {
                cfg.api.base_url = v;
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_API_TIMEOUT_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.api.request_timeout = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_SYNC_MAX_ATTEMPTS") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.max_attempts = value.min(u32::MAX as u64) as u32;
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_SYNC_BACKOFF_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.backoff_secs = value;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.database.url.trim().is_empty() {
            return Err("Database url must not be empty".to_string());
        }
        if self.api.base_url.trim().is_empty() {
            return Err("API base_url must not be empty".to_string());
        }
        if self.api.request_timeout == 0 {
            return Err("API request_timeout must be greater than 0".to_string());
        }
        if self.sync.max_attempts == 0 {
            return Err("Sync max_attempts must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut cfg = AppConfig::default();
        cfg.api.request_timeout = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_base_url() {
        let mut cfg = AppConfig::default();
        cfg.api.base_url = "  ".to_string();
        assert!(cfg.validate().is_err());
    }
}
