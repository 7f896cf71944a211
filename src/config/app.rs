use anyhow::{bail, Result};
use std::env;

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    /// Browser origins allowed to send credentialed requests; empty mirrors the caller
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());
        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24);
        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_default());

        let config = AppConfig {
            host,
            port,
            environment,
            log_level,
            jwt_secret,
            session_ttl_hours,
            cors_origins,
        };
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.session_ttl_hours < 1 {
            bail!("SESSION_TTL_HOURS must be at least 1");
        }
        if self.is_production() && self.jwt_secret == DEFAULT_JWT_SECRET {
            bail!("JWT_SECRET must be set in production");
        }
        if self.is_production() && self.cors_origins.is_empty() {
            bail!("CORS_ORIGINS must be set in production");
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Without configured origins, development answers any caller
    pub fn mirror_any_origin(&self) -> bool {
        self.is_development() && self.cors_origins.is_empty()
    }

    /// Session cookies are only marked `Secure` outside development
    pub fn secure_cookies(&self) -> bool {
        !self.is_development()
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: &str) -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: environment.to_string(),
            log_level: "info".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            session_ttl_hours: 24,
            cors_origins: vec![],
        }
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://localhost:5173, https://app.example.com,,"),
            vec!["http://localhost:5173", "https://app.example.com"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_production_requires_secret() {
        assert!(config("development").validate().is_ok());
        assert!(config("production").validate().is_err());

        let mut prod = config("production");
        prod.jwt_secret = "a-real-secret".to_string();
        prod.cors_origins = vec!["https://app.example.com".to_string()];
        assert!(prod.validate().is_ok());
        assert!(prod.secure_cookies());
        assert!(!config("development").secure_cookies());
    }

    #[test]
    fn test_cors_origins_policy() {
        let mut prod = config("production");
        prod.jwt_secret = "a-real-secret".to_string();
        assert!(prod.validate().is_err());
        assert!(!prod.mirror_any_origin());

        assert!(config("development").mirror_any_origin());
        assert!(!config("staging").mirror_any_origin());

        let mut dev = config("development");
        dev.cors_origins = vec!["http://localhost:5173".to_string()];
        assert!(!dev.mirror_any_origin());
    }

    #[test]
    fn test_server_address() {
        assert_eq!(config("development").server_address(), "127.0.0.1:3000");
    }
}
